mod booking;
mod config;
mod errors;
mod sessions;
mod templating;


use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::Infallible;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use http_body_util::Full;
use hyper::{Request, Response};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use metro_booking::desk::BookingDesk;
use metro_booking::qr::QrPngEncoder;
use metro_interface::interfaces::{NoSpeech, SpeechSynthesizer};
use metro_speech::TranslateSpeech;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::booking::{handle_book, handle_clear_history, handle_index, handle_ticket_asset};
use crate::config::{load_config, WebConfig};
use crate::errors::GeneralError;
use crate::sessions::SessionStore;
use crate::templating::{Error400Template, Error404Template, Error405Template};


const PRUNE_INTERVAL: Duration = Duration::from_secs(60);


pub(crate) struct AppState {
    pub desk: BookingDesk,
    pub sessions: SessionStore,
}


fn get_query_pairs<T>(request: &Request<T>) -> HashMap<Cow<str>, Cow<str>> {
    if let Some(q) = request.uri().query() {
        form_urlencoded::parse(q.as_bytes())
            .collect()
    } else {
        HashMap::new()
    }
}


// query_pairs is queried for "format" to decide between HTML and JSON
async fn render_response<S: Serialize + Template>(value: &S, query_pairs: &HashMap<Cow<'_, str>, Cow<'_, str>>, status: u16, headers: Vec<(String, String)>) -> Option<Response<Full<Bytes>>> {
    if query_pairs.get("format").map(|f| f == "json").unwrap_or(false) {
        render_json(value, status, headers).await
    } else {
        render_template(value, status, headers).await
    }
}

async fn render_json<S: Serialize>(value: &S, status: u16, headers: Vec<(String, String)>) -> Option<Response<Full<Bytes>>> {
    let rendered = match serde_json::to_string_pretty(value) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to render JSON: {}", e);
            return None;
        },
    };
    assemble_response(Bytes::from(rendered), "application/json", status, headers)
}

async fn render_template<T: Template>(value: &T, status: u16, headers: Vec<(String, String)>) -> Option<Response<Full<Bytes>>> {
    let rendered = match value.render() {
        Ok(s) => s,
        Err(e) => {
            error!("failed to render template: {}", e);
            return None;
        },
    };
    assemble_response(Bytes::from(rendered), "text/html; charset=utf-8", status, headers)
}

fn assemble_response(body: Bytes, content_type: &str, status: u16, headers: Vec<(String, String)>) -> Option<Response<Full<Bytes>>> {
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", content_type);
    for (k, v) in &headers {
        builder = builder.header(k, v);
    }
    match builder.body(Full::new(body)) {
        Ok(r) => Some(r),
        Err(e) => {
            error!("failed to assemble response: {}", e);
            None
        },
    }
}


async fn return_404(query_pairs: &HashMap<Cow<'_, str>, Cow<'_, str>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let template = Error404Template;
    match render_response(&template, query_pairs, 404, vec![]).await {
        Some(r) => Ok(r),
        None => return_500(),
    }
}

async fn return_400(reason: &str, query_pairs: &HashMap<Cow<'_, str>, Cow<'_, str>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let template = Error400Template {
        reason: reason.to_owned(),
    };
    match render_response(&template, query_pairs, 400, vec![]).await {
        Some(r) => Ok(r),
        None => return_500(),
    }
}

async fn return_405(allowed_methods: &[&str], query_pairs: &HashMap<Cow<'_, str>, Cow<'_, str>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let template = Error405Template {
        allowed_methods: allowed_methods.iter().map(|m| (*m).to_owned()).collect(),
    };
    let headers = vec![
        ("Allow".to_owned(), allowed_methods.join(", ")),
    ];
    match render_response(&template, query_pairs, 405, headers).await {
        Some(r) => Ok(r),
        None => return_500(),
    }
}

fn return_500() -> Result<Response<Full<Bytes>>, Infallible> {
    let mut response = Response::new(Full::new(Bytes::from_static(b"500 Internal Server Error")));
    *response.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Ok(response)
}


async fn handle_request(request: Request<Incoming>, state: Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    debug!("{} {}", request.method(), request.uri());
    let path = request.uri().path().to_owned();
    match path.as_str() {
        "/" => handle_index(&request, &state).await,
        "/book" => handle_book(request, &state).await,
        "/history/clear" => handle_clear_history(&request, &state).await,
        other => {
            if let Some(rest) = other.strip_prefix("/ticket/") {
                if let Some((ticket_id, asset)) = rest.split_once('/') {
                    return handle_ticket_asset(&request, &state, ticket_id, asset).await;
                }
            }
            let query_pairs = get_query_pairs(&request);
            return_404(&query_pairs).await
        },
    }
}


fn build_state(config: &WebConfig) -> Result<AppState, GeneralError> {
    let stations = Arc::new(config.station_table()?);
    let fare_policy = config.fare_policy(&stations)?;
    let image_options = config.image_options()?;
    info!(
        "{} stations, {:?} fare policy",
        stations.len(), fare_policy.config().policy,
    );

    let speech: Arc<dyn SpeechSynthesizer> = if config.speech.enabled {
        Arc::new(TranslateSpeech::new(&config.speech)?)
    } else {
        info!("speech synthesis disabled");
        Arc::new(NoSpeech)
    };

    let desk = BookingDesk::new(
        stations,
        fare_policy,
        Arc::new(QrPngEncoder),
        image_options,
        speech,
        config.voice.clone(),
    );
    let sessions = SessionStore::new(
        config.sessions.history_limit,
        Duration::from_secs(config.sessions.idle_timeout_minutes * 60),
    );

    Ok(AppState {
        desk,
        sessions,
    })
}


async fn run() -> Result<(), GeneralError> {
    // set up tracing
    let (stderr_non_blocking, _guard) = tracing_appender::non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(stderr_non_blocking)
        .init();

    // get config path and load config
    let args_os: Vec<OsString> = std::env::args_os().collect();
    let config_path = match args_os.get(1) {
        Some(cp) => PathBuf::from(cp),
        None => PathBuf::from("metroweb.toml"),
    };
    let config = load_config(&config_path)?;
    let state = Arc::new(build_state(&config)?);

    // end idle sessions in the background
    debug!("sessions end after {:?} of inactivity", state.sessions.idle_timeout());
    let prune_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            prune_state.sessions.prune().await;
        }
    });

    let listener = TcpListener::bind(config.listen).await
        .map_err(GeneralError::Listening)?;
    info!("listening on {}", config.listen);

    loop {
        let (stream, remote_address) = match listener.accept().await {
            Ok(sa) => sa,
            Err(e) => {
                error!("failed to accept connection: {}", e);
                continue;
            },
        };
        let io = TokioIo::new(stream);
        let connection_state = Arc::clone(&state);

        tokio::spawn(async move {
            let service = service_fn(move |request| {
                handle_request(request, Arc::clone(&connection_state))
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("connection from {} ended with error: {}", remote_address, e);
            }
        });
    }
}

fn main() {
    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(GeneralError::Runtime)
        .and_then(|runtime| runtime.block_on(run()));

    std::process::exit(
        match result {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{}", e);
                1
            },
        }
    )
}
