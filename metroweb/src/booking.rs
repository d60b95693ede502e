use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, Limited};
use hyper::{Method, Request, Response};
use hyper::body::{Bytes, Incoming};
use metro_booking::desk::BookingError;
use metro_booking::session::Session;
use metro_booking::validation::JourneyForm;
use metro_interface::model::{Download, IssuedTicket};
use tracing::{debug, error, info};

use crate::{AppState, get_query_pairs, render_response, return_400, return_404, return_405, return_500};
use crate::sessions::{session_cookie_header, session_id_from_headers, SessionSlot};
use crate::templating::IndexTemplate;


const MAX_FORM_BYTES: usize = 16 * 1024;


#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum TicketAsset {
    QrCode,
    Text,
    Voice,
}
impl TicketAsset {
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "qr.png" => Some(Self::QrCode),
            "ticket.txt" => Some(Self::Text),
            "voice.mp3" => Some(Self::Voice),
            _ => None,
        }
    }

    fn download(&self, issued: &IssuedTicket) -> Option<Download> {
        match self {
            Self::QrCode => Some(issued.qr_download()),
            Self::Text => Some(issued.text_download()),
            Self::Voice => issued.voice.as_ref()
                .map(|clip| Download::new(
                    clip.data.clone(),
                    format!("{}.mp3", issued.ticket.id),
                    clip.mime_type.clone(),
                )),
        }
    }
}


pub(crate) fn parse_form_body(body: &[u8]) -> JourneyForm {
    JourneyForm::from_pairs(form_urlencoded::parse(body))
}

fn attachment_header(file_name: &str) -> (String, String) {
    (
        "Content-Disposition".to_owned(),
        format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
    )
}

fn wants_download(query_pairs: &HashMap<Cow<'_, str>, Cow<'_, str>>) -> bool {
    query_pairs.get("download")
        .map(|d| d == "1" || d == "true")
        .unwrap_or(false)
}


async fn render_index(
    state: &AppState,
    session: &Session,
    form: &JourneyForm,
    error_message: Option<String>,
    query_pairs: &HashMap<Cow<'_, str>, Cow<'_, str>>,
    status: u16,
    headers: Vec<(String, String)>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    // newest first
    let template = IndexTemplate::new(
        state.desk.stations(),
        form,
        error_message,
        session.current(),
        session.history().rev(),
    );
    match render_response(&template, query_pairs, status, headers).await {
        Some(r) => Ok(r),
        None => return_500(),
    }
}

async fn session_for<T>(request: &Request<T>, state: &AppState) -> (Arc<SessionSlot>, Vec<(String, String)>) {
    let known_id = session_id_from_headers(request.headers());
    let (session_id, slot, created) = state.sessions
        .get_or_create(known_id.as_deref())
        .await;
    let headers = if created {
        vec![session_cookie_header(&session_id)]
    } else {
        Vec::new()
    };
    (slot, headers)
}


pub(crate) async fn handle_index(request: &Request<Incoming>, state: &AppState) -> Result<Response<Full<Bytes>>, Infallible> {
    let query_pairs = get_query_pairs(request);

    if request.method() != Method::GET {
        return return_405(&["GET"], &query_pairs).await;
    }

    let (slot, headers) = session_for(request, state).await;
    let guard = slot.lock().await;
    render_index(state, &guard.session, &JourneyForm::default(), None, &query_pairs, 200, headers).await
}


pub(crate) async fn handle_book(request: Request<Incoming>, state: &AppState) -> Result<Response<Full<Bytes>>, Infallible> {
    // the body is consumed below; the query string has to outlive it
    let query_string = request.uri().query().unwrap_or("").to_owned();
    let query_pairs: HashMap<Cow<str>, Cow<str>> = form_urlencoded::parse(query_string.as_bytes())
        .collect();

    if request.method() != Method::POST {
        return return_405(&["POST"], &query_pairs).await;
    }

    let (slot, headers) = session_for(&request, state).await;

    let body = match Limited::new(request.into_body(), MAX_FORM_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("failed to read booking form: {}", e);
            return return_400("The booking form could not be read.", &query_pairs).await;
        },
    };
    let form = parse_form_body(&body);

    // holding the lock for the whole booking processes one submission per session at a time
    let mut guard = slot.lock().await;
    let outcome = state.desk.book_form(&mut guard.session, &form).await
        .map(|issued| issued.ticket.id.clone());
    let (error_message, status) = match outcome {
        Ok(ticket_id) => {
            debug!("session now shows ticket {}", ticket_id);
            (None, 200)
        },
        Err(BookingError::Validation(e)) => {
            info!("booking rejected: {}", e);
            (Some(BookingError::Validation(e).user_message()), 400)
        },
        Err(e) => {
            error!("booking failed: {}", e);
            (Some(e.user_message()), 500)
        },
    };
    render_index(state, &guard.session, &form, error_message, &query_pairs, status, headers).await
}


pub(crate) async fn handle_clear_history(request: &Request<Incoming>, state: &AppState) -> Result<Response<Full<Bytes>>, Infallible> {
    let query_pairs = get_query_pairs(request);

    if request.method() != Method::POST {
        return return_405(&["POST"], &query_pairs).await;
    }

    if let Some(session_id) = session_id_from_headers(request.headers()) {
        if let Some(slot) = state.sessions.get(&session_id).await {
            let mut guard = slot.lock().await;
            guard.session.clear();
            debug!("cleared booking history");
        }
    }

    let response_res = Response::builder()
        .status(303)
        .header("Location", "/")
        .body(Full::new(Bytes::new()));
    match response_res {
        Ok(r) => Ok(r),
        Err(e) => {
            error!("failed to assemble redirect: {}", e);
            return_500()
        },
    }
}


pub(crate) async fn handle_ticket_asset(request: &Request<Incoming>, state: &AppState, ticket_id: &str, asset_name: &str) -> Result<Response<Full<Bytes>>, Infallible> {
    let query_pairs = get_query_pairs(request);

    let asset = match TicketAsset::from_file_name(asset_name) {
        Some(a) => a,
        None => return return_404(&query_pairs).await,
    };
    if request.method() != Method::GET {
        return return_405(&["GET"], &query_pairs).await;
    }

    // only the session that booked a ticket can see it
    let slot = match session_id_from_headers(request.headers()) {
        Some(session_id) => state.sessions.get(&session_id).await,
        None => None,
    };
    let slot = match slot {
        Some(s) => s,
        None => return return_404(&query_pairs).await,
    };
    let download = {
        let guard = slot.lock().await;
        guard.session.find(ticket_id)
            .and_then(|issued| asset.download(issued))
    };
    let download = match download {
        Some(d) => d,
        None => return return_404(&query_pairs).await,
    };

    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", download.mime_type.as_str());
    if wants_download(&query_pairs) {
        let (name, value) = attachment_header(&download.file_name);
        builder = builder.header(name, value);
    }
    match builder.body(Full::new(Bytes::from(download.data))) {
        Ok(r) => Ok(r),
        Err(e) => {
            error!("failed to assemble download response: {}", e);
            return_500()
        },
    }
}


#[cfg(test)]
mod tests {
    use chrono::Local;
    use metro_interface::model::{JourneyType, Ticket, TravelClass, VoiceClip};

    use super::*;

    fn issued(voice: Option<VoiceClip>) -> IssuedTicket {
        let ticket = Ticket {
            id: "0A1B2C3D".to_owned(),
            passenger_name: "Asha".to_owned(),
            source: "Ameerpet".to_owned(),
            destination: "KPHB".to_owned(),
            count: 1,
            journey_type: JourneyType::Single,
            travel_class: TravelClass::Standard,
            fare: 20,
            issued_at: Local::now(),
            text_block: "METRO RAIL TICKET".to_owned(),
            voice_text: "Booking confirmed for Asha.".to_owned(),
        };
        IssuedTicket::new(ticket, vec![0x89, b'P', b'N', b'G'], voice)
    }

    #[test]
    fn test_ticket_asset_names() {
        assert_eq!(Some(TicketAsset::QrCode), TicketAsset::from_file_name("qr.png"));
        assert_eq!(Some(TicketAsset::Text), TicketAsset::from_file_name("ticket.txt"));
        assert_eq!(Some(TicketAsset::Voice), TicketAsset::from_file_name("voice.mp3"));
        assert_eq!(None, TicketAsset::from_file_name("qr.jpg"));
        assert_eq!(None, TicketAsset::from_file_name(""));
    }

    #[test]
    fn test_ticket_asset_downloads() {
        let silent = issued(None);
        let qr = TicketAsset::QrCode.download(&silent).unwrap();
        assert_eq!("0A1B2C3D.png", qr.file_name);
        assert_eq!("image/png", qr.mime_type);

        let text = TicketAsset::Text.download(&silent).unwrap();
        assert_eq!("0A1B2C3D.txt", text.file_name);
        assert_eq!(b"METRO RAIL TICKET".to_vec(), text.data);

        assert_eq!(None, TicketAsset::Voice.download(&silent));

        let spoken = issued(Some(VoiceClip::new(vec![1, 2, 3], "audio/mpeg".to_owned())));
        let voice = TicketAsset::Voice.download(&spoken).unwrap();
        assert_eq!("audio/mpeg", voice.mime_type);
        assert_eq!(vec![1, 2, 3], voice.data);
    }

    #[test]
    fn test_parse_form_body() {
        let form = parse_form_body(b"passenger_name=Asha+Rao&source=Ameerpet&destination=Hitech+City&count=2&journey_type=Return&travel_class=Premium&submit=");
        assert_eq!("Asha Rao", form.passenger_name);
        assert_eq!("Ameerpet", form.source);
        assert_eq!("Hitech City", form.destination);
        assert_eq!("2", form.count);
        assert_eq!("Return", form.journey_type);
        assert_eq!("Premium", form.travel_class);

        let form = parse_form_body(b"passenger_name=%E0%A4%86%E0%A4%B6%E0%A4%BE");
        assert_eq!("\u{0906}\u{0936}\u{093E}", form.passenger_name);
        assert_eq!("", form.count);
    }

    #[test]
    fn test_attachment_header() {
        let (name, value) = attachment_header("0A1B2C3D.png");
        assert_eq!("Content-Disposition", name);
        assert_eq!("attachment; filename=\"0A1B2C3D.png\"", value);
    }

    #[test]
    fn test_wants_download() {
        let pairs: HashMap<Cow<str>, Cow<str>> = form_urlencoded::parse(b"download=1").collect();
        assert!(wants_download(&pairs));
        let pairs: HashMap<Cow<str>, Cow<str>> = form_urlencoded::parse(b"format=json").collect();
        assert!(!wants_download(&pairs));
    }
}
