pub mod chunking;


use std::time::Duration;

use async_trait::async_trait;
use metro_interface::errors::SynthesisError;
use metro_interface::interfaces::{SpeechOptions, SpeechSynthesizer};
use metro_interface::model::VoiceClip;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chunking::split_for_speech;


const DEFAULT_BASE_URL: &str = "https://translate.google.com/";
const MAX_CHUNK_CHARS: usize = 100;
const NORMAL_SPEED: &str = "1";
const SLOW_SPEED: &str = "0.3";


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}
impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: "Mozilla/5.0 (compatible; metroweb)".to_owned(),
            timeout_secs: 10,
        }
    }
}


#[derive(Debug)]
pub enum SpeechSetupError {
    BaseUrl(url::ParseError),
    HttpClient(reqwest::Error),
}
impl std::fmt::Display for SpeechSetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechSetupError::BaseUrl(e)
                => write!(f, "invalid speech base URL: {}", e),
            SpeechSetupError::HttpClient(e)
                => write!(f, "failed to set up speech HTTP client: {}", e),
        }
    }
}
impl std::error::Error for SpeechSetupError {
}


/// Speaks text using the Google Translate text-to-speech endpoint, which returns MP3 audio.
///
/// The endpoint only accepts short snippets, so longer text is split up and the MP3 streams of
/// the snippets are concatenated.
pub struct TranslateSpeech {
    base_url: Url,
    user_agent: String,
    http_client: reqwest::Client,
}
impl TranslateSpeech {
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechSetupError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(SpeechSetupError::BaseUrl)?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SpeechSetupError::HttpClient)?;
        Ok(Self {
            base_url,
            user_agent: config.user_agent.clone(),
            http_client,
        })
    }

    fn chunk_url(&self, chunk: &str, index: usize, total: usize, options: &SpeechOptions) -> Result<Url, SynthesisError> {
        let mut url = self.base_url
            .join("translate_tts")
            .map_err(|e| SynthesisError::Rejected(format!("cannot construct URL: {}", e)))?;
        {
            url.query_pairs_mut()
                .append_pair("ie", "UTF-8")
                .append_pair("q", chunk)
                .append_pair("tl", &options.language)
                .append_pair("client", "tw-ob")
                .append_pair("ttsspeed", if options.slow { SLOW_SPEED } else { NORMAL_SPEED })
                .append_pair("total", &total.to_string())
                .append_pair("idx", &index.to_string())
                .append_pair("textlen", &chunk.chars().count().to_string());
        }
        Ok(url)
    }

    async fn fetch_chunk(&self, url: Url) -> Result<Vec<u8>, SynthesisError> {
        let response = self.http_client
            .get(url.clone())
            .header("User-Agent", &self.user_agent)
            .header("Referer", self.base_url.as_str())
            .send().await
            .map_err(|e| {
                debug!("speech request to {} failed: {}", url, e);
                SynthesisError::Unavailable(e.to_string())
            })?;

        if let Some(err) = classify_status(response.status()) {
            debug!("speech request to {} returned status code {}", url, response.status());
            return Err(err);
        }

        let content_type = response.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("")
            .to_owned();
        if !content_type.is_empty() && !content_type.starts_with("audio/") {
            return Err(SynthesisError::Rejected(format!("unexpected content type {:?}", content_type)));
        }

        let bytes = response
            .bytes().await
            .map_err(|e| SynthesisError::Unavailable(format!("failed to read audio: {}", e)))?;
        if bytes.is_empty() {
            return Err(SynthesisError::Rejected("empty audio response".to_owned()));
        }
        Ok(bytes.to_vec())
    }
}
#[async_trait]
impl SpeechSynthesizer for TranslateSpeech {
    async fn synthesize(&self, text: &str, options: &SpeechOptions) -> Result<VoiceClip, SynthesisError> {
        let chunks = split_for_speech(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::Rejected("nothing to say".to_owned()));
        }

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let url = self.chunk_url(chunk, index, chunks.len(), options)?;
            let chunk_audio = self.fetch_chunk(url).await?;
            audio.extend_from_slice(&chunk_audio);
        }

        debug!("synthesized {} bytes of speech from {} chunks", audio.len(), chunks.len());
        Ok(VoiceClip::new(audio, "audio/mpeg".to_owned()))
    }
}


/// Rate limiting and server trouble count as the service being unavailable; any other
/// unsuccessful status means the request itself was refused.
fn classify_status(status: StatusCode) -> Option<SynthesisError> {
    if status.is_success() {
        None
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(SynthesisError::Unavailable(format!("HTTP {}", status)))
    } else {
        Some(SynthesisError::Rejected(format!("HTTP {}", status)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn speech(base_url: &str) -> TranslateSpeech {
        let config = SpeechConfig {
            base_url: base_url.to_owned(),
            timeout_secs: 2,
            ..SpeechConfig::default()
        };
        TranslateSpeech::new(&config).unwrap()
    }

    #[test]
    fn test_chunk_url() {
        let options = SpeechOptions {
            language: "en".to_owned(),
            slow: true,
        };
        let url = speech(DEFAULT_BASE_URL)
            .chunk_url("Booking confirmed for Asha.", 0, 2, &options)
            .unwrap();
        assert_eq!("translate.google.com", url.host_str().unwrap());
        assert_eq!("/translate_tts", url.path());

        let pairs: Vec<(String, String)> = url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("q".to_owned(), "Booking confirmed for Asha.".to_owned())));
        assert!(pairs.contains(&("tl".to_owned(), "en".to_owned())));
        assert!(pairs.contains(&("ttsspeed".to_owned(), SLOW_SPEED.to_owned())));
        assert!(pairs.contains(&("total".to_owned(), "2".to_owned())));
        assert!(pairs.contains(&("textlen".to_owned(), "27".to_owned())));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = SpeechConfig {
            base_url: "not a url".to_owned(),
            ..SpeechConfig::default()
        };
        assert!(matches!(TranslateSpeech::new(&config), Err(SpeechSetupError::BaseUrl(_))));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(None, classify_status(StatusCode::OK));
        assert!(matches!(classify_status(StatusCode::TOO_MANY_REQUESTS), Some(SynthesisError::Unavailable(_))));
        assert!(matches!(classify_status(StatusCode::BAD_GATEWAY), Some(SynthesisError::Unavailable(_))));
        assert!(matches!(classify_status(StatusCode::BAD_REQUEST), Some(SynthesisError::Rejected(_))));
        assert!(matches!(classify_status(StatusCode::FORBIDDEN), Some(SynthesisError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // nothing listens on the discard port of the loopback interface
        let result = speech("http://127.0.0.1:9/")
            .synthesize("Booking confirmed.", &SpeechOptions::default())
            .await;
        assert!(matches!(result, Err(SynthesisError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let result = speech(DEFAULT_BASE_URL)
            .synthesize("  ", &SpeechOptions::default())
            .await;
        assert!(matches!(result, Err(SynthesisError::Rejected(_))));
    }

    #[test]
    fn test_config_from_toml() {
        let config: SpeechConfig = toml::from_str("enabled = false\ntimeout_secs = 3\n").unwrap();
        assert!(!config.enabled);
        assert_eq!(3, config.timeout_secs);
        assert_eq!(DEFAULT_BASE_URL, config.base_url);
    }
}
