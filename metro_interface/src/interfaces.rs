use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{EncodingError, SynthesisError};
use crate::model::VoiceClip;


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct ImageOptions {
    /// Edge length of one code module in pixels.
    pub size_hint: usize,

    /// Width of the light border around the code, in modules.
    pub border_width: usize,

    pub foreground_color: String,
    pub background_color: String,
}
impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            size_hint: 10,
            border_width: 4,
            foreground_color: "#2c3e50".to_owned(),
            background_color: "#ffffff".to_owned(),
        }
    }
}


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct SpeechOptions {
    pub language: String,
    pub slow: bool,
}
impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language: "en".to_owned(),
            slow: false,
        }
    }
}


/// Turns ticket text into a scannable image.
pub trait ImageEncoder: Send + Sync {
    /// Encodes the text and returns the image file contents.
    fn encode(&self, text: &str, options: &ImageOptions) -> Result<Vec<u8>, EncodingError>;
}


/// Turns a sentence into spoken audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, options: &SpeechOptions) -> Result<VoiceClip, SynthesisError>;
}


/// A synthesizer for deployments without a speech service; every request is unavailable.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct NoSpeech;
#[async_trait]
impl SpeechSynthesizer for NoSpeech {
    async fn synthesize(&self, _text: &str, _options: &SpeechOptions) -> Result<VoiceClip, SynthesisError> {
        Err(SynthesisError::Unavailable("speech synthesis is disabled".to_owned()))
    }
}
