use std::fmt;
use std::sync::Arc;

use metro_interface::errors::{EncodingError, FareError, SynthesisError, ValidationError};
use metro_interface::interfaces::{ImageEncoder, ImageOptions, SpeechOptions, SpeechSynthesizer};
use metro_interface::model::{IssuedTicket, JourneyRequest, StationTable, VoiceClip};
use tracing::{error, info, warn};

use crate::fare::FarePolicy;
use crate::session::Session;
use crate::ticket::build_ticket;
use crate::validation::{validate, JourneyForm};


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum BookingError {
    Validation(ValidationError),
    Fare(FareError),
    Encoding(EncodingError),
}
impl BookingError {
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Validation(e)
                => e.user_message(),
            BookingError::Fare(_)
                => "The fare for this route cannot be calculated.".to_owned(),
            BookingError::Encoding(_)
                => "The ticket code could not be generated. Please try again.".to_owned(),
        }
    }
}
impl fmt::Display for BookingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingError::Validation(e)
                => write!(f, "validation failed: {}", e),
            BookingError::Fare(e)
                => write!(f, "fare calculation failed: {}", e),
            BookingError::Encoding(e)
                => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for BookingError {
}
impl From<ValidationError> for BookingError {
    fn from(e: ValidationError) -> Self {
        BookingError::Validation(e)
    }
}
impl From<FareError> for BookingError {
    fn from(e: FareError) -> Self {
        BookingError::Fare(e)
    }
}
impl From<EncodingError> for BookingError {
    fn from(e: EncodingError) -> Self {
        BookingError::Encoding(e)
    }
}


/// Turns submitted journeys into issued tickets.
///
/// Validation, fare calculation, ticket building and QR encoding must all succeed for a booking
/// to be recorded; the spoken confirmation is optional. A failed booking leaves the session as it
/// was.
pub struct BookingDesk {
    stations: Arc<StationTable>,
    fare_policy: FarePolicy,
    image_encoder: Arc<dyn ImageEncoder>,
    image_options: ImageOptions,
    speech: Arc<dyn SpeechSynthesizer>,
    speech_options: SpeechOptions,
}
impl BookingDesk {
    pub fn new(
        stations: Arc<StationTable>,
        fare_policy: FarePolicy,
        image_encoder: Arc<dyn ImageEncoder>,
        image_options: ImageOptions,
        speech: Arc<dyn SpeechSynthesizer>,
        speech_options: SpeechOptions,
    ) -> Self {
        Self {
            stations,
            fare_policy,
            image_encoder,
            image_options,
            speech,
            speech_options,
        }
    }

    pub fn stations(&self) -> &StationTable { &self.stations }
    pub fn fare_policy(&self) -> &FarePolicy { &self.fare_policy }

    pub async fn book_form<'s>(&self, session: &'s mut Session, form: &JourneyForm) -> Result<&'s IssuedTicket, BookingError> {
        let request = form.to_request(&self.stations)?;
        self.book(session, request).await
    }

    pub async fn book<'s>(&self, session: &'s mut Session, request: JourneyRequest) -> Result<&'s IssuedTicket, BookingError> {
        let valid = validate(request)?;
        let fare = self.fare_policy.fare_for(&valid)?;
        let ticket = build_ticket(&valid, fare);

        let qr_png = self.image_encoder.encode(&ticket.text_block, &self.image_options)
            .map_err(|e| {
                error!("failed to encode ticket {}: {}", ticket.id, e);
                e
            })?;
        let voice = self.announce(&ticket.id, &ticket.voice_text).await;

        info!(
            "issued ticket {} for {:?}: {} x{} {} {}, fare {}",
            ticket.id, ticket.passenger_name, ticket.route(), ticket.count,
            ticket.journey_type, ticket.travel_class, ticket.fare,
        );
        Ok(session.push(IssuedTicket::new(ticket, qr_png, voice)))
    }

    async fn announce(&self, ticket_id: &str, voice_text: &str) -> Option<VoiceClip> {
        match self.speech.synthesize(voice_text, &self.speech_options).await {
            Ok(clip) => Some(clip),
            Err(SynthesisError::Unavailable(reason)) => {
                warn!("no voice confirmation for ticket {}: speech unavailable: {}", ticket_id, reason);
                None
            },
            Err(SynthesisError::Rejected(reason)) => {
                error!("no voice confirmation for ticket {}: speech service rejected the request: {}", ticket_id, reason);
                None
            },
        }
    }
}
