use std::error::Error;
use std::fmt;


/// Reasons why a journey request is refused before any fare is computed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ValidationError {
    EmptyName,
    InvalidName,
    SameStation(String),
    CountOutOfRange { count: i64, min: u32, max: u32 },
    UnknownStation(String),
    UnknownJourneyType(String),
    UnknownTravelClass(String),
}
impl ValidationError {
    /// The message shown to the passenger next to the form.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::EmptyName
                => "Please enter the passenger name.".to_owned(),
            ValidationError::InvalidName
                => "The passenger name must fit on one line.".to_owned(),
            ValidationError::SameStation(_)
                => "Invalid route: source and destination must differ.".to_owned(),
            ValidationError::CountOutOfRange { min, max, .. }
                => format!("Passenger count must be between {} and {}.", min, max),
            ValidationError::UnknownStation(station)
                => format!("Unknown station {:?}.", station),
            ValidationError::UnknownJourneyType(jt)
                => format!("Unknown journey type {:?}.", jt),
            ValidationError::UnknownTravelClass(tc)
                => format!("Unknown travel class {:?}.", tc),
        }
    }
}
impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName
                => write!(f, "passenger name is empty"),
            ValidationError::InvalidName
                => write!(f, "passenger name contains control characters"),
            ValidationError::SameStation(station)
                => write!(f, "source and destination are both {:?}", station),
            ValidationError::CountOutOfRange { count, min, max }
                => write!(f, "passenger count {} outside [{}, {}]", count, min, max),
            ValidationError::UnknownStation(station)
                => write!(f, "unknown station {:?}", station),
            ValidationError::UnknownJourneyType(jt)
                => write!(f, "unknown journey type {:?}", jt),
            ValidationError::UnknownTravelClass(tc)
                => write!(f, "unknown travel class {:?}", tc),
        }
    }
}
impl Error for ValidationError {
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FareError {
    UnpositionedStation(String),
}
impl fmt::Display for FareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FareError::UnpositionedStation(station)
                => write!(f, "station {:?} has no position; distance-based fares are impossible", station),
        }
    }
}
impl Error for FareError {
}


/// The image encoder failed to turn the ticket text into an image.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EncodingError(pub String);
impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image encoding failed: {}", self.0)
    }
}
impl Error for EncodingError {
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SynthesisError {
    /// The speech service could not be reached or is temporarily refusing requests.
    Unavailable(String),

    /// The speech service answered, but not with usable audio.
    Rejected(String),
}
impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisError::Unavailable(reason)
                => write!(f, "speech synthesis unavailable: {}", reason),
            SynthesisError::Rejected(reason)
                => write!(f, "speech synthesis rejected: {}", reason),
        }
    }
}
impl Error for SynthesisError {
}
