use std::error;
use std::fmt;

use metro_barcode::bitmap::ColorParseError;
use metro_booking::fare::FareConfigError;
use metro_speech::SpeechSetupError;


#[derive(Debug)]
pub(crate) enum ConfigError {
    OpeningFile(std::io::Error),
    Loading(toml::de::Error),
    TooFewStations(usize),
    DuplicateStation(String),
    EmptyStationName,
    Fare(FareConfigError),
    QrColor { key: &'static str, error: ColorParseError },
    QrModuleSize,
}
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OpeningFile(e)
                => write!(f, "error opening config file: {}", e),
            ConfigError::Loading(e)
                => write!(f, "error loading configuration: {}", e),
            ConfigError::TooFewStations(count)
                => write!(f, "at least two stations are required, {} configured", count),
            ConfigError::DuplicateStation(name)
                => write!(f, "station {:?} is configured more than once", name),
            ConfigError::EmptyStationName
                => write!(f, "a station has an empty name"),
            ConfigError::Fare(e)
                => write!(f, "invalid fare configuration: {}", e),
            ConfigError::QrColor { key, error }
                => write!(f, "invalid qr.{}: {}", key, error),
            ConfigError::QrModuleSize
                => write!(f, "qr.size_hint must be at least 1"),
        }
    }
}
impl error::Error for ConfigError {
}


#[derive(Debug)]
pub(crate) enum GeneralError {
    Config(ConfigError),
    Speech(SpeechSetupError),
    Runtime(std::io::Error),
    Listening(std::io::Error),
}
impl fmt::Display for GeneralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralError::Config(e)
                => write!(f, "{}", e),
            GeneralError::Speech(e)
                => write!(f, "{}", e),
            GeneralError::Runtime(e)
                => write!(f, "error starting runtime: {}", e),
            GeneralError::Listening(e)
                => write!(f, "error listening for connections: {}", e),
        }
    }
}
impl error::Error for GeneralError {
}
impl From<ConfigError> for GeneralError {
    fn from(e: ConfigError) -> Self {
        GeneralError::Config(e)
    }
}
impl From<SpeechSetupError> for GeneralError {
    fn from(e: SpeechSetupError) -> Self {
        GeneralError::Speech(e)
    }
}
