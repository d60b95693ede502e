use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use metro_barcode::bitmap::Rgb;
use metro_booking::fare::{FareConfig, FarePolicy};
use metro_booking::session::DEFAULT_HISTORY_LIMIT;
use metro_interface::interfaces::{ImageOptions, SpeechOptions};
use metro_interface::model::{Station, StationTable};
use metro_speech::SpeechConfig;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;


#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct WebConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default)]
    pub fare: FareConfig,

    /// Empty means the built-in station table.
    #[serde(default)]
    pub stations: Vec<Station>,

    #[serde(default)]
    pub qr: ImageOptions,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub voice: SpeechOptions,

    #[serde(default)]
    pub sessions: SessionConfig,
}
impl WebConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text)
            .map_err(ConfigError::Loading)
    }

    /// Builds the station table and checks it: at least two stations, no blank or duplicate
    /// names.
    pub fn station_table(&self) -> Result<StationTable, ConfigError> {
        if self.stations.is_empty() {
            return Ok(StationTable::hyderabad());
        }
        if self.stations.len() < 2 {
            return Err(ConfigError::TooFewStations(self.stations.len()));
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if station.name.trim().is_empty() {
                return Err(ConfigError::EmptyStationName);
            }
            if !seen.insert(station.name.as_str()) {
                return Err(ConfigError::DuplicateStation(station.name.clone()));
            }
        }
        Ok(StationTable::new(self.stations.clone()))
    }

    /// Returns the QR options after checking that both colours parse and modules have a size.
    pub fn image_options(&self) -> Result<ImageOptions, ConfigError> {
        for (key, value) in [("foreground_color", &self.qr.foreground_color), ("background_color", &self.qr.background_color)] {
            Rgb::from_str(value)
                .map_err(|error| ConfigError::QrColor { key, error })?;
        }
        if self.qr.size_hint == 0 {
            return Err(ConfigError::QrModuleSize);
        }
        Ok(self.qr.clone())
    }

    pub fn fare_policy(&self, stations: &StationTable) -> Result<FarePolicy, ConfigError> {
        FarePolicy::new(self.fare.clone(), stations)
            .map_err(ConfigError::Fare)
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8501))
}


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub(crate) struct SessionConfig {
    pub history_limit: usize,
    pub idle_timeout_minutes: u64,
}
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            idle_timeout_minutes: 30,
        }
    }
}


pub(crate) fn load_config(path: &Path) -> Result<WebConfig, ConfigError> {
    let mut file = File::open(path)
        .map_err(ConfigError::OpeningFile)?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(ConfigError::OpeningFile)?;
    WebConfig::from_toml(&text)
}


#[cfg(test)]
mod tests {
    use metro_booking::fare::FarePolicyKind;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = WebConfig::from_toml("").unwrap();
        assert_eq!(default_listen(), config.listen);
        assert_eq!(FarePolicyKind::Distance, config.fare.policy);
        assert_eq!(10, config.qr.size_hint);
        assert_eq!("#2c3e50", config.qr.foreground_color);
        assert_eq!("en", config.voice.language);
        assert!(config.speech.enabled);
        assert_eq!(DEFAULT_HISTORY_LIMIT, config.sessions.history_limit);

        let stations = config.station_table().unwrap();
        assert_eq!(StationTable::hyderabad(), stations);
        assert!(config.fare_policy(&stations).is_ok());
    }

    #[test]
    fn test_full_config() {
        let config = WebConfig::from_toml(r##"
            listen = "0.0.0.0:8080"

            [fare]
            policy = "flat"
            base_rate = 30

            [[stations]]
            name = "Ameerpet"

            [[stations]]
            name = "KPHB"

            [[stations]]
            name = "Kukatpally"

            [qr]
            foreground_color = "#000000"
            border_width = 2

            [speech]
            enabled = false

            [voice]
            language = "hi"
            slow = true

            [sessions]
            history_limit = 5
        "##).unwrap();

        assert_eq!(8080, config.listen.port());
        assert_eq!(FarePolicyKind::Flat, config.fare.policy);
        assert_eq!(2, config.qr.border_width);
        assert_eq!(10, config.qr.size_hint);
        assert!(!config.speech.enabled);
        assert_eq!("hi", config.voice.language);
        assert!(config.voice.slow);
        assert_eq!(5, config.sessions.history_limit);
        assert_eq!(30, config.sessions.idle_timeout_minutes);

        let stations = config.station_table().unwrap();
        assert_eq!(3, stations.len());
        assert_eq!(None, stations.by_name("KPHB").unwrap().position);
        assert!(config.fare_policy(&stations).is_ok());
    }

    #[test]
    fn test_distance_policy_needs_positions() {
        let config = WebConfig::from_toml(r#"
            [[stations]]
            name = "Ameerpet"
            position = 1

            [[stations]]
            name = "KPHB"
        "#).unwrap();
        let stations = config.station_table().unwrap();
        assert!(matches!(config.fare_policy(&stations), Err(ConfigError::Fare(_))));
    }

    #[test]
    fn test_station_table_checks() {
        let config = WebConfig::from_toml("[[stations]]\nname = \"Ameerpet\"\n").unwrap();
        assert!(matches!(config.station_table(), Err(ConfigError::TooFewStations(1))));

        let config = WebConfig::from_toml("[[stations]]\nname = \"KPHB\"\n[[stations]]\nname = \"KPHB\"\n").unwrap();
        assert!(matches!(config.station_table(), Err(ConfigError::DuplicateStation(_))));

        let config = WebConfig::from_toml("[[stations]]\nname = \" \"\n[[stations]]\nname = \"KPHB\"\n").unwrap();
        assert!(matches!(config.station_table(), Err(ConfigError::EmptyStationName)));
    }

    #[test]
    fn test_qr_options_checked() {
        let config = WebConfig::from_toml("").unwrap();
        assert_eq!(config.qr, config.image_options().unwrap());

        let config = WebConfig::from_toml("[qr]\nforeground_color = \"navy\"\n").unwrap();
        assert!(matches!(
            config.image_options(),
            Err(ConfigError::QrColor { key: "foreground_color", .. }),
        ));

        let config = WebConfig::from_toml("[qr]\nbackground_color = \"#ffff\"\n").unwrap();
        assert!(matches!(
            config.image_options(),
            Err(ConfigError::QrColor { key: "background_color", .. }),
        ));

        let config = WebConfig::from_toml("[qr]\nsize_hint = 0\n").unwrap();
        assert!(matches!(config.image_options(), Err(ConfigError::QrModuleSize)));

        let config = WebConfig::from_toml("[qr]\nforeground_color = \"#000\"\nsize_hint = 3\n").unwrap();
        assert!(config.image_options().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(WebConfig::from_toml("listen = 5"), Err(ConfigError::Loading(_))));
    }
}
