use std::fmt;

use metro_interface::errors::FareError;
use metro_interface::model::{JourneyType, Station, StationTable, TravelClass};
use serde::{Deserialize, Serialize};

use crate::validation::ValidRequest;


#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FarePolicyKind {
    /// A fixed rate per passenger, independent of the route. A base rate below the minimum fare
    /// is raised to the minimum fare before the multipliers apply.
    Flat,

    /// A rate per station travelled, with a minimum per passenger.
    Distance,
}


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct FareConfig {
    pub policy: FarePolicyKind,
    pub base_rate: u64,
    pub minimum_fare: u64,
    pub per_station_rate: u64,
    pub return_multiplier_percent: u64,
    pub premium_multiplier_percent: u64,
}
impl Default for FareConfig {
    fn default() -> Self {
        Self {
            policy: FarePolicyKind::Distance,
            base_rate: 30,
            minimum_fare: 20,
            per_station_rate: 10,
            return_multiplier_percent: 180,
            premium_multiplier_percent: 150,
        }
    }
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FareConfigError {
    MultiplierBelowPar { name: &'static str, percent: u64 },
    UnpositionedStation(String),
}
impl fmt::Display for FareConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FareConfigError::MultiplierBelowPar { name, percent }
                => write!(f, "{} is {}%; multipliers below 100% are not allowed", name, percent),
            FareConfigError::UnpositionedStation(station)
                => write!(f, "the distance fare policy needs a position for station {:?}", station),
        }
    }
}
impl std::error::Error for FareConfigError {
}


/// Computes fares in exact integer arithmetic, truncating once at the very end.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FarePolicy {
    config: FareConfig,
}
impl FarePolicy {
    /// Checks the configuration against the station table it will be used with.
    pub fn new(config: FareConfig, stations: &StationTable) -> Result<Self, FareConfigError> {
        let multipliers = [
            ("return_multiplier_percent", config.return_multiplier_percent),
            ("premium_multiplier_percent", config.premium_multiplier_percent),
        ];
        for (name, percent) in multipliers {
            if percent < 100 {
                return Err(FareConfigError::MultiplierBelowPar { name, percent });
            }
        }

        if config.policy == FarePolicyKind::Distance {
            if let Some(unpositioned) = stations.stations().iter().find(|s| s.position.is_none()) {
                return Err(FareConfigError::UnpositionedStation(unpositioned.name.clone()));
            }
        }

        Ok(Self {
            config,
        })
    }

    pub fn config(&self) -> &FareConfig { &self.config }

    pub fn minimum_fare(&self) -> u64 { self.config.minimum_fare }

    pub fn fare_for(&self, request: &ValidRequest) -> Result<u64, FareError> {
        self.calculate_fare(
            request.source(),
            request.destination(),
            request.count(),
            request.journey_type(),
            request.travel_class(),
        )
    }

    pub fn calculate_fare(
        &self,
        source: &Station,
        destination: &Station,
        count: u32,
        journey_type: JourneyType,
        travel_class: TravelClass,
    ) -> Result<u64, FareError> {
        let per_person = match self.config.policy {
            FarePolicyKind::Flat => self.config.base_rate,
            FarePolicyKind::Distance => {
                let distance = station_distance(source, destination)?;
                distance.saturating_mul(self.config.per_station_rate)
            },
        }.max(self.config.minimum_fare);

        let (journey_numerator, journey_denominator) = match journey_type {
            JourneyType::Single => (1, 1),
            JourneyType::Return => (self.config.return_multiplier_percent, 100),
        };
        let (class_numerator, class_denominator) = match travel_class {
            TravelClass::Standard => (1, 1),
            TravelClass::Premium => (self.config.premium_multiplier_percent, 100),
        };

        let numerator = per_person
            .saturating_mul(journey_numerator)
            .saturating_mul(class_numerator)
            .saturating_mul(u64::from(count));
        Ok(numerator / (journey_denominator * class_denominator))
    }
}


fn station_distance(source: &Station, destination: &Station) -> Result<u64, FareError> {
    let position = |station: &Station| station.position
        .ok_or_else(|| FareError::UnpositionedStation(station.name.clone()));
    let source_pos = position(source)?;
    let destination_pos = position(destination)?;
    Ok(u64::from(source_pos.abs_diff(destination_pos)))
}
