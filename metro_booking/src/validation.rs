use std::convert::TryFrom;

use metro_interface::errors::ValidationError;
use metro_interface::model::{JourneyRequest, JourneyType, Station, StationTable, TravelClass};


pub const MIN_PASSENGERS: u32 = 1;
pub const MAX_PASSENGERS: u32 = 10;


/// A journey request that passed [`validate`].
///
/// The only way to obtain one is through validation, so fare calculation and ticket building
/// never see an empty name, a zero-length route or an absurd passenger count.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ValidRequest {
    passenger_name: String,
    source: Station,
    destination: Station,
    count: u32,
    journey_type: JourneyType,
    travel_class: TravelClass,
}
impl ValidRequest {
    pub fn passenger_name(&self) -> &str { &self.passenger_name }
    pub fn source(&self) -> &Station { &self.source }
    pub fn destination(&self) -> &Station { &self.destination }
    pub fn count(&self) -> u32 { self.count }
    pub fn journey_type(&self) -> JourneyType { self.journey_type }
    pub fn travel_class(&self) -> TravelClass { self.travel_class }
}


pub fn validate(request: JourneyRequest) -> Result<ValidRequest, ValidationError> {
    let passenger_name = request.passenger_name.trim();
    if passenger_name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    // the name becomes one line of the ticket text
    if passenger_name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName);
    }
    if request.source == request.destination {
        return Err(ValidationError::SameStation(request.source.name));
    }

    let count = u32::try_from(request.count)
        .ok()
        .filter(|c| (MIN_PASSENGERS..=MAX_PASSENGERS).contains(c))
        .ok_or(ValidationError::CountOutOfRange {
            count: request.count,
            min: MIN_PASSENGERS,
            max: MAX_PASSENGERS,
        })?;

    Ok(ValidRequest {
        passenger_name: passenger_name.to_owned(),
        source: request.source,
        destination: request.destination,
        count,
        journey_type: request.journey_type,
        travel_class: request.travel_class,
    })
}


/// The booking form's fields as submitted, all still text.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct JourneyForm {
    pub passenger_name: String,
    pub source: String,
    pub destination: String,
    pub count: String,
    pub journey_type: String,
    pub travel_class: String,
}
impl JourneyForm {
    /// Collects the form from `name=value` pairs; unknown keys are ignored and missing keys stay
    /// empty.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
        where I: IntoIterator<Item = (K, V)>, K: AsRef<str>, V: Into<String>
    {
        let mut form = JourneyForm::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "passenger_name" => &mut form.passenger_name,
                "source" => &mut form.source,
                "destination" => &mut form.destination,
                "count" => &mut form.count,
                "journey_type" => &mut form.journey_type,
                "travel_class" => &mut form.travel_class,
                _ => continue,
            };
            *slot = value.into();
        }
        form
    }

    /// Resolves station names and enumerations. Range checks are left to [`validate`], but a
    /// missing name is reported first, as [`validate`] would.
    pub fn to_request(&self, stations: &StationTable) -> Result<JourneyRequest, ValidationError> {
        if self.passenger_name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let lookup = |name: &str| stations.by_name(name.trim())
            .cloned()
            .ok_or_else(|| ValidationError::UnknownStation(name.to_owned()));

        let source = lookup(&self.source)?;
        let destination = lookup(&self.destination)?;

        let count_str = self.count.trim();
        let count: i64 = if count_str.is_empty() {
            i64::from(MIN_PASSENGERS)
        } else {
            count_str.parse()
                .map_err(|_| ValidationError::CountOutOfRange {
                    count: 0,
                    min: MIN_PASSENGERS,
                    max: MAX_PASSENGERS,
                })?
        };

        let journey_type = if self.journey_type.is_empty() {
            JourneyType::Single
        } else {
            JourneyType::try_from(self.journey_type.as_str())?
        };
        let travel_class = if self.travel_class.is_empty() {
            TravelClass::Standard
        } else {
            TravelClass::try_from(self.travel_class.as_str())?
        };

        Ok(JourneyRequest {
            passenger_name: self.passenger_name.clone(),
            source,
            destination,
            count,
            journey_type,
            travel_class,
        })
    }
}
