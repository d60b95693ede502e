use std::convert::TryFrom;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;


/// Display format of ticket timestamps, e.g. `14:05 | 18-Oct`.
pub const TICKET_TIME_FORMAT: &str = "%H:%M | %d-%b";


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Station {
    pub name: String,
    pub position: Option<u32>,
}
impl Station {
    pub fn new(name: String, position: Option<u32>) -> Self {
        Self {
            name,
            position,
        }
    }
}


/// The closed, ordered set of stations a journey may start or end at.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct StationTable {
    stations: Vec<Station>,
}
impl StationTable {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            stations,
        }
    }

    /// The Hyderabad metro stops served when no other table is configured.
    pub fn hyderabad() -> Self {
        let stations = [
            ("Ameerpet", 1),
            ("Kukatpally", 2),
            ("KPHB", 3),
            ("Nizampet", 4),
            ("Madhapur", 5),
            ("Hitech City", 6),
        ]
            .iter()
            .map(|(name, pos)| Station::new((*name).to_owned(), Some(*pos)))
            .collect();
        Self::new(stations)
    }

    pub fn by_name(&self, name: &str) -> Option<&Station> {
        self.stations.iter()
            .find(|s| s.name == name)
    }

    pub fn stations(&self) -> &[Station] { self.stations.as_slice() }
    pub fn len(&self) -> usize { self.stations.len() }
    pub fn is_empty(&self) -> bool { self.stations.is_empty() }
}


#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum JourneyType {
    Single,
    Return,
}
impl JourneyType {
    pub const ALL: [JourneyType; 2] = [JourneyType::Single, JourneyType::Return];

    pub fn as_str(&self) -> &'static str {
        match self {
            JourneyType::Single => "Single",
            JourneyType::Return => "Return",
        }
    }
}
impl TryFrom<&str> for JourneyType {
    type Error = ValidationError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Single" => Ok(JourneyType::Single),
            "Return" => Ok(JourneyType::Return),
            other => Err(ValidationError::UnknownJourneyType(other.to_owned())),
        }
    }
}
impl fmt::Display for JourneyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum TravelClass {
    Standard,
    Premium,
}
impl TravelClass {
    pub const ALL: [TravelClass; 2] = [TravelClass::Standard, TravelClass::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Standard => "Standard",
            TravelClass::Premium => "Premium",
        }
    }
}
impl TryFrom<&str> for TravelClass {
    type Error = ValidationError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Standard" => Ok(TravelClass::Standard),
            "Premium" => Ok(TravelClass::Premium),
            other => Err(ValidationError::UnknownTravelClass(other.to_owned())),
        }
    }
}
impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


/// A journey as submitted, before validation.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct JourneyRequest {
    pub passenger_name: String,
    pub source: Station,
    pub destination: Station,
    pub count: i64,
    pub journey_type: JourneyType,
    pub travel_class: TravelClass,
}


/// An immutable record of a successful booking.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct Ticket {
    pub id: String,
    pub passenger_name: String,
    pub source: String,
    pub destination: String,
    pub count: u32,
    pub journey_type: JourneyType,
    pub travel_class: TravelClass,
    pub fare: u64,
    pub issued_at: DateTime<Local>,
    pub text_block: String,
    pub voice_text: String,
}
impl Ticket {
    pub fn route(&self) -> String {
        format!("{} -> {}", self.source, self.destination)
    }

    pub fn issued_display(&self) -> String {
        self.issued_at.format(TICKET_TIME_FORMAT).to_string()
    }
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct VoiceClip {
    pub data: Vec<u8>,
    pub mime_type: String,
}
impl VoiceClip {
    pub fn new(data: Vec<u8>, mime_type: String) -> Self {
        Self {
            data,
            mime_type,
        }
    }
}


/// A ticket together with the buffers produced by the image encoder and speech synthesizer.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IssuedTicket {
    pub ticket: Ticket,
    pub qr_png: Vec<u8>,
    pub voice: Option<VoiceClip>,
}
impl IssuedTicket {
    pub fn new(ticket: Ticket, qr_png: Vec<u8>, voice: Option<VoiceClip>) -> Self {
        Self {
            ticket,
            qr_png,
            voice,
        }
    }

    pub fn qr_download(&self) -> Download {
        Download::new(
            self.qr_png.clone(),
            format!("{}.png", self.ticket.id),
            "image/png".to_owned(),
        )
    }

    pub fn text_download(&self) -> Download {
        Download::new(
            self.ticket.text_block.clone().into_bytes(),
            format!("{}.txt", self.ticket.id),
            "text/plain; charset=utf-8".to_owned(),
        )
    }
}


/// A byte buffer offered to the passenger for download.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Download {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}
impl Download {
    pub fn new(
        data: Vec<u8>,
        file_name: String,
        mime_type: String,
    ) -> Self {
        Self {
            data,
            file_name,
            mime_type,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_ticket() -> Ticket {
        Ticket {
            id: "1A2B3C4D".to_owned(),
            passenger_name: "Asha".to_owned(),
            source: "Ameerpet".to_owned(),
            destination: "KPHB".to_owned(),
            count: 2,
            journey_type: JourneyType::Single,
            travel_class: TravelClass::Standard,
            fare: 60,
            issued_at: Local.with_ymd_and_hms(2026, 10, 18, 14, 5, 0).unwrap(),
            text_block: "METRO RAIL TICKET\nID: 1A2B3C4D".to_owned(),
            voice_text: "Booking confirmed for Asha.".to_owned(),
        }
    }

    #[test]
    fn test_station_lookup() {
        let table = StationTable::hyderabad();
        assert_eq!(6, table.len());
        assert_eq!(Some(6), table.by_name("Hitech City").and_then(|s| s.position));
        assert_eq!(Some(1), table.by_name("Ameerpet").and_then(|s| s.position));
        assert!(table.by_name("ameerpet").is_none());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(Ok(JourneyType::Return), JourneyType::try_from("Return"));
        assert_eq!(Ok(TravelClass::Premium), TravelClass::try_from("Premium"));
        assert_eq!(
            Err(ValidationError::UnknownJourneyType("Round".to_owned())),
            JourneyType::try_from("Round"),
        );
        assert_eq!(
            Err(ValidationError::UnknownTravelClass("First".to_owned())),
            TravelClass::try_from("First"),
        );
    }

    #[test]
    fn test_ticket_display() {
        let ticket = sample_ticket();
        assert_eq!("Ameerpet -> KPHB", ticket.route());
        assert_eq!("14:05 | 18-Oct", ticket.issued_display());
    }

    #[test]
    fn test_downloads() {
        let issued = IssuedTicket::new(sample_ticket(), vec![0x89, b'P'], None);

        let qr = issued.qr_download();
        assert_eq!("1A2B3C4D.png", qr.file_name);
        assert_eq!("image/png", qr.mime_type);

        let txt = issued.text_download();
        assert_eq!("1A2B3C4D.txt", txt.file_name);
        assert!(txt.mime_type.starts_with("text/plain"));
        assert_eq!(b"METRO RAIL TICKET\nID: 1A2B3C4D".to_vec(), txt.data);
    }

    #[test]
    fn test_ticket_json() {
        let json = serde_json::to_value(sample_ticket()).unwrap();
        assert_eq!("1A2B3C4D", json["id"]);
        assert_eq!("Single", json["journey_type"]);
        assert_eq!(60, json["fare"]);
    }
}
