use askama::Template;
use metro_booking::validation::{JourneyForm, MAX_PASSENGERS, MIN_PASSENGERS};
use metro_interface::model::{IssuedTicket, JourneyType, StationTable, TravelClass};
use serde::{Deserialize, Serialize};


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Template)]
#[template(path = "400.html")]
pub(crate) struct Error400Template {
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Template)]
#[template(path = "404.html")]
pub(crate) struct Error404Template;

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Template)]
#[template(path = "405.html")]
pub(crate) struct Error405Template {
    pub allowed_methods: Vec<String>,
}


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Template)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub passenger_name: String,
    pub sources: Vec<ChoicePart>,
    pub destinations: Vec<ChoicePart>,
    pub journey_types: Vec<ChoicePart>,
    pub travel_classes: Vec<ChoicePart>,
    pub count: String,
    pub min_passengers: u32,
    pub max_passengers: u32,
    pub error: Option<String>,
    pub current: Option<TicketPart>,
    pub history: Vec<TicketPart>,
}
impl IndexTemplate {
    /// Prepares the page, pre-filling the form with what the passenger submitted last.
    pub fn new<'a, H>(stations: &StationTable, form: &JourneyForm, error: Option<String>, current: Option<&IssuedTicket>, history: H) -> Self
        where H: Iterator<Item = &'a IssuedTicket>
    {
        let station_names: Vec<&str> = stations.stations().iter()
            .map(|s| s.name.as_str())
            .collect();

        // pre-select two different stations on a blank form
        let source = if form.source.is_empty() {
            station_names.first().copied().unwrap_or("")
        } else {
            form.source.as_str()
        };
        let destination = if form.destination.is_empty() {
            station_names.get(1).copied().unwrap_or("")
        } else {
            form.destination.as_str()
        };
        let journey_type = if form.journey_type.is_empty() { JourneyType::Single.as_str() } else { form.journey_type.as_str() };
        let travel_class = if form.travel_class.is_empty() { TravelClass::Standard.as_str() } else { form.travel_class.as_str() };

        let count = if form.count.is_empty() {
            MIN_PASSENGERS.to_string()
        } else {
            form.count.clone()
        };

        Self {
            passenger_name: form.passenger_name.clone(),
            sources: ChoicePart::list(station_names.iter().copied(), source),
            destinations: ChoicePart::list(station_names.iter().copied(), destination),
            journey_types: ChoicePart::list(JourneyType::ALL.iter().map(|jt| jt.as_str()), journey_type),
            travel_classes: ChoicePart::list(TravelClass::ALL.iter().map(|tc| tc.as_str()), travel_class),
            count,
            min_passengers: MIN_PASSENGERS,
            max_passengers: MAX_PASSENGERS,
            error,
            current: current.map(TicketPart::from),
            history: history.map(TicketPart::from).collect(),
        }
    }
}


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub(crate) struct ChoicePart {
    pub value: String,
    pub selected: bool,
}
impl ChoicePart {
    fn list<'a, I: Iterator<Item = &'a str>>(values: I, selected: &str) -> Vec<ChoicePart> {
        values
            .map(|value| ChoicePart {
                value: value.to_owned(),
                selected: value == selected,
            })
            .collect()
    }
}


#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub(crate) struct TicketPart {
    pub id: String,
    pub passenger_name: String,
    pub route: String,
    pub count: u32,
    pub journey_type: String,
    pub travel_class: String,
    pub fare: u64,
    pub issued: String,
    pub text_block: String,
    pub has_voice: bool,
}
impl From<&IssuedTicket> for TicketPart {
    fn from(issued: &IssuedTicket) -> Self {
        let ticket = &issued.ticket;
        Self {
            id: ticket.id.clone(),
            passenger_name: ticket.passenger_name.clone(),
            route: ticket.route(),
            count: ticket.count,
            journey_type: ticket.journey_type.to_string(),
            travel_class: ticket.travel_class.to_string(),
            fare: ticket.fare,
            issued: ticket.issued_display(),
            text_block: ticket.text_block.clone(),
            has_voice: issued.voice.is_some(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_form_preselects_distinct_stations() {
        let page = IndexTemplate::new(&StationTable::hyderabad(), &JourneyForm::default(), None, None, std::iter::empty());
        let source: Vec<&str> = page.sources.iter().filter(|c| c.selected).map(|c| c.value.as_str()).collect();
        let destination: Vec<&str> = page.destinations.iter().filter(|c| c.selected).map(|c| c.value.as_str()).collect();
        assert_eq!(vec!["Ameerpet"], source);
        assert_eq!(vec!["Kukatpally"], destination);
        assert_eq!("1", page.count);
        assert!(page.journey_types[0].selected);
        assert!(page.travel_classes[0].selected);
        assert!(page.current.is_none());
    }

    #[test]
    fn test_form_is_echoed() {
        let form = JourneyForm {
            passenger_name: "Asha <3".to_owned(),
            source: "KPHB".to_owned(),
            destination: "KPHB".to_owned(),
            count: "4".to_owned(),
            journey_type: "Return".to_owned(),
            travel_class: "Premium".to_owned(),
        };
        let page = IndexTemplate::new(&StationTable::hyderabad(), &form, Some("Invalid route".to_owned()), None, std::iter::empty());
        assert_eq!("4", page.count);
        assert!(page.journey_types.iter().any(|c| c.selected && c.value == "Return"));
        assert!(page.travel_classes.iter().any(|c| c.selected && c.value == "Premium"));

        let html = page.render().unwrap();
        assert!(html.contains("Invalid route"));
        // user input is escaped
        assert!(html.contains("Asha &#60;3") || html.contains("Asha &lt;3"));
        assert!(!html.contains("Asha <3"));
    }
}
