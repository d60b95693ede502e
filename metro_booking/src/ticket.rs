use chrono::{DateTime, Local};
use metro_interface::model::{JourneyType, Ticket, TravelClass, TICKET_TIME_FORMAT};
use rand::Rng;

use crate::validation::ValidRequest;


pub const TICKET_ID_LENGTH: usize = 8;
const CURRENCY_LABEL: &str = "Rs.";


/// Returns the first eight hex digits of a fresh 128-bit random token.
pub fn generate_ticket_id() -> String {
    let token: u128 = rand::thread_rng().gen();
    let mut id = format!("{:032X}", token);
    id.truncate(TICKET_ID_LENGTH);
    id
}


pub fn build_ticket(request: &ValidRequest, fare: u64) -> Ticket {
    build_ticket_with(request, fare, generate_ticket_id(), Local::now())
}

pub(crate) fn build_ticket_with(request: &ValidRequest, fare: u64, id: String, issued_at: DateTime<Local>) -> Ticket {
    let text_block = render_text_block(request, fare, &id, &issued_at);
    let voice_text = render_voice_text(request, fare);

    Ticket {
        id,
        passenger_name: request.passenger_name().to_owned(),
        source: request.source().name.clone(),
        destination: request.destination().name.clone(),
        count: request.count(),
        journey_type: request.journey_type(),
        travel_class: request.travel_class(),
        fare,
        issued_at,
        text_block,
        voice_text,
    }
}


fn render_text_block(request: &ValidRequest, fare: u64, id: &str, issued_at: &DateTime<Local>) -> String {
    let lines = [
        "METRO RAIL TICKET".to_owned(),
        format!("ID: {}", id),
        format!("Passenger: {}", request.passenger_name()),
        format!("Route: {} -> {}", request.source().name, request.destination().name),
        format!("Journey: {}", request.journey_type()),
        format!("Class: {}", request.travel_class()),
        format!("Passengers: {}", request.count()),
        format!("Fare: {} {}", CURRENCY_LABEL, fare),
        format!("Issued: {}", issued_at.format(TICKET_TIME_FORMAT)),
    ];
    lines.join("\n")
}

fn render_voice_text(request: &ValidRequest, fare: u64) -> String {
    let passengers = if request.count() == 1 {
        "1 passenger".to_owned()
    } else {
        format!("{} passengers", request.count())
    };
    let journey = match request.journey_type() {
        JourneyType::Single => "single",
        JourneyType::Return => "return",
    };
    let class = match request.travel_class() {
        TravelClass::Standard => "standard",
        TravelClass::Premium => "premium",
    };

    format!(
        "Booking confirmed for {}. {} from {} to {}, {} journey in {} class. Total fare {} rupees.",
        request.passenger_name(), passengers, request.source().name, request.destination().name,
        journey, class, fare,
    )
}
