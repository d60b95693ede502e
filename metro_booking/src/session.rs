use std::collections::VecDeque;

use metro_interface::model::IssuedTicket;
use tracing::debug;


pub const DEFAULT_HISTORY_LIMIT: usize = 20;


/// Booking state of one passenger session.
///
/// The most recent booking is the current ticket; older bookings stay in the history until it
/// reaches its limit, after which the oldest ones are evicted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    history: VecDeque<IssuedTicket>,
    history_limit: usize,
}
impl Session {
    pub fn new(history_limit: usize) -> Self {
        let history_limit = history_limit.max(1);
        Self {
            history: VecDeque::with_capacity(history_limit),
            history_limit,
        }
    }

    pub fn current(&self) -> Option<&IssuedTicket> {
        self.history.back()
    }

    /// All tickets still held, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &IssuedTicket> + ExactSizeIterator {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize { self.history.len() }
    pub fn history_limit(&self) -> usize { self.history_limit }

    pub fn find(&self, ticket_id: &str) -> Option<&IssuedTicket> {
        self.history.iter()
            .find(|t| t.ticket.id == ticket_id)
    }

    /// Appends the ticket, evicting the oldest entries beyond the limit, and returns it as the
    /// new current ticket.
    pub fn push(&mut self, issued: IssuedTicket) -> &IssuedTicket {
        while self.history.len() >= self.history_limit {
            if let Some(evicted) = self.history.pop_front() {
                debug!("evicting ticket {} from session history", evicted.ticket.id);
            }
        }
        self.history.push_back(issued);
        &self.history[self.history.len() - 1]
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
