use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::header::{HeaderMap, COOKIE};
use metro_booking::session::Session;
use metro_interface::sync::{Mutex, MutexGuard};
use rand::Rng;
use tracing::{debug, info};


pub(crate) const SESSION_COOKIE: &str = "metro_session";
const SESSION_ID_LENGTH: usize = 32;


pub(crate) struct SessionState {
    pub session: Session,
    last_seen: Instant,
}


pub(crate) struct SessionSlot {
    state: Mutex<SessionState>,
}
impl SessionSlot {
    fn new(session: Session) -> Self {
        Self {
            state: Mutex::new(
                "SessionSlot::state",
                SessionState {
                    session,
                    last_seen: Instant::now(),
                },
            ),
        }
    }

    /// Waits for exclusive access to the session; a session handles one request at a time.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        let mut guard = self.state.lock().await;
        guard.last_seen = Instant::now();
        guard
    }
}


/// Booking sessions of all connected passengers, keyed by the session cookie.
pub(crate) struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<SessionSlot>>>,
    history_limit: usize,
    idle_timeout: Duration,
}
impl SessionStore {
    pub fn new(history_limit: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new("SessionStore::sessions", HashMap::new()),
            history_limit,
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration { self.idle_timeout }

    pub async fn get(&self, session_id: &str) -> Option<Arc<SessionSlot>> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).cloned()
    }

    /// Returns the session for the given identifier, or starts a new one if there is none. The
    /// flag is `true` if the session is new and the cookie has to be (re)set.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> (String, Arc<SessionSlot>, bool) {
        let mut sessions = self.sessions.lock().await;
        if let Some(id) = session_id {
            if let Some(slot) = sessions.get(id) {
                return (id.to_owned(), Arc::clone(slot), false);
            }
        }

        let mut new_id = generate_session_id();
        while sessions.contains_key(&new_id) {
            new_id = generate_session_id();
        }
        let slot = Arc::new(SessionSlot::new(Session::new(self.history_limit)));
        sessions.insert(new_id.clone(), Arc::clone(&slot));
        debug!("started session; {} active", sessions.len());
        (new_id, slot, true)
    }

    /// Ends sessions that have been idle for longer than the timeout. Sessions that a request is
    /// still holding on to are never idle, even if that request has not locked them yet.
    pub async fn prune(&self) -> usize {
        self.prune_idle_since(Instant::now()).await
    }

    async fn prune_idle_since(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_id, slot| {
            // handed out by get or get_or_create and not dropped yet
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.state.try_lock() {
                None => true,
                Some(state) => now.saturating_duration_since(state.last_seen) <= self.idle_timeout,
            }
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!("ended {} idle sessions; {} remain", pruned, sessions.len());
        }
        pruned
    }
}


fn generate_session_id() -> String {
    let token: u128 = rand::thread_rng().gen();
    format!("{:032x}", token)
}

fn is_session_id(value: &str) -> bool {
    value.len() == SESSION_ID_LENGTH
        && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}


/// Extracts the session identifier from the request's cookies, ignoring malformed values.
pub(crate) fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    for header_value in headers.get_all(COOKIE) {
        let header_str = match header_value.to_str() {
            Ok(s) => s,
            Err(_) => continue,
        };
        for cookie in header_str.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                if name == SESSION_COOKIE && is_session_id(value) {
                    return Some(value.to_owned());
                }
            }
        }
    }
    None
}

pub(crate) fn session_cookie_header(session_id: &str) -> (String, String) {
    (
        "Set-Cookie".to_owned(),
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id),
    )
}


#[cfg(test)]
mod tests {
    use hyper::header::HeaderValue;

    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let id = generate_session_id();
        assert!(is_session_id(&id));

        let mut headers = HeaderMap::new();
        assert_eq!(None, session_id_from_headers(&headers));

        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_str(&format!("a=b; {}={}", SESSION_COOKIE, id)).unwrap());
        assert_eq!(Some(id), session_id_from_headers(&headers));
    }

    #[test]
    fn test_cookie_rejects_malformed_ids() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("metro_session=../../etc/passwd"));
        assert_eq!(None, session_id_from_headers(&headers));

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("metro_session=0123456789ABCDEF0123456789ABCDEF"));
        assert_eq!(None, session_id_from_headers(&headers));
    }

    #[test]
    fn test_set_cookie() {
        let (name, value) = session_cookie_header("00ff");
        assert_eq!("Set-Cookie", name);
        assert!(value.starts_with("metro_session=00ff;"));
        assert!(value.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(5, Duration::from_secs(60));
        let (first_id, first, created) = store.get_or_create(None).await;
        assert!(created);
        let (second_id, second, _) = store.get_or_create(None).await;
        assert_ne!(first_id, second_id);
        assert!(!Arc::ptr_eq(&first, &second));

        let (again_id, again, created) = store.get_or_create(Some(&first_id)).await;
        assert!(!created);
        assert_eq!(first_id, again_id);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(5, again.lock().await.session.history_limit());

        // unknown identifiers get a fresh session
        let (fresh_id, _, created) = store.get_or_create(Some("0123456789abcdef0123456789abcdef")).await;
        assert!(created);
        assert_ne!("0123456789abcdef0123456789abcdef", fresh_id);
    }

    #[tokio::test]
    async fn test_prune_idle_sessions() {
        let store = SessionStore::new(5, Duration::from_secs(60));
        let (idle_id, _, _) = store.get_or_create(None).await;
        let (busy_id, busy, _) = store.get_or_create(None).await;

        let later = Instant::now() + Duration::from_secs(120);
        {
            let _busy_guard = busy.lock().await;
            assert_eq!(1, store.prune_idle_since(later).await);
        }
        assert!(store.get(&idle_id).await.is_none());
        assert!(store.get(&busy_id).await.is_some());

        assert_eq!(0, store.prune().await);
    }

    #[tokio::test]
    async fn test_prune_keeps_sessions_handed_out() {
        let store = SessionStore::new(5, Duration::from_secs(60));
        let (id, _, _) = store.get_or_create(None).await;

        // a request looked the session up but has not locked it yet
        let pending = store.get(&id).await.unwrap();
        let later = Instant::now() + Duration::from_secs(120);
        assert_eq!(0, store.prune_idle_since(later).await);
        assert!(store.get(&id).await.is_some());

        drop(pending);
        assert_eq!(1, store.prune_idle_since(later).await);
        assert!(store.get(&id).await.is_none());
    }
}
