//! Async locks that log their acquisition and release under a fixed identifier, which makes
//! stuck sessions easy to spot in `debug` logs.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::debug;


pub struct Mutex<T: ?Sized> {
    identifier: &'static str,
    inner_mutex: tokio::sync::Mutex<T>,
}
impl<T: ?Sized> Mutex<T> {
    pub fn new(identifier: &'static str, value: T) -> Self
        where T: Sized
    {
        let inner_mutex = tokio::sync::Mutex::new(value);
        Self {
            identifier,
            inner_mutex,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, T> {
        debug!("Mutex: locking {}", self.identifier);
        let inner_guard = self.inner_mutex.lock().await;
        debug!("Mutex: locked {}", self.identifier);
        MutexGuard::new(self.identifier, inner_guard)
    }

    /// Locks the mutex if nobody else holds it right now.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        let inner_guard = self.inner_mutex.try_lock().ok()?;
        debug!("Mutex: try-locked {}", self.identifier);
        Some(MutexGuard::new(self.identifier, inner_guard))
    }
}
impl<T: fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("identifier", &self.identifier)
            .field("inner_mutex", &self.inner_mutex)
            .finish()
    }
}

#[derive(Debug)]
pub struct MutexGuard<'a, T: ?Sized> {
    identifier: &'static str,
    inner_guard: tokio::sync::MutexGuard<'a, T>,
}
impl<'a, T: ?Sized> MutexGuard<'a, T> {
    fn new(identifier: &'static str, inner_guard: tokio::sync::MutexGuard<'a, T>) -> Self {
        Self {
            identifier,
            inner_guard,
        }
    }
}
impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.inner_guard.deref()
    }
}
impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner_guard.deref_mut()
    }
}
impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        debug!("Mutex: unlocking {}", self.identifier);
    }
}
