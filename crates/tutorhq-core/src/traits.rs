//! Collaborator traits: student storage and the clock.
//!
//! The engine never touches storage or reads the wall clock itself; hosts
//! inject both so that release gating and reward timestamps are reproducible.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;
use crate::record::StudentRecord;

// ---------------------------------------------------------------------------
// Student store trait
// ---------------------------------------------------------------------------

/// Callback invoked with a fresh snapshot when a record changes elsewhere.
pub type RecordCallback = Arc<dyn Fn(&StudentRecord) + Send + Sync>;

/// Trait for backends that persist student records.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    /// Load a record, or an empty default on first contact.
    async fn load(&self, student_id: &str) -> Result<StudentRecord, StoreError>;

    /// Persist a record, replacing whatever was stored.
    async fn save(&self, student_id: &str, record: &StudentRecord) -> Result<(), StoreError>;

    /// Delete a record entirely.
    async fn remove(&self, student_id: &str) -> Result<(), StoreError>;

    /// All stored records keyed by student id, for the admin roster.
    async fn list_all(&self) -> Result<BTreeMap<String, StudentRecord>, StoreError>;

    /// Register for push updates of one record. Backends without push
    /// support return an inert subscription.
    fn subscribe(&self, _student_id: &str, _callback: RecordCallback) -> Subscription {
        Subscription::inert()
    }
}

/// Handle for a push subscription. Dropping it unsubscribes.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A subscription that never delivers anything.
    pub fn inert() -> Self {
        Self { unsubscribe: None }
    }

    /// Stop receiving updates.
    pub fn cancel(mut self) {
        self.run_unsubscribe();
    }

    fn run_unsubscribe(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Clock trait
// ---------------------------------------------------------------------------

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = *guard + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let start = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::days(2));
        assert_eq!(clock.now(), start + Duration::days(2));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn subscription_unsubscribes_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&calls);
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let counter = Arc::clone(&calls);
        {
            let _sub = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        drop(Subscription::inert());
    }
}
