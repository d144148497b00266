//! In-memory student store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::StudentRecord;
use crate::traits::{RecordCallback, StudentStore, Subscription};

type SubscriberMap = HashMap<String, Vec<(u64, RecordCallback)>>;

/// A store that keeps every record in process memory.
///
/// Saving a record notifies the subscribers of that student, which is how
/// tests exercise push updates between two sessions of the same student.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, StudentRecord>>,
    subscribers: Arc<Mutex<SubscriberMap>>,
    next_subscriber: AtomicU64,
    save_count: AtomicU32,
    fail_saves: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with records.
    pub fn with_records(records: impl IntoIterator<Item = (String, StudentRecord)>) -> Self {
        let store = Self::default();
        lock(&store.records).extend(records);
        store
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::Relaxed)
    }

    /// Make subsequent saves fail with `StoreError::Unavailable`.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }

    /// Number of live subscriptions for a student.
    pub fn subscriber_count(&self, student_id: &str) -> usize {
        lock(&self.subscribers)
            .get(student_id)
            .map_or(0, |subs| subs.len())
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, student_id: &str) -> Result<StudentRecord, StoreError> {
        Ok(lock(&self.records)
            .get(student_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, student_id: &str, record: &StudentRecord) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store rejected save".into()));
        }
        lock(&self.records).insert(student_id.to_string(), record.clone());
        self.save_count.fetch_add(1, Ordering::Relaxed);

        // Invoke outside the lock so callbacks may subscribe or save.
        let callbacks: Vec<RecordCallback> = lock(&self.subscribers)
            .get(student_id)
            .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();
        for cb in callbacks {
            cb(record);
        }
        Ok(())
    }

    async fn remove(&self, student_id: &str) -> Result<(), StoreError> {
        lock(&self.records).remove(student_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<BTreeMap<String, StudentRecord>, StoreError> {
        Ok(lock(&self.records).clone())
    }

    fn subscribe(&self, student_id: &str, callback: RecordCallback) -> Subscription {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers)
            .entry(student_id.to_string())
            .or_default()
            .push((id, callback));

        let subscribers = Arc::clone(&self.subscribers);
        let student_id = student_id.to_string();
        Subscription::new(move || {
            let mut map = lock(&subscribers);
            if let Some(subs) = map.get_mut(&student_id) {
                subs.retain(|(sub_id, _)| *sub_id != id);
                if subs.is_empty() {
                    map.remove(&student_id);
                }
            }
        })
    }
}
