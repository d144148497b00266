//! Per-student session wiring the engine to a store and a clock.
//!
//! A session owns the in-memory snapshot of one student's record. Each
//! mutation holds the session's write lock from computing the update until
//! its save completes, so recording an attempt and the reward scan that
//! follows it are never interleaved with another update of the same record,
//! and saves reach the store in the order the updates were made. The record
//! mutex itself is only held for synchronous reads and writes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::engine::{self, TestOutcome};
use crate::error::SessionError;
use crate::model::Catalog;
use crate::progress::{self, LessonStatus, ProgressSummary, TestSummary};
use crate::record::StudentRecord;
use crate::traits::{Clock, StudentStore, Subscription};

use tokio::sync::Mutex as WriteLock;

/// A mutation's result together with whether it reached the store.
#[derive(Debug, Clone)]
pub struct Update<T> {
    pub value: T,
    /// False when the store rejected the save; the in-memory record still
    /// reflects the update.
    pub saved: bool,
}

/// The session of one student against one catalog.
pub struct StudentSession {
    catalog: Arc<Catalog>,
    store: Arc<dyn StudentStore>,
    clock: Arc<dyn Clock>,
    student_id: Option<String>,
    record: Mutex<StudentRecord>,
    writes: WriteLock<()>,
}

impl StudentSession {
    /// Open a session: load the student's record and mark them as seen.
    pub async fn open(
        catalog: Arc<Catalog>,
        store: Arc<dyn StudentStore>,
        clock: Arc<dyn Clock>,
        student_id: &str,
    ) -> Result<Self, SessionError> {
        let mut record = store.load(student_id).await?;
        record.touch(clock.now());
        if let Err(e) = store.save(student_id, &record).await {
            tracing::warn!(student = student_id, "failed to save touched record: {e}");
        }
        tracing::debug!(
            student = student_id,
            store = store.name(),
            candies = record.candies,
            "session opened"
        );

        Ok(Self {
            catalog,
            store,
            clock,
            student_id: Some(student_id.to_string()),
            record: Mutex::new(record),
            writes: WriteLock::new(()),
        })
    }

    /// A session with no established student. Reads work on an empty record;
    /// every mutation fails with [`SessionError::NoStudent`].
    pub fn detached(
        catalog: Arc<Catalog>,
        store: Arc<dyn StudentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let record = StudentRecord::new(clock.now());
        Self {
            catalog,
            store,
            clock,
            student_id: None,
            record: Mutex::new(record),
            writes: WriteLock::new(()),
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn lock_record(&self) -> MutexGuard<'_, StudentRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current record.
    pub fn record(&self) -> StudentRecord {
        self.lock_record().clone()
    }

    /// Apply `f` to the record, stamp `last_seen`, then save, all under the
    /// write lock.
    async fn update<T>(
        &self,
        f: impl FnOnce(&mut StudentRecord, &Catalog, chrono::DateTime<chrono::Utc>) -> T,
    ) -> Result<Update<T>, SessionError> {
        let student_id = self.student_id.as_deref().ok_or(SessionError::NoStudent)?;
        let _write = self.writes.lock().await;

        let (value, snapshot) = {
            let mut record = self.lock_record();
            let now = self.clock.now();
            let value = f(&mut record, &self.catalog, now);
            record.touch(now);
            (value, record.clone())
        };

        let saved = match self.store.save(student_id, &snapshot).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(student = student_id, store = self.store.name(), "save failed: {e}");
                false
            }
        };

        Ok(Update { value, saved })
    }

    /// Record a finished quiz run and grant any rewards it unlocks.
    pub async fn finish_test(
        &self,
        test_id: &str,
        score: u32,
        max_score: u32,
    ) -> Result<Update<TestOutcome>, SessionError> {
        self.update(|record, catalog, now| {
            engine::finish_test(record, catalog, test_id, score, max_score, now)
        })
        .await
    }

    pub async fn set_nickname(&self, nickname: &str) -> Result<Update<()>, SessionError> {
        self.update(|record, _, _| record.nickname = nickname.to_string())
            .await
    }

    /// Clear progress. The nickname survives when `keep_nickname` is set.
    pub async fn reset(&self, keep_nickname: bool) -> Result<Update<()>, SessionError> {
        self.update(|record, _, now| record.reset(keep_nickname, now))
            .await
    }

    /// Replace the in-memory record with an externally updated snapshot.
    /// The most recently applied snapshot wins.
    pub fn apply_remote(&self, snapshot: StudentRecord) {
        *self.lock_record() = snapshot;
    }

    /// Subscribe this session to the store's push updates for its student.
    ///
    /// Returns None for detached sessions. The subscription only holds a weak
    /// reference, so it never keeps the session alive.
    pub fn follow_remote(self: &Arc<Self>) -> Option<Subscription> {
        let student_id = self.student_id.as_deref()?;
        let weak: Weak<Self> = Arc::downgrade(self);
        Some(self.store.subscribe(
            student_id,
            Arc::new(move |snapshot: &StudentRecord| {
                if let Some(session) = weak.upgrade() {
                    session.apply_remote(snapshot.clone());
                }
            }),
        ))
    }

    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary::compute(&self.lock_record(), &self.catalog, self.clock.now())
    }

    /// Status of every catalog lesson, in catalog order.
    pub fn lesson_statuses(&self) -> Vec<(String, LessonStatus)> {
        let record = self.lock_record();
        let now = self.clock.now();
        self.catalog
            .lessons
            .iter()
            .map(|l| {
                (
                    l.id.clone(),
                    progress::lesson_status(&record, &self.catalog, l, now),
                )
            })
            .collect()
    }

    pub fn test_summaries(&self) -> Vec<TestSummary> {
        progress::test_summaries(&self.lock_record(), &self.catalog)
    }
}
