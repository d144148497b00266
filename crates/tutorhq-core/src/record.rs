//! Per-student mutable state.
//!
//! The JSON shape (camelCase keys, millisecond timestamps) is what the
//! storage collaborators persist, so snapshots written by older clients load
//! without migration. Every field falls back to its empty default.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of attempts kept per test, most recent first.
pub const ATTEMPT_HISTORY_LIMIT: usize = 20;

/// One scored run of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    /// Correctly answered questions.
    pub score: u32,
    /// Questions in the run.
    pub max_score: u32,
    /// When the run was finished.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

/// Bounded attempt list: inserts at the front, drops the oldest at the back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Attempt>", into = "Vec<Attempt>")]
pub struct AttemptHistory {
    entries: VecDeque<Attempt>,
}

impl AttemptHistory {
    /// Prepend an attempt, discarding whatever falls past the cap.
    pub fn push_front(&mut self, attempt: Attempt) {
        self.entries.push_front(attempt);
        self.entries.truncate(ATTEMPT_HISTORY_LIMIT);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent attempt.
    pub fn latest(&self) -> Option<&Attempt> {
        self.entries.front()
    }

    /// Attempts, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        self.entries.iter()
    }
}

impl From<Vec<Attempt>> for AttemptHistory {
    fn from(mut attempts: Vec<Attempt>) -> Self {
        attempts.truncate(ATTEMPT_HISTORY_LIMIT);
        Self {
            entries: attempts.into(),
        }
    }
}

impl From<AttemptHistory> for Vec<Attempt> {
    fn from(history: AttemptHistory) -> Self {
        history.entries.into()
    }
}

impl<'a> IntoIterator for &'a AttemptHistory {
    type Item = &'a Attempt;
    type IntoIter = std::collections::vec_deque::Iter<'a, Attempt>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Completion tombstone for a lesson. Presence alone is what counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCompletion {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

/// The mutable unit of state for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentRecord {
    /// Display name chosen by the student.
    pub nickname: String,
    /// Reward currency balance. Only the reward engine increments it.
    pub candies: u64,
    /// Attempt histories keyed by test id.
    pub attempts: BTreeMap<String, AttemptHistory>,
    /// Completion tombstones keyed by lesson id. Append-only.
    pub lesson_done: BTreeMap<String, LessonCompletion>,
    /// Time of the last mutation.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen: DateTime<Utc>,
}

impl Default for StudentRecord {
    fn default() -> Self {
        Self {
            nickname: String::new(),
            candies: 0,
            attempts: BTreeMap::new(),
            lesson_done: BTreeMap::new(),
            last_seen: DateTime::UNIX_EPOCH,
        }
    }
}

impl StudentRecord {
    /// Fresh record for a student seen for the first time at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_seen: now,
            ..Default::default()
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }

    /// Clear progress back to defaults, optionally keeping the nickname.
    pub fn reset(&mut self, keep_nickname: bool, now: DateTime<Utc>) {
        let nickname = if keep_nickname {
            std::mem::take(&mut self.nickname)
        } else {
            String::new()
        };
        *self = Self {
            nickname,
            ..Self::new(now)
        };
    }

    pub fn is_lesson_done(&self, lesson_id: &str) -> bool {
        self.lesson_done.contains_key(lesson_id)
    }

    /// Attempt history for a test, if the student ever took it.
    pub fn history(&self, test_id: &str) -> Option<&AttemptHistory> {
        self.attempts.get(test_id)
    }

    /// Trimmed nickname, or None when the student never set one.
    pub fn display_name(&self) -> Option<&str> {
        let trimmed = self.nickname.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
