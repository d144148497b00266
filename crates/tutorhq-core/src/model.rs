//! Catalog data model types for tutorhq.
//!
//! Lessons, tests and reference resources are static for a deployment: they
//! are loaded once by the catalog loader and only ever read by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text shown to the student.
    pub prompt: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    pub answer_index: usize,
}

/// A fixed set of scored questions with a pass threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    /// Unique identifier referenced by lessons and attempt histories.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Questions in the order they are asked.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Minimum score required to pass (None = every question must be correct).
    #[serde(default)]
    pub pass_score: Option<u32>,
}

impl Test {
    /// The score a single attempt needs to reach for this test to count as passed.
    pub fn required_score(&self) -> u32 {
        self.pass_score.unwrap_or(self.questions.len() as u32)
    }
}

/// A link attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonLink {
    pub title: String,
    pub url: String,
}

/// A catalog item unlocked by a publish date and optionally gated by tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier, used as the key of completion tombstones.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Short description of the lesson content.
    #[serde(default)]
    pub description: String,
    /// Publish time; the lesson is released once `now` reaches it.
    pub release_at: DateTime<Utc>,
    /// Tests that must all be passed for the lesson to complete.
    #[serde(default)]
    pub required_tests: Vec<String>,
    /// Candies granted once when the lesson completes.
    #[serde(default)]
    pub reward_candies: u64,
    /// Lesson material links.
    #[serde(default)]
    pub links: Vec<LessonLink>,
}

impl Lesson {
    /// Whether the lesson is visible at `now`.
    pub fn is_released(&self, now: DateTime<Utc>) -> bool {
        self.release_at <= now
    }

    /// Lessons without required tests are never completed by the engine.
    pub fn is_graded(&self) -> bool {
        !self.required_tests.is_empty()
    }
}

/// Supplementary material or video listed alongside the lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// The immutable course catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Course name shown in headers.
    #[serde(default)]
    pub name: String,
    /// Lessons in publish order.
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    /// Tests referenced by lessons.
    #[serde(default)]
    pub tests: Vec<Test>,
    /// Reading materials.
    #[serde(default)]
    pub materials: Vec<Resource>,
    /// Video lessons.
    #[serde(default)]
    pub videos: Vec<Resource>,
}

impl Catalog {
    /// Look up a test by id.
    pub fn test(&self, id: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Look up a lesson by id.
    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }
}
