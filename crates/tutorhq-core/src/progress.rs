//! Publish-scoped progress metrics derived from a student record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{best_attempt, is_test_passed};
use crate::model::{Catalog, Lesson};
use crate::record::{Attempt, StudentRecord};

/// Lessons released at `now`, in catalog order.
pub fn released_lessons(catalog: &Catalog, now: DateTime<Utc>) -> Vec<&Lesson> {
    catalog
        .lessons
        .iter()
        .filter(|l| l.is_released(now))
        .collect()
}

/// Percentage (0..=100) of released lessons the student has completed.
pub fn progress_percent(record: &StudentRecord, catalog: &Catalog, now: DateTime<Utc>) -> u32 {
    let released = released_lessons(catalog, now);
    if released.is_empty() {
        return 0;
    }
    let done = released
        .iter()
        .filter(|l| record.is_lesson_done(&l.id))
        .count();
    (100.0 * done as f64 / released.len() as f64).round() as u32
}

/// Sum of rewards over released lessons.
pub fn total_reward(catalog: &Catalog, now: DateTime<Utc>) -> u64 {
    released_lessons(catalog, now)
        .iter()
        .map(|l| l.reward_candies)
        .sum()
}

/// Display state of one lesson for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    /// Not released yet.
    Locked,
    /// Completion tombstone present.
    Done,
    /// Every required test passed but no tombstone yet.
    Ready,
    /// Released and still missing passes (or ungraded).
    InProgress,
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LessonStatus::Locked => write!(f, "locked"),
            LessonStatus::Done => write!(f, "done"),
            LessonStatus::Ready => write!(f, "ready"),
            LessonStatus::InProgress => write!(f, "in progress"),
        }
    }
}

/// Status of a lesson at `now`.
pub fn lesson_status(
    record: &StudentRecord,
    catalog: &Catalog,
    lesson: &Lesson,
    now: DateTime<Utc>,
) -> LessonStatus {
    if !lesson.is_released(now) {
        LessonStatus::Locked
    } else if record.is_lesson_done(&lesson.id) {
        LessonStatus::Done
    } else if lesson.is_graded()
        && lesson
            .required_tests
            .iter()
            .all(|t| is_test_passed(record, catalog, t))
    {
        LessonStatus::Ready
    } else {
        LessonStatus::InProgress
    }
}

/// Best result and pass state for one catalog test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub test_id: String,
    pub title: String,
    pub best: Option<Attempt>,
    pub need: u32,
    pub passed: bool,
    /// Attempts kept in history.
    pub attempts: usize,
}

/// One summary per catalog test, in catalog order.
pub fn test_summaries(record: &StudentRecord, catalog: &Catalog) -> Vec<TestSummary> {
    catalog
        .tests
        .iter()
        .map(|test| {
            let history = record.history(&test.id);
            let best = history.and_then(|h| best_attempt(h)).copied();
            let need = test.required_score();
            TestSummary {
                test_id: test.id.clone(),
                title: test.title.clone(),
                passed: best.is_some_and(|b| b.score >= need),
                best,
                need,
                attempts: history.map_or(0, |h| h.len()),
            }
        })
        .collect()
}

/// Header metrics for the student dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Lessons released at `now`.
    pub released: usize,
    /// Released lessons the student completed.
    pub released_done: usize,
    /// Completed lessons overall.
    pub done_total: usize,
    /// `released_done / released` as a rounded percentage.
    pub percent: u32,
    /// Candies available across released lessons.
    pub total_reward: u64,
    /// Current balance.
    pub candies: u64,
}

impl ProgressSummary {
    pub fn compute(record: &StudentRecord, catalog: &Catalog, now: DateTime<Utc>) -> Self {
        let released = released_lessons(catalog, now);
        let released_done = released
            .iter()
            .filter(|l| record.is_lesson_done(&l.id))
            .count();
        Self {
            released: released.len(),
            released_done,
            done_total: record.lesson_done.len(),
            percent: progress_percent(record, catalog, now),
            total_reward: total_reward(catalog, now),
            candies: record.candies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{finish_test, record_attempt};
    use crate::model::{Question, Test};
    use crate::record::LessonCompletion;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
    }

    fn lesson(id: &str, days_from_now: i64, required: &[&str], reward: u64) -> Lesson {
        Lesson {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            release_at: now() + Duration::days(days_from_now),
            required_tests: required.iter().map(|s| s.to_string()).collect(),
            reward_candies: reward,
            links: vec![],
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            lessons: vec![
                lesson("l1", -14, &["t1"], 10),
                lesson("l2", -7, &["t2"], 0),
                lesson("l3", -1, &[], 4),
                lesson("l4", 7, &["t1"], 20),
            ],
            tests: vec![
                Test {
                    id: "t1".into(),
                    title: "Check 1".into(),
                    questions: vec![Question {
                        prompt: "?".into(),
                        options: vec!["a".into(), "b".into()],
                        answer_index: 1,
                    }],
                    pass_score: None,
                },
                Test {
                    id: "t2".into(),
                    title: "Check 2".into(),
                    questions: vec![],
                    pass_score: Some(0),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn released_lessons_preserve_order() {
        let catalog = catalog();
        let ids: Vec<&str> = released_lessons(&catalog, now())
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn percent_is_zero_without_released_lessons() {
        let catalog = catalog();
        let record = StudentRecord::new(now());
        assert_eq!(progress_percent(&record, &catalog, now() - Duration::days(30)), 0);
        assert_eq!(total_reward(&catalog, now() - Duration::days(30)), 0);
    }

    #[test]
    fn percent_counts_only_released_lessons() {
        let catalog = catalog();
        let mut record = StudentRecord::new(now());
        record
            .lesson_done
            .insert("l1".into(), LessonCompletion { ts: now() });
        record
            .lesson_done
            .insert("l4".into(), LessonCompletion { ts: now() });

        assert_eq!(progress_percent(&record, &catalog, now()), 33);
        assert_eq!(total_reward(&catalog, now()), 14);

        let summary = ProgressSummary::compute(&record, &catalog, now());
        assert_eq!(summary.released, 3);
        assert_eq!(summary.released_done, 1);
        assert_eq!(summary.done_total, 2);
    }

    #[test]
    fn statuses_follow_release_and_passes() {
        let catalog = catalog();
        let mut record = StudentRecord::new(now());
        let status = |record: &StudentRecord, id: &str| {
            lesson_status(record, &catalog, catalog.lesson(id).unwrap(), now())
        };

        assert_eq!(status(&record, "l4"), LessonStatus::Locked);
        assert_eq!(status(&record, "l1"), LessonStatus::InProgress);
        assert_eq!(status(&record, "l3"), LessonStatus::InProgress);

        finish_test(&mut record, &catalog, "t1", 1, 1, now());
        assert_eq!(status(&record, "l1"), LessonStatus::Done);

        record_attempt(&mut record, "t2", 0, 0, now());
        assert_eq!(status(&record, "l2"), LessonStatus::Ready);
    }

    #[test]
    fn test_summaries_report_best_and_need() {
        let catalog = catalog();
        let mut record = StudentRecord::new(now());
        record_attempt(&mut record, "t1", 0, 1, now());

        let summaries = test_summaries(&record, &catalog);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].best.unwrap().score, 0);
        assert_eq!(summaries[0].need, 1);
        assert!(!summaries[0].passed);
        assert_eq!(summaries[0].attempts, 1);
        assert!(summaries[1].best.is_none());
        assert!(!summaries[1].passed);
    }
}
