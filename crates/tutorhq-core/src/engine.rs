//! Lesson unlock and reward rules.
//!
//! Every function takes the student record, the catalog and the current time
//! explicitly. The catalog is only read; the record is the sole mutable state
//! and callers persist it after each mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Catalog, Lesson};
use crate::record::{Attempt, LessonCompletion, StudentRecord};

/// Candies and lessons granted by one reward scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOutcome {
    /// Candies added to the balance.
    pub gained: u64,
    /// Lessons marked done by this scan, in catalog order.
    pub completed: Vec<String>,
}

impl RewardOutcome {
    pub fn is_empty(&self) -> bool {
        self.gained == 0
    }
}

/// Result of one finished quiz run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub test_id: String,
    pub score: u32,
    pub max_score: u32,
    /// Score this run needed to pass.
    pub need: u32,
    /// Whether this run alone met the threshold.
    pub passed: bool,
    pub reward: RewardOutcome,
}

/// Prepend a scored run to the test's history, keeping the 20 most recent.
///
/// The test id is not checked against the catalog: an attempt for an unknown
/// test is stored but can never make anything pass.
pub fn record_attempt(
    record: &mut StudentRecord,
    test_id: &str,
    score: u32,
    max_score: u32,
    now: DateTime<Utc>,
) {
    record
        .attempts
        .entry(test_id.to_string())
        .or_default()
        .push_front(Attempt {
            score,
            max_score,
            ts: now,
        });
}

/// The highest-scoring attempt. Ties go to the earliest entry, which in a
/// most-recent-first history is the newest run.
pub fn best_attempt<'a, I>(attempts: I) -> Option<&'a Attempt>
where
    I: IntoIterator<Item = &'a Attempt>,
{
    attempts.into_iter().fold(None, |best, cur| match best {
        Some(b) if cur.score <= b.score => Some(b),
        _ => Some(cur),
    })
}

/// Whether the student's best attempt meets the test's threshold.
pub fn is_test_passed(record: &StudentRecord, catalog: &Catalog, test_id: &str) -> bool {
    let Some(test) = catalog.test(test_id) else {
        return false;
    };
    let Some(history) = record.history(test_id) else {
        return false;
    };
    best_attempt(history).is_some_and(|best| best.score >= test.required_score())
}

/// Whether a released, graded lesson has all of its required tests passed.
pub fn is_lesson_eligible(
    record: &StudentRecord,
    catalog: &Catalog,
    lesson: &Lesson,
    now: DateTime<Utc>,
) -> bool {
    if !lesson.is_released(now) || !lesson.is_graded() {
        return false;
    }
    lesson
        .required_tests
        .iter()
        .all(|test_id| is_test_passed(record, catalog, test_id))
}

/// Scan every lesson once and grant rewards for newly satisfied ones.
///
/// Completed lessons are tombstoned in `lesson_done` and never granted again.
/// When the scan gains nothing the record is left untouched, so calling this
/// again without a new attempt is a no-op.
pub fn recompute_rewards(
    record: &mut StudentRecord,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> RewardOutcome {
    let mut outcome = RewardOutcome::default();

    for lesson in &catalog.lessons {
        if record.is_lesson_done(&lesson.id) {
            continue;
        }
        if is_lesson_eligible(record, catalog, lesson, now) {
            tracing::debug!(
                lesson = %lesson.id,
                reward = lesson.reward_candies,
                "lesson requirements met"
            );
            outcome.gained += lesson.reward_candies;
            outcome.completed.push(lesson.id.clone());
        }
    }

    if outcome.gained == 0 {
        return RewardOutcome::default();
    }

    for lesson_id in &outcome.completed {
        record
            .lesson_done
            .entry(lesson_id.clone())
            .or_insert(LessonCompletion { ts: now });
    }
    record.candies += outcome.gained;
    tracing::info!(
        gained = outcome.gained,
        lessons = ?outcome.completed,
        candies = record.candies,
        "granted lesson rewards"
    );

    outcome
}

/// Record a finished run and re-scan rewards as one logical update.
pub fn finish_test(
    record: &mut StudentRecord,
    catalog: &Catalog,
    test_id: &str,
    score: u32,
    max_score: u32,
    now: DateTime<Utc>,
) -> TestOutcome {
    record_attempt(record, test_id, score, max_score, now);
    let reward = recompute_rewards(record, catalog, now);

    let need = catalog
        .test(test_id)
        .map(|t| t.required_score())
        .unwrap_or(max_score);

    TestOutcome {
        test_id: test_id.to_string(),
        score,
        max_score,
        need,
        passed: score >= need,
        reward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, Test};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
    }

    fn make_test(id: &str, questions: usize, pass_score: Option<u32>) -> Test {
        Test {
            id: id.into(),
            title: id.into(),
            questions: (0..questions)
                .map(|i| Question {
                    prompt: format!("q{i}"),
                    options: vec!["a".into(), "b".into()],
                    answer_index: 0,
                })
                .collect(),
            pass_score,
        }
    }

    fn make_lesson(id: &str, release_at: DateTime<Utc>, required: &[&str], reward: u64) -> Lesson {
        Lesson {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            release_at,
            required_tests: required.iter().map(|s| s.to_string()).collect(),
            reward_candies: reward,
            links: vec![],
        }
    }

    fn scenario_catalog() -> Catalog {
        Catalog {
            lessons: vec![make_lesson("L1", now() - Duration::days(1), &["T1"], 5)],
            tests: vec![make_test("T1", 2, None)],
            ..Default::default()
        }
    }

    fn attempt(score: u32, secs: i64) -> Attempt {
        Attempt {
            score,
            max_score: 10,
            ts: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn best_attempt_empty_is_none() {
        assert!(best_attempt(&Vec::<Attempt>::new()).is_none());
    }

    #[test]
    fn best_attempt_ties_favor_first_entry() {
        let attempts = vec![attempt(5, 2), attempt(5, 1)];
        let best = best_attempt(&attempts).unwrap();
        assert_eq!(best.score, 5);
        assert_eq!(best.ts.timestamp(), 2);
    }

    #[test]
    fn best_attempt_picks_highest() {
        let attempts = vec![attempt(3, 3), attempt(8, 2), attempt(8, 1), attempt(1, 0)];
        let best = best_attempt(&attempts).unwrap();
        assert_eq!(best.score, 8);
        assert_eq!(best.ts.timestamp(), 2);
    }

    #[test]
    fn pass_threshold_boundary() {
        let catalog = Catalog {
            tests: vec![make_test("T", 10, Some(7))],
            ..Default::default()
        };

        let mut record = StudentRecord::new(now());
        record_attempt(&mut record, "T", 6, 10, now());
        assert!(!is_test_passed(&record, &catalog, "T"));

        record_attempt(&mut record, "T", 7, 10, now());
        assert!(is_test_passed(&record, &catalog, "T"));
    }

    #[test]
    fn unknown_or_unattempted_test_never_passes() {
        let catalog = scenario_catalog();
        let mut record = StudentRecord::new(now());
        assert!(!is_test_passed(&record, &catalog, "T1"));

        record_attempt(&mut record, "ghost", 5, 5, now());
        assert!(!is_test_passed(&record, &catalog, "ghost"));
        assert_eq!(record.history("ghost").unwrap().len(), 1);
    }

    #[test]
    fn bounded_history_after_many_attempts() {
        let mut record = StudentRecord::new(now());
        for score in 0..25u32 {
            record_attempt(&mut record, "T1", score, 30, now() + Duration::seconds(score as i64));
        }
        let scores: Vec<u32> = record.history("T1").unwrap().iter().map(|a| a.score).collect();
        assert_eq!(scores.len(), 20);
        assert_eq!(scores, (5..25).rev().collect::<Vec<_>>());
        for a in record.history("T1").unwrap() {
            assert!(a.score <= a.max_score);
        }
    }

    #[test]
    fn lesson_without_requirements_is_never_eligible() {
        let catalog = Catalog {
            lessons: vec![make_lesson("intro", now() - Duration::days(3), &[], 10)],
            ..Default::default()
        };
        let mut record = StudentRecord::new(now());
        assert!(!is_lesson_eligible(&record, &catalog, &catalog.lessons[0], now()));
        assert!(recompute_rewards(&mut record, &catalog, now()).is_empty());
        assert!(record.lesson_done.is_empty());
    }

    #[test]
    fn lesson_with_missing_test_is_never_eligible() {
        let catalog = Catalog {
            lessons: vec![make_lesson("L", now() - Duration::days(1), &["T1", "nope"], 3)],
            tests: vec![make_test("T1", 1, None)],
            ..Default::default()
        };
        let mut record = StudentRecord::new(now());
        record_attempt(&mut record, "T1", 1, 1, now());
        assert!(!is_lesson_eligible(&record, &catalog, &catalog.lessons[0], now()));
    }

    #[test]
    fn unlock_gating_scenario() {
        let catalog = scenario_catalog();
        let mut record = StudentRecord::new(now());

        record_attempt(&mut record, "T1", 1, 2, now());
        let first = recompute_rewards(&mut record, &catalog, now());
        assert_eq!(first.gained, 0);
        assert!(record.lesson_done.is_empty());
        assert_eq!(record.candies, 0);

        record_attempt(&mut record, "T1", 2, 2, now());
        let second = recompute_rewards(&mut record, &catalog, now());
        assert_eq!(second.gained, 5);
        assert_eq!(second.completed, vec!["L1".to_string()]);
        assert!(record.is_lesson_done("L1"));
        assert_eq!(record.candies, 5);

        let third = recompute_rewards(&mut record, &catalog, now());
        assert_eq!(third.gained, 0);
        assert_eq!(record.candies, 5);
    }

    #[test]
    fn repeated_recompute_is_idempotent() {
        let catalog = scenario_catalog();
        let mut record = StudentRecord::new(now());
        record_attempt(&mut record, "T1", 2, 2, now());
        recompute_rewards(&mut record, &catalog, now());

        let before = record.clone();
        let again = recompute_rewards(&mut record, &catalog, now() + Duration::hours(1));
        assert!(again.is_empty());
        assert_eq!(record, before);
    }

    #[test]
    fn candies_never_decrease() {
        let catalog = scenario_catalog();
        let mut record = StudentRecord::new(now());
        record.candies = 40;
        for score in [0, 1, 2, 0, 2] {
            let before = record.candies;
            record_attempt(&mut record, "T1", score, 2, now());
            recompute_rewards(&mut record, &catalog, now());
            assert!(record.candies >= before);
        }
        assert_eq!(record.candies, 45);
    }

    #[test]
    fn unreleased_lesson_waits_for_release() {
        let release = now() + Duration::days(7);
        let catalog = Catalog {
            lessons: vec![make_lesson("future", release, &["T1"], 9)],
            tests: vec![make_test("T1", 2, None)],
            ..Default::default()
        };
        let mut record = StudentRecord::new(now());
        record_attempt(&mut record, "T1", 2, 2, now());

        assert_eq!(recompute_rewards(&mut record, &catalog, now()).gained, 0);
        assert_eq!(
            recompute_rewards(&mut record, &catalog, release - Duration::seconds(1)).gained,
            0
        );
        assert_eq!(recompute_rewards(&mut record, &catalog, release).gained, 9);
    }

    #[test]
    fn zero_reward_lesson_is_not_tombstoned_alone() {
        let catalog = Catalog {
            lessons: vec![make_lesson("free", now() - Duration::days(1), &["T1"], 0)],
            tests: vec![make_test("T1", 1, None)],
            ..Default::default()
        };
        let mut record = StudentRecord::new(now());
        record_attempt(&mut record, "T1", 1, 1, now());
        let outcome = recompute_rewards(&mut record, &catalog, now());
        assert!(outcome.completed.is_empty());
        assert!(!record.is_lesson_done("free"));
    }

    #[test]
    fn one_scan_grants_several_lessons() {
        let past = now() - Duration::days(1);
        let catalog = Catalog {
            lessons: vec![
                make_lesson("a", past, &["T1"], 2),
                make_lesson("b", past, &["T1", "T2"], 3),
                make_lesson("c", past, &["T2"], 0),
            ],
            tests: vec![make_test("T1", 1, None), make_test("T2", 4, Some(3))],
            ..Default::default()
        };
        let mut record = StudentRecord::new(now());
        record_attempt(&mut record, "T1", 1, 1, now());
        record_attempt(&mut record, "T2", 3, 4, now());

        let outcome = recompute_rewards(&mut record, &catalog, now());
        assert_eq!(outcome.gained, 5);
        assert_eq!(outcome.completed, vec!["a", "b", "c"]);
        assert!(record.is_lesson_done("c"));
        assert_eq!(record.lesson_done["a"].ts, now());
    }

    #[test]
    fn done_tombstone_is_never_regranted() {
        let catalog = scenario_catalog();
        let mut record = StudentRecord::new(now());
        record
            .lesson_done
            .insert("L1".into(), LessonCompletion { ts: now() - Duration::days(2) });
        record_attempt(&mut record, "T1", 2, 2, now());

        assert!(recompute_rewards(&mut record, &catalog, now()).is_empty());
        assert_eq!(record.candies, 0);
        assert_eq!(record.lesson_done["L1"].ts, now() - Duration::days(2));
    }

    #[test]
    fn finish_test_reports_run_and_reward() {
        let catalog = scenario_catalog();
        let mut record = StudentRecord::new(now());

        let failed = finish_test(&mut record, &catalog, "T1", 1, 2, now());
        assert!(!failed.passed);
        assert_eq!(failed.need, 2);
        assert!(failed.reward.is_empty());

        let passed = finish_test(&mut record, &catalog, "T1", 2, 2, now());
        assert!(passed.passed);
        assert_eq!(passed.reward.gained, 5);
        assert_eq!(record.candies, 5);
    }

    #[test]
    fn finish_unknown_test_needs_max_score() {
        let catalog = scenario_catalog();
        let mut record = StudentRecord::new(now());
        let outcome = finish_test(&mut record, &catalog, "bonus", 4, 4, now());
        assert_eq!(outcome.need, 4);
        assert!(outcome.passed);
        assert!(outcome.reward.is_empty());
    }
}
