//! The `tutorhq submit` command.

use anyhow::Result;

use tutorhq_core::engine::TestOutcome;

use super::{open_session, report_unsaved, Overrides};

pub async fn execute(
    overrides: &Overrides,
    test_id: String,
    score: u32,
    max_score: Option<u32>,
) -> Result<()> {
    let session = open_session(overrides).await?;

    let max_score = match max_score {
        Some(max) => max,
        None => match session.catalog().test(&test_id) {
            Some(test) => test.questions.len() as u32,
            None => anyhow::bail!("unknown test '{test_id}'; pass --max-score to record it anyway"),
        },
    };
    if score > max_score {
        anyhow::bail!("score {score} exceeds max score {max_score}");
    }

    let update = session.finish_test(&test_id, score, max_score).await?;
    print_outcome(&update.value);
    report_unsaved(update.saved);
    Ok(())
}

/// Print a finished run and any reward it unlocked.
pub fn print_outcome(outcome: &TestOutcome) {
    println!(
        "Test {}: {}/{} ({}, need {})",
        outcome.test_id,
        outcome.score,
        outcome.max_score,
        if outcome.passed { "passed" } else { "not passed" },
        outcome.need
    );
    if !outcome.reward.is_empty() {
        println!(
            "Reward! +{} candies (lessons: {})",
            outcome.reward.gained,
            outcome.reward.completed.join(", ")
        );
    }
}
