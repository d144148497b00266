//! The `tutorhq quiz` command.

use anyhow::{Context, Result};

use tutorhq_core::quiz::QuizRun;

use super::submit::print_outcome;
use super::{open_session, report_unsaved, Overrides};

pub async fn execute(overrides: &Overrides, test_id: String, answers: String) -> Result<()> {
    let session = open_session(overrides).await?;
    let test = session
        .catalog()
        .test(&test_id)
        .with_context(|| format!("unknown test '{test_id}'"))?;

    let picks = parse_answers(&answers)?;
    if picks.len() > test.questions.len() {
        anyhow::bail!(
            "too many answers: '{test_id}' has {} question(s)",
            test.questions.len()
        );
    }

    let mut run = QuizRun::new(test);
    for (step, pick) in picks.into_iter().enumerate() {
        run.go_to(step);
        run.choose(pick);
    }

    let score = run.finish()?;
    let update = session
        .finish_test(&test_id, score.score, score.max_score)
        .await?;
    print_outcome(&update.value);
    report_unsaved(update.saved);
    Ok(())
}

fn parse_answers(raw: &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .with_context(|| format!("invalid answer '{s}', expected an option index"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_indexes() {
        assert_eq!(parse_answers("0, 2,1").unwrap(), vec![0, 2, 1]);
        assert_eq!(parse_answers("").unwrap(), Vec::<usize>::new());
        assert!(parse_answers("0,b").is_err());
    }
}
