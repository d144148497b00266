//! The `tutorhq status` command.

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use tutorhq_core::progress::{LessonStatus, ProgressSummary, TestSummary};
use tutorhq_core::roster::NO_NICKNAME;

use super::{open_session, Overrides};

#[derive(Serialize)]
struct StatusReport {
    student_id: String,
    nickname: String,
    progress: ProgressSummary,
    lessons: Vec<LessonRow>,
    tests: Vec<TestSummary>,
}

#[derive(Serialize)]
struct LessonRow {
    id: String,
    status: LessonStatus,
}

pub async fn execute(overrides: &Overrides, format: String) -> Result<()> {
    let session = open_session(overrides).await?;
    let record = session.record();
    let progress = session.progress();
    let statuses = session.lesson_statuses();
    let tests = session.test_summaries();
    let student_id = session.student_id().unwrap_or_default().to_string();

    if format == "json" {
        let report = StatusReport {
            student_id,
            nickname: record.nickname.clone(),
            progress,
            lessons: statuses
                .into_iter()
                .map(|(id, status)| LessonRow { id, status })
                .collect(),
            tests,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Student: {} ({student_id})",
        record.display_name().unwrap_or(NO_NICKNAME)
    );

    let catalog = session.catalog();
    let mut lessons = Table::new();
    lessons.set_header(vec!["Lesson", "Title", "Release", "Status", "Reward", "Requires"]);
    for (lesson, (_, status)) in catalog.lessons.iter().zip(&statuses) {
        let requires = if lesson.required_tests.is_empty() {
            "-".to_string()
        } else {
            lesson.required_tests.join(", ")
        };
        lessons.add_row(vec![
            Cell::new(&lesson.id),
            Cell::new(&lesson.title),
            Cell::new(lesson.release_at.format("%Y-%m-%d %H:%M")),
            Cell::new(status),
            Cell::new(lesson.reward_candies),
            Cell::new(requires),
        ]);
    }
    println!("\n{lessons}");

    let mut table = Table::new();
    table.set_header(vec!["Test", "Title", "Best", "Need", "Passed", "Attempts"]);
    for t in &tests {
        let best = t
            .best
            .map(|a| format!("{}/{}", a.score, a.max_score))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&t.test_id),
            Cell::new(&t.title),
            Cell::new(best),
            Cell::new(t.need),
            Cell::new(if t.passed { "yes" } else { "no" }),
            Cell::new(t.attempts),
        ]);
    }
    println!("\n{table}");

    println!(
        "\nProgress: {}/{} released lessons done ({}%)",
        progress.released_done, progress.released, progress.percent
    );
    println!(
        "Candies: {} (released lessons are worth {})",
        progress.candies, progress.total_reward
    );

    Ok(())
}
