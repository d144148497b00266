//! The `tutorhq admin` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use tutorhq_core::roster::build_roster;
use tutorhq_core::traits::StudentStore;

use super::{resolve_config, snapshot_store, Overrides};

pub async fn execute(overrides: &Overrides, code: String, format: String) -> Result<()> {
    let config = resolve_config(overrides)?;
    if !config.admin_gate().verify(&code) {
        anyhow::bail!("invalid admin code");
    }

    let store = snapshot_store(&config);
    let records = store.list_all().await?;
    let roster = build_roster(&records);
    tracing::info!(students = roster.len(), "admin roster loaded");

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&roster)?);
        return Ok(());
    }

    if roster.is_empty() {
        println!("No students yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Student", "Nickname", "Candies", "Lessons done", "Last seen"]);
    for entry in &roster {
        table.add_row(vec![
            Cell::new(&entry.student_id),
            Cell::new(&entry.nickname),
            Cell::new(entry.candies),
            Cell::new(entry.lessons_done),
            Cell::new(entry.last_seen.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("{table}");
    println!("\n{} student(s)", roster.len());

    Ok(())
}
