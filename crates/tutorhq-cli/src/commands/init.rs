//! The `tutorhq init` command.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use tutorhq_core::engine::record_attempt;
use tutorhq_core::record::{LessonCompletion, StudentRecord};

use super::{resolve_config, Overrides};

pub fn execute(overrides: &Overrides) -> Result<()> {
    let config = resolve_config(overrides)?;

    write_if_missing(Path::new("tutorhq.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("catalog")?;
    write_if_missing(Path::new("catalog/course.toml"), SAMPLE_CATALOG)?;

    // Demo students so the admin roster is not empty.
    let students_dir = config.data_dir.join("students");
    std::fs::create_dir_all(&students_dir)?;
    let mut seeded = 0;
    for (id, record) in demo_students(Utc::now()) {
        let path = students_dir.join(format!("{id}.json"));
        if !path.exists() {
            std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;
            seeded += 1;
        }
    }
    println!("Seeded {seeded} demo student(s) in {}", students_dir.display());

    println!("\nNext steps:");
    println!("  1. Edit catalog/course.toml with your lessons and tests");
    println!("  2. Run: tutorhq validate");
    println!("  3. Run: tutorhq status");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

fn demo_students(now: DateTime<Utc>) -> Vec<(&'static str, StudentRecord)> {
    let day_ago = now - Duration::days(1);

    let mut masha = StudentRecord::new(now - Duration::hours(1));
    masha.nickname = "Masha_9A".into();
    masha.candies = 52;
    record_attempt(&mut masha, "t1", 3, 3, day_ago);
    masha
        .lesson_done
        .insert("l1".into(), LessonCompletion { ts: day_ago });

    let mut kolya = StudentRecord::new(now - Duration::hours(2));
    kolya.nickname = "Kolya_9B".into();
    kolya.candies = 38;
    record_attempt(&mut kolya, "t1", 1, 3, now);

    let mut dasha = StudentRecord::new(now - Duration::days(2));
    dasha.nickname = "Dasha_8V".into();
    dasha.candies = 71;
    record_attempt(&mut dasha, "t2", 2, 2, now);
    dasha
        .lesson_done
        .insert("l1".into(), LessonCompletion { ts: now });

    vec![
        ("dev_user_001", masha),
        ("dev_user_002", kolya),
        ("dev_user_003", dasha),
    ]
}

const SAMPLE_CONFIG: &str = r#"# tutorhq configuration

# Code that unlocks `tutorhq admin`. TUTORHQ_ADMIN_CODE overrides it.
admin_code = "repetitor2025"

catalog = "catalog/course.toml"
data_dir = "./tutorhq-data"

# Uncomment to act as a fixed student instead of this device's id.
# student_id = "dev_user_001"
"#;

const SAMPLE_CATALOG: &str = include_str!("../../../../catalog/course.toml");
