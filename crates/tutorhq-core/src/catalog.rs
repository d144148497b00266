//! TOML catalog loader.
//!
//! Loads lessons, tests and resources from TOML files and directories, and
//! validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::model::{Catalog, Lesson, LessonLink, Question, Resource, Test};

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    #[serde(default)]
    course: TomlCourseHeader,
    #[serde(default)]
    lessons: Vec<TomlLesson>,
    #[serde(default)]
    tests: Vec<TomlTest>,
    #[serde(default)]
    materials: Vec<Resource>,
    #[serde(default)]
    videos: Vec<Resource>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlCourseHeader {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlLesson {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    release_at: String,
    #[serde(default)]
    required_tests: Vec<String>,
    #[serde(default)]
    reward_candies: i64,
    #[serde(default)]
    links: Vec<LessonLink>,
}

#[derive(Debug, Deserialize)]
struct TomlTest {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pass_score: Option<f64>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    prompt: String,
    options: Vec<String>,
    answer_index: usize,
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let lessons = parsed
        .lessons
        .into_iter()
        .map(|l| {
            let release_at = parse_release_at(&l.release_at).unwrap_or_else(|| {
                tracing::warn!(
                    lesson = %l.id,
                    "unparseable release_at '{}', treating lesson as released",
                    l.release_at
                );
                DateTime::UNIX_EPOCH
            });
            Lesson {
                id: l.id,
                title: l.title,
                description: l.description,
                release_at,
                required_tests: l.required_tests,
                reward_candies: l.reward_candies.max(0) as u64,
                links: l.links,
            }
        })
        .collect();

    let tests = parsed
        .tests
        .into_iter()
        .map(|t| Test {
            id: t.id,
            title: t.title,
            pass_score: t.pass_score.and_then(normalize_pass_score),
            questions: t
                .questions
                .into_iter()
                .map(|q| Question {
                    prompt: q.prompt,
                    options: q.options,
                    answer_index: q.answer_index,
                })
                .collect(),
        })
        .collect();

    Ok(Catalog {
        name: parsed.course.name,
        lessons,
        tests,
        materials: parsed.materials,
        videos: parsed.videos,
    })
}

/// Non-finite thresholds mean "perfect score"; fractional ones round up.
fn normalize_pass_score(raw: f64) -> Option<u32> {
    if !raw.is_finite() {
        return None;
    }
    Some(raw.max(0.0).ceil().min(u32::MAX as f64) as u32)
}

/// Parse a lesson publish time.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC) or a bare
/// date (midnight UTC).
pub fn parse_release_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// Load a catalog from a file, or merge every catalog file under a directory.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.is_dir() {
        return parse_catalog(path);
    }

    let mut merged = Catalog::default();
    for catalog in load_catalog_directory(path)? {
        if merged.name.is_empty() {
            merged.name = catalog.name;
        }
        merged.lessons.extend(catalog.lessons);
        merged.tests.extend(catalog.tests);
        merged.materials.extend(catalog.materials);
        merged.videos.extend(catalog.videos);
    }
    merged.lessons.sort_by_key(|l| l.release_at);
    Ok(merged)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The lesson or test id (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn for_item(id: &str, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a catalog for common authoring mistakes.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_lessons = HashSet::new();
    for lesson in &catalog.lessons {
        if !seen_lessons.insert(&lesson.id) {
            warnings.push(ValidationWarning::for_item(
                &lesson.id,
                format!("duplicate lesson ID: {}", lesson.id),
            ));
        }
    }

    let mut seen_tests = HashSet::new();
    for test in &catalog.tests {
        if !seen_tests.insert(&test.id) {
            warnings.push(ValidationWarning::for_item(
                &test.id,
                format!("duplicate test ID: {}", test.id),
            ));
        }
    }

    for lesson in &catalog.lessons {
        if !lesson.is_graded() {
            warnings.push(ValidationWarning::for_item(
                &lesson.id,
                "no required_tests; the lesson can never be completed automatically",
            ));
        }
        for test_id in &lesson.required_tests {
            if catalog.test(test_id).is_none() {
                warnings.push(ValidationWarning::for_item(
                    &lesson.id,
                    format!("required test '{test_id}' is not in the catalog"),
                ));
            }
        }
    }

    for test in &catalog.tests {
        if test.questions.is_empty() {
            warnings.push(ValidationWarning::for_item(&test.id, "test has no questions"));
        }
        if let Some(pass) = test.pass_score {
            if pass as usize > test.questions.len() {
                warnings.push(ValidationWarning::for_item(
                    &test.id,
                    format!(
                        "pass_score {pass} exceeds the {} question(s); the test can never be passed",
                        test.questions.len()
                    ),
                ));
            }
        }
        for (i, q) in test.questions.iter().enumerate() {
            if q.options.len() < 2 {
                warnings.push(ValidationWarning::for_item(
                    &test.id,
                    format!("question {} has fewer than two options", i + 1),
                ));
            }
            if q.answer_index >= q.options.len() {
                warnings.push(ValidationWarning::for_item(
                    &test.id,
                    format!(
                        "question {} answer_index {} is out of range",
                        i + 1,
                        q.answer_index
                    ),
                ));
            }
        }
    }

    warnings
}
