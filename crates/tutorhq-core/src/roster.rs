//! Admin view over every stored student.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::StudentRecord;

/// Placeholder shown for students who never set a nickname.
pub const NO_NICKNAME: &str = "(no nickname)";

/// One row of the admin roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student_id: String,
    pub nickname: String,
    pub candies: u64,
    pub lessons_done: usize,
    pub last_seen: DateTime<Utc>,
}

impl RosterEntry {
    pub fn from_record(student_id: &str, record: &StudentRecord) -> Self {
        Self {
            student_id: student_id.to_string(),
            nickname: record.display_name().unwrap_or(NO_NICKNAME).to_string(),
            candies: record.candies,
            lessons_done: record.lesson_done.len(),
            last_seen: record.last_seen,
        }
    }
}

/// Build roster rows, most recently active students first.
pub fn build_roster(records: &BTreeMap<String, StudentRecord>) -> Vec<RosterEntry> {
    let mut entries: Vec<RosterEntry> = records
        .iter()
        .map(|(id, record)| RosterEntry::from_record(id, record))
        .collect();
    entries.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
    entries
}

/// Shared-secret gate for the admin view.
pub struct AdminGate {
    code: String,
}

impl AdminGate {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// The trimmed input must be non-empty and match the configured code.
    pub fn verify(&self, input: &str) -> bool {
        let input = input.trim();
        !input.is_empty() && input == self.code
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate").field("code", &"***").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LessonCompletion;
    use chrono::{Duration, TimeZone};

    #[test]
    fn roster_sorted_by_last_seen_desc() {
        let base = Utc.with_ymd_and_hms(2025, 9, 20, 10, 0, 0).unwrap();
        let mut records = BTreeMap::new();
        records.insert(
            "dev_user_001".to_string(),
            StudentRecord {
                nickname: "Masha_9A".into(),
                candies: 52,
                lesson_done: BTreeMap::from([("l1".to_string(), LessonCompletion { ts: base })]),
                last_seen: base - Duration::hours(1),
                ..Default::default()
            },
        );
        records.insert(
            "dev_user_002".to_string(),
            StudentRecord {
                nickname: "   ".into(),
                candies: 38,
                last_seen: base,
                ..Default::default()
            },
        );
        records.insert(
            "dev_user_003".to_string(),
            StudentRecord {
                nickname: "Dasha_8V".into(),
                last_seen: base - Duration::days(2),
                ..Default::default()
            },
        );

        let roster = build_roster(&records);
        let ids: Vec<&str> = roster.iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(ids, vec!["dev_user_002", "dev_user_001", "dev_user_003"]);
        assert_eq!(roster[0].nickname, NO_NICKNAME);
        assert_eq!(roster[1].lessons_done, 1);
        assert_eq!(roster[1].candies, 52);
    }

    #[test]
    fn admin_gate_trims_and_rejects_empty() {
        let gate = AdminGate::new("repetitor2025");
        assert!(gate.verify("repetitor2025"));
        assert!(gate.verify("  repetitor2025\n"));
        assert!(!gate.verify("wrong"));
        assert!(!gate.verify("   "));

        let open = AdminGate::new("");
        assert!(!open.verify(""));
        assert!(!format!("{gate:?}").contains("repetitor"));
    }
}
