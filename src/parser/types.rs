use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::period::{Period, PeriodSpan};

/// The CSV export kinds this engine understands. Each kind has a fixed
/// column set (see `parser::columns`) and its own normalization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DatasetKind {
    AssigneePerformance,
    ContributorPerformance,
    Monthly,
    Engineering,
    Resolution,
    Frt,
    Organizations,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 7] = [
        DatasetKind::AssigneePerformance,
        DatasetKind::ContributorPerformance,
        DatasetKind::Monthly,
        DatasetKind::Engineering,
        DatasetKind::Resolution,
        DatasetKind::Frt,
        DatasetKind::Organizations,
    ];

    /// The `<kind>` token in the `khelp_<kind>_*.csv` file-name convention.
    pub fn file_token(&self) -> &'static str {
        match self {
            DatasetKind::AssigneePerformance => "assignee_performance",
            DatasetKind::ContributorPerformance => "contributor_performance",
            DatasetKind::Monthly => "monthly",
            DatasetKind::Engineering => "engineering",
            DatasetKind::Resolution => "resolution",
            DatasetKind::Frt => "frt",
            DatasetKind::Organizations => "organizations",
        }
    }

    /// Recognize a dataset kind from an export file name, e.g.
    /// `khelp_resolution_latest.csv` or `khelp_frt_2025-06.csv`.
    pub fn from_file_name(name: &str) -> Option<DatasetKind> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let stem = base.strip_suffix(".csv")?.strip_prefix("khelp_")?;
        // Longest token first so `assignee_performance` is never read as a
        // hypothetical `assignee` kind.
        let mut kinds = DatasetKind::ALL;
        kinds.sort_by_key(|k| std::cmp::Reverse(k.file_token().len()));
        kinds.into_iter().find(|kind| {
            let token = kind.file_token();
            stem == token || stem.starts_with(&format!("{token}_"))
        })
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_token())
    }
}

/// Support-tier classification from the team roster. Names not on the
/// roster are kept but tagged `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    Level1,
    Level2,
    Unknown,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Level1 => "Level 1",
            Tier::Level2 => "Level 2",
            Tier::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ticket severity scale used by the resolution export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Blocker,
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
    ];

    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocker" => Some(Severity::Blocker),
            "critical" => Some(Severity::Critical),
            "major" => Some(Severity::Major),
            "minor" => Some(Severity::Minor),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Blocker => "Blocker",
            Severity::Critical => "Critical",
            Severity::Major => "Major",
            Severity::Minor => "Minor",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Well-known value keys on a normalized `Record`. A key that is absent
/// from `Record::values` means "no data", never zero.
pub mod field {
    pub const CREATED: &str = "created";
    pub const RESOLVED: &str = "resolved";
    pub const TOTAL_RESOLVED: &str = "total_resolved";
    pub const AVG_RESOLUTION_DAYS: &str = "avg_resolution_days";
    pub const RESOLUTION_RATE: &str = "resolution_rate";
    pub const ESCALATION_RATE: &str = "escalation_rate";
    pub const AVG_FRT_HOURS: &str = "avg_frt_hours";
    pub const TICKETS_CONTRIBUTED: &str = "tickets_contributed";
    pub const TOTAL_COMMENTS: &str = "total_comments";
    pub const AVG_COMMENTS_PER_TICKET: &str = "avg_comments_per_ticket";
    pub const AVG_HOLD_TIME_HOURS: &str = "avg_hold_time_hours";
    pub const TOTAL_TICKETS: &str = "total_tickets";
    pub const ENGINEERING_TICKETS: &str = "engineering_tickets";
    pub const RESOLUTION_HOURS: &str = "resolution_hours";
    pub const FIRST_RESPONSE_MINUTES: &str = "first_response_minutes";
    pub const TICKETS: &str = "tickets";
}

/// One row of a normalized dataset. All six (plus organizations) CSV
/// schemas collapse into this shape; calculators only ever see `Record`s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub entity: Option<String>,
    pub tier: Tier,
    pub organization: Option<String>,
    pub severity: Option<Severity>,
    pub period: Period,
    pub values: BTreeMap<&'static str, f64>,
}

impl Record {
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }
}

/// A malformed row that was dropped. Line numbers are 1-based and include
/// the header row, matching what an operator sees in a text editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

/// A fully normalized dataset plus its load metadata. Owned by the
/// `DatasetRegistry` for the duration of one report-generation cycle;
/// calculators borrow it read-only.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub records: Vec<Record>,
    pub warnings: Vec<ParseWarning>,
    /// Data rows read from the file, dropped rows included.
    pub rows_read: usize,
    pub loaded_at: NaiveDateTime,
    /// Min/max period present. `None` when every row was dropped.
    pub period_range: Option<PeriodSpan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(
            DatasetKind::from_file_name("khelp_resolution_latest.csv"),
            Some(DatasetKind::Resolution)
        );
        assert_eq!(
            DatasetKind::from_file_name("khelp_assignee_performance_2025.csv"),
            Some(DatasetKind::AssigneePerformance)
        );
        assert_eq!(
            DatasetKind::from_file_name("exports/khelp_frt_latest.csv"),
            Some(DatasetKind::Frt)
        );
        assert_eq!(DatasetKind::from_file_name("khelp_frt.csv"), Some(DatasetKind::Frt));
    }

    #[test]
    fn test_kind_from_file_name_rejects() {
        assert_eq!(DatasetKind::from_file_name("tickets.csv"), None);
        assert_eq!(DatasetKind::from_file_name("khelp_unknown_latest.csv"), None);
        assert_eq!(DatasetKind::from_file_name("khelp_frt_latest.txt"), None);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("Blocker"), Some(Severity::Blocker));
        assert_eq!(Severity::parse("critical"), Some(Severity::Critical));
        assert_eq!(Severity::parse(" MAJOR "), Some(Severity::Major));
        assert_eq!(Severity::parse("P1"), None);
    }

    #[test]
    fn test_record_value_absent_is_none() {
        let record = Record {
            entity: None,
            tier: Tier::Unknown,
            organization: None,
            severity: None,
            period: Period::new(2025, 1).unwrap(),
            values: BTreeMap::new(),
        };
        assert_eq!(record.value(field::CREATED), None);
    }
}
