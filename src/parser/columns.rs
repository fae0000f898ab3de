use std::collections::HashMap;

use crate::error::Error;
use crate::parser::types::DatasetKind;

/// Expected column set for one dataset kind. Absence of a required column
/// fails the whole load; absence of an optional column is reported back
/// but rows still normalize with that value missing.
#[derive(Debug)]
pub struct ColumnSpec {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

/// Column specifications per dataset kind. Kind-specific behavior is
/// dispatched through this table, not through trait objects.
pub fn spec_for(kind: DatasetKind) -> &'static ColumnSpec {
    match kind {
        DatasetKind::AssigneePerformance => &ColumnSpec {
            required: &["Assignee", "Month", "Total_Resolved", "Avg_Resolution_Days"],
            optional: &[
                "Resolution_Rate_Pct",
                "Engineering_Escalation_Rate_Pct",
                "Avg_FRT_Hours",
            ],
        },
        DatasetKind::ContributorPerformance => &ColumnSpec {
            required: &["Contributor", "Month", "Tickets_Contributed"],
            optional: &[
                "Total_Comments",
                "Avg_Comments_Per_Ticket",
                "Avg_Hold_Time_Hours",
            ],
        },
        DatasetKind::Monthly => &ColumnSpec {
            required: &["Year", "Month", "Created"],
            optional: &["Resolved"],
        },
        DatasetKind::Engineering => &ColumnSpec {
            required: &["Month", "Total_Tickets", "Engineering_Tickets"],
            optional: &["Assignee"],
        },
        DatasetKind::Resolution => &ColumnSpec {
            required: &["Ticket", "Severity", "Opened"],
            optional: &["Resolved", "Assignee", "Organization"],
        },
        DatasetKind::Frt => &ColumnSpec {
            required: &["Ticket", "Opened", "First_Response_Minutes"],
            optional: &["Assignee", "Organization"],
        },
        DatasetKind::Organizations => &ColumnSpec {
            required: &["Organization", "Month", "Tickets"],
            optional: &["Engineering_Tickets", "Avg_Resolution_Days"],
        },
    }
}

/// Maps column names to their index in a CSV record, so field lookup is
/// independent of the column order the exporter happened to use.
pub struct ColumnMap {
    indices: HashMap<String, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    /// Header fields are trimmed; a UTF-8 BOM on the first header is
    /// stripped so `khelp_*` exports from Windows tooling still match.
    pub fn from_headers(headers: &csv::StringRecord) -> ColumnMap {
        let mut indices = HashMap::new();
        let mut header_list = Vec::new();
        for (i, raw) in headers.iter().enumerate() {
            let name = raw.trim_start_matches('\u{FEFF}').trim().to_string();
            indices.insert(name.clone(), i);
            header_list.push(name);
        }
        ColumnMap {
            indices,
            headers: header_list,
        }
    }

    pub fn get<'a>(&self, record: &'a csv::StringRecord, col: &str) -> Option<&'a str> {
        self.indices.get(col).and_then(|&i| record.get(i))
    }

    pub fn has(&self, col: &str) -> bool {
        self.indices.contains_key(col)
    }

    pub fn all_headers(&self) -> &[String] {
        &self.headers
    }
}

/// Result of validating a header row against a kind's `ColumnSpec`.
#[derive(Debug)]
pub struct ColumnValidation {
    pub present: Vec<String>,
    pub missing_optional: Vec<String>,
}

/// Check that every required column for `kind` is present.
pub fn validate_columns(kind: DatasetKind, col_map: &ColumnMap) -> Result<ColumnValidation, Error> {
    let spec = spec_for(kind);

    let missing_required: Vec<String> = spec
        .required
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    if !missing_required.is_empty() {
        return Err(Error::MissingColumns {
            kind,
            columns: missing_required,
        });
    }

    let missing_optional = spec
        .optional
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    Ok(ColumnValidation {
        present: col_map.all_headers().to_vec(),
        missing_optional,
    })
}
