use std::collections::BTreeMap;
use std::io::Read;

use chrono::Utc;
use log::{info, warn};

use crate::config::TeamRoster;
use crate::error::Error;
use crate::parser::columns::{validate_columns, ColumnMap};
use crate::parser::deserializers::{
    parse_datetime, parse_f64, parse_month, parse_month_component, parse_pct, parse_year,
};
use crate::parser::types::{field, Dataset, DatasetKind, ParseWarning, Record, Severity, Tier};
use crate::period::{Period, PeriodSpan};

/// Parse a KHELP CSV export from `path` as the given dataset kind.
pub fn parse_csv(path: &str, kind: DatasetKind, roster: &TeamRoster) -> Result<Dataset, Error> {
    let file = std::fs::File::open(path)?;
    parse_csv_reader(std::io::BufReader::new(file), kind, roster)
}

/// Core normalization logic. Accepts any `Read` source, which is also what
/// the tests feed with inline fixtures.
///
/// Whole-dataset failures are missing required columns, an empty file, or
/// I/O; everything else is a per-row warning and the row is dropped.
pub fn parse_csv_reader<R: Read>(
    reader: R,
    kind: DatasetKind,
    roster: &TeamRoster,
) -> Result<Dataset, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers.get(0) == Some("")) {
        return Err(Error::EmptyFile(kind));
    }
    let col_map = ColumnMap::from_headers(&headers);
    validate_columns(kind, &col_map)?;

    let mut records: Vec<Record> = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut rows_read = 0usize;

    for result in rdr.records() {
        rows_read += 1;
        let line = rows_read + 1; // account for the header row
        match result {
            Ok(raw) => match normalize_row(kind, &col_map, &raw, roster) {
                Ok(record) => records.push(record),
                Err(message) => {
                    warn!("{kind} line {line}: {message}");
                    warnings.push(ParseWarning { line, message });
                }
            },
            Err(err) => {
                let message = err.to_string();
                warn!("{kind} line {line}: {message}");
                warnings.push(ParseWarning { line, message });
            }
        }
    }

    if rows_read == 0 {
        return Err(Error::EmptyFile(kind));
    }

    let mut period_range: Option<PeriodSpan> = None;
    for record in &records {
        match period_range.as_mut() {
            Some(span) => span.extend(record.period),
            None => period_range = Some(PeriodSpan::month(record.period)),
        }
    }

    info!(
        "loaded {kind} dataset: {} records, {} dropped",
        records.len(),
        warnings.len()
    );

    Ok(Dataset {
        kind,
        records,
        warnings,
        rows_read,
        loaded_at: Utc::now().naive_utc(),
        period_range,
    })
}

fn normalize_row(
    kind: DatasetKind,
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    roster: &TeamRoster,
) -> Result<Record, String> {
    match kind {
        DatasetKind::AssigneePerformance => normalize_assignee(cols, raw, roster),
        DatasetKind::ContributorPerformance => normalize_contributor(cols, raw, roster),
        DatasetKind::Monthly => normalize_monthly(cols, raw),
        DatasetKind::Engineering => normalize_engineering(cols, raw, roster),
        DatasetKind::Resolution => normalize_resolution(cols, raw, roster),
        DatasetKind::Frt => normalize_frt(cols, raw, roster),
        DatasetKind::Organizations => normalize_organizations(cols, raw),
    }
}

// ─── Cell helpers ────────────────────────────────────────────────────────────

fn cell<'a>(cols: &ColumnMap, raw: &'a csv::StringRecord, name: &str) -> &'a str {
    cols.get(raw, name).unwrap_or("")
}

fn required_text(cols: &ColumnMap, raw: &csv::StringRecord, name: &str) -> Result<String, String> {
    let value = cell(cols, raw, name).trim();
    if value.is_empty() {
        Err(format!("{name} is empty"))
    } else {
        Ok(value.to_string())
    }
}

fn required_f64(cols: &ColumnMap, raw: &csv::StringRecord, name: &str) -> Result<f64, String> {
    let value = cell(cols, raw, name);
    parse_f64(value).ok_or_else(|| format!("{name} is not numeric: {value:?}"))
}

fn required_month(cols: &ColumnMap, raw: &csv::StringRecord, name: &str) -> Result<Period, String> {
    let value = cell(cols, raw, name);
    parse_month(value).ok_or_else(|| format!("{name} is not a valid month: {value:?}"))
}

/// Insert an optional numeric cell if present and parseable. A present but
/// non-numeric cell fails the row; absence is fine.
fn optional_f64(
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    name: &str,
    key: &'static str,
    values: &mut BTreeMap<&'static str, f64>,
) -> Result<(), String> {
    let value = cell(cols, raw, name);
    if value.trim().is_empty() {
        return Ok(());
    }
    match parse_f64(value) {
        Some(v) => {
            values.insert(key, v);
            Ok(())
        }
        None => Err(format!("{name} is not numeric: {value:?}")),
    }
}

fn optional_pct(
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    name: &str,
    key: &'static str,
    values: &mut BTreeMap<&'static str, f64>,
) -> Result<(), String> {
    let value = cell(cols, raw, name);
    if value.trim().is_empty() {
        return Ok(());
    }
    match parse_pct(value) {
        Some(v) => {
            values.insert(key, v);
            Ok(())
        }
        None => Err(format!("{name} is not a percentage: {value:?}")),
    }
}

fn optional_text(cols: &ColumnMap, raw: &csv::StringRecord, name: &str) -> Option<String> {
    let value = cell(cols, raw, name).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ─── Per-kind normalizers ────────────────────────────────────────────────────

fn normalize_assignee(
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    roster: &TeamRoster,
) -> Result<Record, String> {
    let assignee = required_text(cols, raw, "Assignee")?;
    let period = required_month(cols, raw, "Month")?;

    let mut values = BTreeMap::new();
    values.insert(field::TOTAL_RESOLVED, required_f64(cols, raw, "Total_Resolved")?);
    values.insert(
        field::AVG_RESOLUTION_DAYS,
        required_f64(cols, raw, "Avg_Resolution_Days")?,
    );
    optional_pct(cols, raw, "Resolution_Rate_Pct", field::RESOLUTION_RATE, &mut values)?;
    optional_pct(
        cols,
        raw,
        "Engineering_Escalation_Rate_Pct",
        field::ESCALATION_RATE,
        &mut values,
    )?;
    optional_f64(cols, raw, "Avg_FRT_Hours", field::AVG_FRT_HOURS, &mut values)?;

    Ok(Record {
        tier: roster.classify(&assignee),
        entity: Some(assignee),
        organization: None,
        severity: None,
        period,
        values,
    })
}

fn normalize_contributor(
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    roster: &TeamRoster,
) -> Result<Record, String> {
    let contributor = required_text(cols, raw, "Contributor")?;
    let period = required_month(cols, raw, "Month")?;

    let mut values = BTreeMap::new();
    values.insert(
        field::TICKETS_CONTRIBUTED,
        required_f64(cols, raw, "Tickets_Contributed")?,
    );
    optional_f64(cols, raw, "Total_Comments", field::TOTAL_COMMENTS, &mut values)?;
    optional_f64(
        cols,
        raw,
        "Avg_Comments_Per_Ticket",
        field::AVG_COMMENTS_PER_TICKET,
        &mut values,
    )?;
    optional_f64(
        cols,
        raw,
        "Avg_Hold_Time_Hours",
        field::AVG_HOLD_TIME_HOURS,
        &mut values,
    )?;

    Ok(Record {
        tier: roster.classify(&contributor),
        entity: Some(contributor),
        organization: None,
        severity: None,
        period,
        values,
    })
}

fn normalize_monthly(cols: &ColumnMap, raw: &csv::StringRecord) -> Result<Record, String> {
    let year_cell = cell(cols, raw, "Year");
    let year =
        parse_year(year_cell).ok_or_else(|| format!("Year is not a year: {year_cell:?}"))?;
    let month_cell = cell(cols, raw, "Month");
    let month = parse_month_component(month_cell)
        .ok_or_else(|| format!("Month is not a valid month: {month_cell:?}"))?;
    let period = Period::new(year, month).ok_or_else(|| format!("invalid month {month}"))?;

    let mut values = BTreeMap::new();
    values.insert(field::CREATED, required_f64(cols, raw, "Created")?);
    optional_f64(cols, raw, "Resolved", field::RESOLVED, &mut values)?;

    Ok(Record {
        entity: None,
        tier: Tier::Unknown,
        organization: None,
        severity: None,
        period,
        values,
    })
}

fn normalize_engineering(
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    roster: &TeamRoster,
) -> Result<Record, String> {
    let period = required_month(cols, raw, "Month")?;

    let mut values = BTreeMap::new();
    values.insert(field::TOTAL_TICKETS, required_f64(cols, raw, "Total_Tickets")?);
    values.insert(
        field::ENGINEERING_TICKETS,
        required_f64(cols, raw, "Engineering_Tickets")?,
    );

    let entity = optional_text(cols, raw, "Assignee");
    let tier = entity
        .as_deref()
        .map(|name| roster.classify(name))
        .unwrap_or(Tier::Unknown);

    Ok(Record {
        entity,
        tier,
        organization: None,
        severity: None,
        period,
        values,
    })
}

fn normalize_resolution(
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    roster: &TeamRoster,
) -> Result<Record, String> {
    required_text(cols, raw, "Ticket")?;

    let severity_cell = cell(cols, raw, "Severity");
    let severity = Severity::parse(severity_cell)
        .ok_or_else(|| format!("Severity is not recognized: {severity_cell:?}"))?;

    let opened_cell = cell(cols, raw, "Opened");
    let opened = parse_datetime(opened_cell)
        .ok_or_else(|| format!("Opened is not a valid datetime: {opened_cell:?}"))?;

    let mut values = BTreeMap::new();
    // An empty Resolved cell is an open ticket, not a malformed row. It
    // carries no resolution_hours value and lands in open_count instead.
    let resolved_cell = cell(cols, raw, "Resolved");
    if !resolved_cell.trim().is_empty() {
        let resolved = parse_datetime(resolved_cell)
            .ok_or_else(|| format!("Resolved is not a valid datetime: {resolved_cell:?}"))?;
        let minutes = (resolved - opened).num_minutes();
        if minutes < 0 {
            return Err(format!(
                "Resolved {resolved_cell:?} precedes Opened {opened_cell:?}"
            ));
        }
        values.insert(field::RESOLUTION_HOURS, minutes as f64 / 60.0);
    }

    let entity = optional_text(cols, raw, "Assignee");
    let tier = entity
        .as_deref()
        .map(|name| roster.classify(name))
        .unwrap_or(Tier::Unknown);

    Ok(Record {
        entity,
        tier,
        organization: optional_text(cols, raw, "Organization"),
        severity: Some(severity),
        period: Period::from_date(opened.date()),
        values,
    })
}

fn normalize_frt(
    cols: &ColumnMap,
    raw: &csv::StringRecord,
    roster: &TeamRoster,
) -> Result<Record, String> {
    required_text(cols, raw, "Ticket")?;

    let opened_cell = cell(cols, raw, "Opened");
    let opened = parse_datetime(opened_cell)
        .ok_or_else(|| format!("Opened is not a valid datetime: {opened_cell:?}"))?;

    let frt = required_f64(cols, raw, "First_Response_Minutes")?;
    if frt < 0.0 {
        return Err(format!("First_Response_Minutes is negative: {frt}"));
    }

    let mut values = BTreeMap::new();
    values.insert(field::FIRST_RESPONSE_MINUTES, frt);

    let entity = optional_text(cols, raw, "Assignee");
    let tier = entity
        .as_deref()
        .map(|name| roster.classify(name))
        .unwrap_or(Tier::Unknown);

    Ok(Record {
        entity,
        tier,
        organization: optional_text(cols, raw, "Organization"),
        severity: None,
        period: Period::from_date(opened.date()),
        values,
    })
}

fn normalize_organizations(cols: &ColumnMap, raw: &csv::StringRecord) -> Result<Record, String> {
    let organization = required_text(cols, raw, "Organization")?;
    let period = required_month(cols, raw, "Month")?;

    let mut values = BTreeMap::new();
    values.insert(field::TICKETS, required_f64(cols, raw, "Tickets")?);
    optional_f64(
        cols,
        raw,
        "Engineering_Tickets",
        field::ENGINEERING_TICKETS,
        &mut values,
    )?;
    optional_f64(
        cols,
        raw,
        "Avg_Resolution_Days",
        field::AVG_RESOLUTION_DAYS,
        &mut values,
    )?;

    Ok(Record {
        entity: None,
        tier: Tier::Unknown,
        organization: Some(organization),
        severity: None,
        period,
        values,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> TeamRoster {
        TeamRoster::new(
            vec!["Maya Lindqvist".into(), "Tomas Rivera".into()],
            vec!["Andrei Popescu".into()],
        )
    }

    fn parse(kind: DatasetKind, csv: &str) -> Dataset {
        parse_csv_reader(csv.as_bytes(), kind, &roster()).unwrap()
    }

    fn parse_err(kind: DatasetKind, csv: &str) -> Error {
        parse_csv_reader(csv.as_bytes(), kind, &roster()).unwrap_err()
    }

    // ── Assignee performance ────────────────────────────────────────────────

    #[test]
    fn test_assignee_happy_path() {
        let out = parse(
            DatasetKind::AssigneePerformance,
            "Assignee,Month,Total_Resolved,Avg_Resolution_Days,Resolution_Rate_Pct,Engineering_Escalation_Rate_Pct\n\
             Maya Lindqvist,2025-06,42,3.5,91.0,12.5\n\
             Visiting Temp,Jun 2025,7,5.0,80.0,0.0",
        );
        assert_eq!(out.records.len(), 2);
        let maya = &out.records[0];
        assert_eq!(maya.tier, Tier::Level1);
        assert_eq!(maya.period, Period::new(2025, 6).unwrap());
        assert_eq!(maya.value(field::TOTAL_RESOLVED), Some(42.0));
        assert_eq!(maya.value(field::RESOLUTION_RATE), Some(0.91));
        assert_eq!(maya.value(field::ESCALATION_RATE), Some(0.125));
        // Unknown names are kept, tagged Unknown, and month spellings mix.
        let temp = &out.records[1];
        assert_eq!(temp.tier, Tier::Unknown);
        assert_eq!(temp.period, Period::new(2025, 6).unwrap());
    }

    #[test]
    fn test_assignee_roster_match_is_case_insensitive() {
        let out = parse(
            DatasetKind::AssigneePerformance,
            "Assignee,Month,Total_Resolved,Avg_Resolution_Days\nTOMAS RIVERA,2025-01,10,2.0",
        );
        assert_eq!(out.records[0].tier, Tier::Level1);
    }

    #[test]
    fn test_assignee_bad_month_drops_row() {
        let out = parse(
            DatasetKind::AssigneePerformance,
            "Assignee,Month,Total_Resolved,Avg_Resolution_Days\n\
             Maya Lindqvist,not-a-month,10,2.0\n\
             Tomas Rivera,2025-02,11,2.5",
        );
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].line, 2);
        assert_eq!(out.rows_read, 2);
        assert!(out.warnings[0].message.contains("Month"));
    }

    #[test]
    fn test_assignee_non_numeric_count_drops_row() {
        let out = parse(
            DatasetKind::AssigneePerformance,
            "Assignee,Month,Total_Resolved,Avg_Resolution_Days\nMaya Lindqvist,2025-06,many,2.0",
        );
        assert!(out.records.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("Total_Resolved"));
    }

    #[test]
    fn test_missing_required_column_fails_load() {
        let err = parse_err(
            DatasetKind::AssigneePerformance,
            "Assignee,Total_Resolved\nMaya Lindqvist,10",
        );
        match err {
            Error::MissingColumns { kind, columns } => {
                assert_eq!(kind, DatasetKind::AssigneePerformance);
                assert!(columns.contains(&"Month".to_string()));
                assert!(columns.contains(&"Avg_Resolution_Days".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_fails_load() {
        match parse_err(DatasetKind::Monthly, "") {
            Error::EmptyFile(_) | Error::MissingColumns { .. } | Error::Csv(_) => {}
            other => panic!("expected empty-file class error, got {other:?}"),
        }
        match parse_err(DatasetKind::Monthly, "Year,Month,Created\n") {
            Error::EmptyFile(kind) => assert_eq!(kind, DatasetKind::Monthly),
            other => panic!("expected EmptyFile, got {other:?}"),
        }
    }

    // ── Monthly ─────────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_named_and_numeric_months() {
        let out = parse(
            DatasetKind::Monthly,
            "Year,Month,Created,Resolved\n2025,6,120,110\n2025,July,98,\n2024,Jun,140,139",
        );
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].period, Period::new(2025, 6).unwrap());
        assert_eq!(out.records[1].period, Period::new(2025, 7).unwrap());
        assert_eq!(out.records[1].value(field::RESOLVED), None);
        assert_eq!(out.records[2].period, Period::new(2024, 6).unwrap());
        assert_eq!(
            out.period_range,
            Some(PeriodSpan::new(
                Period::new(2024, 6).unwrap(),
                Period::new(2025, 7).unwrap()
            ))
        );
    }

    // ── Engineering ─────────────────────────────────────────────────────────

    #[test]
    fn test_engineering_without_assignee_column() {
        let out = parse(
            DatasetKind::Engineering,
            "Month,Total_Tickets,Engineering_Tickets\n2025-05,200,36",
        );
        let rec = &out.records[0];
        assert_eq!(rec.entity, None);
        assert_eq!(rec.tier, Tier::Unknown);
        assert_eq!(rec.value(field::TOTAL_TICKETS), Some(200.0));
        assert_eq!(rec.value(field::ENGINEERING_TICKETS), Some(36.0));
    }

    // ── Resolution ──────────────────────────────────────────────────────────

    #[test]
    fn test_resolution_open_ticket_has_no_hours() {
        let out = parse(
            DatasetKind::Resolution,
            "Ticket,Severity,Opened,Resolved,Organization\n\
             KH-1,Critical,2025-06-01 09:00,2025-06-01 10:00,Acme\n\
             KH-2,Critical,2025-06-02 09:00,2025-06-02 11:00,Acme\n\
             KH-3,Critical,2025-06-03 09:00,,Acme",
        );
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.records[0].value(field::RESOLUTION_HOURS), Some(1.0));
        assert_eq!(out.records[1].value(field::RESOLUTION_HOURS), Some(2.0));
        assert_eq!(out.records[2].value(field::RESOLUTION_HOURS), None);
        assert_eq!(out.records[2].severity, Some(Severity::Critical));
        assert_eq!(out.records[0].organization.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_resolution_unknown_severity_drops_row() {
        let out = parse(
            DatasetKind::Resolution,
            "Ticket,Severity,Opened\nKH-1,P1,2025-06-01 09:00\nKH-2,minor,2025-06-01 09:30",
        );
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].severity, Some(Severity::Minor));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_resolution_resolved_before_opened_drops_row() {
        let out = parse(
            DatasetKind::Resolution,
            "Ticket,Severity,Opened,Resolved\nKH-1,Major,2025-06-02 09:00,2025-06-01 09:00",
        );
        assert!(out.records.is_empty());
        assert!(out.warnings[0].message.contains("precedes"));
    }

    // ── FRT ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_frt_rows_carry_minutes_and_assignee() {
        let out = parse(
            DatasetKind::Frt,
            "Ticket,Opened,First_Response_Minutes,Assignee\n\
             KH-1,2025-06-01 09:00,45,Maya Lindqvist\n\
             KH-2,2025-06-01 10:00,90,Andrei Popescu",
        );
        assert_eq!(out.records[0].value(field::FIRST_RESPONSE_MINUTES), Some(45.0));
        assert_eq!(out.records[0].tier, Tier::Level1);
        assert_eq!(out.records[1].tier, Tier::Level2);
    }

    #[test]
    fn test_frt_negative_minutes_drops_row() {
        let out = parse(
            DatasetKind::Frt,
            "Ticket,Opened,First_Response_Minutes\nKH-1,2025-06-01 09:00,-5",
        );
        assert!(out.records.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    // ── Organizations ───────────────────────────────────────────────────────

    #[test]
    fn test_organizations_rows() {
        let out = parse(
            DatasetKind::Organizations,
            "Organization,Month,Tickets,Engineering_Tickets\nAcme,2025-06,80,12\nGlobex,2025-06,20,",
        );
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].organization.as_deref(), Some("Acme"));
        assert_eq!(out.records[0].value(field::TICKETS), Some(80.0));
        assert_eq!(out.records[1].value(field::ENGINEERING_TICKETS), None);
    }

    // ── Cross-cutting ───────────────────────────────────────────────────────

    #[test]
    fn test_bom_in_header_is_tolerated() {
        let csv = "\u{FEFF}Year,Month,Created\n2025,6,10";
        let out = parse(DatasetKind::Monthly, csv);
        assert_eq!(out.records.len(), 1);
    }

    #[test]
    fn test_row_count_accounting() {
        let out = parse(
            DatasetKind::Monthly,
            "Year,Month,Created\n2025,6,10\nbad,row,here\n2025,7,12",
        );
        assert_eq!(out.rows_read, 3);
        assert_eq!(out.records.len(), out.rows_read - out.warnings.len());
    }

    #[test]
    fn test_reparse_is_deterministic() {
        let csv = "Ticket,Severity,Opened,Resolved\n\
                   KH-1,Blocker,2025-06-01 09:00,2025-06-03 09:00\n\
                   KH-2,Minor,2025-06-02 12:00,";
        let a = parse(DatasetKind::Resolution, csv);
        let b = parse(DatasetKind::Resolution, csv);
        assert_eq!(a.records, b.records);
        assert_eq!(a.warnings, b.warnings);
    }
}
