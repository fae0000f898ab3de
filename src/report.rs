//! Report assembly: composes calculator and comparator output into the
//! immutable tables the presentation layer renders.
//!
//! Each report kind declares its prerequisite datasets. A missing
//! prerequisite fails that report with `Error::MissingDataset`; it never
//! takes the other reports down with it.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::compare::{self, pct_change};
use crate::config::AnalyticsConfig;
use crate::error::Error;
use crate::metrics::{
    assignee, contributor, escalation, frt, organizations, resolution, stats, volume, Grouping,
    MetricName, MetricResult,
};
use crate::parser::types::{Dataset, DatasetKind, Severity, Tier};
use crate::registry::DatasetRegistry;
use crate::scorecard::{self, Cell, Scorecard};

/// The five report pages the presentation layer knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportKind {
    ExecutiveSummary,
    TeamScorecard,
    CustomerIntelligence,
    EngineeringAnalysis,
    ResolutionAnalysis,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::ExecutiveSummary,
        ReportKind::TeamScorecard,
        ReportKind::CustomerIntelligence,
        ReportKind::EngineeringAnalysis,
        ReportKind::ResolutionAnalysis,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::ExecutiveSummary => "Executive Summary",
            ReportKind::TeamScorecard => "Team Scorecard",
            ReportKind::CustomerIntelligence => "Customer Intelligence",
            ReportKind::EngineeringAnalysis => "Engineering Analysis",
            ReportKind::ResolutionAnalysis => "Resolution Analysis",
        }
    }

    /// Dataset kinds that must be registered before this report assembles.
    pub fn required(&self) -> &'static [DatasetKind] {
        match self {
            ReportKind::ExecutiveSummary => &[
                DatasetKind::Monthly,
                DatasetKind::Engineering,
                DatasetKind::Resolution,
                DatasetKind::Frt,
            ],
            ReportKind::TeamScorecard => &[
                DatasetKind::AssigneePerformance,
                DatasetKind::ContributorPerformance,
            ],
            ReportKind::CustomerIntelligence => &[DatasetKind::Organizations],
            ReportKind::EngineeringAnalysis => &[DatasetKind::Engineering],
            ReportKind::ResolutionAnalysis => &[DatasetKind::Resolution],
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// A named rows-by-columns section of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl From<Scorecard> for Table {
    fn from(card: Scorecard) -> Table {
        Table {
            title: card.title,
            columns: card.columns,
            rows: card
                .rows
                .into_iter()
                .map(|row| TableRow {
                    label: row.label,
                    cells: row.cells,
                })
                .collect(),
        }
    }
}

/// A fully assembled report: structured tables plus the contributing
/// datasets' row warnings, ready for the in-process handoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub period_label: String,
    pub tables: Vec<Table>,
    pub warnings: Vec<String>,
}

pub struct ReportAssembler<'a> {
    registry: &'a DatasetRegistry,
    config: &'a AnalyticsConfig,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(registry: &'a DatasetRegistry, config: &'a AnalyticsConfig) -> ReportAssembler<'a> {
        ReportAssembler { registry, config }
    }

    pub fn assemble(&self, kind: ReportKind) -> Result<Report, Error> {
        for &dataset in kind.required() {
            if !self.registry.is_loaded(dataset) {
                return Err(Error::MissingDataset {
                    report: kind,
                    dataset,
                });
            }
        }
        debug!("assembling {kind}");
        match kind {
            ReportKind::ExecutiveSummary => self.executive_summary(),
            ReportKind::TeamScorecard => self.team_scorecard(),
            ReportKind::CustomerIntelligence => self.customer_intelligence(),
            ReportKind::EngineeringAnalysis => self.engineering_analysis(),
            ReportKind::ResolutionAnalysis => self.resolution_analysis(),
        }
    }

    /// Assemble every report kind. Reports whose prerequisites are missing
    /// fail individually; the rest still come back.
    pub fn assemble_all(&self) -> Vec<(ReportKind, Result<Report, Error>)> {
        ReportKind::ALL
            .into_iter()
            .map(|kind| (kind, self.assemble(kind)))
            .collect()
    }

    fn warnings_of(&self, kinds: &[DatasetKind]) -> Vec<String> {
        let mut out = Vec::new();
        for &kind in kinds {
            if let Some(dataset) = self.registry.try_get(kind) {
                for warning in &dataset.warnings {
                    out.push(format!("{kind} line {}: {}", warning.line, warning.message));
                }
            }
        }
        out
    }

    fn report(&self, kind: ReportKind, tables: Vec<Table>) -> Report {
        Report {
            kind,
            title: kind.title().to_string(),
            period_label: self
                .registry
                .period_range()
                .map(|span| span.label())
                .unwrap_or_default(),
            tables,
            warnings: self.warnings_of(kind.required()),
        }
    }

    // ── Executive Summary ───────────────────────────────────────────────────

    fn executive_summary(&self) -> Result<Report, Error> {
        let monthly = self.registry.get(DatasetKind::Monthly)?;
        let engineering = self.registry.get(DatasetKind::Engineering)?;
        let resolution_ds = self.registry.get(DatasetKind::Resolution)?;
        let frt_ds = self.registry.get(DatasetKind::Frt)?;

        let volumes = volume::compute(monthly, Grouping::Global);
        let escalations = escalation::compute(engineering, Grouping::Global);
        let resolutions = resolution::compute(resolution_ds, Grouping::Global);
        let frts = frt::compute(frt_ds, Grouping::Global);

        let Some(current_year) = latest_year(&[monthly, engineering, resolution_ds, frt_ds])
        else {
            // Every row of every dataset was dropped; nothing to summarize.
            return Ok(self.report(ReportKind::ExecutiveSummary, Vec::new()));
        };
        let prior_year = current_year - 1;

        let mut kpi_rows = Vec::new();
        kpi_rows.push(yoy_row(
            "Total Tickets",
            yearly_global(&volumes, MetricName::TicketVolume, current_year),
            yearly_global(&volumes, MetricName::TicketVolume, prior_year),
        ));
        kpi_rows.push(yoy_row(
            "Engineering Involvement Rate",
            yearly_global(&escalations, MetricName::EscalationRate, current_year),
            yearly_global(&escalations, MetricName::EscalationRate, prior_year),
        ));
        kpi_rows.push(yoy_row(
            "Avg First Response (hrs)",
            yearly_global(&frts, MetricName::FrtMean, current_year).map(|m| m / 60.0),
            yearly_global(&frts, MetricName::FrtMean, prior_year).map(|m| m / 60.0),
        ));
        kpi_rows.push(yoy_row(
            "Avg Resolution (days)",
            overall_resolution_days(&resolutions, current_year),
            overall_resolution_days(&resolutions, prior_year),
        ));

        let kpi_table = Table {
            title: "Year-over-Year Comparison".to_string(),
            columns: yoy_columns(current_year, prior_year),
            rows: kpi_rows,
        };

        let severity_rows = Severity::ALL
            .iter()
            .map(|&severity| {
                yoy_row(
                    severity.label(),
                    yearly_global(&resolutions, MetricName::ResolutionMean(severity), current_year),
                    yearly_global(&resolutions, MetricName::ResolutionMean(severity), prior_year),
                )
            })
            .collect();
        let severity_table = Table {
            title: "Resolution Time by Severity (hrs)".to_string(),
            columns: yoy_columns(current_year, prior_year),
            rows: severity_rows,
        };

        Ok(self.report(
            ReportKind::ExecutiveSummary,
            vec![kpi_table, severity_table],
        ))
    }

    // ── Team Scorecard ──────────────────────────────────────────────────────

    fn team_scorecard(&self) -> Result<Report, Error> {
        let assignees = self.registry.get(DatasetKind::AssigneePerformance)?;
        let contributors = self.registry.get(DatasetKind::ContributorPerformance)?;

        let level1 = rollup_each(
            &assignee::compute(assignees, Grouping::ByEntity),
            &[
                MetricName::TicketsResolved,
                MetricName::AvgResolutionDays,
                MetricName::ResolutionRate,
                MetricName::EscalationRate,
                MetricName::AvgFrtHours,
            ],
        );
        let level2 = rollup_each(
            &contributor::compute(contributors, Grouping::ByEntity),
            &[
                MetricName::TicketsContributed,
                MetricName::TotalComments,
                MetricName::AvgCommentsPerTicket,
                MetricName::AvgHoldTimeHours,
            ],
        );

        let roster = &self.config.roster;
        Ok(self.report(
            ReportKind::TeamScorecard,
            vec![
                scorecard::team_scorecard(&level1, Tier::Level1, roster).into(),
                scorecard::team_scorecard(&level2, Tier::Level2, roster).into(),
            ],
        ))
    }

    // ── Customer Intelligence ───────────────────────────────────────────────

    fn customer_intelligence(&self) -> Result<Report, Error> {
        let orgs = self.registry.get(DatasetKind::Organizations)?;

        let rolled = rollup_each(
            &organizations::compute(orgs, Grouping::ByCustomer),
            &[
                MetricName::TicketVolume,
                MetricName::EscalationRate,
                MetricName::AvgResolutionDays,
            ],
        );
        let mut tables: Vec<Table> =
            vec![scorecard::customer_scorecard(&rolled, self.config.customer_cutoff).into()];

        // Ticket-level FRT enrichment when that dataset happens to carry
        // organization tags. Optional: its absence is a normal answer.
        if let Some(frt_ds) = self.registry.try_get(DatasetKind::Frt) {
            let frt_by_customer = rollup_each(
                &frt::compute(frt_ds, Grouping::ByCustomer),
                &[MetricName::FrtMean, MetricName::FrtMedian],
            );
            if !frt_by_customer.is_empty() {
                let mut card = scorecard::customer_scorecard(&frt_by_customer, None);
                card.title = "First Response by Customer".to_string();
                tables.push(card.into());
            }
        }

        Ok(self.report(ReportKind::CustomerIntelligence, tables))
    }

    // ── Engineering Analysis ────────────────────────────────────────────────

    fn engineering_analysis(&self) -> Result<Report, Error> {
        let engineering = self.registry.get(DatasetKind::Engineering)?;
        let results = escalation::compute(engineering, Grouping::Global);

        let mut trend_rows = Vec::new();
        for result in results
            .iter()
            .filter(|r| r.metric == MetricName::EscalationRate)
        {
            let period = result.span.start;
            let tickets = compare::find_month(&results, MetricName::TicketVolume, period)
                .and_then(MetricResult::global);
            trend_rows.push(TableRow {
                label: period.label(),
                cells: vec![Cell::from_value(tickets), Cell::from_value(result.global())],
            });
        }
        let trend_table = Table {
            title: "Escalation Rate by Month".to_string(),
            columns: vec!["Tickets".to_string(), "Escalation Rate".to_string()],
            rows: trend_rows,
        };

        let mut tables = vec![trend_table];
        if let Some(latest) = engineering.period_range.map(|span| span.end) {
            let mut delta_rows = Vec::new();
            if let Some(mom) =
                compare::month_over_month(&results, MetricName::EscalationRate, latest)
            {
                delta_rows.push(comparison_row(
                    &format!("vs {}", latest.prev_month().label()),
                    mom.global(),
                ));
            }
            if let Some(yoy) = compare::year_over_year(&results, MetricName::EscalationRate, latest)
            {
                delta_rows.push(comparison_row(
                    &format!("vs {}", latest.prev_year().label()),
                    yoy.global(),
                ));
            }
            if !delta_rows.is_empty() {
                tables.push(Table {
                    title: format!("Escalation Rate Movement ({})", latest.label()),
                    columns: vec![
                        "Current".to_string(),
                        "Prior".to_string(),
                        "Change".to_string(),
                    ],
                    rows: delta_rows,
                });
            }
        }

        Ok(self.report(ReportKind::EngineeringAnalysis, tables))
    }

    // ── Resolution Analysis ─────────────────────────────────────────────────

    fn resolution_analysis(&self) -> Result<Report, Error> {
        let resolution_ds = self.registry.get(DatasetKind::Resolution)?;
        let results = resolution::compute(resolution_ds, Grouping::Global);

        let Some(current_year) = resolution_ds.period_range.map(|span| span.end.year) else {
            return Ok(self.report(ReportKind::ResolutionAnalysis, Vec::new()));
        };
        let prior_year = current_year - 1;

        let breakdown_rows = Severity::ALL
            .iter()
            .map(|&severity| TableRow {
                label: severity.label().to_string(),
                cells: vec![
                    Cell::from_value(yearly_global(
                        &results,
                        MetricName::ResolutionMean(severity),
                        current_year,
                    )),
                    Cell::from_value(yearly_global(
                        &results,
                        MetricName::OpenTickets(severity),
                        current_year,
                    )),
                ],
            })
            .collect();
        let breakdown_table = Table {
            title: format!("Resolution by Severity ({current_year})"),
            columns: vec!["Avg Resolution (hrs)".to_string(), "Open Tickets".to_string()],
            rows: breakdown_rows,
        };

        let yoy_rows = Severity::ALL
            .iter()
            .map(|&severity| {
                yoy_row(
                    severity.label(),
                    yearly_global(&results, MetricName::ResolutionMean(severity), current_year),
                    yearly_global(&results, MetricName::ResolutionMean(severity), prior_year),
                )
            })
            .collect();
        let yoy_table = Table {
            title: "Resolution Time by Severity, Year over Year (hrs)".to_string(),
            columns: yoy_columns(current_year, prior_year),
            rows: yoy_rows,
        };

        Ok(self.report(
            ReportKind::ResolutionAnalysis,
            vec![breakdown_table, yoy_table],
        ))
    }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Roll up each metric in `order` across all months present, keeping only
/// the metrics that actually have data.
fn rollup_each(results: &[MetricResult], order: &[MetricName]) -> Vec<MetricResult> {
    order
        .iter()
        .filter_map(|&metric| compare::rollup_all(results, metric))
        .collect()
}

/// Annual global value for one metric: counts sum over the year's months,
/// means average.
fn yearly_global(results: &[MetricResult], metric: MetricName, year: i32) -> Option<f64> {
    compare::rollup_year(results, metric, year).and_then(|r| r.global())
}

/// The Executive Summary's single resolution figure: an unweighted mean
/// across the severities that have data for the year, converted to days.
fn overall_resolution_days(results: &[MetricResult], year: i32) -> Option<f64> {
    let means: Vec<f64> = Severity::ALL
        .iter()
        .filter_map(|&severity| {
            yearly_global(results, MetricName::ResolutionMean(severity), year)
        })
        .collect();
    stats::mean(&means).map(|hours| hours / 24.0)
}

/// Latest year present across the given datasets.
fn latest_year(datasets: &[&Dataset]) -> Option<i32> {
    datasets
        .iter()
        .filter_map(|ds| ds.period_range.map(|span| span.end.year))
        .max()
}

fn yoy_columns(current_year: i32, prior_year: i32) -> Vec<String> {
    vec![
        prior_year.to_string(),
        current_year.to_string(),
        "Change".to_string(),
        "Trend".to_string(),
    ]
}

/// A `[prior, current, pct change, trend]` row. Every one of this engine's
/// headline metrics is lower-is-better, so a negative move is improvement.
/// An undefined change (no prior, or prior of zero) renders as missing,
/// never as 0%.
fn yoy_row(label: &str, current: Option<f64>, prior: Option<f64>) -> TableRow {
    let change = match (current, prior) {
        (Some(cur), Some(prev)) => pct_change(cur, prev),
        _ => None,
    };
    let trend = match (current, prior) {
        (Some(cur), Some(prev)) => {
            let delta = cur - prev;
            Cell::Text(if delta < 0.0 {
                "improving".to_string()
            } else if delta > 0.0 {
                "worsening".to_string()
            } else {
                "flat".to_string()
            })
        }
        _ => Cell::Missing,
    };
    TableRow {
        label: label.to_string(),
        cells: vec![
            Cell::from_value(prior),
            Cell::from_value(current),
            Cell::from_value(change),
            trend,
        ],
    }
}

fn comparison_row(label: &str, comparison: Option<&crate::compare::Comparison>) -> TableRow {
    match comparison {
        Some(c) => TableRow {
            label: label.to_string(),
            cells: vec![
                Cell::Value(c.current),
                Cell::Value(c.prior),
                Cell::from_value(c.pct_change),
            ],
        },
        None => TableRow {
            label: label.to_string(),
            cells: vec![Cell::Missing, Cell::Missing, Cell::Missing],
        },
    }
}
