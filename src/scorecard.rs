//! Scorecard assembly: grouped, ranked metric tables.
//!
//! Team scorecards aggregate across a tier by unweighted mean: every
//! agent counts equally, whatever their ticket volume. Customer
//! scorecards weight by ticket volume instead; they rank customer
//! impact, not per-agent parity.

use serde::Serialize;

use crate::config::TeamRoster;
use crate::metrics::{stats, GroupKey, MetricName, MetricResult};
use crate::parser::types::Tier;

/// One table cell. `Missing` renders as "no data" downstream and is never
/// collapsed into a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Cell {
    Value(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn from_value(value: Option<f64>) -> Cell {
        match value {
            Some(v) => Cell::Value(v),
            None => Cell::Missing,
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// An immutable ranked metrics table for one tier or the customer list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub title: String,
    pub period_label: String,
    pub columns: Vec<String>,
    pub rows: Vec<ScorecardRow>,
}

/// Distinct metrics in first-seen order; the column plan for a scorecard.
fn column_metrics(results: &[MetricResult]) -> Vec<MetricName> {
    let mut metrics = Vec::new();
    for result in results {
        if !metrics.contains(&result.metric) {
            metrics.push(result.metric);
        }
    }
    metrics
}

fn value_of(results: &[MetricResult], metric: MetricName, key: &GroupKey) -> Option<f64> {
    results
        .iter()
        .find(|r| r.metric == metric)
        .and_then(|r| r.value(key))
}

fn span_label(results: &[MetricResult]) -> String {
    results
        .first()
        .map(|r| r.span.label())
        .unwrap_or_default()
}

/// Rank labels by a metric, highest first, no-data entries last.
/// Ties and the no-data tail stay alphabetical so output is deterministic.
fn rank_by(
    mut labels: Vec<String>,
    results: &[MetricResult],
    metric: MetricName,
    key_of: impl Fn(&str) -> GroupKey,
) -> Vec<String> {
    labels.sort();
    labels.sort_by(|a, b| {
        let va = value_of(results, metric, &key_of(a));
        let vb = value_of(results, metric, &key_of(b));
        match (va, vb) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
    labels
}

/// Build the scorecard for one support tier from entity-grouped results.
///
/// Rows are roster members of the tier that appear in the data, ranked by
/// the tier's lead count metric. Entities with `Tier::Unknown` roster
/// classification never appear here; they still count in global totals.
/// The final row is the tier average, an unweighted mean across entities.
pub fn team_scorecard(
    results: &[MetricResult],
    tier: Tier,
    roster: &TeamRoster,
) -> Scorecard {
    let metrics = column_metrics(results);
    let lead = metrics
        .iter()
        .copied()
        .find(MetricName::is_additive)
        .or_else(|| metrics.first().copied());

    let mut entities: Vec<String> = Vec::new();
    for result in results {
        for key in result.values.keys() {
            if let GroupKey::Entity(name) = key {
                if roster.classify(name) == tier && !entities.contains(name) {
                    entities.push(name.clone());
                }
            }
        }
    }
    if let Some(lead) = lead {
        entities = rank_by(entities, results, lead, |name| {
            GroupKey::Entity(name.to_string())
        });
    } else {
        entities.sort();
    }

    let mut rows: Vec<ScorecardRow> = entities
        .iter()
        .map(|name| {
            let key = GroupKey::Entity(name.clone());
            ScorecardRow {
                label: name.clone(),
                cells: metrics
                    .iter()
                    .map(|&m| Cell::from_value(value_of(results, m, &key)))
                    .collect(),
            }
        })
        .collect();

    // Tier average: each agent weighs the same regardless of volume.
    let average_cells: Vec<Cell> = metrics
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let samples: Vec<f64> = rows
                .iter()
                .filter_map(|row| row.cells[i].as_value())
                .collect();
            Cell::from_value(stats::mean(&samples))
        })
        .collect();
    rows.push(ScorecardRow {
        label: format!("{} average", tier.label()),
        cells: average_cells,
    });

    Scorecard {
        title: format!("{} Scorecard", tier.label()),
        period_label: span_label(results),
        columns: metrics.iter().map(|m| m.label()).collect(),
        rows,
    }
}

/// Build the customer intelligence scorecard from customer-grouped
/// results. Rows are organizations ranked by ticket volume, truncated to
/// `cutoff` when given; the summary row is a ticket-volume-weighted mean
/// computed over every organization, cutoff or not.
pub fn customer_scorecard(results: &[MetricResult], cutoff: Option<usize>) -> Scorecard {
    let metrics = column_metrics(results);

    let mut customers: Vec<String> = Vec::new();
    for result in results {
        for key in result.values.keys() {
            if let GroupKey::Customer(name) = key {
                if !customers.contains(name) {
                    customers.push(name.clone());
                }
            }
        }
    }
    let customers = rank_by(customers, results, MetricName::TicketVolume, |name| {
        GroupKey::Customer(name.to_string())
    });

    let summary_cells: Vec<Cell> = metrics
        .iter()
        .map(|&metric| {
            if metric == MetricName::TicketVolume {
                let total: f64 = customers
                    .iter()
                    .filter_map(|name| {
                        value_of(results, metric, &GroupKey::Customer(name.clone()))
                    })
                    .sum();
                Cell::Value(total)
            } else {
                let pairs: Vec<(f64, f64)> = customers
                    .iter()
                    .filter_map(|name| {
                        let key = GroupKey::Customer(name.clone());
                        let value = value_of(results, metric, &key)?;
                        let weight = value_of(results, MetricName::TicketVolume, &key)?;
                        Some((value, weight))
                    })
                    .collect();
                Cell::from_value(stats::weighted_mean(&pairs))
            }
        })
        .collect();

    let shown: &[String] = match cutoff {
        Some(n) if n < customers.len() => &customers[..n],
        _ => &customers,
    };

    let mut rows: Vec<ScorecardRow> = shown
        .iter()
        .map(|name| {
            let key = GroupKey::Customer(name.clone());
            ScorecardRow {
                label: name.clone(),
                cells: metrics
                    .iter()
                    .map(|&m| Cell::from_value(value_of(results, m, &key)))
                    .collect(),
            }
        })
        .collect();
    rows.push(ScorecardRow {
        label: "All customers (weighted)".to_string(),
        cells: summary_cells,
    });

    Scorecard {
        title: "Top Customers by Volume".to_string(),
        period_label: span_label(results),
        columns: metrics.iter().map(|m| m.label()).collect(),
        rows,
    }
}
