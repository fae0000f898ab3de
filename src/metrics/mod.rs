//! Metric calculators, one per dataset kind, plus the shared result model.
//!
//! Every calculator is a pure function over a borrowed dataset: identical
//! input always yields identical output, and nothing here mutates a
//! `Dataset`. Results are keyed by `BTreeMap` so iteration order (and
//! therefore everything built downstream) is deterministic.

pub mod assignee;
pub mod contributor;
pub mod escalation;
pub mod frt;
pub mod organizations;
pub mod resolution;
pub mod stats;
pub mod volume;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::parser::types::{Record, Severity, Tier};
use crate::period::{Period, PeriodSpan};

/// Unit attached to a metric's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Unit {
    Count,
    Minutes,
    Hours,
    Days,
    /// A fraction in [0, 1].
    Ratio,
}

/// Every derived metric the engine can produce, with its unit and label
/// fixed at the type level so the comparator and report assembler can
/// align results generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MetricName {
    TicketVolume,
    TicketsResolved,
    AvgResolutionDays,
    ResolutionRate,
    EscalationRate,
    AvgFrtHours,
    TicketsContributed,
    TotalComments,
    AvgCommentsPerTicket,
    AvgHoldTimeHours,
    FrtMean,
    FrtMedian,
    ResolutionMean(Severity),
    OpenTickets(Severity),
}

impl MetricName {
    pub fn unit(&self) -> Unit {
        match self {
            MetricName::TicketVolume
            | MetricName::TicketsResolved
            | MetricName::TicketsContributed
            | MetricName::TotalComments
            | MetricName::AvgCommentsPerTicket
            | MetricName::OpenTickets(_) => Unit::Count,
            MetricName::AvgResolutionDays => Unit::Days,
            MetricName::ResolutionRate | MetricName::EscalationRate => Unit::Ratio,
            MetricName::AvgFrtHours | MetricName::AvgHoldTimeHours => Unit::Hours,
            MetricName::FrtMean | MetricName::FrtMedian => Unit::Minutes,
            MetricName::ResolutionMean(_) => Unit::Hours,
        }
    }

    /// Count-like metrics sum when aggregated over periods or entities;
    /// everything else averages.
    pub fn is_additive(&self) -> bool {
        matches!(
            self,
            MetricName::TicketVolume
                | MetricName::TicketsResolved
                | MetricName::TicketsContributed
                | MetricName::TotalComments
                | MetricName::OpenTickets(_)
        )
    }

    pub fn label(&self) -> String {
        match self {
            MetricName::TicketVolume => "Tickets".to_string(),
            MetricName::TicketsResolved => "Tickets Resolved".to_string(),
            MetricName::AvgResolutionDays => "Avg Resolution (days)".to_string(),
            MetricName::ResolutionRate => "Resolution Rate".to_string(),
            MetricName::EscalationRate => "Engineering Escalation Rate".to_string(),
            MetricName::AvgFrtHours => "Avg FRT (hrs)".to_string(),
            MetricName::TicketsContributed => "Tickets Contributed".to_string(),
            MetricName::TotalComments => "Total Comments".to_string(),
            MetricName::AvgCommentsPerTicket => "Avg Comments/Ticket".to_string(),
            MetricName::AvgHoldTimeHours => "Avg Hold Time (hrs)".to_string(),
            MetricName::FrtMean => "Avg First Response (min)".to_string(),
            MetricName::FrtMedian => "Median First Response (min)".to_string(),
            MetricName::ResolutionMean(sev) => format!("Avg Resolution (hrs, {sev})"),
            MetricName::OpenTickets(sev) => format!("Open Tickets ({sev})"),
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// How records are grouped before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grouping {
    Global,
    ByEntity,
    ByTier,
    ByCustomer,
}

/// One key in a `MetricResult`'s value table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GroupKey {
    Global,
    Entity(String),
    Tier(Tier),
    Customer(String),
}

impl GroupKey {
    pub fn label(&self) -> String {
        match self {
            GroupKey::Global => "All".to_string(),
            GroupKey::Entity(name) => name.clone(),
            GroupKey::Tier(tier) => tier.label().to_string(),
            GroupKey::Customer(name) => name.clone(),
        }
    }
}

/// Output of a metric calculator: one metric over one period span, with a
/// value per group key. A key that is absent has no data for that span,
/// which is distinct from a present zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub metric: MetricName,
    pub unit: Unit,
    pub grouping: Grouping,
    pub span: PeriodSpan,
    pub values: BTreeMap<GroupKey, f64>,
}

impl MetricResult {
    pub fn new(metric: MetricName, grouping: Grouping, span: PeriodSpan) -> MetricResult {
        MetricResult {
            metric,
            unit: metric.unit(),
            grouping,
            span,
            values: BTreeMap::new(),
        }
    }

    pub fn value(&self, key: &GroupKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn global(&self) -> Option<f64> {
        self.value(&GroupKey::Global)
    }
}

/// The group key a record contributes to under `grouping`, or None when
/// the record cannot be grouped that way (no assignee, no organization).
pub(crate) fn group_key(record: &Record, grouping: Grouping) -> Option<GroupKey> {
    match grouping {
        Grouping::Global => Some(GroupKey::Global),
        Grouping::ByEntity => record.entity.clone().map(GroupKey::Entity),
        Grouping::ByTier => Some(GroupKey::Tier(record.tier)),
        Grouping::ByCustomer => record.organization.clone().map(GroupKey::Customer),
    }
}

/// Sample table: every observed value for a field, bucketed by period and
/// group key. The building block all calculators share.
pub(crate) type Samples = BTreeMap<(Period, GroupKey), Vec<f64>>;

pub(crate) fn collect_samples<F>(records: &[Record], grouping: Grouping, extract: F) -> Samples
where
    F: Fn(&Record) -> Option<f64>,
{
    let mut samples: Samples = BTreeMap::new();
    for record in records {
        let Some(key) = group_key(record, grouping) else {
            continue;
        };
        if let Some(value) = extract(record) {
            samples.entry((record.period, key)).or_default().push(value);
        }
    }
    samples
}

/// Fold a sample table into per-month results, summing for additive
/// metrics and averaging otherwise.
pub(crate) fn finish(metric: MetricName, grouping: Grouping, samples: &Samples) -> Vec<MetricResult> {
    finish_with(metric, grouping, samples, |values| {
        if metric.is_additive() {
            Some(values.iter().sum())
        } else {
            stats::mean(values)
        }
    })
}

/// Like `finish`, but with a caller-supplied reducer (medians, rates).
pub(crate) fn finish_with<F>(
    metric: MetricName,
    grouping: Grouping,
    samples: &Samples,
    reduce: F,
) -> Vec<MetricResult>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut by_period: BTreeMap<Period, MetricResult> = BTreeMap::new();
    for ((period, key), values) in samples {
        let Some(value) = reduce(values) else {
            continue;
        };
        by_period
            .entry(*period)
            .or_insert_with(|| MetricResult::new(metric, grouping, PeriodSpan::month(*period)))
            .values
            .insert(key.clone(), value);
    }
    by_period.into_values().collect()
}

/// Per-bucket ratio of sums, e.g. escalated over total tickets. A bucket
/// is left out entirely when its denominator sums to zero (a rate over
/// zero tickets is undefined, not 0%) or when it has no numerator samples
/// at all (no data is not the same as zero escalations).
pub(crate) fn rate_of_sums(
    metric: MetricName,
    grouping: Grouping,
    numerator: &Samples,
    denominator: &Samples,
) -> Vec<MetricResult> {
    let mut by_period: BTreeMap<Period, MetricResult> = BTreeMap::new();
    for ((period, key), denom_values) in denominator {
        let denom: f64 = denom_values.iter().sum();
        if denom == 0.0 {
            continue;
        }
        let Some(numer_values) = numerator.get(&(*period, key.clone())) else {
            continue;
        };
        let numer: f64 = numer_values.iter().sum();
        by_period
            .entry(*period)
            .or_insert_with(|| MetricResult::new(metric, grouping, PeriodSpan::month(*period)))
            .values
            .insert(key.clone(), numer / denom);
    }
    by_period.into_values().collect()
}
