//! Period-over-period comparison of metric results.
//!
//! Two rules from the record model carry through everything here. A group
//! key missing from either side is omitted from the comparison, because
//! zero-filling would misrepresent "no data" as "zero tickets". And
//! `pct_change` is `None` whenever the prior value is zero; callers must
//! render that distinctly from 0%.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::{GroupKey, Grouping, MetricName, MetricResult, Unit};
use crate::period::{Period, PeriodSpan};

/// One group key's current/prior pairing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub current: f64,
    pub prior: f64,
    pub delta: f64,
    /// `(current - prior) / |prior|`, or `None` when `prior == 0`.
    pub pct_change: Option<f64>,
}

/// A metric compared across two period spans, per group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub metric: MetricName,
    pub unit: Unit,
    pub grouping: Grouping,
    pub current_span: PeriodSpan,
    pub prior_span: PeriodSpan,
    pub entries: BTreeMap<GroupKey, Comparison>,
}

impl ComparisonResult {
    pub fn entry(&self, key: &GroupKey) -> Option<&Comparison> {
        self.entries.get(key)
    }

    pub fn global(&self) -> Option<&Comparison> {
        self.entry(&GroupKey::Global)
    }
}

pub fn pct_change(current: f64, prior: f64) -> Option<f64> {
    if prior == 0.0 {
        None
    } else {
        Some((current - prior) / prior.abs())
    }
}

/// Pair two results of the same metric and grouping. Keys present on only
/// one side are dropped from the output.
pub fn compare(current: &MetricResult, prior: &MetricResult) -> ComparisonResult {
    debug_assert_eq!(current.metric, prior.metric);
    debug_assert_eq!(current.grouping, prior.grouping);

    let mut entries = BTreeMap::new();
    for (key, &cur) in &current.values {
        let Some(&prev) = prior.values.get(key) else {
            continue;
        };
        entries.insert(
            key.clone(),
            Comparison {
                current: cur,
                prior: prev,
                delta: cur - prev,
                pct_change: pct_change(cur, prev),
            },
        );
    }

    ComparisonResult {
        metric: current.metric,
        unit: current.unit,
        grouping: current.grouping,
        current_span: current.span,
        prior_span: prior.span,
        entries,
    }
}

/// Find the result for `metric` covering exactly the month `period`.
pub fn find_month<'a>(
    results: &'a [MetricResult],
    metric: MetricName,
    period: Period,
) -> Option<&'a MetricResult> {
    results
        .iter()
        .find(|r| r.metric == metric && r.span == PeriodSpan::month(period))
}

/// Align `period` with the same calendar month one year earlier.
/// `None` when either month has no result for the metric.
pub fn year_over_year(
    results: &[MetricResult],
    metric: MetricName,
    period: Period,
) -> Option<ComparisonResult> {
    let current = find_month(results, metric, period)?;
    let prior = find_month(results, metric, period.prev_year())?;
    Some(compare(current, prior))
}

/// Align `period` with the immediately preceding month.
pub fn month_over_month(
    results: &[MetricResult],
    metric: MetricName,
    period: Period,
) -> Option<ComparisonResult> {
    let current = find_month(results, metric, period)?;
    let prior = find_month(results, metric, period.prev_month())?;
    Some(compare(current, prior))
}

/// Fold every single-month result for `metric` whose month falls in `year`
/// into one result spanning the months actually present: counts sum,
/// everything else is an unweighted mean of the monthly values. `None`
/// when the year has no data at all.
pub fn rollup_year(
    results: &[MetricResult],
    metric: MetricName,
    year: i32,
) -> Option<MetricResult> {
    rollup(results.iter().filter(|r| {
        r.metric == metric && r.span.is_single_month() && r.span.start.year == year
    }))
}

/// Fold every single-month result for `metric`, regardless of year, into
/// one result covering the dataset's whole range.
pub fn rollup_all(results: &[MetricResult], metric: MetricName) -> Option<MetricResult> {
    rollup(
        results
            .iter()
            .filter(|r| r.metric == metric && r.span.is_single_month()),
    )
}

fn rollup<'a, I>(months: I) -> Option<MetricResult>
where
    I: Iterator<Item = &'a MetricResult>,
{
    let mut span: Option<PeriodSpan> = None;
    let mut samples: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    let mut metric: Option<(MetricName, Grouping)> = None;

    for result in months {
        metric = Some((result.metric, result.grouping));
        match span.as_mut() {
            Some(s) => {
                s.extend(result.span.start);
                s.extend(result.span.end);
            }
            None => span = Some(result.span),
        }
        for (key, &value) in &result.values {
            samples.entry(key.clone()).or_default().push(value);
        }
    }

    let (metric, grouping) = metric?;
    let mut folded = MetricResult::new(metric, grouping, span?);
    for (key, values) in samples {
        let value = if metric.is_additive() {
            values.iter().sum()
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        folded.values.insert(key, value);
    }
    Some(folded)
}
