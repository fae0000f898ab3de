//! First-response-time statistics from the ticket-level FRT dataset, in
//! minutes. A (group, month) with no tickets has no entry at all; the
//! presentation layer renders that as "no data", never as zero.

use crate::parser::types::{field, Dataset, DatasetKind};

use super::{collect_samples, finish, finish_with, stats, Grouping, MetricName, MetricResult};

pub fn compute(dataset: &Dataset, grouping: Grouping) -> Vec<MetricResult> {
    debug_assert_eq!(dataset.kind, DatasetKind::Frt);

    let samples = collect_samples(&dataset.records, grouping, |r| {
        r.value(field::FIRST_RESPONSE_MINUTES)
    });

    let mut results = finish(MetricName::FrtMean, grouping, &samples);
    results.extend(finish_with(
        MetricName::FrtMedian,
        grouping,
        &samples,
        stats::median,
    ));
    results
}
