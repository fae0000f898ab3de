//! Resolution-time statistics from the ticket-level resolution dataset,
//! partitioned by severity. Unresolved tickets never enter the mean; they
//! are counted separately as open tickets.

use crate::parser::types::{field, Dataset, DatasetKind, Severity};

use super::{collect_samples, finish, Grouping, MetricName, MetricResult};

pub fn compute(dataset: &Dataset, grouping: Grouping) -> Vec<MetricResult> {
    debug_assert_eq!(dataset.kind, DatasetKind::Resolution);

    let mut results = Vec::new();
    for severity in Severity::ALL {
        let resolved = collect_samples(&dataset.records, grouping, |r| {
            if r.severity == Some(severity) {
                r.value(field::RESOLUTION_HOURS)
            } else {
                None
            }
        });
        results.extend(finish(MetricName::ResolutionMean(severity), grouping, &resolved));

        // Every row of the severity contributes 0 or 1, so a group that has
        // tickets but none open reports an explicit zero rather than no data.
        let open = collect_samples(&dataset.records, grouping, |r| {
            if r.severity == Some(severity) {
                Some(if r.value(field::RESOLUTION_HOURS).is_none() {
                    1.0
                } else {
                    0.0
                })
            } else {
                None
            }
        });
        results.extend(finish(MetricName::OpenTickets(severity), grouping, &open));
    }
    results
}
