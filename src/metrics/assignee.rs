//! Per-agent performance metrics from the assignee performance rollup.
//! Rows are already monthly per-agent aggregates; coarser groupings
//! average them without ticket-volume weighting.

use crate::parser::types::{field, Dataset, DatasetKind};

use super::{collect_samples, finish, Grouping, MetricName, MetricResult};

pub fn compute(dataset: &Dataset, grouping: Grouping) -> Vec<MetricResult> {
    debug_assert_eq!(dataset.kind, DatasetKind::AssigneePerformance);

    const FIELDS: [(MetricName, &str); 5] = [
        (MetricName::TicketsResolved, field::TOTAL_RESOLVED),
        (MetricName::AvgResolutionDays, field::AVG_RESOLUTION_DAYS),
        (MetricName::ResolutionRate, field::RESOLUTION_RATE),
        (MetricName::EscalationRate, field::ESCALATION_RATE),
        (MetricName::AvgFrtHours, field::AVG_FRT_HOURS),
    ];

    let mut results = Vec::new();
    for (metric, name) in FIELDS {
        let samples = collect_samples(&dataset.records, grouping, |r| r.value(name));
        results.extend(finish(metric, grouping, &samples));
    }
    results
}
