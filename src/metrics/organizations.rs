//! Customer-level metrics from the organizations dataset: ticket volume,
//! engineering escalation rate, and average resolution time per customer
//! account.

use crate::parser::types::{field, Dataset, DatasetKind};

use super::{collect_samples, finish, rate_of_sums, Grouping, MetricName, MetricResult};

pub fn compute(dataset: &Dataset, grouping: Grouping) -> Vec<MetricResult> {
    debug_assert_eq!(dataset.kind, DatasetKind::Organizations);

    let tickets = collect_samples(&dataset.records, grouping, |r| r.value(field::TICKETS));
    let mut results = finish(MetricName::TicketVolume, grouping, &tickets);

    let escalated = collect_samples(&dataset.records, grouping, |r| {
        r.value(field::ENGINEERING_TICKETS)
    });
    results.extend(rate_of_sums(
        MetricName::EscalationRate,
        grouping,
        &escalated,
        &tickets,
    ));

    let resolution = collect_samples(&dataset.records, grouping, |r| {
        r.value(field::AVG_RESOLUTION_DAYS)
    });
    results.extend(finish(MetricName::AvgResolutionDays, grouping, &resolution));

    results
}
