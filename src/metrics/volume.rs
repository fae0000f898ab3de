//! Ticket volume from the monthly trends dataset. The raw counts here are
//! both reported directly (Executive Summary) and used as denominators by
//! other consumers.

use crate::parser::types::{field, Dataset, DatasetKind};

use super::{collect_samples, finish, Grouping, MetricName, MetricResult};

pub fn compute(dataset: &Dataset, grouping: Grouping) -> Vec<MetricResult> {
    debug_assert_eq!(dataset.kind, DatasetKind::Monthly);

    let created = collect_samples(&dataset.records, grouping, |r| r.value(field::CREATED));
    let mut results = finish(MetricName::TicketVolume, grouping, &created);

    let resolved = collect_samples(&dataset.records, grouping, |r| r.value(field::RESOLVED));
    results.extend(finish(MetricName::TicketsResolved, grouping, &resolved));

    results
}
