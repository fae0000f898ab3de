//! Level 2 contributor metrics from the contributor performance rollup.

use crate::parser::types::{field, Dataset, DatasetKind};

use super::{collect_samples, finish, Grouping, MetricName, MetricResult};

pub fn compute(dataset: &Dataset, grouping: Grouping) -> Vec<MetricResult> {
    debug_assert_eq!(dataset.kind, DatasetKind::ContributorPerformance);

    const FIELDS: [(MetricName, &str); 4] = [
        (MetricName::TicketsContributed, field::TICKETS_CONTRIBUTED),
        (MetricName::TotalComments, field::TOTAL_COMMENTS),
        (MetricName::AvgCommentsPerTicket, field::AVG_COMMENTS_PER_TICKET),
        (MetricName::AvgHoldTimeHours, field::AVG_HOLD_TIME_HOURS),
    ];

    let mut results = Vec::new();
    for (metric, name) in FIELDS {
        let samples = collect_samples(&dataset.records, grouping, |r| r.value(name));
        results.extend(finish(metric, grouping, &samples));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeamRoster;
    use crate::metrics::GroupKey;
    use crate::parser::pipeline::parse_csv_reader;

    fn dataset(csv: &str) -> Dataset {
        parse_csv_reader(
            csv.as_bytes(),
            DatasetKind::ContributorPerformance,
            &TeamRoster::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_contributor_metrics() {
        let ds = dataset(
            "Contributor,Month,Tickets_Contributed,Total_Comments,Avg_Comments_Per_Ticket\n\
             Andrei Popescu,2025-06,31,120,3.9\n\
             Sofia Almeida,2025-06,24,80,3.3",
        );
        let results = compute(&ds, Grouping::ByEntity);
        let andrei = GroupKey::Entity("Andrei Popescu".into());
        let contributed = results
            .iter()
            .find(|r| r.metric == MetricName::TicketsContributed)
            .unwrap();
        assert_eq!(contributed.value(&andrei), Some(31.0));
        assert_eq!(contributed.values.len(), 2);

        let global = compute(&ds, Grouping::Global);
        let comments = global
            .iter()
            .find(|r| r.metric == MetricName::TotalComments)
            .unwrap();
        assert_eq!(comments.global(), Some(200.0));
    }

    #[test]
    fn test_missing_optional_metric_has_no_result() {
        let ds = dataset("Contributor,Month,Tickets_Contributed\nAndrei Popescu,2025-06,31");
        let results = compute(&ds, Grouping::ByEntity);
        assert!(results.iter().all(|r| r.metric != MetricName::AvgHoldTimeHours));
    }
}
