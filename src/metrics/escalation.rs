//! Engineering escalation rate: escalated tickets over total tickets, per
//! grouping and month. Undefined (absent) when the total is zero.

use crate::parser::types::{field, Dataset, DatasetKind};

use super::{collect_samples, finish, rate_of_sums, Grouping, MetricName, MetricResult};

pub fn compute(dataset: &Dataset, grouping: Grouping) -> Vec<MetricResult> {
    debug_assert_eq!(dataset.kind, DatasetKind::Engineering);

    let totals = collect_samples(&dataset.records, grouping, |r| r.value(field::TOTAL_TICKETS));
    let escalated = collect_samples(&dataset.records, grouping, |r| {
        r.value(field::ENGINEERING_TICKETS)
    });

    let mut results = rate_of_sums(MetricName::EscalationRate, grouping, &escalated, &totals);
    results.extend(finish(MetricName::TicketVolume, grouping, &totals));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeamRoster;
    use crate::metrics::GroupKey;
    use crate::parser::pipeline::parse_csv_reader;

    fn dataset(csv: &str) -> Dataset {
        parse_csv_reader(csv.as_bytes(), DatasetKind::Engineering, &TeamRoster::default()).unwrap()
    }

    fn rate_for(results: &[MetricResult], key: &GroupKey) -> Option<f64> {
        results
            .iter()
            .find(|r| r.metric == MetricName::EscalationRate)
            .and_then(|r| r.value(key))
    }

    #[test]
    fn test_rate_is_ratio_of_sums() {
        let ds = dataset("Month,Total_Tickets,Engineering_Tickets\n2025-06,200,36");
        let results = compute(&ds, Grouping::Global);
        assert!((rate_for(&results, &GroupKey::Global).unwrap() - 0.18).abs() < 1e-10);
    }

    #[test]
    fn test_zero_total_is_undefined_not_zero() {
        let ds = dataset("Month,Total_Tickets,Engineering_Tickets\n2025-06,0,0");
        let results = compute(&ds, Grouping::Global);
        assert_eq!(rate_for(&results, &GroupKey::Global), None);
    }

    #[test]
    fn test_per_assignee_rates() {
        let ds = dataset(
            "Month,Total_Tickets,Engineering_Tickets,Assignee\n\
             2025-06,100,10,Maya Lindqvist\n\
             2025-06,50,20,Tomas Rivera",
        );
        let results = compute(&ds, Grouping::ByEntity);
        let maya = GroupKey::Entity("Maya Lindqvist".into());
        let tomas = GroupKey::Entity("Tomas Rivera".into());
        assert!((rate_for(&results, &maya).unwrap() - 0.10).abs() < 1e-10);
        assert!((rate_for(&results, &tomas).unwrap() - 0.40).abs() < 1e-10);
    }

    #[test]
    fn test_global_rate_pools_rows() {
        let ds = dataset(
            "Month,Total_Tickets,Engineering_Tickets,Assignee\n\
             2025-06,100,10,Maya Lindqvist\n\
             2025-06,50,20,Tomas Rivera",
        );
        let results = compute(&ds, Grouping::Global);
        // 30 escalated out of 150 total, not the mean of 10% and 40%.
        assert!((rate_for(&results, &GroupKey::Global).unwrap() - 0.20).abs() < 1e-10);
    }
}
