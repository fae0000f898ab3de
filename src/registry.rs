use std::collections::BTreeMap;

use crate::error::Error;
use crate::parser::types::{Dataset, DatasetKind};
use crate::period::PeriodSpan;

/// Holds the normalized datasets for one load cycle, keyed by kind.
///
/// Each report-generation cycle constructs a fresh registry; concurrent
/// requests in a hosting layer must each get their own instance. The
/// registry owns its datasets, and everything downstream borrows them.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    datasets: BTreeMap<DatasetKind, Dataset>,
}

impl DatasetRegistry {
    pub fn new() -> DatasetRegistry {
        DatasetRegistry::default()
    }

    /// Register a dataset, replacing any previous dataset of the same kind.
    /// Returns the replaced dataset, if there was one.
    pub fn register(&mut self, dataset: Dataset) -> Option<Dataset> {
        self.datasets.insert(dataset.kind, dataset)
    }

    pub fn get(&self, kind: DatasetKind) -> Result<&Dataset, Error> {
        self.datasets.get(&kind).ok_or(Error::NotLoaded(kind))
    }

    /// For optional datasets: absent is a normal answer, not an error.
    pub fn try_get(&self, kind: DatasetKind) -> Option<&Dataset> {
        self.datasets.get(&kind)
    }

    pub fn is_loaded(&self, kind: DatasetKind) -> bool {
        self.datasets.contains_key(&kind)
    }

    pub fn loaded_kinds(&self) -> Vec<DatasetKind> {
        self.datasets.keys().copied().collect()
    }

    /// The union of all loaded datasets' period ranges.
    pub fn period_range(&self) -> Option<PeriodSpan> {
        let mut overall: Option<PeriodSpan> = None;
        for dataset in self.datasets.values() {
            if let Some(range) = dataset.period_range {
                match overall.as_mut() {
                    Some(span) => {
                        span.extend(range.start);
                        span.extend(range.end);
                    }
                    None => overall = Some(range),
                }
            }
        }
        overall
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeamRoster;
    use crate::parser::pipeline::parse_csv_reader;
    use crate::period::Period;

    fn dataset(kind: DatasetKind, csv: &str) -> Dataset {
        parse_csv_reader(csv.as_bytes(), kind, &TeamRoster::default()).unwrap()
    }

    #[test]
    fn test_get_unloaded_kind_fails() {
        let registry = DatasetRegistry::new();
        match registry.get(DatasetKind::Frt) {
            Err(Error::NotLoaded(kind)) => assert_eq!(kind, DatasetKind::Frt),
            other => panic!("expected NotLoaded, got {other:?}"),
        }
        assert!(registry.try_get(DatasetKind::Frt).is_none());
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = DatasetRegistry::new();
        let first = dataset(DatasetKind::Monthly, "Year,Month,Created\n2025,1,10");
        let second = dataset(DatasetKind::Monthly, "Year,Month,Created\n2025,2,20");
        assert!(registry.register(first).is_none());
        let replaced = registry.register(second).expect("replaced dataset");
        assert_eq!(replaced.records[0].period, Period::new(2025, 1).unwrap());
        assert_eq!(
            registry.get(DatasetKind::Monthly).unwrap().records[0].period,
            Period::new(2025, 2).unwrap()
        );
    }

    #[test]
    fn test_period_range_spans_all_datasets() {
        let mut registry = DatasetRegistry::new();
        registry.register(dataset(DatasetKind::Monthly, "Year,Month,Created\n2024,11,10"));
        registry.register(dataset(
            DatasetKind::Frt,
            "Ticket,Opened,First_Response_Minutes\nKH-1,2025-03-01 09:00,30",
        ));
        let range = registry.period_range().unwrap();
        assert_eq!(range.start, Period::new(2024, 11).unwrap());
        assert_eq!(range.end, Period::new(2025, 3).unwrap());
    }
}
