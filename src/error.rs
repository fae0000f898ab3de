use thiserror::Error;

use crate::parser::types::DatasetKind;
use crate::report::ReportKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} dataset: missing required columns: {}", columns.join(", "))]
    MissingColumns {
        kind: DatasetKind,
        columns: Vec<String>,
    },

    #[error("{0} dataset: file is empty or has no data rows")]
    EmptyFile(DatasetKind),

    #[error("{0} dataset has not been loaded")]
    NotLoaded(DatasetKind),

    #[error("{report} report requires the {dataset} dataset, which is not loaded")]
    MissingDataset {
        report: ReportKind,
        dataset: DatasetKind,
    },
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
