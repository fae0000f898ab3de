//! Metrics aggregation and comparison engine for KHELP support-ticket
//! CSV exports.
//!
//! One report-generation cycle runs the synchronous pipeline: parse each
//! `khelp_<kind>_*.csv` export into a normalized [`Dataset`], register the
//! datasets in a fresh [`DatasetRegistry`], then let a [`ReportAssembler`]
//! compose calculator and comparator output into immutable report tables
//! for the presentation layer.
//!
//! ```no_run
//! use khelp_analytics::{
//!     parser, AnalyticsConfig, DatasetKind, DatasetRegistry, ReportAssembler, ReportKind,
//! };
//!
//! # fn main() -> Result<(), khelp_analytics::Error> {
//! let config = AnalyticsConfig::default();
//! let mut registry = DatasetRegistry::new();
//! registry.register(parser::parse_csv(
//!     "khelp_monthly_latest.csv",
//!     DatasetKind::Monthly,
//!     &config.roster,
//! )?);
//!
//! let assembler = ReportAssembler::new(&registry, &config);
//! for (kind, outcome) in assembler.assemble_all() {
//!     match outcome {
//!         Ok(report) => println!("{kind}: {} tables", report.tables.len()),
//!         Err(err) => eprintln!("{kind}: {err}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod compare;
pub mod config;
pub mod error;
pub mod metrics;
pub mod parser;
pub mod period;
pub mod registry;
pub mod report;
pub mod scorecard;

pub use compare::{Comparison, ComparisonResult};
pub use config::{AnalyticsConfig, TeamRoster};
pub use error::Error;
pub use metrics::{GroupKey, Grouping, MetricName, MetricResult, Unit};
pub use parser::{Dataset, DatasetKind, ParseWarning, Record, Severity, Tier};
pub use period::{Period, PeriodSpan};
pub use registry::DatasetRegistry;
pub use report::{Report, ReportAssembler, ReportKind, Table};
pub use scorecard::{Cell, Scorecard};
