//! Routine Insights - usage aggregation and absence detection for smart-home routines
//!
//! Reduces per-country device-activity logs into hour-of-day statistics through
//! a deterministic pipeline: corpus loading → registry resolution → usage
//! aggregation → {diversity index, absence detection, top-N ranking}.
//!
//! ## Modules
//!
//! - **Inputs**: [`corpus`] parses routine corpora, [`registry`] maps device codes to categories
//! - **Core**: [`aggregate`], [`diversity`], [`absence`], [`ranking`]
//! - **Orchestration**: [`pipeline`] runs every configured country, [`report`] writes results

pub mod absence;
pub mod aggregate;
pub mod config;
pub mod corpus;
pub mod diversity;
pub mod error;
pub mod hours;
pub mod logging;
pub mod pipeline;
pub mod ranking;
pub mod registry;
pub mod report;
pub mod types;

pub use absence::{AbsenceDetector, PRESENCE_CATEGORIES};
pub use aggregate::{CategoryFilter, UsageAggregator, UsageTables};
pub use config::{AnalysisOptions, CountrySource, RunConfig};
pub use corpus::CorpusLoader;
pub use error::{AnalysisError, RegistryIntegrityError};
pub use pipeline::{analyze_all, analyze_corpus, analyze_country, RunSummary};
pub use ranking::TopNRanker;
pub use registry::DeviceRegistry;
pub use report::ReportWriter;
pub use types::{AbsenceProfile, CountryReport, RankedDevice, RoutineCorpus};

/// Crate version embedded in run summaries
pub const ROUTINE_INSIGHTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for run summaries
pub const PRODUCER_NAME: &str = "routine-insights";
