//! Pipeline orchestration
//!
//! Runs the per-country analysis and drives it across every configured
//! country. Each country is independent: a country whose inputs are missing
//! is skipped, one whose inputs are malformed is recorded as failed, and
//! neither affects the others.

use crate::absence::AbsenceDetector;
use crate::aggregate::{CategoryFilter, UsageAggregator};
use crate::config::{AnalysisOptions, CountrySource, RunConfig};
use crate::corpus::CorpusLoader;
use crate::diversity::diversity_index;
use crate::error::AnalysisError;
use crate::ranking::TopNRanker;
use crate::registry::DeviceRegistry;
use crate::types::{CountryReport, RoutineCorpus};
use crate::{PRODUCER_NAME, ROUTINE_INSIGHTS_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// Analyze an already loaded corpus.
///
/// Pipeline stages:
/// 1. UsageAggregator - resolve codes and build count tables
/// 2. Diversity index over all observations
/// 3. AbsenceDetector over presence-indicative devices
/// 4. TopNRanker over all observations
pub fn analyze_corpus(
    country: &str,
    corpus: &RoutineCorpus,
    registry: &DeviceRegistry,
    options: &AnalysisOptions,
) -> CountryReport {
    let tables = UsageAggregator::aggregate(corpus, registry, &CategoryFilter::All);
    let absence = AbsenceDetector::detect(corpus, registry);
    let ranker = TopNRanker::new(options.top_n, options.exclude_sentinels_in_ranking);

    CountryReport {
        country: country.to_string(),
        timesteps: corpus.len(),
        total_observations: tables.total_observations(),
        by_hour: *tables.by_hour(),
        by_device: tables.by_device(),
        by_device_hour: tables.by_device_hour(),
        diversity_index: diversity_index(&tables),
        absence,
        top_devices: ranker.rank(&tables),
    }
}

/// Load a country's inputs and analyze them
pub fn analyze_country(
    source: &CountrySource,
    options: &AnalysisOptions,
) -> Result<CountryReport, AnalysisError> {
    let registry = match &source.registry {
        Some(path) => DeviceRegistry::load(path)?,
        None => DeviceRegistry::standard(),
    };
    let corpus = CorpusLoader::load(&source.corpus)?;

    let report = analyze_corpus(&source.name, &corpus, &registry, options);
    info!(
        timesteps = report.timesteps,
        observations = report.total_observations,
        diversity_index = report.diversity_index,
        absence_hours = ?report.absence.absence_hours,
        "country analyzed"
    );
    Ok(report)
}

/// A country left out of the run because its inputs were missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCountry {
    pub country: String,
    pub reason: String,
}

/// A country whose inputs could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCountry {
    pub country: String,
    pub error: String,
}

/// Diversity index of one country, for cross-country comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDiversity {
    pub country: String,
    pub diversity_index: f64,
}

/// Outcome of analyzing every configured country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub producer: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<CountryReport>,
    pub skipped: Vec<SkippedCountry>,
    pub failed: Vec<FailedCountry>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            producer: PRODUCER_NAME.to_string(),
            version: ROUTINE_INSIGHTS_VERSION.to_string(),
            generated_at: Utc::now(),
            reports: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Diversity index per analyzed country, in configuration order
    pub fn diversity_comparison(&self) -> Vec<CountryDiversity> {
        self.reports
            .iter()
            .map(|r| CountryDiversity {
                country: r.country.clone(),
                diversity_index: r.diversity_index,
            })
            .collect()
    }

    pub fn report(&self, country: &str) -> Option<&CountryReport> {
        self.reports.iter().find(|r| r.country == country)
    }
}

/// Analyze every configured country in order
pub fn analyze_all(config: &RunConfig) -> RunSummary {
    let mut summary = RunSummary::new();

    for source in &config.countries {
        let _span = info_span!("country", country = %source.name).entered();
        info!("processing country");

        let missing = source.missing_inputs();
        if !missing.is_empty() {
            let reason = missing
                .iter()
                .map(|(kind, path)| format!("{kind} not found: {}", path.display()))
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%reason, "data files are missing, skipping");
            summary.skipped.push(SkippedCountry {
                country: source.name.clone(),
                reason,
            });
            continue;
        }

        match analyze_country(source, &config.analysis) {
            Ok(report) => summary.reports.push(report),
            Err(e) if e.is_skippable() => {
                warn!(error = %e, "input disappeared, skipping");
                summary.skipped.push(SkippedCountry {
                    country: source.name.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                summary.failed.push(FailedCountry {
                    country: source.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        analyzed = summary.reports.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "run complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceCount, HOURS_PER_DAY};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;

    const SCENARIO_REGISTRY: &str = "[devices]\nLight = 13\nMotionSensor = 15\nPresenceSensor = 20\n";

    fn write_country(dir: &Path, corpus: &str, registry: Option<&str>) -> CountrySource {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("routine_device_corpus.txt"), corpus).unwrap();
        let mut source = CountrySource::new("Test", dir.join("routine_device_corpus.txt"));
        if let Some(registry) = registry {
            fs::write(dir.join("dictionary.toml"), registry).unwrap();
            source = source.with_registry(dir.join("dictionary.toml"));
        }
        source
    }

    #[test]
    fn test_scenario_report() {
        let corpus = RoutineCorpus::from_codes(vec![vec![13, 15], vec![13], vec![20, 13, 15]]);
        let registry = DeviceRegistry::from_toml_str(SCENARIO_REGISTRY).unwrap();
        let report = analyze_corpus("Test", &corpus, &registry, &AnalysisOptions::default());

        assert_eq!(report.timesteps, 3);
        assert_eq!(report.total_observations, 6);
        assert_eq!(
            report.by_device,
            vec![
                DeviceCount { device: "Light".into(), count: 3 },
                DeviceCount { device: "MotionSensor".into(), count: 2 },
                DeviceCount { device: "PresenceSensor".into(), count: 1 },
            ]
        );
        assert_eq!(&report.by_hour[..3], &[2, 1, 3]);
        assert!((report.diversity_index - 0.5).abs() < 1e-12);
        assert_eq!(report.top_devices.len(), 3);
        assert_eq!(report.top_devices[0].device, "Light");
        // All three categories are presence devices
        assert_eq!(report.absence.hourly, report.by_hour);
    }

    #[test]
    fn test_analyze_country_uses_standard_registry_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_country(dir.path(), "29 29\n17\n99\n", None);

        let report = analyze_country(&source, &AnalysisOptions::default()).unwrap();
        assert_eq!(report.by_device[0].device, "Television");
        // Sentinels are excluded from the ranking by default
        assert_eq!(report.top_devices.len(), 1);
        assert_eq!(report.by_device.len(), 3);
    }

    #[test]
    fn test_analyze_country_rejects_bad_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_country(dir.path(), "13\n1.5\n", Some(SCENARIO_REGISTRY));

        let err = analyze_country(&source, &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::CorpusFormat { line: 2, .. }));
    }

    #[test]
    fn test_analyze_all_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut good = write_country(&dir.path().join("fr"), "13 15\n13\n", Some(SCENARIO_REGISTRY));
        good.name = "France".to_string();
        let mut bad = write_country(
            &dir.path().join("kr"),
            "13\n",
            Some("[devices]\nLight = 13\nLamp = 13\n"),
        );
        bad.name = "Korea".to_string();
        let missing = CountrySource::in_directory("USA", dir.path().join("us"));

        let config = RunConfig {
            countries: vec![good, bad, missing],
            ..RunConfig::default()
        };
        let summary = analyze_all(&config);

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].country, "France");
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].country, "Korea");
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].country, "USA");
        assert!(summary.report("Korea").is_none());

        let comparison = summary.diversity_comparison();
        assert_eq!(comparison.len(), 1);
        assert!((comparison[0].diversity_index - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_corpus_report() {
        let report = analyze_corpus(
            "Empty",
            &RoutineCorpus::default(),
            &DeviceRegistry::standard(),
            &AnalysisOptions::default(),
        );
        assert_eq!(report.total_observations, 0);
        assert_eq!(report.diversity_index, 0.0);
        assert_eq!(report.by_hour, [0; HOURS_PER_DAY]);
        assert!(report.absence.absence_hours.is_empty());
        assert!(report.top_devices.is_empty());
    }
}
