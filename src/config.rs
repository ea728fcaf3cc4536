//! Run configuration
//!
//! Describes which countries to analyze and where their inputs live, plus
//! analysis, output and logging settings. Loaded from TOML, then adjusted
//! with environment overrides:
//!
//! - `ROUTINES_OUTPUT_DIR` - output directory
//! - `ROUTINES_LOG_LEVEL` - log level / filter directive
//! - `ROUTINES_LOG_FORMAT` - `pretty` or `json`

use crate::error::{AnalysisError, InputKind};
use crate::ranking::DEFAULT_TOP_N;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Input files of one country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySource {
    pub name: String,
    /// Routine corpus (one line per timestep)
    pub corpus: PathBuf,
    /// Device registry TOML; the standard registry is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
}

impl CountrySource {
    pub fn new(name: impl Into<String>, corpus: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            corpus: corpus.into(),
            registry: None,
        }
    }

    pub fn with_registry(mut self, registry: impl Into<PathBuf>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Conventional layout: `<dir>/routine_device_corpus.txt` and `<dir>/dictionary.toml`
    pub fn in_directory(name: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(name, dir.join("routine_device_corpus.txt"))
            .with_registry(dir.join("dictionary.toml"))
    }

    /// Inputs that do not exist on disk
    pub fn missing_inputs(&self) -> Vec<(InputKind, &Path)> {
        let mut missing = Vec::new();
        if !self.corpus.exists() {
            missing.push((InputKind::Corpus, self.corpus.as_path()));
        }
        if let Some(registry) = &self.registry {
            if !registry.exists() {
                missing.push((InputKind::Registry, registry.as_path()));
            }
        }
        missing
    }
}

/// Analysis knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Number of devices kept in the usage ranking
    pub top_n: usize,
    /// Drop "Unknown" and "None" from the usage ranking
    pub exclude_sentinels_in_ranking: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            exclude_sentinels_in_ranking: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("result"),
            pretty: true,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AnalysisError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub countries: Vec<CountrySource>,
    #[serde(default)]
    pub analysis: AnalysisOptions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            countries: vec![
                CountrySource::in_directory("France", "data/fr"),
                CountrySource::in_directory("Korea", "data/kr"),
                CountrySource::in_directory("USA", "data/us"),
                CountrySource::in_directory("Spain", "data/sp"),
            ],
            analysis: AnalysisOptions::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, AnalysisError> {
        toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// Load a configuration file, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AnalysisError::MissingInput {
                kind: InputKind::Config,
                path: path.to_path_buf(),
            },
            _ => AnalysisError::Io(e),
        })?;

        info!(config_file = %path.display(), "loading configuration");
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ROUTINES_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), AnalysisError> {
        if let Ok(val) = env::var("ROUTINES_OUTPUT_DIR") {
            self.output.directory = PathBuf::from(val);
        }
        if let Ok(val) = env::var("ROUTINES_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("ROUTINES_LOG_FORMAT") {
            self.logging.format = val.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.countries.is_empty() {
            return Err(AnalysisError::Config("no countries configured".to_string()));
        }

        let mut seen = HashSet::new();
        for country in &self.countries {
            if country.name.trim().is_empty() {
                return Err(AnalysisError::Config("country name cannot be empty".to_string()));
            }
            if !seen.insert(country.name.as_str()) {
                return Err(AnalysisError::Config(format!(
                    "country '{}' is listed more than once",
                    country.name
                )));
            }
        }

        if self.analysis.top_n == 0 {
            return Err(AnalysisError::Config("top_n must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        let names: Vec<&str> = config.countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["France", "Korea", "USA", "Spain"]);
        assert_eq!(
            config.countries[0].corpus,
            PathBuf::from("data/fr/routine_device_corpus.txt")
        );
        assert_eq!(config.analysis.top_n, 10);
        assert!(config.analysis.exclude_sentinels_in_ranking);
        assert_eq!(config.output.directory, PathBuf::from("result"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = RunConfig::from_toml_str(
            r#"
            [[countries]]
            name = "France"
            corpus = "data/fr/routine_device_corpus.txt"
            registry = "data/fr/dictionary.toml"

            [[countries]]
            name = "Korea"
            corpus = "data/kr/routine_device_corpus.txt"

            [analysis]
            top_n = 5

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.countries.len(), 2);
        assert_eq!(config.countries[1].registry, None);
        assert_eq!(config.analysis.top_n, 5);
        assert!(config.analysis.exclude_sentinels_in_ranking);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = RunConfig::default();
        config.analysis.top_n = 0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.countries.push(CountrySource::new("France", "other.txt"));
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.countries.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        env::set_var("ROUTINES_OUTPUT_DIR", "/tmp/routines-out");
        env::set_var("ROUTINES_LOG_FORMAT", "JSON");
        let mut config = RunConfig::default();
        config.apply_env_overrides().unwrap();
        env::remove_var("ROUTINES_OUTPUT_DIR");
        env::remove_var("ROUTINES_LOG_FORMAT");

        assert_eq!(config.output.directory, PathBuf::from("/tmp/routines-out"));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountrySource::in_directory("France", dir.path());
        assert_eq!(source.missing_inputs().len(), 2);

        fs::write(dir.path().join("routine_device_corpus.txt"), "13\n").unwrap();
        let missing = source.missing_inputs();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].0, InputKind::Registry);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunConfig::load(&dir.path().join("routines.toml")).unwrap_err();
        assert!(err.is_skippable());
    }
}
