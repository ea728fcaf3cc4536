//! Error types for Routine Insights

use crate::types::DeviceCode;
use std::path::PathBuf;
use thiserror::Error;

/// Which input of a country could not be found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Corpus,
    Registry,
    Config,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputKind::Corpus => "routine corpus",
            InputKind::Registry => "device registry",
            InputKind::Config => "configuration",
        };
        f.write_str(name)
    }
}

/// Violations of the name/code bijection of a device registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryIntegrityError {
    #[error("Device code {code} is assigned to both '{first}' and '{second}'")]
    DuplicateCode {
        code: DeviceCode,
        first: String,
        second: String,
    },

    #[error("Device category '{name}' is declared more than once")]
    DuplicateName { name: String },
}

/// Errors that can occur while loading or analyzing a country's routines
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing {kind}: {}", path.display())]
    MissingInput { kind: InputKind, path: PathBuf },

    #[error("Invalid device code '{token}' on line {line} of {}", path.display())]
    CorpusFormat {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("Registry integrity error: {0}")]
    RegistryIntegrity(#[from] RegistryIntegrityError),

    #[error("Failed to parse device registry: {0}")]
    RegistryParse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Whether the orchestrator should skip the country instead of recording a failure
    pub fn is_skippable(&self) -> bool {
        matches!(self, AnalysisError::MissingInput { .. })
    }
}
