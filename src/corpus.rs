//! Routine corpus loading
//!
//! A corpus is plain text with one line per timestep. Each line holds the
//! whitespace-separated codes of the devices active during that timestep; an
//! empty line means nothing was active.

use crate::error::{AnalysisError, InputKind};
use crate::types::{DeviceCode, RoutineCorpus, TimestepRecord};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Loader for routine corpora
pub struct CorpusLoader;

impl CorpusLoader {
    /// Read and parse a corpus file.
    ///
    /// A missing file is reported as [`AnalysisError::MissingInput`], never as
    /// an empty corpus. Any token that is not an integer aborts the load.
    pub fn load(path: &Path) -> Result<RoutineCorpus, AnalysisError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AnalysisError::MissingInput {
                kind: InputKind::Corpus,
                path: path.to_path_buf(),
            },
            _ => AnalysisError::Io(e),
        })?;

        let corpus = Self::parse(&text, path)?;
        debug!(
            path = %path.display(),
            timesteps = corpus.len(),
            observations = corpus.observation_count(),
            "loaded routine corpus"
        );
        Ok(corpus)
    }

    /// Parse corpus text. `source` is only used in error messages.
    pub fn parse(text: &str, source: &Path) -> Result<RoutineCorpus, AnalysisError> {
        let timesteps = text
            .lines()
            .enumerate()
            .map(|(index, line)| parse_line(line, index + 1, source))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RoutineCorpus::new(timesteps))
    }
}

fn parse_line(line: &str, line_number: usize, source: &Path) -> Result<TimestepRecord, AnalysisError> {
    let devices = line
        .split_whitespace()
        .map(|token| {
            token
                .parse::<DeviceCode>()
                .map_err(|_| AnalysisError::CorpusFormat {
                    path: source.to_path_buf(),
                    line: line_number,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TimestepRecord::new(devices))
}
