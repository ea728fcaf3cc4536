//! Report writer
//!
//! Persists analysis results as JSON documents under an output directory:
//!
//! ```text
//! <dir>/absence-patterns/absence-patterns-<country>.json
//! <dir>/device-country/<country>/<device>-<country>-hour.json
//! <dir>/diversity-index/diversity-index-by-country.json
//! <dir>/top-ten/top-10-device-<country>.json
//! <dir>/summary.json
//! ```

use crate::error::AnalysisError;
use crate::pipeline::RunSummary;
use crate::types::{CountryReport, DeviceHourlyUsage};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes run results to disk
pub struct ReportWriter {
    root: PathBuf,
    pretty: bool,
}

impl ReportWriter {
    pub fn new(root: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            root: root.into(),
            pretty,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write every artifact of a run; returns the files written
    pub fn write_summary(&self, summary: &RunSummary) -> Result<Vec<PathBuf>, AnalysisError> {
        let mut written = Vec::new();

        for report in &summary.reports {
            written.extend(self.write_country(report)?);
        }

        let diversity = self
            .root
            .join("diversity-index")
            .join("diversity-index-by-country.json");
        self.write_json(&diversity, &summary.diversity_comparison())?;
        written.push(diversity);

        let summary_path = self.root.join("summary.json");
        self.write_json(&summary_path, summary)?;
        written.push(summary_path);

        Ok(written)
    }

    /// Write the per-country artifacts of one report
    pub fn write_country(&self, report: &CountryReport) -> Result<Vec<PathBuf>, AnalysisError> {
        let country = file_component(&report.country);
        let mut written = Vec::new();

        let absence = self
            .root
            .join("absence-patterns")
            .join(format!("absence-patterns-{country}.json"));
        self.write_json(&absence, &report.absence)?;
        written.push(absence);

        let device_dir = self.root.join("device-country").join(&country);
        for usage in &report.by_device_hour {
            let device = file_component(&usage.device);
            let path = device_dir.join(format!("{device}-{country}-hour.json"));
            self.write_json(&path, &HourlyDocument::new(&report.country, usage))?;
            written.push(path);
        }

        let top = self
            .root
            .join("top-ten")
            .join(format!("top-10-device-{country}.json"));
        self.write_json(&top, &report.top_devices)?;
        written.push(top);

        Ok(written)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), AnalysisError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        fs::write(path, json)?;
        debug!(path = %path.display(), "wrote report");
        Ok(())
    }
}

/// Make a country or device name safe to use inside a single file name.
///
/// Separators and other characters reserved on common filesystems become
/// `_`, and names made only of dots are prefixed so they never resolve to
/// `.` or `..`.
fn file_component(name: &str) -> String {
    let mut component: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if component.chars().all(|c| c == '.') {
        component.insert(0, '_');
    }
    component
}

#[derive(Serialize)]
struct HourlyDocument<'a> {
    country: &'a str,
    device: &'a str,
    hourly: &'a [u64],
}

impl<'a> HourlyDocument<'a> {
    fn new(country: &'a str, usage: &'a DeviceHourlyUsage) -> Self {
        Self {
            country,
            device: &usage.device,
            hourly: &usage.hourly,
        }
    }
}
