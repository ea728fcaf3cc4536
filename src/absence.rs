//! Absence detection
//!
//! Flags hours of the day where presence-indicative devices are used much
//! less than usual. Only devices that react to occupants and do not run
//! continuously are counted; everything else is dropped before aggregation.
//!
//! The statistics are taken over the 24 hourly bins (hours without activity
//! count as zero), using the population standard deviation:
//!
//! ```text
//! threshold = mean(hourly) - std(hourly)
//! absent(h) = hourly[h] < threshold
//! ```

use crate::aggregate::{CategoryFilter, UsageAggregator};
use crate::registry::DeviceRegistry;
use crate::types::{AbsenceProfile, HourlyCounts, RoutineCorpus, HOURS_PER_DAY};
use tracing::debug;

/// Device categories whose activity implies someone is home
pub const PRESENCE_CATEGORIES: [&str; 5] = [
    "Light",
    "MotionSensor",
    "SmartPlug",
    "PresenceSensor",
    "Television",
];

/// Absence detector over presence-device usage
pub struct AbsenceDetector;

impl AbsenceDetector {
    /// Filter for presence-indicative categories
    pub fn presence_filter() -> CategoryFilter {
        CategoryFilter::only(PRESENCE_CATEGORIES)
    }

    /// Aggregate presence-device usage per hour and flag quiet hours
    pub fn detect(corpus: &RoutineCorpus, registry: &DeviceRegistry) -> AbsenceProfile {
        let tables = UsageAggregator::aggregate(corpus, registry, &Self::presence_filter());
        let profile = Self::from_hourly(*tables.by_hour());
        debug!(
            observations = tables.total_observations(),
            threshold = profile.threshold,
            absence_hours = ?profile.absence_hours,
            "computed absence profile"
        );
        profile
    }

    /// Flag hours strictly below `mean - std_dev` of the given hourly counts
    pub fn from_hourly(hourly: HourlyCounts) -> AbsenceProfile {
        let (mean, std_dev) = population_stats(&hourly);
        let threshold = mean - std_dev;

        let absence_hours = hourly
            .iter()
            .enumerate()
            .filter(|(_, count)| (**count as f64) < threshold)
            .map(|(hour, _)| hour as u8)
            .collect();

        AbsenceProfile {
            hourly,
            mean,
            std_dev,
            threshold,
            absence_hours,
        }
    }
}

/// Mean and population standard deviation of the hourly bins
fn population_stats(hourly: &HourlyCounts) -> (f64, f64) {
    let n = HOURS_PER_DAY as f64;
    let mean = hourly.iter().map(|&c| c as f64).sum::<f64>() / n;
    let variance = hourly
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}
