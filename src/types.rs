//! Core data types for Routine Insights
//!
//! These types represent the data flowing through the analysis pipeline:
//! RoutineCorpus → UsageTables → {DiversityIndex, AbsenceProfile, RankedDevice} → CountryReport

use serde::{Deserialize, Serialize};

/// Number of hour-of-day buckets
pub const HOURS_PER_DAY: usize = 24;

/// Category assigned to device codes absent from the registry
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Explicit "no device" category defined by the standard registry
pub const NONE_CATEGORY: &str = "None";

/// Numeric device code as written in routine corpora and registries
pub type DeviceCode = i64;

/// Counts indexed by hour of day (0-23)
pub type HourlyCounts = [u64; HOURS_PER_DAY];

/// Devices active during a single timestep (unordered)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestepRecord {
    pub devices: Vec<DeviceCode>,
}

impl TimestepRecord {
    pub fn new(devices: Vec<DeviceCode>) -> Self {
        Self { devices }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Ordered log of per-timestep device activity for one country.
///
/// The position of a record is its timestep index; an empty record means no
/// device was active during that timestep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineCorpus {
    timesteps: Vec<TimestepRecord>,
}

impl RoutineCorpus {
    pub fn new(timesteps: Vec<TimestepRecord>) -> Self {
        Self { timesteps }
    }

    /// Build a corpus from raw code lists, one per timestep
    pub fn from_codes<I>(timesteps: I) -> Self
    where
        I: IntoIterator<Item = Vec<DeviceCode>>,
    {
        Self {
            timesteps: timesteps.into_iter().map(TimestepRecord::new).collect(),
        }
    }

    /// Number of timesteps (including empty ones)
    pub fn len(&self) -> usize {
        self.timesteps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }

    pub fn timesteps(&self) -> &[TimestepRecord] {
        &self.timesteps
    }

    /// Iterate `(timestep_index, record)` pairs in corpus order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TimestepRecord)> {
        self.timesteps.iter().enumerate()
    }

    /// Total number of `(timestep, device)` pairs
    pub fn observation_count(&self) -> usize {
        self.timesteps.iter().map(|t| t.devices.len()).sum()
    }
}

/// Total usage of one device category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCount {
    pub device: String,
    pub count: u64,
}

/// Hour-of-day usage series of one device category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHourlyUsage {
    pub device: String,
    pub hourly: HourlyCounts,
}

/// Presence-device activity per hour and the hours flagged as likely absence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceProfile {
    /// Presence-device observations per hour of day (zero-filled)
    pub hourly: HourlyCounts,
    /// Mean of the 24 hourly counts
    pub mean: f64,
    /// Population standard deviation of the 24 hourly counts
    pub std_dev: f64,
    /// `mean - std_dev`
    pub threshold: f64,
    /// Hours whose count is strictly below the threshold, ascending
    pub absence_hours: Vec<u8>,
}

/// One entry of a top-N usage ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedDevice {
    /// 1-based position in the ranking
    pub rank: usize,
    pub device: String,
    pub count: u64,
}

/// Full analysis result for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryReport {
    pub country: String,
    /// Number of timesteps in the corpus
    pub timesteps: usize,
    /// Number of `(timestep, device)` observations counted
    pub total_observations: u64,
    /// All observations per hour of day
    pub by_hour: HourlyCounts,
    /// Observations per device category, in discovery order
    pub by_device: Vec<DeviceCount>,
    /// Hourly series per device category, in discovery order
    pub by_device_hour: Vec<DeviceHourlyUsage>,
    /// Distinct categories / total observations
    pub diversity_index: f64,
    pub absence: AbsenceProfile,
    pub top_devices: Vec<RankedDevice>,
}
