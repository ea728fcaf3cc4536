//! Usage aggregation
//!
//! Reduces a routine corpus into count tables keyed by hour of day, by device
//! category, and by the (device, hour) pair. Every device code is resolved
//! through the registry first, so unregistered codes are counted under
//! "Unknown" unless the filter drops them.

use crate::hours::hour_of;
use crate::registry::DeviceRegistry;
use crate::types::{DeviceCount, DeviceHourlyUsage, HourlyCounts, RoutineCorpus, HOURS_PER_DAY};
use std::collections::{BTreeSet, HashMap};

/// Selects which device categories take part in an aggregation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Count every observation
    #[default]
    All,
    /// Count only the listed categories
    Only(BTreeSet<String>),
    /// Count everything except the listed categories
    Except(BTreeSet<String>),
}

impl CategoryFilter {
    pub fn only<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryFilter::Only(categories.into_iter().map(Into::into).collect())
    }

    pub fn except<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryFilter::Except(categories.into_iter().map(Into::into).collect())
    }

    /// Whether observations of `category` pass the filter
    pub fn admits(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(allowed) => allowed.contains(category),
            CategoryFilter::Except(excluded) => !excluded.contains(category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DeviceEntry {
    name: String,
    total: u64,
    hourly: HourlyCounts,
}

/// Count tables produced by [`UsageAggregator`].
///
/// Devices are kept in the order they were first seen while walking the
/// corpus, which is the tie-break order used by rankings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTables {
    by_hour: HourlyCounts,
    devices: Vec<DeviceEntry>,
    index: HashMap<String, usize>,
    total_observations: u64,
}

impl Default for UsageTables {
    fn default() -> Self {
        Self {
            by_hour: [0; HOURS_PER_DAY],
            devices: Vec::new(),
            index: HashMap::new(),
            total_observations: 0,
        }
    }
}

impl UsageTables {
    fn record(&mut self, category: &str, hour: usize) {
        let slot = match self.index.get(category).copied() {
            Some(slot) => slot,
            None => {
                self.devices.push(DeviceEntry {
                    name: category.to_string(),
                    total: 0,
                    hourly: [0; HOURS_PER_DAY],
                });
                self.index.insert(category.to_string(), self.devices.len() - 1);
                self.devices.len() - 1
            }
        };

        let entry = &mut self.devices[slot];
        entry.total += 1;
        entry.hourly[hour] += 1;
        self.by_hour[hour] += 1;
        self.total_observations += 1;
    }

    /// Observations per hour of day; hours without activity are zero
    pub fn by_hour(&self) -> &HourlyCounts {
        &self.by_hour
    }

    /// Observations per device category, in discovery order
    pub fn by_device(&self) -> Vec<DeviceCount> {
        self.devices
            .iter()
            .map(|d| DeviceCount {
                device: d.name.clone(),
                count: d.total,
            })
            .collect()
    }

    /// Hourly series per device category, in discovery order
    pub fn by_device_hour(&self) -> Vec<DeviceHourlyUsage> {
        self.devices
            .iter()
            .map(|d| DeviceHourlyUsage {
                device: d.name.clone(),
                hourly: d.hourly,
            })
            .collect()
    }

    /// Total observations of one category (0 if never seen)
    pub fn device_count(&self, category: &str) -> u64 {
        self.index
            .get(category)
            .map(|&slot| self.devices[slot].total)
            .unwrap_or(0)
    }

    /// Observations of one category during one hour (0 if never seen)
    pub fn device_hour_count(&self, category: &str, hour: usize) -> u64 {
        match (self.index.get(category), self.by_hour.get(hour)) {
            (Some(&slot), Some(_)) => self.devices[slot].hourly[hour],
            _ => 0,
        }
    }

    /// Hourly series of one category
    pub fn device_hourly(&self, category: &str) -> Option<&HourlyCounts> {
        self.index.get(category).map(|&slot| &self.devices[slot].hourly)
    }

    /// Categories in discovery order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|d| d.name.as_str())
    }

    /// Number of distinct categories observed
    pub fn distinct_categories(&self) -> usize {
        self.devices.len()
    }

    pub fn total_observations(&self) -> u64 {
        self.total_observations
    }
}

/// Builds [`UsageTables`] from a corpus and registry
pub struct UsageAggregator;

impl UsageAggregator {
    /// Aggregate every `(timestep, device)` pair whose resolved category passes `filter`
    pub fn aggregate(
        corpus: &RoutineCorpus,
        registry: &DeviceRegistry,
        filter: &CategoryFilter,
    ) -> UsageTables {
        let mut tables = UsageTables::default();

        for (timestep, record) in corpus.iter() {
            let hour = hour_of(timestep);
            for &code in &record.devices {
                let category = registry.code_to_name(code);
                if filter.admits(category) {
                    tables.record(category, hour);
                }
            }
        }

        tables
    }
}
