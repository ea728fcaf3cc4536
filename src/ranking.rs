//! Top-N device ranking
//!
//! Orders device categories by total usage. Equal counts keep the order in
//! which the categories were first seen in the corpus, so the sort must be
//! stable.

use crate::aggregate::UsageTables;
use crate::types::{RankedDevice, NONE_CATEGORY, UNKNOWN_CATEGORY};
use std::cmp::Reverse;

/// Number of devices kept by default
pub const DEFAULT_TOP_N: usize = 10;

/// Categories that can be dropped from rankings on request
pub const SENTINEL_CATEGORIES: [&str; 2] = [UNKNOWN_CATEGORY, NONE_CATEGORY];

/// Ranks device categories by usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopNRanker {
    limit: usize,
    exclude_sentinels: bool,
}

impl Default for TopNRanker {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N, false)
    }
}

impl TopNRanker {
    pub fn new(limit: usize, exclude_sentinels: bool) -> Self {
        Self {
            limit,
            exclude_sentinels,
        }
    }

    /// Rank categories descending by count, keeping at most `limit` entries
    pub fn rank(&self, tables: &UsageTables) -> Vec<RankedDevice> {
        let mut counts: Vec<_> = tables
            .by_device()
            .into_iter()
            .filter(|d| !(self.exclude_sentinels && SENTINEL_CATEGORIES.contains(&d.device.as_str())))
            .collect();

        // `sort_by_key` is stable: ties stay in discovery order
        counts.sort_by_key(|d| Reverse(d.count));

        counts
            .into_iter()
            .take(self.limit)
            .enumerate()
            .map(|(i, d)| RankedDevice {
                rank: i + 1,
                device: d.device,
                count: d.count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{CategoryFilter, UsageAggregator};
    use crate::registry::DeviceRegistry;
    use crate::types::{DeviceCode, RoutineCorpus};
    use pretty_assertions::assert_eq;

    fn tables_for(timesteps: Vec<Vec<DeviceCode>>) -> UsageTables {
        UsageAggregator::aggregate(
            &RoutineCorpus::from_codes(timesteps),
            &DeviceRegistry::standard(),
            &CategoryFilter::All,
        )
    }

    fn names(ranking: &[RankedDevice]) -> Vec<&str> {
        ranking.iter().map(|d| d.device.as_str()).collect()
    }

    #[test]
    fn test_descending_with_ranks() {
        let tables = tables_for(vec![vec![13, 15], vec![13], vec![20, 13, 15]]);
        let ranking = TopNRanker::default().rank(&tables);

        assert_eq!(
            ranking,
            vec![
                RankedDevice { rank: 1, device: "Light".into(), count: 3 },
                RankedDevice { rank: 2, device: "MotionSensor".into(), count: 2 },
                RankedDevice { rank: 3, device: "PresenceSensor".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_occurrence_order() {
        // Oven(19), Fan(11), Washer(31) each used twice; Oven seen first
        let tables = tables_for(vec![vec![19, 11], vec![31], vec![31, 11, 19], vec![13, 13, 13]]);
        let ranking = TopNRanker::default().rank(&tables);

        assert_eq!(names(&ranking), vec!["Light", "Oven", "Fan", "Washer"]);
    }

    #[test]
    fn test_limit_caps_length() {
        let timesteps: Vec<Vec<DeviceCode>> = (0..20).map(|code| vec![code]).collect();
        let tables = tables_for(timesteps);

        let ranking = TopNRanker::default().rank(&tables);
        assert_eq!(ranking.len(), DEFAULT_TOP_N);
        // All counts equal, so the first ten codes in corpus order win
        assert_eq!(ranking[0].device, "AirConditioner");
        assert_eq!(ranking[9].device, "Dryer");

        assert_eq!(TopNRanker::new(3, false).rank(&tables).len(), 3);
    }

    #[test]
    fn test_fewer_categories_than_limit() {
        let tables = tables_for(vec![vec![13], vec![15]]);
        assert_eq!(TopNRanker::default().rank(&tables).len(), 2);
        assert!(TopNRanker::default().rank(&tables_for(vec![])).is_empty());
    }

    #[test]
    fn test_sentinel_exclusion() {
        let tables = tables_for(vec![vec![99, 99, 99], vec![17, 17], vec![13]]);

        let kept = TopNRanker::new(DEFAULT_TOP_N, false).rank(&tables);
        assert_eq!(names(&kept), vec![UNKNOWN_CATEGORY, NONE_CATEGORY, "Light"]);

        let dropped = TopNRanker::new(DEFAULT_TOP_N, true).rank(&tables);
        assert_eq!(names(&dropped), vec!["Light"]);
        assert_eq!(dropped[0].rank, 1);
    }
}
