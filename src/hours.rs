//! Hour-of-day binning
//!
//! Timesteps are hourly and start at midnight, so the hour of a record is a
//! pure function of its position in the corpus.

use crate::types::HOURS_PER_DAY;

/// Hour-of-day bucket (0-23) for an absolute timestep index
pub fn hour_of(timestep_index: usize) -> usize {
    timestep_index % HOURS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_day_maps_to_itself() {
        for i in 0..HOURS_PER_DAY {
            assert_eq!(hour_of(i), i);
        }
    }

    #[test]
    fn test_wraps_every_day() {
        assert_eq!(hour_of(24), 0);
        assert_eq!(hour_of(25), 1);
        assert_eq!(hour_of(24 * 7 + 23), 23);
    }
}
