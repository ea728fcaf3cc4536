//! Device diversity index
//!
//! Formula: `distinct_categories / total_observations`, 0 when nothing was observed.

use crate::aggregate::UsageTables;
use std::collections::HashSet;

/// Diversity index of aggregated usage tables
pub fn diversity_index(tables: &UsageTables) -> f64 {
    compute_diversity(tables.distinct_categories(), tables.total_observations())
}

/// Diversity index of a raw list of resolved category names (one per observation)
pub fn diversity_of_names<'a, I>(names: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    let mut distinct = HashSet::new();
    let mut total = 0u64;
    for name in names {
        distinct.insert(name);
        total += 1;
    }
    compute_diversity(distinct.len(), total)
}

fn compute_diversity(distinct: usize, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (distinct as f64 / total as f64).clamp(0.0, 1.0)
}
