//! Per-core and aggregate statistics counters.

use serde::{Deserialize, Serialize};

/// Counters for a single core, monotonic for the lifetime of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStat {
    pub accesses: u64,
    pub misses: u64,
    pub replacements: u64,
    /// Demand-fetch traffic, in words.
    pub demand_fetches: u64,
    /// Writeback traffic, in words (evictions plus end-of-run flush).
    pub copies_back: u64,
    pub broadcasts: u64,
}

impl CacheStat {
    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses as f64
        }
    }

    pub fn hit_rate(&self) -> f64 {
        1.0 - self.miss_rate()
    }
}

/// Roll-up of every core's counters, used for the aggregate report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub demand_fetches: u64,
    pub broadcasts: u64,
    pub copies_back: u64,
}

impl AggregateStat {
    pub fn from_per_core(stats: &[CacheStat]) -> Self {
        stats.iter().fold(AggregateStat::default(), |mut acc, s| {
            acc.demand_fetches += s.demand_fetches;
            acc.broadcasts += s.broadcasts;
            acc.copies_back += s.copies_back;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_rate_zero_accesses_is_zero() {
        let stat = CacheStat::default();
        assert_eq!(stat.miss_rate(), 0.0);
        assert_eq!(stat.hit_rate(), 1.0);
    }

    #[test]
    fn miss_rate_computed_correctly() {
        let stat = CacheStat {
            accesses: 4,
            misses: 3,
            ..Default::default()
        };
        assert_eq!(stat.miss_rate(), 0.75);
        assert_eq!(stat.hit_rate(), 0.25);
    }

    #[test]
    fn aggregate_sums_across_cores() {
        let stats = vec![
            CacheStat {
                demand_fetches: 4,
                broadcasts: 1,
                copies_back: 0,
                ..Default::default()
            },
            CacheStat {
                demand_fetches: 8,
                broadcasts: 2,
                copies_back: 4,
                ..Default::default()
            },
        ];
        let agg = AggregateStat::from_per_core(&stats);
        assert_eq!(agg.demand_fetches, 12);
        assert_eq!(agg.broadcasts, 3);
        assert_eq!(agg.copies_back, 4);
    }
}
