//! Renders a finished run as human-readable text or as JSON.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::config::SimConfig;
use crate::stats::{AggregateStat, CacheStat};

/// Everything one run produces, in a shape that serializes cleanly to JSON
/// and renders cleanly as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub config: SimConfig,
    pub per_core: Vec<CacheStat>,
    pub aggregate: AggregateStat,
}

impl RunReport {
    pub fn new(config: SimConfig, per_core: Vec<CacheStat>) -> Self {
        let aggregate = AggregateStat::from_per_core(&per_core);
        Self {
            config,
            per_core,
            aggregate,
        }
    }

    /// Render as the fixed-width text report (the default format).
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "cores={} cache_size={}B block_size={}B associativity={} word_size={}B",
            self.config.num_cores,
            self.config.cache_size_bytes,
            self.config.block_size_bytes,
            self.config.associativity,
            self.config.word_size_bytes,
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<5} {:>10} {:>10} {:>9} {:>9} {:>12}",
            "core", "accesses", "misses", "miss%", "hit%", "replacements"
        );
        for (id, stat) in self.per_core.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<5} {:>10} {:>10} {:>8.2}% {:>8.2}% {:>12}",
                id,
                stat.accesses,
                stat.misses,
                stat.miss_rate() * 100.0,
                stat.hit_rate() * 100.0,
                stat.replacements,
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "aggregate: demand_fetches={} broadcasts={} copies_back={}",
            self.aggregate.demand_fetches, self.aggregate.broadcasts, self.aggregate.copies_back,
        );
        out
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        let config = SimConfig::default();
        let per_core = vec![CacheStat {
            accesses: 10,
            misses: 3,
            replacements: 1,
            demand_fetches: 12,
            copies_back: 4,
            broadcasts: 2,
        }];
        RunReport::new(config, per_core)
    }

    #[test]
    fn text_report_contains_core_row_and_aggregate() {
        let text = sample_report().to_text();
        assert!(text.contains("core"));
        assert!(text.contains("aggregate: demand_fetches=12 broadcasts=2 copies_back=4"));
    }

    #[test]
    fn json_report_round_trips() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.aggregate, report.aggregate);
        assert_eq!(parsed.per_core, report.per_core);
    }

    #[test]
    fn aggregate_reflects_single_core_sum() {
        let report = sample_report();
        assert_eq!(report.aggregate.demand_fetches, 12);
        assert_eq!(report.aggregate.broadcasts, 2);
        assert_eq!(report.aggregate.copies_back, 4);
    }
}
