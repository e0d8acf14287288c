//! Cache geometry configuration and validation.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Upper bound on the number of simulated cores.
pub const MAX_CORES: usize = 8;

/// Geometry shared by every per-core cache in a run.
///
/// `SimConfig` is validated eagerly by [`SimConfig::validate`]; nothing
/// downstream re-checks these invariants, so a `SimConfig` that has passed
/// validation may be assumed realizable everywhere else in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of independent per-core caches, 1..=[`MAX_CORES`].
    pub num_cores: usize,
    /// Unified cache size per core, in bytes. Must be a power of two.
    pub cache_size_bytes: usize,
    /// Block (cache line) size, in bytes. Must be a power of two and at
    /// least `word_size_bytes`.
    pub block_size_bytes: usize,
    /// Ways per set. Must be a power of two and divide
    /// `cache_size_bytes / block_size_bytes`.
    pub associativity: usize,
    /// Bytes per word; traffic counters are denominated in words.
    pub word_size_bytes: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_cores: 1,
            cache_size_bytes: 32 * 1024,
            block_size_bytes: 32,
            associativity: 4,
            word_size_bytes: 4,
        }
    }
}

fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

impl SimConfig {
    /// Number of blocks per set's governing set count (`n_sets`).
    ///
    /// Only meaningful after [`SimConfig::validate`] has succeeded.
    pub fn n_sets(&self) -> usize {
        self.cache_size_bytes / self.block_size_bytes / self.associativity
    }

    /// Words transferred per block (demand fetch / writeback granularity).
    pub fn words_per_block(&self) -> usize {
        self.block_size_bytes / self.word_size_bytes
    }

    /// Check that this configuration describes a realizable cache geometry.
    ///
    /// This is the single place invalid geometry is rejected; every other
    /// module trusts a `SimConfig` it is handed.
    pub fn validate(&self) -> SimResult<()> {
        if self.num_cores == 0 || self.num_cores > MAX_CORES {
            return Err(SimError::Config(format!(
                "num_cores must be between 1 and {MAX_CORES}, got {}",
                self.num_cores
            )));
        }
        if self.word_size_bytes == 0 || !is_power_of_two(self.word_size_bytes) {
            return Err(SimError::Config(format!(
                "word_size_bytes must be a nonzero power of two, got {}",
                self.word_size_bytes
            )));
        }
        if !is_power_of_two(self.block_size_bytes) {
            return Err(SimError::Config(format!(
                "block_size_bytes must be a power of two, got {}",
                self.block_size_bytes
            )));
        }
        if self.block_size_bytes < self.word_size_bytes {
            return Err(SimError::Config(format!(
                "block_size_bytes ({}) must be >= word_size_bytes ({})",
                self.block_size_bytes, self.word_size_bytes
            )));
        }
        if !is_power_of_two(self.cache_size_bytes) {
            return Err(SimError::Config(format!(
                "cache_size_bytes must be a power of two, got {}",
                self.cache_size_bytes
            )));
        }
        if self.associativity == 0 || !is_power_of_two(self.associativity) {
            return Err(SimError::Config(format!(
                "associativity must be a nonzero power of two, got {}",
                self.associativity
            )));
        }
        if self.cache_size_bytes < self.block_size_bytes {
            return Err(SimError::Config(
                "cache_size_bytes must be >= block_size_bytes".to_string(),
            ));
        }
        let blocks_total = self.cache_size_bytes / self.block_size_bytes;
        if blocks_total % self.associativity != 0 {
            return Err(SimError::Config(format!(
                "associativity ({}) must divide cache_size_bytes/block_size_bytes ({})",
                self.associativity, blocks_total
            )));
        }
        let n_sets = blocks_total / self.associativity;
        if !is_power_of_two(n_sets) {
            return Err(SimError::Config(format!(
                "derived n_sets ({n_sets}) must be a power of two"
            )));
        }
        Ok(())
    }

    /// `log2` of `n_sets`, used by address decoding. Only valid after
    /// [`SimConfig::validate`].
    pub(crate) fn index_bits(&self) -> u32 {
        self.n_sets().trailing_zeros()
    }

    /// `log2` of `block_size_bytes`, the address bit offset into a block.
    pub(crate) fn index_shift(&self) -> u32 {
        self.block_size_bytes.trailing_zeros()
    }

    /// Mask selecting the set-index bits out of a byte address.
    pub(crate) fn index_mask(&self) -> u64 {
        ((self.n_sets() as u64) - 1) << self.index_shift()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two_cache_size() {
        let cfg = SimConfig {
            cache_size_bytes: 100,
            ..SimConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_zero_associativity() {
        let cfg = SimConfig {
            associativity: 0,
            ..SimConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_associativity_not_dividing_block_count() {
        let cfg = SimConfig {
            cache_size_bytes: 64,
            block_size_bytes: 16,
            associativity: 8,
            ..SimConfig::default()
        };
        // 64/16 = 4 blocks total, associativity 8 does not divide it.
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_too_many_cores() {
        let cfg = SimConfig {
            num_cores: MAX_CORES + 1,
            ..SimConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn accepts_single_set_single_way() {
        let cfg = SimConfig {
            cache_size_bytes: 16,
            block_size_bytes: 16,
            associativity: 1,
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.n_sets(), 1);
    }

    #[test]
    fn words_per_block_is_block_over_word() {
        let cfg = SimConfig {
            block_size_bytes: 16,
            word_size_bytes: 4,
            ..SimConfig::default()
        };
        assert_eq!(cfg.words_per_block(), 4);
    }
}
