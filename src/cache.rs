//! A single per-core set-associative cache.

use crate::config::SimConfig;
use crate::set::Set;
use crate::state::{Line, MesiState};

/// Decoded `(set index, tag)` pair for an address, per the cache's
/// geometry (I6: `index = (addr & index_mask) >> index_shift`,
/// `tag = addr >> (index_shift + log2(n_sets))`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub index: usize,
    pub tag: u64,
}

/// One core's unified, set-associative cache.
///
/// The cache owns its sets and, transitively, every `Line` inside them.
/// Nothing outside `Cache` holds a `Line` directly; peers are reached by
/// indexing a fleet of `Cache`s by core id (see `Simulator`).
#[derive(Debug, Clone)]
pub struct Cache {
    pub core_id: usize,
    pub associativity: usize,
    index_mask: u64,
    index_shift: u32,
    index_bits: u32,
    sets: Vec<Set>,
}

impl Cache {
    pub fn new(core_id: usize, config: &SimConfig) -> Self {
        let n_sets = config.n_sets();
        Self {
            core_id,
            associativity: config.associativity,
            index_mask: config.index_mask(),
            index_shift: config.index_shift(),
            index_bits: config.index_bits(),
            sets: (0..n_sets).map(|_| Set::new()).collect(),
        }
    }

    pub fn n_sets(&self) -> usize {
        self.sets.len()
    }

    /// Decode a byte address into `(set index, tag)` (I6).
    pub fn decode(&self, addr: u64) -> Decoded {
        let index = ((addr & self.index_mask) >> self.index_shift) as usize;
        let tag = addr >> (self.index_shift + self.index_bits);
        Decoded { index, tag }
    }

    pub fn set(&self, index: usize) -> &Set {
        &self.sets[index]
    }

    pub fn set_mut(&mut self, index: usize) -> &mut Set {
        &mut self.sets[index]
    }

    /// Linear scan of the set at `index` for `tag`; uniqueness of tags
    /// within a set (I4) makes the first match the only match.
    pub fn lookup(&self, index: usize, tag: u64) -> Option<usize> {
        self.sets[index].find(tag)
    }

    /// Install a new line at MRU. Caller must guarantee
    /// `set.len() < associativity`; otherwise use
    /// [`Cache::evict_then_install`].
    pub fn install(&mut self, index: usize, tag: u64, state: MesiState) {
        debug_assert!(self.sets[index].len() < self.associativity);
        self.sets[index].insert_head(Line::new(tag, state));
    }

    /// Evict the LRU line from the set at `index`, returning it.
    pub fn evict(&mut self, index: usize) -> Line {
        self.sets[index].evict_lru()
    }

    /// Evict the LRU line from the set at `index`, returning it, then
    /// install the new line at MRU.
    pub fn evict_then_install(&mut self, index: usize, tag: u64, state: MesiState) -> Line {
        let victim = self.evict(index);
        self.sets[index].insert_head(Line::new(tag, state));
        victim
    }

    /// Iterate over every `(set index, line)` pair, for flush.
    pub fn iter_lines(&self) -> impl Iterator<Item = (usize, &Line)> {
        self.sets
            .iter()
            .enumerate()
            .flat_map(|(i, set)| set.iter().map(move |line| (i, line)))
    }

    /// Check invariants P2: every set within associativity and tags
    /// distinct. Intended for tests / debug assertions, not the hot path.
    #[cfg(test)]
    pub fn check_set_bounds(&self) -> bool {
        self.sets.iter().all(|set| {
            if set.len() > self.associativity {
                return false;
            }
            let mut seen = std::collections::HashSet::new();
            set.iter().all(|line| seen.insert(line.tag))
        })
    }
}
