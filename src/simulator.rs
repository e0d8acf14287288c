//! The top-level simulator: owns the fleet of per-core caches and their
//! statistics, and drives one access at a time through the MESI protocol.

use log::trace;

use crate::cache::Cache;
use crate::coherence;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::event::{AccessEvent, AccessOp};
use crate::stats::{AggregateStat, CacheStat};
use crate::state::MesiState;

/// Owns every per-core cache ("the fleet") plus per-core statistics for one
/// simulation run.
///
/// There is no global mutable state: a `Simulator` is an ordinary owned
/// value, constructed with [`Simulator::new`] and dropped like anything
/// else. Peer caches are reached by indexing `self.caches`, which is the
/// only way the coherence engine can mutate sibling state while servicing
/// one core's access.
pub struct Simulator {
    config: SimConfig,
    caches: Vec<Cache>,
    stats: Vec<CacheStat>,
    flushed: bool,
}

impl Simulator {
    /// Build a simulator for `config`. Returns a [`SimError::Config`] if the
    /// geometry is not realizable.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let caches = (0..config.num_cores)
            .map(|id| Cache::new(id, &config))
            .collect();
        let stats = vec![CacheStat::default(); config.num_cores];
        Ok(Self {
            config,
            caches,
            stats,
            flushed: false,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn stats(&self) -> &[CacheStat] {
        &self.stats
    }

    pub fn aggregate(&self) -> AggregateStat {
        AggregateStat::from_per_core(&self.stats)
    }

    /// Process one access event, driving the local cache and the cross-core
    /// coherence engine per the MESI transitions in the core design.
    pub fn perform_access(&mut self, event: AccessEvent) -> SimResult<()> {
        self.perform(event.core_id, event.address, event.op)
    }

    /// Process one access, decoded out to its components. `event_index` is
    /// the position of this access in whatever stream is driving the
    /// simulator, reported in the error if `core_id` is out of range.
    pub fn perform_access_at(
        &mut self,
        event: AccessEvent,
        event_index: usize,
    ) -> SimResult<()> {
        if event.core_id >= self.caches.len() {
            return Err(SimError::EventDecode {
                line: event_index,
                message: format!(
                    "core id {} out of range (num_cores = {})",
                    event.core_id,
                    self.caches.len()
                ),
            });
        }
        self.perform_access(event)
    }

    fn perform(&mut self, core: usize, addr: u64, op: AccessOp) -> SimResult<()> {
        if core >= self.caches.len() {
            return Err(SimError::Invariant(format!(
                "perform called with out-of-range core {core}"
            )));
        }

        self.stats[core].accesses += 1;
        let words_per_block = self.config.words_per_block() as u64;
        let decoded = self.caches[core].decode(addr);
        let (index, tag) = (decoded.index, decoded.tag);

        let existing = self.caches[core].lookup(index, tag);

        match existing {
            None if self.caches[core].set(index).is_empty() => {
                // Compulsory miss.
                trace!("core {core} compulsory miss at addr {addr:#x}");
                self.charge_miss(core, words_per_block);
                self.install_miss(core, index, tag, op);
            }
            Some(pos) if self.caches[core].set(index).get(pos).state != MesiState::Invalid => {
                self.handle_hit(core, index, pos, op)?;
            }
            _ => {
                // Either no matching tag, or a matching tag that is
                // Invalid (not a usable hit) — both are misses.
                trace!("core {core} miss at addr {addr:#x}");
                self.charge_miss(core, words_per_block);
                // A stale Invalid line with this tag may still occupy a
                // slot (peer invalidation only flips state, it does not
                // unlink). Reclaim that slot directly rather than install
                // a second line with the same tag, which would violate I4.
                if let Some(stale_pos) = existing {
                    self.caches[core].set_mut(index).unlink(stale_pos);
                }
                if self.caches[core].set(index).len() < self.caches[core].associativity {
                    self.install_miss(core, index, tag, op);
                } else {
                    self.stats[core].replacements += 1;
                    let state = self.resolve_miss_state(core, index, tag, op);
                    let victim = self.caches[core].evict_then_install(index, tag, state);
                    if victim.state == MesiState::Modified {
                        self.stats[core].copies_back += words_per_block;
                    }
                }
            }
        }
        Ok(())
    }

    fn charge_miss(&mut self, core: usize, words_per_block: u64) {
        self.stats[core].misses += 1;
        self.stats[core].broadcasts += 1;
        self.stats[core].demand_fetches += words_per_block;
    }

    /// Run the peer probe for a miss and report the state the requester
    /// should install the new line in.
    fn resolve_miss_state(&mut self, core: usize, index: usize, tag: u64, op: AccessOp) -> MesiState {
        match op {
            AccessOp::Load => {
                let sourceable = coherence::probe_load_miss(&mut self.caches, core, tag, index);
                if sourceable {
                    MesiState::Shared
                } else {
                    MesiState::Exclusive
                }
            }
            AccessOp::Store => {
                coherence::probe_store_miss(&mut self.caches, core, tag, index);
                MesiState::Modified
            }
        }
    }

    /// Install a freshly-allocated line (room already guaranteed by the
    /// caller) with state derived from the peer probe.
    fn install_miss(&mut self, core: usize, index: usize, tag: u64, op: AccessOp) {
        let state = self.resolve_miss_state(core, index, tag, op);
        self.caches[core].install(index, tag, state);
    }

    fn handle_hit(
        &mut self,
        core: usize,
        index: usize,
        pos: usize,
        op: AccessOp,
    ) -> SimResult<()> {
        let tag = self.caches[core].set(index).get(pos).tag;
        match op {
            AccessOp::Load => {
                self.caches[core].set_mut(index).access_touch(pos);
            }
            AccessOp::Store => {
                let was_shared =
                    self.caches[core].set(index).get(pos).state == MesiState::Shared;
                if was_shared {
                    coherence::invalidate_shared_peers(&mut self.caches, core, tag, index);
                    self.stats[core].broadcasts += 1;
                }
                self.caches[core].set_mut(index).get_mut(pos).state = MesiState::Modified;
                self.caches[core].set_mut(index).access_touch(pos);
            }
        }
        Ok(())
    }

    /// Walk every (core, set, line) exactly once, charging a writeback for
    /// every `Modified` line. Idempotent: a second call is a no-op, even
    /// though callers are expected to invoke this exactly once at the end
    /// of a run.
    pub fn flush(&mut self) {
        if self.flushed {
            return;
        }
        let words_per_block = self.config.words_per_block() as u64;
        for (core, cache) in self.caches.iter().enumerate() {
            let modified_lines = cache
                .iter_lines()
                .filter(|(_, line)| line.state == MesiState::Modified)
                .count() as u64;
            self.stats[core].copies_back += modified_lines * words_per_block;
        }
        self.flushed = true;
    }

    /// Access to the fleet, for invariant checks in tests.
    #[cfg(test)]
    pub fn caches(&self) -> &[Cache] {
        &self.caches
    }
}

/// Cross-core consistency over every block currently cached anywhere in the
/// fleet (I1–I3): at most one core may hold a block `Modified` or
/// `Exclusive`, and when one does, no other core may hold anything but
/// `Invalid` for that block.
#[cfg(test)]
fn check_global_consistency(caches: &[Cache]) -> bool {
    use std::collections::HashMap;
    let mut by_block: HashMap<(usize, u64), Vec<MesiState>> = HashMap::new();
    for cache in caches {
        for (index, line) in cache.iter_lines() {
            if line.state != MesiState::Invalid {
                by_block.entry((index, line.tag)).or_default().push(line.state);
            }
        }
    }
    by_block.values().all(|states| {
        let modified = states.iter().filter(|s| **s == MesiState::Modified).count();
        let exclusive = states.iter().filter(|s| **s == MesiState::Exclusive).count();
        if modified > 1 || exclusive > 1 {
            return false;
        }
        if modified + exclusive >= 1 {
            return states.len() == 1;
        }
        true
    })
}
