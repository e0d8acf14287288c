//! The cross-core coherence engine.
//!
//! This module owns exactly one primitive, `peer_transition`, which every
//! MESI transition in the driver is built from. It takes the whole fleet
//! of caches so it can mutate sibling caches while servicing one core's
//! access.

use crate::cache::Cache;
use crate::state::MesiState;

/// For every core other than `requesting_core`, look up `tag` in the set at
/// `index`; if that peer holds it in `from_state`, transition it to
/// `to_state`. All peers are visited unconditionally (no short-circuit on
/// the first match), so one call drives every affected peer atomically.
///
/// Returns `true` if at least one peer matched `from_state` (i.e. the block
/// was sourceable from another cache rather than memory-only).
pub fn peer_transition(
    fleet: &mut [Cache],
    requesting_core: usize,
    from_state: MesiState,
    to_state: MesiState,
    tag: u64,
    index: usize,
) -> bool {
    let mut sourced = false;
    for (core_id, cache) in fleet.iter_mut().enumerate() {
        if core_id == requesting_core {
            continue;
        }
        if let Some(pos) = cache.lookup(index, tag) {
            let line = cache.set_mut(index).get_mut(pos);
            if line.state == from_state {
                line.state = to_state;
                sourced = true;
            }
        }
    }
    sourced
}

/// Run the fixed three-transition peer probe for a Load miss and report
/// whether the block was found sourceable from any peer cache (in which
/// case the requester installs `Shared`; otherwise `Exclusive`).
pub fn probe_load_miss(
    fleet: &mut [Cache],
    requesting_core: usize,
    tag: u64,
    index: usize,
) -> bool {
    let from_modified = peer_transition(
        fleet,
        requesting_core,
        MesiState::Modified,
        MesiState::Shared,
        tag,
        index,
    );
    let from_exclusive = peer_transition(
        fleet,
        requesting_core,
        MesiState::Exclusive,
        MesiState::Shared,
        tag,
        index,
    );
    let from_shared = peer_transition(
        fleet,
        requesting_core,
        MesiState::Shared,
        MesiState::Shared,
        tag,
        index,
    );
    from_modified || from_exclusive || from_shared
}

/// Run the fixed three-transition peer probe for a Store miss
/// (write-allocate): invalidate any peer copy regardless of its state.
/// The requester always installs `Modified`.
pub fn probe_store_miss(fleet: &mut [Cache], requesting_core: usize, tag: u64, index: usize) {
    peer_transition(
        fleet,
        requesting_core,
        MesiState::Modified,
        MesiState::Invalid,
        tag,
        index,
    );
    peer_transition(
        fleet,
        requesting_core,
        MesiState::Shared,
        MesiState::Invalid,
        tag,
        index,
    );
    peer_transition(
        fleet,
        requesting_core,
        MesiState::Exclusive,
        MesiState::Invalid,
        tag,
        index,
    );
}

/// Invalidate peers holding `tag` in `Shared`, for a local write hit on a
/// `Shared` line. Returns whether any peer was actually invalidated, so the
/// caller can decide whether to charge a broadcast.
pub fn invalidate_shared_peers(
    fleet: &mut [Cache],
    requesting_core: usize,
    tag: u64,
    index: usize,
) -> bool {
    peer_transition(
        fleet,
        requesting_core,
        MesiState::Shared,
        MesiState::Invalid,
        tag,
        index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn two_core_fleet() -> Vec<Cache> {
        let cfg = SimConfig {
            num_cores: 2,
            cache_size_bytes: 16,
            block_size_bytes: 16,
            associativity: 1,
            word_size_bytes: 4,
        };
        vec![Cache::new(0, &cfg), Cache::new(1, &cfg)]
    }

    #[test]
    fn peer_transition_visits_all_peers() {
        let mut fleet = two_core_fleet();
        fleet[1].install(0, 0xAB, MesiState::Exclusive);
        let sourced = peer_transition(
            &mut fleet,
            0,
            MesiState::Exclusive,
            MesiState::Shared,
            0xAB,
            0,
        );
        assert!(sourced);
        assert_eq!(fleet[1].set(0).get(0).state, MesiState::Shared);
    }

    #[test]
    fn peer_transition_no_match_returns_false() {
        let mut fleet = two_core_fleet();
        let sourced = peer_transition(
            &mut fleet,
            0,
            MesiState::Exclusive,
            MesiState::Shared,
            0xAB,
            0,
        );
        assert!(!sourced);
    }

    #[test]
    fn probe_load_miss_prefers_shared_when_sourceable() {
        let mut fleet = two_core_fleet();
        fleet[1].install(0, 0x1, MesiState::Modified);
        let sourceable = probe_load_miss(&mut fleet, 0, 0x1, 0);
        assert!(sourceable);
        assert_eq!(fleet[1].set(0).get(0).state, MesiState::Shared);
    }

    #[test]
    fn probe_store_miss_invalidates_every_peer_state() {
        let mut fleet = two_core_fleet();
        fleet[1].install(0, 0x1, MesiState::Shared);
        probe_store_miss(&mut fleet, 0, 0x1, 0);
        assert_eq!(fleet[1].set(0).get(0).state, MesiState::Invalid);
    }
}
