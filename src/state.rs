//! MESI coherence states and cache line representation.

/// The current MESI state of a cache line.
///
/// <pre>
///   M E S I
/// M ✗ ✗ ✗ ✓
/// E ✗ ✗ ✗ ✓
/// S ✗ ✗ ✓ ✓
/// I ✓ ✓ ✓ ✓
/// </pre>
/// (a row/column pair marked ✓ may coexist across cores for the same block)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MesiState {
    /// Dirty, held exclusively; must be written back before any other core
    /// may read the stale value it replaces.
    Modified,
    /// Clean, held exclusively; no peer holds this block.
    Exclusive,
    /// Clean; may also be held `Shared` by any number of peers.
    Shared,
    /// Not valid; effectively absent from this cache.
    Invalid,
}

/// A single cached block: its tag and coherence state.
///
/// A `Line`'s identity is `(owning core, set index, tag)`; the owning core
/// and set index are implicit in where the `Line` is stored, so only the
/// tag and state need to be carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub tag: u64,
    pub state: MesiState,
}

impl Line {
    pub fn new(tag: u64, state: MesiState) -> Self {
        Self { tag, state }
    }
}
