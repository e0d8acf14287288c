//! The access event type consumed by the simulator.

use serde::{Deserialize, Serialize};

/// The operation carried by an access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessOp {
    Load,
    Store,
}

impl AccessOp {
    /// Parse a load/store token from trace text. Accepts `load`/`store`,
    /// their single-letter abbreviations `l`/`s`, and is case-insensitive.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "load" | "l" | "read" | "r" => Some(AccessOp::Load),
            "store" | "s" | "write" | "w" => Some(AccessOp::Store),
            _ => None,
        }
    }
}

/// One memory access: which core issued it, the byte address touched, and
/// whether it was a load or a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub core_id: usize,
    pub address: u64,
    pub op: AccessOp,
}
