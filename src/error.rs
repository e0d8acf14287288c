//! Error types for the coherence simulator core.
//!
//! All errors here are terminal: the simulator has no recoverable error
//! path. A configuration error is fatal before the first access; an
//! event-decode error is fatal at the offending trace line; an invariant
//! violation indicates an implementation bug and aborts the run rather than
//! silently corrupting counters.

use thiserror::Error;

/// Errors produced by the simulator core.
#[derive(Debug, Error)]
pub enum SimError {
    /// Cache geometry could not be realized (non-power-of-two size, zero
    /// associativity, mismatched set count, etc).
    #[error("invalid cache configuration: {0}")]
    Config(String),

    /// A trace event could not be decoded.
    #[error("malformed access at trace line {line}: {message}")]
    EventDecode {
        /// 1-based line number in the trace file.
        line: usize,
        /// Human-readable description of what was wrong.
        message: String,
    },

    /// An invariant the simulator relies on was violated. This indicates a
    /// bug in the simulator itself, not bad input.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// Trace file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the core.
pub type SimResult<T> = Result<T, SimError>;
