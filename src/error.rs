//! Error types for buffer operations

use thiserror::Error;

/// Error type for buffer operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("capacity exceeded: need {0} bytes, capacity {1}")]
    CapacityExceeded(usize, usize), // needed, capacity
    #[error("index out of bounds: {0} >= {1}")]
    InvalidIndex(usize, usize), // index, capacity
    #[error("bit access already active")]
    BitAccessActive,
    #[error("bit access not active")]
    BitAccessInactive,
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}
