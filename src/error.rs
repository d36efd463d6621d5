//! Errors a caller can actually hit when building a classifier.
//!
//! Allocation failure isn't modeled here: the global allocator aborts the
//! process, so there is no `Result` path for it to take. What's left is
//! genuinely reachable precondition violations in the rule set a caller
//! handed us.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("dimension count {0} exceeds the maximum of {max}", max = crate::rule::MAX_DIM)]
    TooManyDimensions(usize),

    #[error("rule {name:?} has an invalid range in dimension {dim}: begin {begin} >= end {end}")]
    InvalidRange {
        name: String,
        dim: usize,
        begin: u32,
        end: u32,
    },

    #[error("max_dim {max_dim} is out of range for a {dims}-dimensional rule set")]
    MaxDimOutOfRange { max_dim: usize, dims: usize },
}
