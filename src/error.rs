//! Error type shared by every tree operation.

/// Result type for tree operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by [`RbTree`](crate::RbTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The key is already stored. The tree was left untouched.
    #[error("tree already contains this key")]
    DuplicateKey,

    /// The node links contradict each other. Never expected from a tree
    /// built only through the public API.
    #[error("tree invariant violated: {0}")]
    InvariantViolation(&'static str),

    /// The arena has no free node index left.
    #[error("tree is full ({limit} nodes)")]
    CapacityExceeded { limit: usize },
}
