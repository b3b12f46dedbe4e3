//! Error taxonomy for map operations.

use thiserror::Error;

/// Failure of a map, handle, or cursor operation.
///
/// All failures are synchronous and local: a failed operation never
/// partially applies. In particular `len` and bucket state only change
/// after the change hook has accepted the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    /// The entry handle does not refer to a live bucket of this map.
    ///
    /// Handles only go dead through the chain-truncation path of `clear`,
    /// or when used against a map other than their owner.
    #[error("entry handle does not refer to a live bucket")]
    InvalidEntry,

    /// Mutation attempted through a read-only handle or cursor.
    #[error("mutation is not permitted through a read-only view")]
    NotPermitted,

    /// The change hook declined the mutation; the map is unchanged.
    #[error("mutation rejected by the change hook")]
    Rejected,

    /// Cursor removal before any advance, or twice for the same position.
    #[error("cursor has no current entry")]
    NoCurrent,
}
