use thiserror::Error;

/// Recoverable errors returned by collection operations.
///
/// Broken invariants are not represented here: they abort the execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Index out of bounds: the len is {len} but the index is {index}")]
    IndexOutOfBounds { index: u32, len: u32 },
}
