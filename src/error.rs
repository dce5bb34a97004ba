//! Errors raised when a compiled-in fix table is inconsistent.
//!
//! None of these can occur with a table produced by the generator; they mean
//! the embedded artifact is corrupt.

/// A matched fix whose operations do not fit its declared sizes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("fix for {map}: patch range {index}+{count} exceeds {len} table entries")]
    PatchRangeOutOfBounds {
        map: String,
        index: u32,
        count: u32,
        len: usize,
    },

    #[error("fix for {map}: copy of {size} bytes at {offset} exceeds original size {old_size}")]
    CopyOutOfBounds {
        map: String,
        offset: u32,
        size: u32,
        old_size: usize,
    },

    #[error("fix for {map}: literal of {size} bytes at {offset} exceeds pool size {pool_size}")]
    LiteralOutOfBounds {
        map: String,
        offset: u32,
        size: u32,
        pool_size: usize,
    },

    #[error("fix for {map}: run value {value} is not a byte")]
    InvalidRunByte { map: String, value: u32 },

    #[error("fix for {map}: operations write past declared size {new_size}")]
    OutputOverflow { map: String, new_size: u32 },

    #[error("fix for {map}: operations produce {actual} bytes, declared {expected}")]
    LengthMismatch {
        map: String,
        expected: u32,
        actual: usize,
    },

    #[error("fix table is not sorted at entry {index} ({map})")]
    UnsortedTable { index: usize, map: String },
}
