//! Crate-level error types.
//!
//! Errors are plain enums with manual `Display`/`Error` impls and `From`
//! conversions between layers, rather than a derive-macro crate. Policy
//! rejections are *not* represented here: those are values returned
//! from the minting pipeline, never errors.

use std::fmt;

/// Errors raised while sealing or validating a single block.
#[derive(Debug)]
pub enum BlockError {
    Seal(crate::types::block::SealError),
    Invalid(Vec<String>),
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::Seal(e) => write!(f, "{e}"),
            BlockError::Invalid(errs) => write!(f, "invalid block: {}", errs.join("; ")),
        }
    }
}
impl std::error::Error for BlockError {}

impl From<crate::types::block::SealError> for BlockError {
    fn from(e: crate::types::block::SealError) -> Self {
        BlockError::Seal(e)
    }
}

/// Errors raised by the chain store.
#[derive(Debug)]
pub enum ChainError {
    /// `append` was offered a block that does not extend the current tip.
    NotTipSuccessor { expected_index: u64, got_index: u64 },
    LinkageMismatch { expected_previous_hash: String, got_previous_hash: String },
    TimestampRegression,
    Block(BlockError),
    DuplicateArtifactId(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::NotTipSuccessor { expected_index, got_index } => write!(
                f,
                "block index {got_index} does not succeed tip (expected {expected_index})"
            ),
            ChainError::LinkageMismatch { expected_previous_hash, got_previous_hash } => write!(
                f,
                "previous_hash {got_previous_hash} does not match tip hash {expected_previous_hash}"
            ),
            ChainError::TimestampRegression => write!(f, "block timestamp precedes tip timestamp"),
            ChainError::Block(e) => write!(f, "{e}"),
            ChainError::DuplicateArtifactId(id) => write!(f, "artifact id {id} already committed"),
        }
    }
}
impl std::error::Error for ChainError {}

impl From<BlockError> for ChainError {
    fn from(e: BlockError) -> Self {
        ChainError::Block(e)
    }
}

/// Errors raised by backup/checkpoint I/O.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Encode(String),
    Decode(String),
    NotFound(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Encode(msg) => write!(f, "encode error: {msg}"),
            StorageError::Decode(msg) => write!(f, "decode error: {msg}"),
            StorageError::NotFound(what) => write!(f, "not found: {what}"),
        }
    }
}
impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for StorageError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        StorageError::Decode(e.to_string())
    }
}

/// Top-level crate error, aggregating the submodule errors; fatal or
/// internal errors also live here as `Fatal`.
#[derive(Debug)]
pub enum LedgerError {
    Chain(ChainError),
    Storage(StorageError),
    Cancelled,
    Fatal(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Chain(e) => write!(f, "{e}"),
            LedgerError::Storage(e) => write!(f, "{e}"),
            LedgerError::Cancelled => write!(f, "operation was cancelled"),
            LedgerError::Fatal(msg) => write!(f, "fatal error: {msg}"),
        }
    }
}
impl std::error::Error for LedgerError {}

impl From<ChainError> for LedgerError {
    fn from(e: ChainError) -> Self {
        LedgerError::Chain(e)
    }
}

impl From<StorageError> for LedgerError {
    fn from(e: StorageError) -> Self {
        LedgerError::Storage(e)
    }
}

impl From<BlockError> for LedgerError {
    fn from(e: BlockError) -> Self {
        LedgerError::Chain(ChainError::Block(e))
    }
}
