//! Error types for the compile engine.

use thiserror::Error;

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors that can occur while flattening or emitting a dump.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A table references an instrument index the registry never assigned.
    #[error("unknown instrument index {index} assigned to bank {bank} patch {patch} ({known} known)")]
    UnknownInstrument {
        /// Bank the assignment belongs to.
        bank: u32,
        /// Patch slot the assignment belongs to.
        patch: u32,
        /// The out-of-range canonical index.
        index: usize,
        /// Number of instruments the registry knows.
        known: usize,
    },

    /// A patch number outside the 0-255 melodic/percussion range.
    #[error("patch {patch} out of range for bank {bank} (0-127 melodic, 128-255 percussion)")]
    PatchOutOfRange {
        /// Bank the assignment belongs to.
        bank: u32,
        /// The out-of-range patch number.
        patch: u32,
    },

    /// A dump record references a flattened vector out of bounds.
    #[error("dangling {section} index {index} (section holds {len} records)")]
    DanglingIndex {
        /// Which flattened vector the index points into.
        section: &'static str,
        /// The offending index.
        index: i64,
        /// Length of that vector.
        len: usize,
    },

    /// Serialized dump is too small to hold a header.
    #[error("dump too small: {found} bytes, header needs {expected}")]
    DumpTooSmall {
        /// Minimum byte count.
        expected: usize,
        /// Bytes actually present.
        found: usize,
    },

    /// Serialized dump does not start with the expected magic.
    #[error("invalid dump magic")]
    InvalidMagic,

    /// Serialized dump carries a format version this build cannot read.
    #[error("unsupported dump version: {version}")]
    UnsupportedVersion {
        /// Version found in the header.
        version: u16,
    },

    /// Serialized dump length disagrees with its header counts.
    #[error("dump length mismatch: header implies {expected} bytes, got {found}")]
    LengthMismatch {
        /// Byte count implied by the header.
        expected: usize,
        /// Bytes actually present.
        found: usize,
    },

    /// I/O error while writing a dump.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
