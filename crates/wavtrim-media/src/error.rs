//! Error types for wavtrim-media.

use crate::riff::ChunkId;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for wavtrim-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for wavtrim-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a well-formed RIFF/WAVE container.
    #[error("Malformed WAV: {0}")]
    Malformed(#[from] MalformedError),

    /// The requested trim range cannot be satisfied.
    #[error("Invalid trim range: {0}")]
    Trim(#[from] TrimError),

    /// A copy buffer of zero bytes was requested.
    #[error("Copy buffer size must be greater than zero")]
    InvalidBufferSize,
}

/// Structural problems found while unpacking a container.
#[derive(Debug, Error)]
pub enum MalformedError {
    /// A fixed tag did not hold its expected value.
    #[error("bad magic: expected {expected}, found {found}")]
    BadMagic { expected: ChunkId, found: ChunkId },

    /// The stream ended in the middle of a chunk.
    #[error("truncated {chunk} chunk")]
    Truncated { chunk: &'static str },

    /// The LIST chunk carries a type other than INFO.
    #[error("unsupported LIST type: {0}")]
    UnsupportedListType(ChunkId),
}

/// Rejected trim requests.
#[derive(Debug, Error)]
pub enum TrimError {
    /// Start or end lies past the end of the audio.
    #[error("start {start:?} or end {end:?} not between 0s and {total:?}")]
    OutOfRange {
        start: Duration,
        end: Duration,
        total: Duration,
    },

    /// Start does not come before end.
    #[error("start {start:?} is not earlier than end {end:?}")]
    InvalidOrder { start: Duration, end: Duration },
}

impl Error {
    /// Create a bad magic error.
    pub fn bad_magic(expected: ChunkId, found: ChunkId) -> Self {
        Self::Malformed(MalformedError::BadMagic { expected, found })
    }

    /// Map a read failure inside `chunk` to the right variant.
    ///
    /// An unexpected EOF means the chunk was cut short; anything else is a
    /// transport failure and is passed through untouched.
    pub(crate) fn from_read(chunk: &'static str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Malformed(MalformedError::Truncated { chunk })
        } else {
            Self::Io(err)
        }
    }

    /// Whether this error came from a structurally invalid input.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}
