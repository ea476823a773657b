//! Errors for the fallible boundary of the crate.
//!
//! The alignment, token and mapping algorithms are total and never fail. Only
//! decoding input from the outside world (diff engine JSON, settings) and
//! checking the hunk contract can.

use std::fmt;
use thiserror::Error;

/// One of the two compared documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    A,
    B,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A hunk's `lines` do not replay to its declared line count.
    #[error(
        "hunk {index} declares {expected} lines of document {document} but its lines consume {actual}"
    )]
    LineCount {
        index: usize,
        document: Document,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
