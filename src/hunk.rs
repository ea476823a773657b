//! The hunk model shared by every other module, and parsing of the external
//! diff engine's JSON output.
//!
//! The line diff itself is computed elsewhere. This crate receives its result
//! as an ordered list of hunks, each describing one localized region of change
//! between document A and document B.
//!
//! ## JSON Format
//!
//! The engine emits a result object. Anything besides `hunks` (file metadata,
//! options echo) is ignored:
//!
//! ```json
//! {
//!   "hunks": [
//!     {
//!       "a_start": 2, "a_lines": 1,
//!       "b_start": 2, "b_lines": 1,
//!       "lines": [
//!         {"op": "delete", "text": "b"},
//!         {"op": "insert", "text": "x"}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A bare array of hunks is accepted as well. See [`parse`].

use crate::error::{Document, Error, Result};
use serde::Deserialize;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LineOp {
    Equal,
    Insert,
    Delete,
}

impl LineOp {
    /// The op as seen from the other document.
    #[inline]
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Equal => Self::Equal,
            Self::Insert => Self::Delete,
            Self::Delete => Self::Insert,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Insert => "insert",
            Self::Delete => "delete",
        }
    }
}

/// A single line of a hunk, belonging to one document or (if equal) both.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct Line {
    pub op: LineOp,
    pub text: String,
}

impl Line {
    pub fn new(op: LineOp, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }
}

/// A contiguous block of changes.
///
/// `a_start`/`b_start` are 1-based. `lines` interleaves the ops so that the
/// non-insert lines reproduce `a_lines` lines of A and the non-delete lines
/// reproduce `b_lines` lines of B.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct Hunk {
    pub a_start: usize,
    pub a_lines: usize,
    pub b_start: usize,
    pub b_lines: usize,
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Number of lines the hunk consumes from document A when replayed.
    pub fn replayed_a_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.op != LineOp::Insert).count()
    }

    /// Number of lines the hunk consumes from document B when replayed.
    pub fn replayed_b_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.op != LineOp::Delete).count()
    }

    /// Checks that `lines` replays to the declared `a_lines`/`b_lines`.
    /// `index` is only used to label the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        let checks = [
            (Document::A, self.a_lines, self.replayed_a_lines()),
            (Document::B, self.b_lines, self.replayed_b_lines()),
        ];
        for (document, expected, actual) in checks {
            if expected != actual {
                return Err(Error::LineCount {
                    index,
                    document,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// The same hunk seen from document B: sides swapped, inserts and
    /// deletes exchanged.
    #[must_use]
    pub fn transposed(&self) -> Self {
        Self {
            a_start: self.b_start,
            a_lines: self.b_lines,
            b_start: self.a_start,
            b_lines: self.a_lines,
            lines: self
                .lines
                .iter()
                .map(|l| Line::new(l.op.flipped(), l.text.clone()))
                .collect(),
        }
    }

    /// 0-based inclusive range of A lines this hunk covers, if any.
    pub fn a_range(&self) -> Option<RangeInclusive<usize>> {
        span(self.a_start, self.a_lines)
    }

    /// 0-based inclusive range of B lines this hunk covers, if any.
    pub fn b_range(&self) -> Option<RangeInclusive<usize>> {
        span(self.b_start, self.b_lines)
    }
}

fn span(start: usize, len: usize) -> Option<RangeInclusive<usize>> {
    let from = start.saturating_sub(1);
    (len > 0).then(|| from..=from.saturating_add(len - 1))
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A:{},{} B:{},{}",
            self.a_start, self.a_lines, self.b_start, self.b_lines
        )
    }
}

/// The full result of one diff engine invocation.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq, Hash)]
pub struct DiffResult {
    #[serde(default)]
    pub hunks: Vec<Hunk>,
}

/// Added/removed line counts for a whole result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub hunks: usize,
    pub additions: usize,
    pub deletions: usize,
}

impl DiffResult {
    pub fn new(hunks: Vec<Hunk>) -> Self {
        Self { hunks }
    }

    pub fn validate(&self) -> Result<()> {
        self.hunks
            .iter()
            .enumerate()
            .try_for_each(|(index, hunk)| hunk.validate(index))
    }

    #[must_use]
    pub fn transposed(&self) -> Self {
        Self {
            hunks: self.hunks.iter().map(Hunk::transposed).collect(),
        }
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats {
            hunks: self.hunks.len(),
            ..DiffStats::default()
        };
        for line in self.hunks.iter().flat_map(|h| &h.lines) {
            match line.op {
                LineOp::Insert => stats.additions += 1,
                LineOp::Delete => stats.deletions += 1,
                LineOp::Equal => {}
            }
        }
        stats
    }

    /// Deterministic hash of the hunk list. Two results with equal hunks
    /// always fingerprint the same.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hunks.hash(&mut hasher);
        hasher.finish()
    }
}

/// Parses diff engine output into a validated [`DiffResult`].
///
/// Handles two shapes:
/// - a result object `{"hunks": [...], ...}`
/// - a bare array of hunks `[{...}, {...}]`
pub fn parse(json: &str) -> Result<DiffResult> {
    let result = match serde_json::from_str::<DiffResult>(json) {
        Ok(result) => result,
        Err(object_err) => match serde_json::from_str::<Vec<Hunk>>(json) {
            Ok(hunks) => DiffResult::new(hunks),
            // Report the object error; it is the documented shape.
            Err(_) => return Err(object_err.into()),
        },
    };
    result.validate()?;
    Ok(result)
}

/// Number of `\n`-separated lines in `text`. Empty text is one (empty) line,
/// matching how an editor counts a blank buffer.
#[inline]
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}
