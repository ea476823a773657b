//! Mapping line indices between the two documents.
//!
//! Scroll following and hunk navigation need to answer "which line of B
//! corresponds to line i of A?" for every line, including lines far from any
//! hunk. [`LineMap`] is a precomputed, total answer to that question for one
//! direction; [`LineMaps`] holds both.
//!
//! All indices here are 0-based. Every output is clamped into the target
//! document, so a diff that is stale with respect to the current document
//! lengths still produces in-range answers.

use crate::hunk::{DiffResult, LineOp};
use std::sync::Arc;
use tracing::{debug, trace};

/// Clamps `index` into `[0, len - 1]`; an empty target maps everything to 0.
#[inline]
fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// A total function from source line index to target line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMap {
    map: Vec<usize>,
}

impl LineMap {
    /// Builds the A to B map.
    ///
    /// Untouched stretches between hunks keep the offset accumulated so far.
    /// Inside a hunk, equal lines map one to one, deleted lines snap to the
    /// current B position, and inserted lines only advance B.
    #[must_use]
    pub fn build(diff: Option<&DiffResult>, source_total: usize, target_total: usize) -> Self {
        let mut map: Vec<usize> = (0..source_total).map(|i| clamp(i, target_total)).collect();

        let Some(diff) = diff else {
            return Self { map };
        };

        let mut hunks: Vec<_> = diff.hunks.iter().collect();
        hunks.sort_by_key(|h| h.a_start);

        let (mut a_idx, mut b_idx) = (0usize, 0usize);
        let set = |map: &mut [usize], src: usize, dst: usize| match map.get_mut(src) {
            Some(slot) => *slot = clamp(dst, target_total),
            None => trace!(src, source_total, "dropping stale hunk line"),
        };

        for hunk in hunks {
            let a_start = hunk.a_start.saturating_sub(1);
            let b_start = hunk.b_start.saturating_sub(1);

            for i in a_idx..a_start.min(source_total) {
                set(&mut map, i, shift(i, a_idx, b_idx));
            }

            a_idx = a_start;
            b_idx = b_start;
            for line in &hunk.lines {
                match line.op {
                    LineOp::Equal => {
                        set(&mut map, a_idx, b_idx);
                        a_idx = a_idx.saturating_add(1);
                        b_idx = b_idx.saturating_add(1);
                    }
                    LineOp::Delete => {
                        set(&mut map, a_idx, b_idx);
                        a_idx = a_idx.saturating_add(1);
                    }
                    LineOp::Insert => b_idx = b_idx.saturating_add(1),
                }
            }
        }

        for i in a_idx..source_total {
            set(&mut map, i, shift(i, a_idx, b_idx));
        }

        if a_idx > source_total {
            debug!(a_idx, source_total, "diff extends past the end of the source document");
        }

        Self { map }
    }

    /// Maps a source line. Out-of-range input is clamped into the source first.
    #[inline]
    pub fn get(&self, line: usize) -> usize {
        self.map
            .get(clamp(line, self.map.len()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of source lines covered.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// `i` moved by the offset between the two cursors, saturating at 0.
#[inline]
fn shift(i: usize, a_idx: usize, b_idx: usize) -> usize {
    if b_idx >= a_idx {
        i.saturating_add(b_idx - a_idx)
    } else {
        i.saturating_sub(a_idx - b_idx)
    }
}

/// Both directions of the line mapping for one diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMaps {
    a_to_b: LineMap,
    b_to_a: LineMap,
}

impl LineMaps {
    /// Builds A to B directly and B to A from the transposed diff.
    #[must_use]
    pub fn build(diff: Option<&DiffResult>, a_total: usize, b_total: usize) -> Self {
        let (a_to_b, b_to_a) = rayon::join(
            || LineMap::build(diff, a_total, b_total),
            || {
                let flipped = diff.map(DiffResult::transposed);
                LineMap::build(flipped.as_ref(), b_total, a_total)
            },
        );
        Self { a_to_b, b_to_a }
    }

    #[inline]
    pub fn a_to_b(&self, line: usize) -> usize {
        self.a_to_b.get(line)
    }

    #[inline]
    pub fn b_to_a(&self, line: usize) -> usize {
        self.b_to_a.get(line)
    }

    pub fn a_total(&self) -> usize {
        self.a_to_b.len()
    }

    pub fn b_total(&self) -> usize {
        self.b_to_a.len()
    }
}

type CacheKey = (Option<u64>, usize, usize);

/// Keeps the most recently built [`LineMaps`], keyed by the diff fingerprint
/// and both document lengths.
///
/// Callers rebuild on every keystroke; only a change to the diff or to either
/// line count actually triggers a rebuild.
#[derive(Debug, Default)]
pub struct LineMapCache {
    entry: Option<(CacheKey, Arc<LineMaps>)>,
}

impl LineMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &mut self,
        diff: Option<&DiffResult>,
        a_total: usize,
        b_total: usize,
    ) -> Arc<LineMaps> {
        let key = (diff.map(DiffResult::fingerprint), a_total, b_total);
        if let Some((cached, maps)) = &self.entry
            && *cached == key
        {
            trace!(?key, "line map cache hit");
            return Arc::clone(maps);
        }

        debug!(?key, "building line maps");
        let maps = Arc::new(LineMaps::build(diff, a_total, b_total));
        self.entry = Some((key, Arc::clone(&maps)));
        maps
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
