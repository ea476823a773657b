//! Aligning hunk lines into side-by-side display rows.
//!
//! A hunk's `lines` interleave equal, deleted and inserted lines. A side-by-side
//! view instead wants rows, each showing at most one line of A on the left and
//! at most one line of B on the right. This module produces those rows.
//!
//! ## Pairing Strategy
//!
//! - Equal lines become rows with both sides populated.
//! - A change block (a run of deletes followed by a run of inserts, or the
//!   other way round) is zipped by position: old line k sits next to new line
//!   k. The shorter run leaves one-sided rows at the end of the block.
//! - Rows with both a deleted and an inserted line carry word-level tokens
//!   from [`crate::tokens::word_diff`] so the renderer can highlight only the
//!   edited words.
//!
//! Positional pairing mirrors conventional unified-diff rendering. It does not
//! claim that old line k and new line k are related.

use crate::hunk::{DiffResult, DiffStats, Hunk, Line, LineOp};
use crate::tokens::{Token, word_diff};
use mlua::prelude::*;
use rayon::prelude::*;
use std::ops::RangeInclusive;

/// One side of a display row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,

    /// `Equal` or `Delete` on the left, `Equal` or `Insert` on the right.
    pub op: LineOp,

    /// 1-based line number in this side's document.
    pub ln: usize,

    /// Word-level tokens, present only on paired replace rows.
    pub tokens: Option<Vec<Token>>,
}

impl Cell {
    #[inline]
    fn new(line: &Line, op: LineOp, ln: usize) -> Self {
        Self {
            text: line.text.clone(),
            op,
            ln,
            tokens: None,
        }
    }
}

/// A single row of the side-by-side display. At least one side is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// The document A side.
    pub left: Option<Cell>,

    /// The document B side.
    pub right: Option<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Equal,
    /// A deleted line paired with an inserted line.
    Replace,
    Delete,
    Insert,
}

impl RowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Insert => "insert",
        }
    }
}

impl Row {
    pub fn kind(&self) -> RowKind {
        match (&self.left, &self.right) {
            (Some(left), Some(_)) if left.op == LineOp::Equal => RowKind::Equal,
            (Some(_), Some(_)) => RowKind::Replace,
            (Some(_), None) => RowKind::Delete,
            (None, _) => RowKind::Insert,
        }
    }
}

/// The rows for one hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedHunk {
    pub a_start: usize,
    pub b_start: usize,
    pub rows: Vec<Row>,
}

/// Takes the maximal run of `want` lines starting at `*i`.
#[inline]
fn take_run<'a>(lines: &'a [Line], i: &mut usize, want: LineOp) -> &'a [Line] {
    let start = *i;
    while *i < lines.len() && lines[*i].op == want {
        *i += 1;
    }
    &lines[start..*i]
}

/// Aligns one hunk into display rows.
#[must_use]
pub fn align_hunk(hunk: &Hunk) -> AlignedHunk {
    let lines = hunk.lines.as_slice();
    let mut rows = Vec::with_capacity(lines.len());
    let mut a_ln = hunk.a_start;
    let mut b_ln = hunk.b_start;
    let mut i = 0;

    while i < lines.len() {
        let op = lines[i].op;

        if op == LineOp::Equal {
            for line in take_run(lines, &mut i, LineOp::Equal) {
                rows.push(Row {
                    left: Some(Cell::new(line, LineOp::Equal, a_ln)),
                    right: Some(Cell::new(line, LineOp::Equal, b_ln)),
                });
                a_ln = a_ln.saturating_add(1);
                b_ln = b_ln.saturating_add(1);
            }
            continue;
        }

        // Change block: one run of each kind, in whichever order the engine
        // emitted them.
        let (del_run, ins_run) = if op == LineOp::Delete {
            let del = take_run(lines, &mut i, LineOp::Delete);
            (del, take_run(lines, &mut i, LineOp::Insert))
        } else {
            let ins = take_run(lines, &mut i, LineOp::Insert);
            (take_run(lines, &mut i, LineOp::Delete), ins)
        };

        for k in 0..del_run.len().max(ins_run.len()) {
            let mut left = del_run.get(k).map(|l| Cell::new(l, LineOp::Delete, a_ln));
            let mut right = ins_run.get(k).map(|l| Cell::new(l, LineOp::Insert, b_ln));

            if let (Some(left), Some(right)) = (&mut left, &mut right) {
                let diff = word_diff(&left.text, &right.text);
                left.tokens = Some(diff.a_tokens);
                right.tokens = Some(diff.b_tokens);
            }
            if left.is_some() {
                a_ln = a_ln.saturating_add(1);
            }
            if right.is_some() {
                b_ln = b_ln.saturating_add(1);
            }
            rows.push(Row { left, right });
        }
    }

    AlignedHunk {
        a_start: hunk.a_start,
        b_start: hunk.b_start,
        rows,
    }
}

/// Aligns every hunk of a result, in order. `None` yields no hunks.
///
/// Hunks are independent, so they are aligned in parallel; the token LCS on
/// long replace blocks dominates the cost.
#[must_use]
pub fn align_all(diff: Option<&DiffResult>) -> Vec<AlignedHunk> {
    diff.map(|diff| diff.hunks.par_iter().map(align_hunk).collect())
        .unwrap_or_default()
}

/// A hunk ready for the renderer: its rows plus what the hunk header and the
/// hover highlight in the editors need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayHunk {
    /// `A:{a_start},{a_lines} B:{b_start},{b_lines}`.
    pub header: String,

    /// 0-based inclusive A lines to highlight while the hunk is hovered.
    pub a_range: Option<RangeInclusive<usize>>,

    /// 0-based inclusive B lines to highlight while the hunk is hovered.
    pub b_range: Option<RangeInclusive<usize>>,

    pub aligned: AlignedHunk,
}

/// Everything the renderer consumes for one diff result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDiff {
    pub hunks: Vec<DisplayHunk>,
    pub stats: DiffStats,
}

/// Aligns `diff` and attaches per-hunk display metadata.
#[must_use]
pub fn display(diff: &DiffResult) -> DisplayDiff {
    let hunks = align_all(Some(diff))
        .into_iter()
        .zip(&diff.hunks)
        .map(|(aligned, hunk)| DisplayHunk {
            header: hunk.to_string(),
            a_range: hunk.a_range(),
            b_range: hunk.b_range(),
            aligned,
        })
        .collect();

    DisplayDiff {
        hunks,
        stats: diff.stats(),
    }
}

impl IntoLua for Cell {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("text", self.text)?;
        table.set("op", self.op.as_str())?;
        table.set("ln", self.ln)?;
        if let Some(tokens) = self.tokens {
            table.set("tokens", lua.create_sequence_from(tokens)?)?;
        }
        Ok(LuaValue::Table(table))
    }
}

impl IntoLua for Row {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("kind", self.kind().as_str())?;
        // Absent sides stay nil.
        table.set("left", self.left)?;
        table.set("right", self.right)?;
        Ok(LuaValue::Table(table))
    }
}

impl IntoLua for AlignedHunk {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("a_start", self.a_start)?;
        table.set("b_start", self.b_start)?;
        table.set("rows", lua.create_sequence_from(self.rows)?)?;
        Ok(LuaValue::Table(table))
    }
}

/// `{ from, to }` for a line range, nil when absent.
fn range_into_lua(lua: &Lua, range: Option<RangeInclusive<usize>>) -> LuaResult<LuaValue> {
    let Some(range) = range else {
        return Ok(LuaValue::Nil);
    };
    let table = lua.create_table()?;
    table.set("from", *range.start())?;
    table.set("to", *range.end())?;
    Ok(LuaValue::Table(table))
}

impl IntoLua for DisplayHunk {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("header", self.header)?;
        table.set("a_range", range_into_lua(lua, self.a_range)?)?;
        table.set("b_range", range_into_lua(lua, self.b_range)?)?;
        table.set("a_start", self.aligned.a_start)?;
        table.set("b_start", self.aligned.b_start)?;
        table.set("rows", lua.create_sequence_from(self.aligned.rows)?)?;
        Ok(LuaValue::Table(table))
    }
}

impl IntoLua for DiffStats {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("hunks", self.hunks)?;
        table.set("additions", self.additions)?;
        table.set("deletions", self.deletions)?;
        Ok(LuaValue::Table(table))
    }
}

impl IntoLua for DisplayDiff {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("hunks", lua.create_sequence_from(self.hunks)?)?;
        table.set("stats", self.stats.into_lua(lua)?)?;
        Ok(LuaValue::Table(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn line(op: LineOp, text: &str) -> Line {
        Line::new(op, text)
    }

    fn hunk(a_start: usize, b_start: usize, lines: Vec<Line>) -> Hunk {
        let mut hunk = Hunk {
            a_start,
            a_lines: 0,
            b_start,
            b_lines: 0,
            lines,
        };
        hunk.a_lines = hunk.replayed_a_lines();
        hunk.b_lines = hunk.replayed_b_lines();
        hunk
    }

    /// `(left_ln, left_text, right_ln, right_text)` per row, `0`/`""` for absent.
    fn shape(aligned: &AlignedHunk) -> Vec<(usize, &str, usize, &str)> {
        aligned
            .rows
            .iter()
            .map(|row| {
                let (l_ln, l_text) = row.left.as_ref().map_or((0, ""), |c| (c.ln, &*c.text));
                let (r_ln, r_text) = row.right.as_ref().map_or((0, ""), |c| (c.ln, &*c.text));
                (l_ln, l_text, r_ln, r_text)
            })
            .collect()
    }

    #[test]
    fn replace_between_equal_lines() {
        let aligned = align_hunk(&hunk(
            1,
            1,
            vec![
                line(LineOp::Equal, "a"),
                line(LineOp::Delete, "b"),
                line(LineOp::Insert, "x"),
                line(LineOp::Equal, "c"),
            ],
        ));

        assert_eq!(
            shape(&aligned),
            vec![(1, "a", 1, "a"), (2, "b", 2, "x"), (3, "c", 3, "c")]
        );
        let kinds: Vec<_> = aligned.rows.iter().map(Row::kind).collect();
        assert_eq!(kinds, vec![RowKind::Equal, RowKind::Replace, RowKind::Equal]);

        let replace = &aligned.rows[1];
        let left = replace.left.as_ref().unwrap();
        let right = replace.right.as_ref().unwrap();
        assert_eq!(left.op, LineOp::Delete);
        assert_eq!(right.op, LineOp::Insert);

        let a_tokens = left.tokens.as_ref().unwrap();
        let b_tokens = right.tokens.as_ref().unwrap();
        assert_eq!(a_tokens.len(), 1);
        assert_eq!((a_tokens[0].text.as_str(), a_tokens[0].kind), ("b", TokenKind::Deleted));
        assert_eq!(b_tokens.len(), 1);
        assert_eq!((b_tokens[0].text.as_str(), b_tokens[0].kind), ("x", TokenKind::Inserted));

        assert!(aligned.rows[0].left.as_ref().unwrap().tokens.is_none());
    }

    #[test]
    fn pure_insertion_hunk() {
        let aligned = align_hunk(&hunk(2, 2, vec![line(LineOp::Insert, "new")]));

        assert_eq!(aligned.rows.len(), 1);
        assert!(aligned.rows[0].left.is_none());
        let right = aligned.rows[0].right.as_ref().unwrap();
        assert_eq!(right.ln, 2);
        assert_eq!(right.op, LineOp::Insert);
        assert!(right.tokens.is_none());
        assert_eq!(aligned.rows[0].kind(), RowKind::Insert);
    }

    #[test]
    fn pure_deletion_hunk() {
        let aligned = align_hunk(&hunk(
            4,
            3,
            vec![line(LineOp::Delete, "x"), line(LineOp::Delete, "y")],
        ));
        assert_eq!(shape(&aligned), vec![(4, "x", 0, ""), (5, "y", 0, "")]);
        assert!(aligned.rows.iter().all(|r| r.kind() == RowKind::Delete));
    }

    #[test]
    fn longer_delete_run_leaves_left_only_rows() {
        let aligned = align_hunk(&hunk(
            10,
            20,
            vec![
                line(LineOp::Delete, "d1"),
                line(LineOp::Delete, "d2"),
                line(LineOp::Delete, "d3"),
                line(LineOp::Insert, "i1"),
                line(LineOp::Equal, "ctx"),
            ],
        ));

        assert_eq!(
            shape(&aligned),
            vec![
                (10, "d1", 20, "i1"),
                (11, "d2", 0, ""),
                (12, "d3", 0, ""),
                (13, "ctx", 21, "ctx"),
            ]
        );
    }

    #[test]
    fn longer_insert_run_leaves_right_only_rows() {
        let aligned = align_hunk(&hunk(
            1,
            1,
            vec![
                line(LineOp::Delete, "old"),
                line(LineOp::Insert, "new1"),
                line(LineOp::Insert, "new2"),
            ],
        ));
        assert_eq!(shape(&aligned), vec![(1, "old", 1, "new1"), (0, "", 2, "new2")]);
    }

    #[test]
    fn inserts_before_deletes_are_paired() {
        let aligned = align_hunk(&hunk(
            3,
            3,
            vec![
                line(LineOp::Insert, "i1"),
                line(LineOp::Insert, "i2"),
                line(LineOp::Delete, "d1"),
            ],
        ));
        assert_eq!(shape(&aligned), vec![(3, "d1", 3, "i1"), (0, "", 4, "i2")]);
        assert_eq!(aligned.rows[0].kind(), RowKind::Replace);
    }

    #[test]
    fn separate_change_blocks_are_not_merged() {
        let aligned = align_hunk(&hunk(
            1,
            1,
            vec![
                line(LineOp::Delete, "d1"),
                line(LineOp::Equal, "same"),
                line(LineOp::Insert, "i1"),
            ],
        ));
        assert_eq!(
            shape(&aligned),
            vec![(1, "d1", 0, ""), (2, "same", 1, "same"), (0, "", 2, "i1")]
        );
    }

    #[test]
    fn align_all_preserves_order() {
        let diff = DiffResult::new(vec![
            hunk(1, 1, vec![line(LineOp::Delete, "a")]),
            hunk(5, 4, vec![line(LineOp::Insert, "b")]),
            hunk(9, 9, vec![line(LineOp::Equal, "c")]),
        ]);
        let starts: Vec<_> = align_all(Some(&diff))
            .iter()
            .map(|h| (h.a_start, h.b_start))
            .collect();
        assert_eq!(starts, vec![(1, 1), (5, 4), (9, 9)]);
        assert!(align_all(None).is_empty());
    }

    #[test]
    fn huge_start_saturates_line_numbers() {
        let h = hunk(
            usize::MAX,
            1,
            vec![line(LineOp::Delete, "x"), line(LineOp::Delete, "y")],
        );
        let shown = display(&DiffResult::new(vec![h]));
        let rows = &shown.hunks[0].aligned.rows;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].left.as_ref().map(|c| c.ln), Some(usize::MAX));
        assert_eq!(rows[1].left.as_ref().map(|c| c.ln), Some(usize::MAX));
        assert!(rows.iter().all(|r| r.kind() == RowKind::Delete));
        assert_eq!(shown.hunks[0].a_range, Some(usize::MAX - 1..=usize::MAX));
        assert_eq!(shown.hunks[0].b_range, None);
    }

    #[test]
    fn display_attaches_header_and_hover_ranges() {
        let diff = DiffResult::new(vec![
            hunk(
                2,
                2,
                vec![line(LineOp::Delete, "b"), line(LineOp::Insert, "x")],
            ),
            hunk(6, 6, vec![line(LineOp::Insert, "tail")]),
        ]);

        let shown = display(&diff);

        assert_eq!(shown.hunks.len(), 2);
        assert_eq!(shown.hunks[0].header, "A:2,1 B:2,1");
        assert_eq!(shown.hunks[0].a_range, Some(1..=1));
        assert_eq!(shown.hunks[0].b_range, Some(1..=1));
        assert_eq!(shown.hunks[1].header, "A:6,0 B:6,1");
        assert_eq!(shown.hunks[1].a_range, None);
        assert_eq!(shown.hunks[1].aligned, align_hunk(&diff.hunks[1]));
        assert_eq!(
            shown.stats,
            DiffStats {
                hunks: 2,
                additions: 2,
                deletions: 1
            }
        );
    }

    fn arb_op() -> impl Strategy<Value = LineOp> {
        prop_oneof![Just(LineOp::Equal), Just(LineOp::Insert), Just(LineOp::Delete)]
    }

    proptest! {
        #[test]
        fn row_sides_sum_to_hunk_counts(
            ops in prop::collection::vec(arb_op(), 0..40),
            a_start in 1usize..50,
            b_start in 1usize..50,
        ) {
            let lines = ops.iter().enumerate().map(|(i, op)| line(*op, &i.to_string())).collect();
            let hunk = hunk(a_start, b_start, lines);
            let aligned = align_hunk(&hunk);

            let lefts: Vec<_> = aligned.rows.iter().filter_map(|r| r.left.as_ref()).collect();
            let rights: Vec<_> = aligned.rows.iter().filter_map(|r| r.right.as_ref()).collect();
            prop_assert_eq!(lefts.len(), hunk.a_lines);
            prop_assert_eq!(rights.len(), hunk.b_lines);
            prop_assert!(aligned.rows.iter().all(|r| r.left.is_some() || r.right.is_some()));

            // Line numbers on each side are consecutive from the hunk start.
            for (k, cell) in lefts.iter().enumerate() {
                prop_assert_eq!(cell.ln, a_start + k);
                prop_assert!(cell.op != LineOp::Insert);
            }
            for (k, cell) in rights.iter().enumerate() {
                prop_assert_eq!(cell.ln, b_start + k);
                prop_assert!(cell.op != LineOp::Delete);
            }
        }
    }
}
