//! Word-level sub-diff for a replaced line pair.
//!
//! When a deleted line is shown next to the inserted line that replaced it,
//! highlighting the whole line hides what actually changed. This module splits
//! both lines into word and whitespace tokens and finds the longest common
//! subsequence of tokens, so only the tokens outside it are flagged.
//!
//! Tokens alternate between runs of non-whitespace and runs of whitespace, and
//! concatenating the tokens of a side always reproduces that side's text.
//! Whitespace is Unicode `White_Space` as tested by [`char::is_whitespace`].

use mlua::prelude::*;
use smallvec::SmallVec;

/// Most edited lines split into a few dozen tokens at most; inline storage
/// avoids a heap allocation per tokenized line.
type Pieces<'a> = SmallVec<[&'a str; 16]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Unchanged,
    /// Present only in the old line.
    Deleted,
    /// Present only in the new line.
    Inserted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    #[inline]
    fn new(text: &str, kind: TokenKind) -> Self {
        Self {
            text: text.to_string(),
            kind,
        }
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.kind == TokenKind::Deleted
    }

    #[inline]
    pub fn is_inserted(&self) -> bool {
        self.kind == TokenKind::Inserted
    }

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.kind != TokenKind::Unchanged
    }
}

/// Tokens for both sides of a replaced line pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDiff {
    /// Tokens of the old text; changed ones are [`TokenKind::Deleted`].
    pub a_tokens: Vec<Token>,
    /// Tokens of the new text; changed ones are [`TokenKind::Inserted`].
    pub b_tokens: Vec<Token>,
}

/// Splits `text` into alternating runs of whitespace and non-whitespace.
/// Never yields an empty piece.
fn tokenize(text: &str) -> Pieces<'_> {
    let mut pieces = Pieces::new();
    let mut start = 0;
    let mut in_space = None;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|prev| prev != space) {
            pieces.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Computes the token-level diff between `deleted` and `inserted`.
///
/// Builds a suffix LCS table in O(m·n) for m and n tokens, then walks it from
/// the start. On a mismatch the side with the larger remaining LCS is
/// consumed; ties consume the deleted side first.
#[must_use]
pub fn word_diff(deleted: &str, inserted: &str) -> WordDiff {
    let a = tokenize(deleted);
    let b = tokenize(inserted);
    let (m, n) = (a.len(), b.len());

    // lcs[i * width + j] = LCS length of a[i..] and b[j..]
    let width = n + 1;
    let mut lcs = vec![0u32; (m + 1) * width];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut diff = WordDiff {
        a_tokens: Vec::with_capacity(m),
        b_tokens: Vec::with_capacity(n),
    };
    let (mut i, mut j) = (0, 0);

    while i < m && j < n {
        if a[i] == b[j] {
            diff.a_tokens.push(Token::new(a[i], TokenKind::Unchanged));
            diff.b_tokens.push(Token::new(b[j], TokenKind::Unchanged));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            diff.a_tokens.push(Token::new(a[i], TokenKind::Deleted));
            i += 1;
        } else {
            diff.b_tokens.push(Token::new(b[j], TokenKind::Inserted));
            j += 1;
        }
    }
    diff.a_tokens
        .extend(a[i..].iter().map(|t| Token::new(t, TokenKind::Deleted)));
    diff.b_tokens
        .extend(b[j..].iter().map(|t| Token::new(t, TokenKind::Inserted)));

    diff
}

impl IntoLua for Token {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("deleted", self.is_deleted())?;
        table.set("inserted", self.is_inserted())?;
        table.set("text", self.text)?;
        Ok(LuaValue::Table(table))
    }
}

impl IntoLua for WordDiff {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("a_tokens", lua.create_sequence_from(self.a_tokens)?)?;
        table.set("b_tokens", lua.create_sequence_from(self.b_tokens)?)?;
        Ok(LuaValue::Table(table))
    }
}
