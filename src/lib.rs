//! # diffsync
//!
//! Side-by-side diff display and synchronized scrolling for two editor views.
//!
//! The crate takes the hunks of a line diff between two documents (A, the
//! old text, and B, the new text), aligns them into side-by-side rows with
//! word-level highlights, and keeps the two views scrolled to corresponding
//! lines. A diff engine upstream produces the hunks; this crate never diffs
//! whole documents itself.
//!
//! ## Architecture
//!
//! - `hunk` - Hunk types, JSON parsing and validation
//! - `tokens` - Word-level sub-diff for a replaced line pair
//! - `align` - Pairs hunk lines into display rows
//! - `line_map` - Total monotone line maps between A and B, and their cache
//! - `scroll` - The scroll-sync coordinator and hunk navigation
//! - `settings` - Coordinator options
//! - `lib` (this module) - Lua bindings
//!
//! ## Usage from Lua
//!
//! ```lua
//! local diffsync = require("diffsync")
//!
//! local shown = diffsync.align(diff_json)
//! print(shown.stats.additions, shown.hunks[1].header)
//!
//! local sync
//! sync = diffsync.new_sync(
//!   function(line, align) scroll_left(line, align) end,
//!   function(line, align) scroll_right(line, align) end,
//!   { link_scroll = true }
//! )
//! sync:set_diff(diff_json, a_line_count, b_line_count)
//! sync:on_left_scroll(top_line) -- from the left view's scroll autocmd
//! sync:next_hunk()
//! ```
//!
//! Line and hunk indices crossing the Lua boundary are 0-based.

use mlua::prelude::*;
use std::sync::Arc;

pub mod align;
pub mod error;
pub mod hunk;
pub mod line_map;
pub mod scroll;
pub mod settings;
pub mod tokens;

pub use align::{AlignedHunk, DisplayDiff, Row, align_all, align_hunk, display};
pub use error::{Error, Result};
pub use hunk::{DiffResult, Hunk, Line, LineOp, line_count, parse};
pub use line_map::{LineMapCache, LineMaps};
pub use scroll::{Align, NavigationTarget, ScrollEvent, ScrollSync, ScrollView};
pub use settings::SyncSettings;
pub use tokens::{Token, WordDiff, word_diff};

/// Parses an optional diff argument; nil means "no diff".
fn diff_arg(json: Option<String>) -> LuaResult<Option<DiffResult>> {
    json.as_deref()
        .map(hunk::parse)
        .transpose()
        .map_err(LuaError::external)
}

/// Read-only line maps handed to Lua.
struct LuaLineMaps(Arc<LineMaps>);

impl LuaUserData for LuaLineMaps {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("a_to_b", |_, this, line: usize| Ok(this.0.a_to_b(line)));
        methods.add_method("b_to_a", |_, this, line: usize| Ok(this.0.b_to_a(line)));
        methods.add_method("a_total", |_, this, ()| Ok(this.0.a_total()));
        methods.add_method("b_total", |_, this, ()| Ok(this.0.b_total()));
    }
}

/// A view backed by a Lua function called as `fn(line, align)`.
struct LuaView {
    scroll: LuaFunction,
}

impl ScrollView for LuaView {
    type Error = LuaError;

    fn scroll_to_line(&self, line: usize, align: Align) -> LuaResult<()> {
        self.scroll.call::<()>((line, align.as_str()))
    }
}

impl IntoLua for NavigationTarget {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        let table = lua.create_table()?;
        table.set("hunk", self.hunk)?;
        table.set("a_line", self.a_line)?;
        table.set("b_line", self.b_line)?;
        Ok(LuaValue::Table(table))
    }
}

/// A scroll-sync session owned by Lua.
///
/// Scroll handlers borrow the session immutably, so a view function may
/// report its own scroll back into the session while a request is in flight.
/// That echo is what the coordinator's guard suppresses.
struct LuaSync(ScrollSync<LuaView>);

impl LuaUserData for LuaSync {
    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method_mut(
            "set_diff",
            |_, this, (json, a_total, b_total): (Option<String>, usize, usize)| {
                let diff = diff_arg(json)?;
                this.0.set_diff(diff.as_ref(), a_total, b_total);
                Ok(())
            },
        );
        methods.add_method("on_left_scroll", |_, this, top_line: usize| {
            this.0.on_left_scroll(ScrollEvent { top_line })
        });
        methods.add_method("on_right_scroll", |_, this, top_line: usize| {
            this.0.on_right_scroll(ScrollEvent { top_line })
        });
        methods.add_method("set_linked", |_, this, linked: bool| {
            this.0.set_linked(linked);
            Ok(())
        });
        methods.add_method("toggle_linked", |_, this, ()| Ok(this.0.toggle_linked()));
        methods.add_method("is_linked", |_, this, ()| Ok(this.0.is_linked()));
        methods.add_method("current_hunk", |_, this, ()| Ok(this.0.current_hunk()));
        methods.add_method("hunk_count", |_, this, ()| Ok(this.0.hunk_count()));
        methods.add_method("jump_to_hunk", |_, this, index: usize| {
            this.0.jump_to_hunk(index)
        });
        methods.add_method("next_hunk", |_, this, ()| this.0.next_hunk());
        methods.add_method("prev_hunk", |_, this, ()| this.0.prev_hunk());
    }
}

/// Creates a scroll-sync session from two view functions and optional settings.
fn new_sync(
    lua: &Lua,
    (left, right, settings): (LuaFunction, LuaFunction, Option<LuaValue>),
) -> LuaResult<LuaAnyUserData> {
    let settings = match settings {
        Some(value) => lua.from_value::<SyncSettings>(value)?,
        None => SyncSettings::default(),
    };
    let sync = ScrollSync::new(
        LuaView { scroll: left },
        LuaView { scroll: right },
        settings,
    );
    lua.create_userdata(LuaSync(sync))
}

/// Builds the table returned by `require("diffsync")`.
pub fn exports(lua: &Lua) -> LuaResult<LuaTable> {
    let exports = lua.create_table()?;
    exports.set(
        "word_diff",
        lua.create_function(|_, (a, b): (String, String)| Ok(tokens::word_diff(&a, &b)))?,
    )?;
    exports.set(
        "align",
        lua.create_function(|_, json: String| {
            let diff = hunk::parse(&json).map_err(LuaError::external)?;
            Ok(align::display(&diff))
        })?,
    )?;
    exports.set(
        "line_count",
        lua.create_function(|_, text: String| Ok(hunk::line_count(&text)))?,
    )?;
    exports.set(
        "line_maps",
        lua.create_function(
            |lua, (json, a_total, b_total): (Option<String>, usize, usize)| {
                let diff = diff_arg(json)?;
                let maps = LineMaps::build(diff.as_ref(), a_total, b_total);
                lua.create_userdata(LuaLineMaps(Arc::new(maps)))
            },
        )?,
    )?;
    exports.set("new_sync", lua.create_function(new_sync)?)?;
    Ok(exports)
}

#[cfg(feature = "module")]
#[mlua::lua_module]
fn diffsync(lua: &Lua) -> LuaResult<LuaTable> {
    exports(lua)
}
