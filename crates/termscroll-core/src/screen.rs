//! Live-screen collaborator surface.
//!
//! The viewport never touches the emulator's grid or the history store
//! directly; it reads everything through this trait. Implementations are
//! expected to treat every call as total — out-of-range queries return safe
//! defaults rather than failing — so the viewport can stay oblivious to the
//! emulator's internal bookkeeping.
//!
//! Line coordinates on this trait are absolute: `0..history_lines()` address
//! history, followed by `screen_lines()` rows of the live screen.

use bitflags::bitflags;

use crate::cell::Cell;

bitflags! {
    /// Per-line metadata reported by the screen.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LineProperty: u16 {
        /// The line is a soft-wrap continuation of the previous one.
        const WRAPPED       = 1 << 0;
        const DOUBLE_WIDTH  = 1 << 1;
        const DOUBLE_HEIGHT = 1 << 2;
        /// The line starts a shell prompt (REPL integration).
        const PROMPT_START  = 1 << 3;
    }
}

bitflags! {
    /// Options for decoding selected text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DecodeOptions: u8 {
        const PLAIN_TEXT               = 1 << 0;
        const CONVERT_TO_HTML          = 1 << 1;
        const PRESERVE_LINE_BREAKS     = 1 << 2;
        const TRIM_LEADING_WHITESPACE  = 1 << 3;
        const TRIM_TRAILING_WHITESPACE = 1 << 4;
    }
}

/// Rectangle in window cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// The live screen the viewport projects over.
///
/// One producer implements this: the terminal emulator's screen, which also
/// owns the history store and appends to it as lines scroll off the top of
/// the visible region.
pub trait Screen {
    /// Lines of history in front of the live screen.
    fn history_lines(&self) -> usize;
    /// Height of the live screen.
    fn screen_lines(&self) -> usize;
    /// Width of the live screen. The viewport window is always this wide.
    fn columns(&self) -> usize;

    fn cursor_x(&self) -> usize;
    fn cursor_y(&self) -> usize;

    /// Fill `buf` with the cells of absolute lines `start_line..=end_line`.
    fn fill_image(&self, buf: &mut [Cell], start_line: usize, end_line: usize);

    /// Properties of absolute lines `start..=end`, one entry per line.
    fn line_properties(&self, start: usize, end: usize) -> Vec<LineProperty>;

    /// Decode the current selection to text.
    fn selected_text(&self, options: DecodeOptions) -> String;
    /// Selection endpoints in absolute (column, line) coordinates.
    fn selection_start(&self) -> (i32, i32);
    fn selection_end(&self) -> (i32, i32);
    fn set_selection_start(&mut self, column: i32, line: i32, column_mode: bool);
    fn set_selection_end(&mut self, column: i32, line: i32, trim_trailing_whitespace: bool);
    fn clear_selection(&mut self);
    fn is_selected(&self, column: i32, line: i32) -> bool;

    /// Lines the screen scrolled since the last output notification.
    fn scrolled_lines(&self) -> usize;
    /// Lines dropped from the front of a bounded history since the last
    /// output notification.
    fn dropped_lines(&self) -> usize;

    /// Total line count before the most recent resize.
    fn old_total_lines(&self) -> usize;
    /// Whether the most recent content change was a resize.
    fn is_resize(&self) -> bool;

    /// The region the screen scrolled last, for smooth-scroll rendering.
    fn last_scrolled_region(&self) -> Rect;

    /// Whether the emulator has shell-integration (prompt) markers.
    fn has_repl(&self) -> bool;

    /// Fill `buf` with this screen's default blank cell.
    fn fill_with_default_char(&self, buf: &mut [Cell]) {
        buf.fill(Cell::default());
    }
}
