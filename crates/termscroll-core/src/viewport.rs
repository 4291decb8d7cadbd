//! Windowed read projection over history + live screen.
//!
//! The viewport owns a frame buffer of `window_lines × columns` cells and a
//! logical cursor (`current_line`, the absolute index of the window's top
//! row) into the combined coordinate space. It rebuilds the frame lazily: a
//! dirty bit is set by every mutation and cleared by [`Viewport::image`].
//!
//! The screen collaborator is passed into each call rather than owned, the
//! same way the rest of this crate takes its collaborators as parameters;
//! the embedder serializes access. Outbound notifications go through a
//! [`ViewportObserver`] injected at construction.

use crate::cell::Cell;
use crate::screen::{DecodeOptions, LineProperty, Rect, Screen};

/// Unit for relative scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Scroll by single lines.
    Lines,
    /// Scroll by pages (half or full window heights).
    Pages,
    /// Scroll between shell prompts; behaves like `Pages` when the screen
    /// has no prompt markers.
    Prompts,
}

/// Outbound viewport notifications, one method per signal.
///
/// Every method has a no-op default, so observers implement only what they
/// care about.
pub trait ViewportObserver {
    /// The embedder is about to swap the screen this viewport projects.
    fn screen_about_to_change(&mut self) {}
    fn selection_changed(&mut self) {}
    fn scrolled(&mut self, current_line: usize) {
        let _ = current_line;
    }
    fn output_changed(&mut self) {}
    fn current_result_line_changed(&mut self) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ViewportObserver for NoopObserver {}

/// Scrollable window over history + live screen.
pub struct Viewport {
    buffer: Vec<Cell>,
    buffer_needs_update: bool,
    window_lines: usize,
    current_line: usize,
    current_result_line: Option<usize>,
    track_output: bool,
    scroll_count: i64,
    observer: Box<dyn ViewportObserver>,
}

impl Viewport {
    /// A one-line window at the top of history, tracking output.
    #[must_use]
    pub fn new() -> Self {
        Self::with_observer(Box::new(NoopObserver))
    }

    /// Like [`Viewport::new`] with an observer for outbound notifications.
    #[must_use]
    pub fn with_observer(observer: Box<dyn ViewportObserver>) -> Self {
        Self {
            buffer: Vec::new(),
            buffer_needs_update: true,
            window_lines: 1,
            current_line: 0,
            current_result_line: None,
            track_output: true,
            scroll_count: 0,
            observer,
        }
    }

    // ── Geometry ────────────────────────────────────────────────────────

    pub fn set_window_lines(&mut self, lines: usize) {
        assert!(lines > 0);
        self.window_lines = lines;
    }

    #[must_use]
    pub fn window_lines(&self) -> usize {
        self.window_lines
    }

    /// The window is always as wide as the screen.
    #[must_use]
    pub fn window_columns(&self, screen: &dyn Screen) -> usize {
        screen.columns()
    }

    /// Total height of the projected space: history plus live screen.
    #[must_use]
    pub fn line_count(&self, screen: &dyn Screen) -> usize {
        screen.history_lines() + screen.screen_lines()
    }

    #[must_use]
    pub fn column_count(&self, screen: &dyn Screen) -> usize {
        screen.columns()
    }

    /// Absolute index of the window's top row, clamped to the valid range.
    ///
    /// The clamp happens on read so the window survives the screen resizing
    /// underneath it.
    #[must_use]
    pub fn current_line(&self, screen: &dyn Screen) -> usize {
        let max = self.line_count(screen).saturating_sub(self.window_lines);
        self.current_line.min(max)
    }

    /// Absolute index of the window's last row, never past the last line of
    /// the screen. Line numbers handed to the screen must not exceed this.
    fn end_window_line(&self, screen: &dyn Screen) -> usize {
        let last = self.line_count(screen).saturating_sub(1);
        (self.current_line(screen) + self.window_lines - 1).min(last)
    }

    #[must_use]
    pub fn cursor_position(&self, screen: &dyn Screen) -> (usize, usize) {
        (screen.cursor_x(), screen.cursor_y())
    }

    // ── Frame assembly ──────────────────────────────────────────────────

    /// The window's frame: `window_lines × columns` cells.
    ///
    /// Rebuilds only when a mutation happened or the window size changed;
    /// otherwise returns the cached frame. The borrow is valid until the
    /// next mutation.
    pub fn image(&mut self, screen: &dyn Screen) -> &[Cell] {
        let size = self.window_lines * screen.columns();
        if self.buffer.len() != size {
            self.buffer = vec![Cell::default(); size];
            self.buffer_needs_update = true;
        }

        if !self.buffer_needs_update {
            return &self.buffer;
        }

        let start_line = self.current_line(screen);
        let end_line = self.end_window_line(screen);
        screen.fill_image(&mut self.buffer, start_line, end_line);
        self.fill_unused_area(screen);

        self.buffer_needs_update = false;
        &self.buffer
    }

    /// Blank the rows past the end of the screen when the window looks
    /// beyond the last line.
    fn fill_unused_area(&mut self, screen: &dyn Screen) {
        let screen_end_line = (screen.history_lines() + screen.screen_lines()).saturating_sub(1);
        let window_end_line = self.current_line(screen) + self.window_lines - 1;

        let unused_lines = window_end_line.saturating_sub(screen_end_line);
        let chars_to_fill = unused_lines * screen.columns();
        if chars_to_fill == 0 {
            return;
        }

        let fill_from = self.buffer.len() - chars_to_fill;
        screen.fill_with_default_char(&mut self.buffer[fill_from..]);
    }

    /// Properties of the window's lines, padded to exactly `window_lines`
    /// entries.
    #[must_use]
    pub fn line_properties(&self, screen: &dyn Screen) -> Vec<LineProperty> {
        let mut properties =
            screen.line_properties(self.current_line(screen), self.end_window_line(screen));
        properties.resize(self.window_lines, LineProperty::empty());
        properties
    }

    // ── Selection ───────────────────────────────────────────────────────
    //
    // The screen keeps selection endpoints in absolute coordinates; these
    // translate from and to window-local line numbers.

    #[must_use]
    pub fn selected_text(&self, screen: &dyn Screen, options: DecodeOptions) -> String {
        screen.selected_text(options)
    }

    /// Selection start in window-local (column, line) coordinates.
    #[must_use]
    pub fn selection_start(&self, screen: &dyn Screen) -> (i32, i32) {
        let (column, line) = screen.selection_start();
        (column, line - self.current_line(screen) as i32)
    }

    /// Selection end in window-local (column, line) coordinates.
    #[must_use]
    pub fn selection_end(&self, screen: &dyn Screen) -> (i32, i32) {
        let (column, line) = screen.selection_end();
        (column, line - self.current_line(screen) as i32)
    }

    pub fn set_selection_start(
        &mut self,
        screen: &mut dyn Screen,
        column: i32,
        line: i32,
        column_mode: bool,
    ) {
        let absolute = line + self.current_line(screen) as i32;
        screen.set_selection_start(column, absolute, column_mode);
        self.buffer_needs_update = true;
        self.observer.selection_changed();
    }

    pub fn set_selection_end(
        &mut self,
        screen: &mut dyn Screen,
        column: i32,
        line: i32,
        trim_trailing_whitespace: bool,
    ) {
        let absolute = line + self.current_line(screen) as i32;
        screen.set_selection_end(column, absolute, trim_trailing_whitespace);
        self.buffer_needs_update = true;
        self.observer.selection_changed();
    }

    /// Select whole absolute lines `start..=end`.
    pub fn set_selection_by_line_range(&mut self, screen: &mut dyn Screen, start: i32, end: i32) {
        self.clear_selection(screen);
        let columns = screen.columns() as i32;
        screen.set_selection_start(0, start, false);
        screen.set_selection_end(columns, end, false);
        self.buffer_needs_update = true;
        self.observer.selection_changed();
    }

    /// Whether the window-local position is inside the selection.
    #[must_use]
    pub fn is_selected(&self, screen: &dyn Screen, column: i32, line: i32) -> bool {
        let absolute = (line + self.current_line(screen) as i32)
            .min(self.end_window_line(screen) as i32);
        screen.is_selected(column, absolute)
    }

    pub fn clear_selection(&mut self, screen: &mut dyn Screen) {
        screen.clear_selection();
        self.observer.selection_changed();
    }

    // ── Scrolling ───────────────────────────────────────────────────────

    /// Move the window's top row to absolute `line`, clamped to the valid
    /// range.
    pub fn scroll_to(&mut self, screen: &dyn Screen, line: isize) {
        let max = self.line_count(screen) as isize - self.window_lines as isize;
        let line = line.clamp(0, max.max(0)) as usize;

        let delta = line as i64 - self.current_line as i64;
        self.current_line = line;
        self.scroll_count += delta;

        self.buffer_needs_update = true;
        self.observer.scrolled(self.current_line);
    }

    /// Scroll relative to the current position.
    pub fn scroll_by(&mut self, screen: &dyn Screen, mode: ScrollMode, amount: isize, full_page: bool) {
        let current = self.current_line(screen) as isize;
        match mode {
            ScrollMode::Lines => self.scroll_to(screen, current + amount),
            ScrollMode::Prompts if screen.has_repl() => self.scroll_to_prompt(screen, amount),
            ScrollMode::Pages | ScrollMode::Prompts => {
                let step = if full_page {
                    self.window_lines as isize
                } else {
                    (self.window_lines / 2) as isize
                };
                self.scroll_to(screen, current + amount * step);
            }
        }
    }

    /// Walk over prompt-start markers: `amount` prompts back (negative) or
    /// forward (positive), stopping at the top of history or the start of
    /// the live screen.
    fn scroll_to_prompt(&mut self, screen: &dyn Screen, mut amount: isize) {
        let current = self.current_line(screen);
        let mut line = current;
        if amount < 0 {
            let properties = screen.line_properties(0, current);
            while line > 0 && amount < 0 {
                line -= 1;
                if properties[line].contains(LineProperty::PROMPT_START) {
                    amount += 1;
                    if amount == 0 {
                        break;
                    }
                }
            }
        } else if amount > 0 {
            let history_lines = screen.history_lines();
            let properties = screen.line_properties(current, history_lines);
            while line < history_lines && amount > 0 {
                line += 1;
                if properties[line - current].contains(LineProperty::PROMPT_START) {
                    amount -= 1;
                    if amount == 0 {
                        break;
                    }
                }
            }
        }
        self.scroll_to(screen, line as isize);
    }

    /// Whether the window's last row is the last row of output.
    #[must_use]
    pub fn at_end_of_output(&self, screen: &dyn Screen) -> bool {
        self.current_line(screen) as isize
            == self.line_count(screen) as isize - self.window_lines as isize
    }

    pub fn set_track_output(&mut self, track_output: bool) {
        self.track_output = track_output;
    }

    #[must_use]
    pub fn track_output(&self) -> bool {
        self.track_output
    }

    /// Signed sum of scroll deltas since the last reset, minus lines the
    /// screen scrolled away while output was being tracked.
    #[must_use]
    pub fn scroll_count(&self) -> i64 {
        self.scroll_count
    }

    pub fn reset_scroll_count(&mut self) {
        self.scroll_count = 0;
    }

    /// The region a renderer may smooth-scroll: the screen's last scrolled
    /// region when the window sits at the end of output at screen height,
    /// otherwise the whole window.
    #[must_use]
    pub fn scroll_region(&self, screen: &dyn Screen) -> Rect {
        if self.at_end_of_output(screen) && self.window_lines == screen.screen_lines() {
            return screen.last_scrolled_region();
        }
        Rect {
            x: 0,
            y: 0,
            width: screen.columns(),
            height: self.window_lines,
        }
    }

    // ── Output events ───────────────────────────────────────────────────

    /// React to new output on the screen.
    ///
    /// When tracking output, the window snaps so its bottom sits at the
    /// screen's bottom. Otherwise the window holds position, compensating
    /// for lines a bounded history dropped from the front so the content
    /// under the window does not appear to move.
    pub fn notify_output_changed(&mut self, screen: &dyn Screen) {
        if self.track_output {
            self.scroll_count -= screen.scrolled_lines() as i64;
            let history_lines = screen.history_lines() as isize;
            let overhang = self.window_lines as isize - screen.screen_lines() as isize;
            self.current_line = (history_lines - overhang).max(0) as usize;
        } else {
            self.current_line = self.current_line.saturating_sub(screen.dropped_lines());
            self.current_line = self.current_line.min(screen.history_lines());
        }

        self.buffer_needs_update = true;
        self.observer.output_changed();
    }

    /// Keep the window anchored to its content across a resize by applying
    /// the old/new total-line delta.
    pub fn update_current_line(&mut self, screen: &dyn Screen) {
        if !screen.is_resize() {
            return;
        }
        if self.current_line > 0 {
            let delta = screen.old_total_lines() as isize - self.line_count(screen) as isize;
            self.current_line = (self.current_line as isize - delta).max(0) as usize;
        }
        let max = (self.line_count(screen) as isize - self.window_lines as isize).max(0) as usize;
        self.current_line = self.current_line.min(max);
    }

    /// Tell the viewport the embedder is about to swap the screen it
    /// projects.
    pub fn notify_screen_about_to_change(&mut self) {
        self.observer.screen_about_to_change();
        self.buffer_needs_update = true;
    }

    // ── Search result line ──────────────────────────────────────────────

    #[must_use]
    pub fn current_result_line(&self) -> Option<usize> {
        self.current_result_line
    }

    pub fn set_current_result_line(&mut self, line: Option<usize>) {
        if self.current_result_line == line {
            return;
        }
        self.current_result_line = line;
        self.observer.current_result_line_changed();
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counts {
        result_line_changed: usize,
    }

    struct CountingObserver(Rc<RefCell<Counts>>);

    impl ViewportObserver for CountingObserver {
        fn current_result_line_changed(&mut self) {
            self.0.borrow_mut().result_line_changed += 1;
        }
    }

    #[test]
    fn result_line_notifies_only_on_change() {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let mut viewport = Viewport::with_observer(Box::new(CountingObserver(counts.clone())));

        viewport.set_current_result_line(Some(4));
        viewport.set_current_result_line(Some(4));
        viewport.set_current_result_line(None);
        assert_eq!(counts.borrow().result_line_changed, 2);
        assert_eq!(viewport.current_result_line(), None);
    }

    #[test]
    fn defaults() {
        let viewport = Viewport::new();
        assert_eq!(viewport.window_lines(), 1);
        assert!(viewport.track_output());
        assert_eq!(viewport.scroll_count(), 0);
        assert_eq!(viewport.current_result_line(), None);
    }

    #[test]
    #[should_panic]
    fn zero_window_lines_is_rejected() {
        Viewport::new().set_window_lines(0);
    }
}
