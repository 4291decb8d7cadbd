//! History store variants and migration between them.
//!
//! The store is a tagged variant rather than a trait object: the three
//! strategies are known, and migration wants to match on (target, current)
//! pairs to reuse an instance in place instead of downcasting.
//!
//! [`StoreKind`] is the configuration value. `create` consumes the session's
//! current store and returns the store for the new configuration; lines that
//! fit the new capacity survive with their order, cells, and wrap flags.

use smallvec::SmallVec;
use tracing::debug;

use crate::cell::Cell;
use crate::compact::CompactStore;
use crate::file_store::FileStore;

/// Inline capacity (in cells) of the migration copy buffer. Longer lines
/// spill to a heap buffer sized to the line; they are never truncated.
pub const LINE_SIZE: usize = 1024;

/// A scrollback history store.
///
/// The uniform contract: lines are numbered in insertion order, cells are
/// appended to an unfinished current line, and `end_line` terminates it with
/// the previous-wrapped flag. Reads with `count == 0` are no-ops; wrap
/// queries out of range report `false`.
#[derive(Debug)]
pub enum Store {
    /// Zero-capacity store: appends vanish, reads see nothing.
    None,
    /// Unbounded file-backed store.
    File(FileStore),
    /// Bounded in-memory compact store.
    Compact(CompactStore),
}

impl Store {
    /// Number of terminated lines.
    #[must_use]
    pub fn lines(&self) -> usize {
        match self {
            Store::None => 0,
            Store::File(store) => store.lines(),
            Store::Compact(store) => store.lines(),
        }
    }

    /// Cell count of `line`.
    #[must_use]
    pub fn line_length(&mut self, line: usize) -> usize {
        match self {
            Store::None => 0,
            Store::File(store) => store.line_length(line),
            Store::Compact(store) => store.line_length(line),
        }
    }

    /// Whether the line before `line` overflowed the screen width.
    #[must_use]
    pub fn is_wrapped(&mut self, line: usize) -> bool {
        match self {
            Store::None => false,
            Store::File(store) => store.is_wrapped(line),
            Store::Compact(store) => store.is_wrapped(line),
        }
    }

    /// Read `count` cells of `line` starting at `start_column` into `dest`.
    pub fn read_cells(&mut self, line: usize, start_column: usize, count: usize, dest: &mut [Cell]) {
        match self {
            Store::None => {}
            Store::File(store) => store.read_cells(line, start_column, count, dest),
            Store::Compact(store) => store.read_cells(line, start_column, count, dest),
        }
    }

    /// Append cells to the unfinished current line.
    pub fn append_cells(&mut self, cells: &[Cell]) {
        match self {
            Store::None => {}
            Store::File(store) => store.append_cells(cells),
            Store::Compact(store) => store.append_cells(cells),
        }
    }

    /// Terminate the current line, recording the previous-wrapped flag.
    pub fn end_line(&mut self, previous_wrapped: bool) {
        match self {
            Store::None => {}
            Store::File(store) => store.end_line(previous_wrapped),
            Store::Compact(store) => store.end_line(previous_wrapped),
        }
    }

    /// Whether this store retains any scrollback at all.
    #[must_use]
    pub fn has_scroll(&self) -> bool {
        !matches!(self, Store::None)
    }

    /// The configuration this store satisfies.
    #[must_use]
    pub fn kind(&self) -> StoreKind {
        match self {
            Store::None => StoreKind::None,
            Store::File(_) => StoreKind::File,
            Store::Compact(store) => StoreKind::Compact {
                max_lines: store.max_line_count(),
            },
        }
    }
}

/// Desired history configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreKind {
    /// Keep no history.
    None,
    /// Unbounded file-backed history.
    File,
    /// Bounded in-memory history of at most `max_lines` lines.
    Compact { max_lines: usize },
}

impl StoreKind {
    /// Whether this configuration retains any history.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, StoreKind::None)
    }

    /// Line capacity: `None` means unbounded.
    #[must_use]
    pub fn max_line_count(&self) -> Option<usize> {
        match self {
            StoreKind::None => Some(0),
            StoreKind::File => None,
            StoreKind::Compact { max_lines } => Some(*max_lines),
        }
    }

    /// Produce the store for this configuration, migrating `old`.
    ///
    /// A store already of the target kind is reused in place (for
    /// `Compact`, with its capacity updated). Otherwise a fresh store is
    /// built and every line of `old` is copied over before `old` is
    /// dropped; a bounded target then retains the newest lines that fit.
    #[must_use]
    pub fn create(self, old: Option<Store>) -> Store {
        match (self, old) {
            (StoreKind::None, _) => Store::None,
            (StoreKind::File, Some(Store::File(store))) => Store::File(store),
            (StoreKind::File, old) => {
                let mut new = Store::File(FileStore::new());
                if let Some(mut old) = old {
                    copy_lines(&mut old, &mut new);
                }
                new
            }
            (StoreKind::Compact { max_lines }, Some(Store::Compact(mut store))) => {
                store.set_max_line_count(max_lines);
                Store::Compact(store)
            }
            (StoreKind::Compact { max_lines }, old) => {
                let mut new = Store::Compact(CompactStore::new(max_lines));
                if let Some(mut old) = old {
                    copy_lines(&mut old, &mut new);
                }
                new
            }
        }
    }
}

/// Copy every terminated line of `old` into `new`, oldest first.
fn copy_lines(old: &mut Store, new: &mut Store) {
    let lines = old.lines();
    debug!(lines, from = ?old.kind(), to = ?new.kind(), "migrating history store");

    let mut buf: SmallVec<[Cell; LINE_SIZE]> = SmallVec::new();
    for line in 0..lines {
        let length = old.line_length(line);
        buf.clear();
        buf.resize(length, Cell::default());
        old.read_cells(line, 0, length, &mut buf);
        new.append_cells(&buf);
        new.end_line(old.is_wrapped(line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(text: &str) -> Vec<Cell> {
        text.chars().map(|ch| Cell::new(ch as u16)).collect()
    }

    fn fill(store: &mut Store, lines: &[(&str, bool)]) {
        for (text, wrapped) in lines {
            store.append_cells(&cells(text));
            store.end_line(*wrapped);
        }
    }

    fn snapshot(store: &mut Store) -> Vec<(Vec<Cell>, bool)> {
        (0..store.lines())
            .map(|line| {
                let length = store.line_length(line);
                let mut dest = vec![Cell::default(); length];
                store.read_cells(line, 0, length, &mut dest);
                (dest, store.is_wrapped(line))
            })
            .collect()
    }

    #[test]
    fn none_store_swallows_everything() {
        let mut store = StoreKind::None.create(None);
        fill(&mut store, &[("ignored", false)]);
        assert_eq!(store.lines(), 0);
        assert!(!store.has_scroll());
        assert!(!store.is_wrapped(0));
    }

    #[test]
    fn kind_reports_configuration() {
        assert!(!StoreKind::None.is_enabled());
        assert!(StoreKind::File.is_enabled());
        assert_eq!(StoreKind::None.max_line_count(), Some(0));
        assert_eq!(StoreKind::File.max_line_count(), None);
        assert_eq!(
            StoreKind::Compact { max_lines: 7 }.max_line_count(),
            Some(7)
        );
    }

    #[test]
    fn none_to_compact_starts_empty() {
        let old = StoreKind::None.create(None);
        let store = StoreKind::Compact { max_lines: 2 }.create(Some(old));
        assert_eq!(store.lines(), 0);
        assert_eq!(store.kind(), StoreKind::Compact { max_lines: 2 });
    }

    #[test]
    fn file_to_file_is_identity() {
        let mut old = StoreKind::File.create(None);
        fill(&mut old, &[("keep", true)]);
        let before = snapshot(&mut old);

        let mut new = StoreKind::File.create(Some(old));
        assert_eq!(snapshot(&mut new), before);
    }

    #[test]
    fn compact_to_compact_updates_capacity_in_place() {
        let mut old = StoreKind::Compact { max_lines: 5 }.create(None);
        fill(&mut old, &[("a", false), ("b", false), ("c", false)]);

        let mut new = StoreKind::Compact { max_lines: 2 }.create(Some(old));
        assert_eq!(new.lines(), 2);
        let lines = snapshot(&mut new);
        assert_eq!(lines[0].0, cells("b"));
        assert_eq!(lines[1].0, cells("c"));
    }

    #[test]
    fn compact_to_compact_with_same_capacity_is_identity() {
        let mut old = StoreKind::Compact { max_lines: 4 }.create(None);
        fill(&mut old, &[("one", false), ("two", true)]);
        let before = snapshot(&mut old);

        let mut new = StoreKind::Compact { max_lines: 4 }.create(Some(old));
        assert_eq!(new.kind(), StoreKind::Compact { max_lines: 4 });
        assert_eq!(snapshot(&mut new), before);
    }

    #[test]
    fn compact_to_file_copies_lines_and_flags() {
        let mut old = StoreKind::Compact { max_lines: 10 }.create(None);
        fill(&mut old, &[("first", false), ("second", true), ("", false)]);
        let before = snapshot(&mut old);

        let mut new = StoreKind::File.create(Some(old));
        assert!(matches!(new, Store::File(_)));
        assert_eq!(snapshot(&mut new), before);
    }

    #[test]
    fn file_to_compact_retains_newest_lines_that_fit() {
        let mut old = StoreKind::File.create(None);
        fill(
            &mut old,
            &[("0", false), ("1", true), ("2", false), ("3", true)],
        );

        let mut new = StoreKind::Compact { max_lines: 2 }.create(Some(old));
        let lines = snapshot(&mut new);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (cells("2"), false));
        assert_eq!(lines[1], (cells("3"), true));
    }

    #[test]
    fn migration_copies_lines_longer_than_the_inline_buffer() {
        let long = "x".repeat(LINE_SIZE + 37);
        let mut old = StoreKind::File.create(None);
        fill(&mut old, &[(&long, false)]);

        let mut new = StoreKind::Compact { max_lines: 4 }.create(Some(old));
        assert_eq!(new.line_length(0), LINE_SIZE + 37);
        let lines = snapshot(&mut new);
        assert_eq!(lines[0].0, cells(&long));
    }
}
