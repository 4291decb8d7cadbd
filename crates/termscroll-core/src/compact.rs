//! Run-length-compressed history lines and the bounded compact store.
//!
//! A line is stored as a flat array of code points plus a short list of
//! format runs; run `k` covers the columns from its start up to the next
//! run's start (the last run extends to the end of the line). Prompt-style
//! output rarely has more than a handful of runs per line, so this trades a
//! bounded linear scan on read for a large memory win over per-cell formats.
//!
//! Both arrays live in the [`Arena`]; the line header lives in the store's
//! ring. Evicting a line releases its arrays back to the arena, and whole
//! blocks are reclaimed once every line allocated from them is gone.

use std::collections::VecDeque;

use tracing::trace;

use crate::arena::{Arena, ArenaSlice};
use crate::cell::{Cell, Color, Rendition};

const CHAR_BYTES: usize = 2;
// start column (u32) + rendition (u16) + fg (u32) + bg (u32)
const RUN_BYTES: usize = 14;

fn encode_run(buf: &mut [u8], start: u32, cell: &Cell) {
    buf[0..4].copy_from_slice(&start.to_ne_bytes());
    buf[4..6].copy_from_slice(&cell.rendition.bits().to_ne_bytes());
    buf[6..10].copy_from_slice(&cell.fg.pack().to_ne_bytes());
    buf[10..14].copy_from_slice(&cell.bg.pack().to_ne_bytes());
}

fn run_start(runs: &[u8], index: usize) -> u32 {
    let at = index * RUN_BYTES;
    u32::from_ne_bytes([runs[at], runs[at + 1], runs[at + 2], runs[at + 3]])
}

/// One history line: code points plus format runs, both arena-allocated.
///
/// An empty line owns no arena storage at all.
#[derive(Debug)]
pub struct CompactLine {
    length: u32,
    wrapped: bool,
    text: Option<ArenaSlice>,
    runs: Option<ArenaSlice>,
}

impl CompactLine {
    /// Compress `cells` into `arena`.
    ///
    /// Walks the cells once to count format changes, then again to record
    /// run boundaries and copy code points.
    pub fn new(cells: &[Cell], arena: &mut Arena) -> Self {
        if cells.is_empty() {
            return Self {
                length: 0,
                wrapped: false,
                text: None,
                runs: None,
            };
        }

        let mut run_count = 1;
        for pair in cells.windows(2) {
            if !pair[1].same_format(&pair[0]) {
                run_count += 1;
            }
        }

        let text = arena.allocate(cells.len() * CHAR_BYTES);
        let runs = arena.allocate(run_count * RUN_BYTES);

        let text_buf = arena.get_mut(text);
        for (i, cell) in cells.iter().enumerate() {
            text_buf[i * CHAR_BYTES..(i + 1) * CHAR_BYTES].copy_from_slice(&cell.ch.to_ne_bytes());
        }

        let runs_buf = arena.get_mut(runs);
        encode_run(&mut runs_buf[0..RUN_BYTES], 0, &cells[0]);
        let mut current = &cells[0];
        let mut next_run = 1;
        for (column, cell) in cells.iter().enumerate().skip(1) {
            if !cell.same_format(current) {
                let at = next_run * RUN_BYTES;
                encode_run(&mut runs_buf[at..at + RUN_BYTES], column as u32, cell);
                current = cell;
                next_run += 1;
            }
        }
        debug_assert_eq!(next_run, run_count);

        Self {
            length: cells.len() as u32,
            wrapped: false,
            text: Some(text),
            runs: Some(runs),
        }
    }

    /// Cell count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn set_wrapped(&mut self, wrapped: bool) {
        self.wrapped = wrapped;
    }

    /// Number of format runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.map_or(0, |slice| slice.len() / RUN_BYTES)
    }

    /// Materialize the cell at `index`.
    ///
    /// Finds the enclosing run by linear scan; runs are few.
    #[must_use]
    pub fn cell_at(&self, index: usize, arena: &Arena) -> Cell {
        assert!(index < self.len(), "column {index} out of line of length {}", self.len());
        let text = arena.get(self.text.expect("non-empty line has text"));
        let runs = arena.get(self.runs.expect("non-empty line has runs"));

        let total_runs = runs.len() / RUN_BYTES;
        let mut run = 0;
        while run + 1 < total_runs && run_start(runs, run + 1) as usize <= index {
            run += 1;
        }

        let at = run * RUN_BYTES;
        Cell {
            ch: u16::from_ne_bytes([text[index * CHAR_BYTES], text[index * CHAR_BYTES + 1]]),
            rendition: Rendition::from_bits_truncate(u16::from_ne_bytes([
                runs[at + 4],
                runs[at + 5],
            ])),
            fg: Color::unpack(u32::from_ne_bytes([
                runs[at + 6],
                runs[at + 7],
                runs[at + 8],
                runs[at + 9],
            ])),
            bg: Color::unpack(u32::from_ne_bytes([
                runs[at + 10],
                runs[at + 11],
                runs[at + 12],
                runs[at + 13],
            ])),
        }
    }

    /// Fill `dest` with the cells at columns `start..start + dest.len()`.
    pub fn read_cells(&self, dest: &mut [Cell], start: usize, arena: &Arena) {
        assert!(
            start + dest.len() <= self.len(),
            "cell range {start}..{} out of line of length {}",
            start + dest.len(),
            self.len(),
        );
        for (i, slot) in dest.iter_mut().enumerate() {
            *slot = self.cell_at(start + i, arena);
        }
    }

    /// Release the arena storage. The header itself is dropped by the ring.
    fn release(&mut self, arena: &mut Arena) {
        if let Some(text) = self.text.take() {
            arena.deallocate(text);
        }
        if let Some(runs) = self.runs.take() {
            arena.deallocate(runs);
        }
    }
}

/// Bounded FIFO of compact lines; drops the oldest line on overflow.
#[derive(Debug)]
pub struct CompactStore {
    lines: VecDeque<CompactLine>,
    arena: Arena,
    max_line_count: usize,
    /// Whether the line at the back came from `append_cells` and has not
    /// been terminated yet.
    line_open: bool,
}

impl CompactStore {
    #[must_use]
    pub fn new(max_line_count: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            arena: Arena::new(),
            max_line_count,
            line_open: false,
        }
    }

    #[must_use]
    pub fn max_line_count(&self) -> usize {
        self.max_line_count
    }

    /// Update the capacity, evicting from the front until it is respected.
    pub fn set_max_line_count(&mut self, max_line_count: usize) {
        self.max_line_count = max_line_count;
        self.evict_overflow();
    }

    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn line_length(&self, line: usize) -> usize {
        self.lines[line].len()
    }

    /// Out-of-range lines report `false`.
    #[must_use]
    pub fn is_wrapped(&self, line: usize) -> bool {
        self.lines.get(line).is_some_and(CompactLine::is_wrapped)
    }

    /// Read `count` cells of `line` starting at column `start_column`.
    pub fn read_cells(&self, line: usize, start_column: usize, count: usize, dest: &mut [Cell]) {
        if count == 0 {
            return;
        }
        assert!(line < self.lines.len(), "line {line} out of range");
        self.lines[line].read_cells(&mut dest[..count], start_column, &self.arena);
    }

    /// Store `cells` as one complete line.
    ///
    /// The producer terminates every line with [`CompactStore::end_line`]
    /// immediately after appending it.
    pub fn append_cells(&mut self, cells: &[Cell]) {
        let line = CompactLine::new(cells, &mut self.arena);
        self.lines.push_back(line);
        self.line_open = true;
        self.evict_overflow();
    }

    /// Terminate the current line, recording the previous-wrapped flag.
    ///
    /// With no cells appended since the last termination, this produces a
    /// fresh zero-length line; an earlier line's flag is never touched.
    pub fn end_line(&mut self, previous_wrapped: bool) {
        if !self.line_open {
            let mut line = CompactLine::new(&[], &mut self.arena);
            line.set_wrapped(previous_wrapped);
            self.lines.push_back(line);
            self.evict_overflow();
        } else if let Some(line) = self.lines.back_mut() {
            line.set_wrapped(previous_wrapped);
        }
        self.line_open = false;
    }

    fn evict_overflow(&mut self) {
        while self.lines.len() > self.max_line_count {
            if let Some(mut line) = self.lines.pop_front() {
                line.release(&mut self.arena);
                trace!(remaining = self.lines.len(), "evicted oldest history line");
            }
        }
    }

    #[cfg(test)]
    fn arena_block_count(&self) -> usize {
        self.arena.block_count()
    }
}
