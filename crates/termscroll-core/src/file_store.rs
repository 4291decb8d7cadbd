//! Unbounded file-backed history store.
//!
//! Three byte logs carry the scroll: `cells` holds cell records in line
//! order with no separators, `index` holds one u32 per terminated line with
//! the byte offset in `cells` just past that line's last cell, and `flags`
//! holds one byte per terminated line (bit 0 = the previous line wrapped).
//! Line 0 starts at offset 0 implicitly, so `index[i - 1]` is where line `i`
//! begins.
//!
//! The cells appended since the last `end_line` form the unfinished trailing
//! line; `start_of_line(lines())` addresses it, so its cells are readable
//! before it is terminated.

use crate::cell::{Cell, CELL_BYTES};
use crate::raw_file::RawFile;

const INDEX_BYTES: usize = std::mem::size_of::<u32>();

/// Unbounded store over three [`RawFile`] logs.
#[derive(Debug, Default)]
pub struct FileStore {
    cells: RawFile,
    index: RawFile,
    flags: RawFile,
}

impl FileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of terminated lines.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.index.len() / INDEX_BYTES
    }

    /// Byte offset in `cells` where `line` starts.
    ///
    /// `lines()` addresses the unfinished trailing line; anything past that
    /// reports the end of the cell log.
    fn start_of_line(&mut self, line: usize) -> usize {
        if line == 0 {
            return 0;
        }
        if line <= self.lines() {
            if !self.index.is_mapped() {
                self.index.map();
            }
            let mut raw = [0u8; INDEX_BYTES];
            self.index.read(&mut raw, (line - 1) * INDEX_BYTES);
            return u32::from_ne_bytes(raw) as usize;
        }
        self.cells.len()
    }

    /// Cell count of `line`, including the unfinished trailing line.
    #[must_use]
    pub fn line_length(&mut self, line: usize) -> usize {
        (self.start_of_line(line + 1) - self.start_of_line(line)) / CELL_BYTES
    }

    /// Out-of-range lines report `false`.
    #[must_use]
    pub fn is_wrapped(&mut self, line: usize) -> bool {
        if line < self.lines() {
            let mut flag = [0u8];
            self.flags.read(&mut flag, line);
            return flag[0] & 0x01 != 0;
        }
        false
    }

    /// Read `count` cells of `line` starting at column `start_column`.
    pub fn read_cells(&mut self, line: usize, start_column: usize, count: usize, dest: &mut [Cell]) {
        if count == 0 {
            return;
        }
        let offset = self.start_of_line(line) + start_column * CELL_BYTES;
        let mut raw = vec![0u8; count * CELL_BYTES];
        self.cells.read(&mut raw, offset);
        for (slot, record) in dest[..count].iter_mut().zip(raw.chunks_exact(CELL_BYTES)) {
            *slot = Cell::from_bytes(record.try_into().expect("chunk is CELL_BYTES long"));
        }
    }

    /// Append cells to the unfinished line.
    pub fn append_cells(&mut self, cells: &[Cell]) {
        let mut raw = Vec::with_capacity(cells.len() * CELL_BYTES);
        for cell in cells {
            raw.extend_from_slice(&cell.to_bytes());
        }
        self.cells.append(&raw);
    }

    /// Terminate the unfinished line, recording its wrap flag.
    pub fn end_line(&mut self, previous_wrapped: bool) {
        if self.index.is_mapped() {
            self.index.unmap();
        }
        let offset = self.cells.len() as u32;
        self.index.append(&offset.to_ne_bytes());
        self.flags.append(&[u8::from(previous_wrapped)]);
    }
}
