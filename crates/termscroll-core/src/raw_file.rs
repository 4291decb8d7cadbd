//! Append-only byte log with random read and adaptive memory mapping.
//!
//! Backs the file-based history store. The log lives in a process-private
//! temp file that is removed when the log is dropped; nothing here survives
//! the session.
//!
//! Reads go through either a read-only map of the whole file or a seek+read
//! pair. A signed balance counter decides which: each append increments it,
//! each read decrements it, and once it sinks below [`MAP_THRESHOLD`] the
//! file is mapped. Mapping wins while the user scrolls back through a quiet
//! session; it loses when output is flowing, because every append has to
//! unmap first — so an append unconditionally drops the map.

use std::io::{Read, Seek, SeekFrom, Write};

use memmap2::Mmap;
use tempfile::NamedTempFile;
use tracing::warn;

/// Read/append balance below which the log maps its backing file.
const MAP_THRESHOLD: i64 = -1000;

/// Append-only byte log over an auto-removed temp file.
///
/// A log whose backing file could not be created stays unbacked: appends and
/// reads become no-ops and `len()` stays 0. Callers observe empty history
/// rather than an error.
#[derive(Debug)]
pub struct RawFile {
    file: Option<NamedTempFile>,
    length: usize,
    map: Option<Mmap>,
    balance: i64,
}

impl RawFile {
    /// Create a log backed by a fresh `termscroll-*.history` temp file.
    pub fn new() -> Self {
        let file = match tempfile::Builder::new()
            .prefix("termscroll-")
            .suffix(".history")
            .tempfile()
        {
            Ok(file) => Some(file),
            Err(err) => {
                warn!(%err, "creating history temp file failed; history stays empty");
                None
            }
        };
        Self {
            file,
            length: 0,
            map: None,
            balance: 0,
        }
    }

    /// Logical length in bytes. Bytes from failed writes are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.map.is_some()
    }

    /// Map the whole file read-only. On failure, reads keep using seek+read
    /// and the adaptive balance restarts from zero.
    pub fn map(&mut self) {
        debug_assert!(self.map.is_none());
        let Some(file) = &self.file else { return };
        if self.length == 0 {
            return;
        }
        // Safety: the temp file is process-private and this handle is its
        // only writer; the map is dropped before every append.
        match unsafe { Mmap::map(file.as_file()) } {
            Ok(map) => self.map = Some(map),
            Err(err) => {
                self.balance = 0;
                warn!(%err, "mapping history file failed; reads fall back to seek+read");
            }
        }
    }

    /// Drop the mapped region, if any.
    pub fn unmap(&mut self) {
        self.map = None;
    }

    /// Append `bytes` at the end of the log.
    ///
    /// Unmaps first if mapped. On an underlying I/O error the length is not
    /// advanced and the bytes are considered never written.
    pub fn append(&mut self, bytes: &[u8]) {
        if self.map.is_some() {
            self.unmap();
        }
        self.balance += 1;

        let Some(file) = self.file.as_mut() else {
            return;
        };
        let file = file.as_file_mut();
        if let Err(err) = file.seek(SeekFrom::Start(self.length as u64)) {
            warn!(%err, "history append seek failed");
            return;
        }
        if let Err(err) = file.write_all(bytes) {
            warn!(%err, "history append write failed");
            return;
        }
        self.length += bytes.len();
    }

    /// Read `dest.len()` bytes starting at `offset`.
    ///
    /// Requesting bytes outside `[0, len())` is a programming error.
    pub fn read(&mut self, dest: &mut [u8], offset: usize) {
        assert!(
            offset + dest.len() <= self.length,
            "history read out of range: {}+{} > {}",
            offset,
            dest.len(),
            self.length,
        );

        self.balance -= 1;
        if self.map.is_none() && self.balance < MAP_THRESHOLD {
            self.map();
        }

        if let Some(map) = &self.map {
            dest.copy_from_slice(&map[offset..offset + dest.len()]);
            return;
        }

        let Some(file) = self.file.as_mut() else {
            return;
        };
        let file = file.as_file_mut();
        if let Err(err) = file.seek(SeekFrom::Start(offset as u64)) {
            warn!(%err, "history read seek failed");
            return;
        }
        if let Err(err) = file.read_exact(dest) {
            warn!(%err, "history read failed");
        }
    }
}

impl Default for RawFile {
    fn default() -> Self {
        Self::new()
    }
}
