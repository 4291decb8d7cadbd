//! Scrollback history engine and screen viewport for terminal emulators.
//!
//! `termscroll-core` is the storage and projection layer underneath a
//! terminal widget. It owns two things and nothing else:
//!
//! - **History stores**: pluggable containers for lines that scrolled off
//!   the top of the live screen — disabled ([`Store::None`]), unbounded and
//!   file-backed with demand-driven memory mapping ([`FileStore`]), or
//!   bounded and run-length-compressed in arena blocks ([`CompactStore`]).
//!   [`StoreKind`] describes the desired configuration and migrates any
//!   existing store to it without losing lines that fit.
//! - **Viewport**: a scrollable `window_lines × columns` projection over the
//!   combined history + live-screen coordinate space ([`Viewport`]), with
//!   output tracking, prompt-aware scrolling, selection coordinate
//!   translation, and lazy frame assembly.
//!
//! # Design principles
//!
//! - **Single producer, single consumer**: the live screen appends lines;
//!   the viewport reads frames. The embedder's event loop serializes both.
//! - **Degrade, don't fail**: storage faults (temp file creation, mmap,
//!   I/O) are logged and absorbed; callers observe empty history, never an
//!   error. Out-of-range reads are programming errors and fail fast.
//! - **No rendering, no parsing, no I/O beyond the history backing files**:
//!   the live screen is reached only through the [`Screen`] trait.

pub mod arena;
pub mod cell;
pub mod compact;
pub mod file_store;
pub mod raw_file;
pub mod screen;
pub mod store;
pub mod viewport;

pub use arena::{Arena, ArenaSlice};
pub use cell::{Cell, Color, Rendition, CELL_BYTES};
pub use compact::{CompactLine, CompactStore};
pub use file_store::FileStore;
pub use raw_file::RawFile;
pub use screen::{DecodeOptions, LineProperty, Rect, Screen};
pub use store::{Store, StoreKind, LINE_SIZE};
pub use viewport::{NoopObserver, ScrollMode, Viewport, ViewportObserver};
