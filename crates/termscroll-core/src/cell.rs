//! Styled character cell: the unit of history storage.
//!
//! Cells here model what survives into scrollback — a 16-bit code point plus
//! rendition flags and colors — not the rendering pipeline's view of a glyph.
//! The fixed-width binary codec is what the file-backed store writes; the
//! compact store keeps only one copy of each distinct format per run instead.

use bitflags::bitflags;

bitflags! {
    /// Rendition attribute flags.
    ///
    /// Maps to the ECMA-48 SGR attributes that affect how a cell is drawn.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Rendition: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const REVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// Color of a cell's foreground or background.
///
/// The standard terminal color hierarchy: default → 256 indexed → 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default (SGR 39 / SGR 49).
    #[default]
    Default,
    /// 256-color palette index (the first 16 are the named colors).
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

// Packed layout is 0xTT_RRGGBB: the top byte tags the variant, the low three
// bytes carry the payload.
const TAG_INDEXED: u32 = 0x00;
const TAG_RGB: u32 = 0x01;
const TAG_DEFAULT: u32 = 0xFF;

impl Color {
    /// Pack into a tagged `u32` for fixed-width storage.
    #[must_use]
    pub const fn pack(self) -> u32 {
        match self {
            Color::Default => TAG_DEFAULT << 24,
            Color::Indexed(idx) => (TAG_INDEXED << 24) | idx as u32,
            Color::Rgb(r, g, b) => {
                (TAG_RGB << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
            }
        }
    }

    /// Unpack a tagged `u32`. Unknown tags decode as [`Color::Default`].
    #[must_use]
    pub const fn unpack(raw: u32) -> Self {
        match raw >> 24 {
            TAG_INDEXED => Color::Indexed((raw & 0xFF) as u8),
            TAG_RGB => Color::Rgb(
                ((raw >> 16) & 0xFF) as u8,
                ((raw >> 8) & 0xFF) as u8,
                (raw & 0xFF) as u8,
            ),
            _ => Color::Default,
        }
    }
}

/// Size of one encoded cell in the file-backed store.
pub const CELL_BYTES: usize = 12;

/// One styled character position.
///
/// Two cells are *format-equal* when they agree on rendition and both colors;
/// the code point does not participate. Format equality is what the compact
/// store's run-length compression is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// UTF-16 code unit. Sufficient for the compact path; content outside the
    /// BMP is the embedder's concern.
    pub ch: u16,
    pub rendition: Rendition,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    /// A cell with the given code point and default format.
    #[must_use]
    pub const fn new(ch: u16) -> Self {
        Self {
            ch,
            rendition: Rendition::empty(),
            fg: Color::Default,
            bg: Color::Default,
        }
    }

    /// Whether `self` and `other` agree on rendition, foreground, background.
    #[must_use]
    pub fn same_format(&self, other: &Self) -> bool {
        self.rendition == other.rendition && self.fg == other.fg && self.bg == other.bg
    }

    /// Encode to the fixed-width native-endian record the file store uses.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; CELL_BYTES] {
        let mut raw = [0u8; CELL_BYTES];
        raw[0..2].copy_from_slice(&self.ch.to_ne_bytes());
        raw[2..4].copy_from_slice(&self.rendition.bits().to_ne_bytes());
        raw[4..8].copy_from_slice(&self.fg.pack().to_ne_bytes());
        raw[8..12].copy_from_slice(&self.bg.pack().to_ne_bytes());
        raw
    }

    /// Decode a record written by [`Cell::to_bytes`].
    #[must_use]
    pub fn from_bytes(raw: &[u8; CELL_BYTES]) -> Self {
        Self {
            ch: u16::from_ne_bytes([raw[0], raw[1]]),
            rendition: Rendition::from_bits_truncate(u16::from_ne_bytes([raw[2], raw[3]])),
            fg: Color::unpack(u32::from_ne_bytes([raw[4], raw[5], raw[6], raw[7]])),
            bg: Color::unpack(u32::from_ne_bytes([raw[8], raw[9], raw[10], raw[11]])),
        }
    }
}

impl Default for Cell {
    /// The blank cell: a space with default format.
    fn default() -> Self {
        Self::new(b' ' as u16)
    }
}
