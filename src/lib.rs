//! Decoding for the binary container shared by TrueType and OpenType
//! fonts: the table directory that indexes the file's table blobs, and
//! the character-to-glyph mapping (`cmap`) table with its format 0 and
//! format 4 subtables.
//!
//! Everything is decoded out of one immutable byte buffer with explicit
//! bounds checks; variable-length results are stored in a caller-owned
//! bump [`arena::Arena`], so a whole decode is reclaimed in one
//! checkpoint restore.

use arena::ArenaError;
use buffer::AtlasByteReaderError;
use tables::TableParseError;
use thiserror::Error;

pub mod arena;
pub mod buffer;
pub mod font;
pub mod tables;

#[derive(Debug, Error)]
pub enum AtlasTypeError {
    #[error(transparent)]
    TableParseError(#[from] TableParseError),

    #[error(transparent)]
    AtlasByteReaderError(#[from] AtlasByteReaderError),

    #[error(transparent)]
    ArenaError(#[from] ArenaError),
}
