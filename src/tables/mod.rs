use std::fmt;

use thiserror::Error;

use crate::{
    arena::{Arena, ArenaError},
    buffer::{AtlasByteReader, AtlasByteReaderError},
};

pub mod cmap;

/// A 4-byte table identifier, e.g. `cmap` or `glyf`.
///
/// Tags are compared by raw byte equality and are case-sensitive per the
/// [Apple Documentation](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6.html);
/// `Cmap` and `cmap` name different tables.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// The character-to-glyph mapping table, the one tag this crate
    /// looks up by itself.
    pub const CMAP: Tag = Tag(*b"cmap");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

/// The outline technology announced by the first four bytes of the file.
///
/// An unrecognized value is preserved as `Unknown` rather than rejected:
/// the scaler type describes the glyph data, and the table directory and
/// cmap decode the same way regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalerType {
    /// 0x00010000, TrueType outlines.
    TrueType,
    /// `true`, the older Apple-only announcement of TrueType outlines.
    AppleTrueType,
    /// `OTTO`, Compact Font Format data (version 1 or 2).
    OpenType,
    /// `typ1`, PostScript outlines wrapped in sfnt tables.
    PostScript,
    Unknown(u32),
}

impl From<u32> for ScalerType {
    fn from(value: u32) -> Self {
        match value {
            0x0001_0000 => Self::TrueType,
            0x7472_7565 => Self::AppleTrueType,
            0x4F54_544F => Self::OpenType,
            0x7479_7031 => Self::PostScript,
            _ => Self::Unknown(value),
        }
    }
}

/// Represents the error messages which may occur when trying to
/// decode tables from a font buffer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableParseError {
    #[error(transparent)]
    AtlasByteReaderError(#[from] AtlasByteReaderError),

    #[error(transparent)]
    ArenaError(#[from] ArenaError),

    /// The stored searchRange/entrySelector/rangeShift fields disagree
    /// with the values derived from numTables. They are redundant
    /// binary-search hints, so a mismatch means a corrupt or hostile
    /// file rather than an unusual one.
    #[error(
        "directory stores binary-search hints {stored:?} for {num_tables} tables, expected {expected:?}"
    )]
    MalformedDirectory {
        num_tables: u16,
        stored: [u32; 3],
        expected: [u32; 3],
    },

    /// A format 4 subtable's declared length does not cover its own
    /// header and segment arrays, or leaves an odd number of bytes for
    /// the trailing 16-bit glyph array.
    #[error(
        "format 4 subtable declares {declared} bytes but its header and segment arrays span {consumed}"
    )]
    MalformedSubtable { declared: u16, consumed: usize },

    /// A structurally valid cmap subtable in a format this crate does
    /// not decode. Failing is deliberate; guessing at an unknown layout
    /// would misinterpret the bytes.
    #[error("cmap subtable format {0} is not supported")]
    UnsupportedFormat(u16),
}

/// Recomputes the binary-search hint fields for `count` entries of
/// `unit` bytes each.
///
/// searchRange is the largest power-of-two multiple of `unit` covered by
/// `count`, entrySelector its log2, and rangeShift the remaining bytes.
/// The reference manual recommends deriving these instead of trusting
/// the stored fields, since incorrect values can be used as an attack
/// vector. Computed in u32: a count large enough to overflow the stored
/// u16 can then never be made to match by truncation.
pub(crate) fn binary_search_hints(count: u16, unit: u16) -> [u32; 3] {
    if count == 0 {
        return [0, 0, 0];
    }

    let entry_selector = u32::from(count).ilog2();
    let search_range = (1u32 << entry_selector) * u32::from(unit);
    let range_shift = u32::from(count) * u32::from(unit) - search_range;

    [search_range, entry_selector, range_shift]
}

/// Describes one table blob inside the font file: its tag and the byte
/// range it occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableRecord {
    tag: Tag,
    checksum: u32,
    offset: u32,
    length: u32,
}

impl TableRecord {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The checksum of the table data. Not verified here; it is kept
    /// for callers that want to check integrity themselves.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Offset of the table data from the beginning of the file.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Length of the table data in bytes, excluding padding.
    pub fn length(&self) -> u32 {
        self.length
    }
}

/// Represents the table directory at the start of the file: the scaler
/// type, the binary-search hint fields and one record per table.
///
/// For more information, see the
/// [Apple Documentation](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6.html).
#[derive(Debug)]
pub struct TableDirectory<'a> {
    scaler_type: ScalerType,
    num_tables: u16,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
    records: &'a [TableRecord],
}

impl<'a> TableDirectory<'a> {
    /// Decodes the table directory from the start of the font buffer,
    /// allocating the record array from `arena`.
    ///
    /// The stored searchRange/entrySelector/rangeShift hints are
    /// recomputed from numTables and cross-checked; a disagreement
    /// fails with [`TableParseError::MalformedDirectory`].
    pub fn from_reader(
        reader: &mut AtlasByteReader,
        arena: &'a Arena,
    ) -> Result<Self, TableParseError> {
        reader.seek_to(0)?;

        let scaler_type = ScalerType::from(reader.read_u32()?);
        let num_tables = reader.read_u16()?;
        let search_range = reader.read_u16()?;
        let entry_selector = reader.read_u16()?;
        let range_shift = reader.read_u16()?;

        let stored = [
            u32::from(search_range),
            u32::from(entry_selector),
            u32::from(range_shift),
        ];
        let expected = binary_search_hints(num_tables, 16);
        if stored != expected {
            return Err(TableParseError::MalformedDirectory {
                num_tables,
                stored,
                expected,
            });
        }

        let records = arena.alloc_slice::<TableRecord>(usize::from(num_tables))?;
        for record in records.iter_mut() {
            record.tag = Tag(reader.read_chunk()?);
            record.checksum = reader.read_u32()?;
            record.offset = reader.read_u32()?;
            record.length = reader.read_u32()?;
        }

        Ok(Self {
            scaler_type,
            num_tables,
            search_range,
            entry_selector,
            range_shift,
            records,
        })
    }

    /// Returns the record whose tag matches, if any.
    ///
    /// Records are expected to be sorted ascending by tag, but that is
    /// a promise made by font producers and is not enforced here, so
    /// lookup is a linear scan in file order.
    pub fn find(&self, tag: Tag) -> Option<&TableRecord> {
        self.records.iter().find(|record| record.tag == tag)
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    /// Returns the number of tables in the font file.
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }

    pub fn search_range(&self) -> u16 {
        self.search_range
    }

    pub fn entry_selector(&self) -> u16 {
        self.entry_selector
    }

    pub fn range_shift(&self) -> u16 {
        self.range_shift
    }

    /// The table records, in file order.
    pub fn records(&self) -> &'a [TableRecord] {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u16(bytes: &mut Vec<u8>, value: u16) {
        bytes.extend_from_slice(&value.to_be_bytes());
    }

    fn push_u32(bytes: &mut Vec<u8>, value: u32) {
        bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Encodes a directory with correct derived hint fields.
    fn directory_bytes(scaler: u32, records: &[(Tag, u32, u32, u32)]) -> Vec<u8> {
        let count = records.len() as u16;
        let [search_range, entry_selector, range_shift] = binary_search_hints(count, 16);

        let mut bytes = Vec::new();
        push_u32(&mut bytes, scaler);
        push_u16(&mut bytes, count);
        push_u16(&mut bytes, search_range as u16);
        push_u16(&mut bytes, entry_selector as u16);
        push_u16(&mut bytes, range_shift as u16);
        for &(tag, checksum, offset, length) in records {
            bytes.extend_from_slice(tag.as_bytes());
            push_u32(&mut bytes, checksum);
            push_u32(&mut bytes, offset);
            push_u32(&mut bytes, length);
        }

        bytes
    }

    #[test]
    fn hints_match_the_reference_values() {
        // (numTables, searchRange, entrySelector, rangeShift) from the
        // reference manual's worked examples.
        let reference = [
            (1u16, 16u32, 0u32, 0u32),
            (2, 32, 1, 0),
            (16, 256, 4, 0),
            (17, 256, 4, 16),
            (255, 2048, 7, 2032),
        ];

        for (count, search_range, entry_selector, range_shift) in reference {
            assert_eq!(
                binary_search_hints(count, 16),
                [search_range, entry_selector, range_shift],
                "numTables = {count}"
            );
        }
    }

    #[test]
    fn directory_round_trips() {
        let records = [
            (Tag(*b"cmap"), 0xDEAD_BEEF, 300, 120),
            (Tag(*b"glyf"), 0x0BAD_F00D, 420, 9000),
            (Tag(*b"head"), 0x1234_5678, 9420, 54),
        ];
        let bytes = directory_bytes(0x0001_0000, &records);

        let arena = Arena::with_capacity(1024);
        let mut reader = AtlasByteReader::new(&bytes);
        let directory = TableDirectory::from_reader(&mut reader, &arena).unwrap();

        assert_eq!(directory.scaler_type(), ScalerType::TrueType);
        assert_eq!(directory.num_tables(), 3);
        assert_eq!(directory.records().len(), 3);
        for (decoded, &(tag, checksum, offset, length)) in
            directory.records().iter().zip(&records)
        {
            assert_eq!(decoded.tag(), tag);
            assert_eq!(decoded.checksum(), checksum);
            assert_eq!(decoded.offset(), offset);
            assert_eq!(decoded.length(), length);
        }
    }

    #[test]
    fn unknown_scaler_type_is_preserved() {
        let bytes = directory_bytes(0xAABB_CCDD, &[(Tag(*b"cmap"), 0, 12, 0)]);

        let arena = Arena::with_capacity(256);
        let mut reader = AtlasByteReader::new(&bytes);
        let directory = TableDirectory::from_reader(&mut reader, &arena).unwrap();

        assert_eq!(directory.scaler_type(), ScalerType::Unknown(0xAABB_CCDD));
    }

    #[test]
    fn inconsistent_hints_are_rejected() {
        let mut bytes = directory_bytes(0x0001_0000, &[(Tag(*b"cmap"), 0, 12, 0)]);
        // searchRange for one table is 16; store 32 instead.
        bytes[6..8].copy_from_slice(&32u16.to_be_bytes());

        let arena = Arena::with_capacity(256);
        let mut reader = AtlasByteReader::new(&bytes);
        let err = TableDirectory::from_reader(&mut reader, &arena).unwrap_err();

        assert_eq!(
            err,
            TableParseError::MalformedDirectory {
                num_tables: 1,
                stored: [32, 0, 0],
                expected: [16, 0, 0],
            }
        );
    }

    #[test]
    fn truncated_record_array_is_rejected() {
        let records = [
            (Tag(*b"cmap"), 0, 92, 10),
            (Tag(*b"glyf"), 0, 102, 10),
            (Tag(*b"head"), 0, 112, 10),
            (Tag(*b"loca"), 0, 122, 10),
            (Tag(*b"maxp"), 0, 132, 10),
        ];
        let mut bytes = directory_bytes(0x0001_0000, &records);
        // Five records declared, bytes for four present.
        bytes.truncate(bytes.len() - 16);

        let arena = Arena::with_capacity(1024);
        let mut reader = AtlasByteReader::new(&bytes);
        let err = TableDirectory::from_reader(&mut reader, &arena).unwrap_err();

        assert!(matches!(
            err,
            TableParseError::AtlasByteReaderError(AtlasByteReaderError::TruncatedBuffer { .. })
        ));
    }

    #[test]
    fn find_scans_in_file_order() {
        let records = [
            (Tag(*b"glyf"), 0, 44, 10),
            (Tag(*b"cmap"), 0, 54, 10),
        ];
        let bytes = directory_bytes(0x0001_0000, &records);

        let arena = Arena::with_capacity(512);
        let mut reader = AtlasByteReader::new(&bytes);
        let directory = TableDirectory::from_reader(&mut reader, &arena).unwrap();

        let record = directory.find(Tag::CMAP).unwrap();
        assert_eq!(record.offset(), 54);
        assert!(directory.find(Tag(*b"name")).is_none());
    }
}
