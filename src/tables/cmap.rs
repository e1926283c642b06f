use crate::{
    arena::Arena,
    buffer::AtlasByteReader,
    tables::{TableParseError, binary_search_hints},
};

/// The platform an encoding record targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformId {
    #[default]
    Unicode,
    Macintosh,
    /// Deprecated by the reference manual; kept so existing fonts
    /// still identify themselves.
    Iso,
    Microsoft,
    Custom,
    Unknown(u16),
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Iso,
            3 => Self::Microsoft,
            4 => Self::Custom,
            _ => Self::Unknown(value),
        }
    }
}

/// Platform-specific encoding identifiers for `PlatformId::Unicode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicodeEncodingId {
    /// Version 1.0, deprecated.
    Version1,
    /// Version 1.1, deprecated.
    Version1_1,
    /// ISO/IEC 10646, deprecated.
    Iso10646,
    /// Unicode 2.0, BMP only; for use with subtable format 4 or 6.
    Unicode2_0Bmp,
    /// Unicode 2.0, full repertoire; for use with subtable format 10 or 12.
    Unicode2_0Full,
    /// For use with subtable format 14.
    VariationSequences,
    /// Full repertoire; for use with subtable format 13.
    UnicodeFull,
    Unknown(u16),
}

impl From<u16> for UnicodeEncodingId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Version1,
            1 => Self::Version1_1,
            2 => Self::Iso10646,
            3 => Self::Unicode2_0Bmp,
            4 => Self::Unicode2_0Full,
            5 => Self::VariationSequences,
            6 => Self::UnicodeFull,
            _ => Self::Unknown(value),
        }
    }
}

/// Platform-specific encoding identifiers for `PlatformId::Macintosh`,
/// straight from the reference manual's script list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacintoshEncodingId {
    Roman,
    Japanese,
    ChineseTraditional,
    Korean,
    Arabic,
    Hebrew,
    Greek,
    Russian,
    RSymbol,
    Devanagari,
    Gurmukhi,
    Gujarati,
    Odia,
    Bangla,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Sinhalese,
    Burmese,
    Khmer,
    Thai,
    Laotian,
    Georgian,
    Armenian,
    ChineseSimplified,
    Tibetan,
    Mongolian,
    Geez,
    Slavic,
    Vietnamese,
    Sindhi,
    Uninterpreted,
    Unknown(u16),
}

impl From<u16> for MacintoshEncodingId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Roman,
            1 => Self::Japanese,
            2 => Self::ChineseTraditional,
            3 => Self::Korean,
            4 => Self::Arabic,
            5 => Self::Hebrew,
            6 => Self::Greek,
            7 => Self::Russian,
            8 => Self::RSymbol,
            9 => Self::Devanagari,
            10 => Self::Gurmukhi,
            11 => Self::Gujarati,
            12 => Self::Odia,
            13 => Self::Bangla,
            14 => Self::Tamil,
            15 => Self::Telugu,
            16 => Self::Kannada,
            17 => Self::Malayalam,
            18 => Self::Sinhalese,
            19 => Self::Burmese,
            20 => Self::Khmer,
            21 => Self::Thai,
            22 => Self::Laotian,
            23 => Self::Georgian,
            24 => Self::Armenian,
            25 => Self::ChineseSimplified,
            26 => Self::Tibetan,
            27 => Self::Mongolian,
            28 => Self::Geez,
            29 => Self::Slavic,
            30 => Self::Vietnamese,
            31 => Self::Sindhi,
            32 => Self::Uninterpreted,
            _ => Self::Unknown(value),
        }
    }
}

/// Platform-specific encoding identifiers for `PlatformId::Microsoft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowsEncodingId {
    Symbol,
    /// For use with subtable format 4. Must not be used to support
    /// Unicode supplementary-plane characters.
    UnicodeBmp,
    ShiftJis,
    Prc,
    Big5,
    Wansung,
    Johab,
    UnicodeFull,
    Unknown(u16),
}

impl From<u16> for WindowsEncodingId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Symbol,
            1 => Self::UnicodeBmp,
            2 => Self::ShiftJis,
            3 => Self::Prc,
            4 => Self::Big5,
            5 => Self::Wansung,
            6 => Self::Johab,
            10 => Self::UnicodeFull,
            _ => Self::Unknown(value),
        }
    }
}

/// One entry in the cmap header, pointing at a subtable for a
/// platform/encoding pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingRecord {
    platform_id: PlatformId,
    platform_specific_id: u16,
    offset: u32,
}

impl EncodingRecord {
    pub fn platform_id(&self) -> PlatformId {
        self.platform_id
    }

    /// The raw platform-specific encoding identifier. Its meaning
    /// depends on the platform; see [`UnicodeEncodingId`],
    /// [`MacintoshEncodingId`] and [`WindowsEncodingId`].
    pub fn platform_specific_id(&self) -> u16 {
        self.platform_specific_id
    }

    /// Offset of the subtable, relative to the START OF THE CMAP TABLE,
    /// not the file. Callers add the cmap table's own offset before
    /// seeking.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Whether this record points at a Unicode-capable subtable: any
    /// Unicode platform entry, or a Microsoft entry with a Unicode BMP
    /// or full-repertoire encoding.
    pub fn is_unicode(&self) -> bool {
        match self.platform_id {
            PlatformId::Unicode => true,
            PlatformId::Microsoft => matches!(
                WindowsEncodingId::from(self.platform_specific_id),
                WindowsEncodingId::UnicodeBmp | WindowsEncodingId::UnicodeFull
            ),
            _ => false,
        }
    }
}

/// Represents the header of the
/// [cmap table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html):
/// the table version and one encoding record per platform/encoding pair.
#[derive(Debug)]
pub struct CmapHeader<'a> {
    version: u16,
    records: &'a [EncodingRecord],
}

impl<'a> CmapHeader<'a> {
    /// Decodes the cmap header at `offset`, the file-absolute position
    /// recorded for the `cmap` tag in the table directory.
    pub fn from_reader(
        reader: &mut AtlasByteReader,
        arena: &'a Arena,
        offset: usize,
    ) -> Result<Self, TableParseError> {
        reader.seek_to(offset)?;

        let version = reader.read_u16()?;
        let num_records = reader.read_u16()?;

        let records = arena.alloc_slice::<EncodingRecord>(usize::from(num_records))?;
        for record in records.iter_mut() {
            record.platform_id = PlatformId::from(reader.read_u16()?);
            record.platform_specific_id = reader.read_u16()?;
            record.offset = reader.read_u32()?;
        }

        Ok(Self { version, records })
    }

    /// The version of the cmap table, almost guaranteed to be zero.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// The encoding records, in file order.
    pub fn records(&self) -> &'a [EncodingRecord] {
        self.records
    }
}

/// A decoded cmap subtable.
///
/// Only the byte-encoding table (format 0) and the segmented BMP
/// mapping (format 4) are decoded; together they cover the formats the
/// original Macintosh platform and BMP-only Unicode fonts use. Every
/// other format fails with [`TableParseError::UnsupportedFormat`]
/// rather than guessing at a layout.
#[derive(Debug)]
pub enum CmapSubtable<'a> {
    Format0(CmapFormat0<'a>),
    Format4(CmapFormat4<'a>),
}

impl<'a> CmapSubtable<'a> {
    /// Decodes the subtable at `offset`, the file-absolute position a
    /// caller computes as cmap table start + encoding record offset.
    /// Dispatches on the leading format field.
    pub fn from_reader(
        reader: &mut AtlasByteReader,
        arena: &'a Arena,
        offset: usize,
    ) -> Result<Self, TableParseError> {
        reader.seek_to(offset)?;

        let format = reader.read_u16()?;
        match format {
            0 => Ok(Self::Format0(CmapFormat0::from_reader(reader, arena)?)),
            4 => Ok(Self::Format4(CmapFormat4::from_reader(reader, arena)?)),
            other => Err(TableParseError::UnsupportedFormat(other)),
        }
    }

    /// The format number this subtable was decoded from.
    pub fn format(&self) -> u16 {
        match self {
            Self::Format0(_) => 0,
            Self::Format4(_) => 4,
        }
    }

    /// Resolves a code point to a glyph id, `None` when the subtable
    /// does not map it.
    pub fn glyph_index(&self, code_point: u32) -> Option<u16> {
        match self {
            Self::Format0(subtable) => subtable.glyph_index(code_point),
            Self::Format4(subtable) => subtable.glyph_index(code_point),
        }
    }
}

/// The byte-encoding subtable (format 0): a flat 256-entry table from
/// single-byte character codes to glyph ids. Used on older Macintosh
/// platforms but not required on newer Apple platforms.
#[derive(Debug)]
pub struct CmapFormat0<'a> {
    length: u16,
    language: u16,
    glyph_ids: &'a [u8],
}

impl<'a> CmapFormat0<'a> {
    /// Decodes the fields after the format word: length, language and
    /// exactly 256 glyph-id bytes.
    fn from_reader(
        reader: &mut AtlasByteReader,
        arena: &'a Arena,
    ) -> Result<Self, TableParseError> {
        let length = reader.read_u16()?;
        let language = reader.read_u16()?;

        let glyph_ids = arena.alloc_slice::<u8>(256)?;
        glyph_ids.copy_from_slice(reader.read_bytes(256)?);

        Ok(Self {
            length,
            language,
            glyph_ids,
        })
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn language(&self) -> u16 {
        self.language
    }

    /// The raw 256-entry mapping table.
    pub fn glyph_ids(&self) -> &'a [u8] {
        self.glyph_ids
    }

    /// Looks up a single-byte code point. Entry 0 is the stored
    /// default (the missing-glyph id); code points past 255 are not
    /// representable in this format.
    pub fn glyph_index(&self, code_point: u32) -> Option<u16> {
        let index = usize::try_from(code_point).ok()?;

        self.glyph_ids.get(index).map(|&id| u16::from(id))
    }
}

/// The segmented BMP mapping subtable (format 4), for fonts that
/// support only Unicode Basic Multilingual Plane characters
/// (U+0000 to U+FFFF).
///
/// The mapping is four parallel per-segment arrays plus a trailing
/// glyph-id array. On disk they are packed back to back and addressed
/// with byte offsets; here each array is decoded into its own arena
/// slice and indexed by segment, so a hostile offset can only miss,
/// never read outside the subtable.
#[derive(Debug)]
pub struct CmapFormat4<'a> {
    length: u16,
    language: u16,
    seg_count: u16,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
    end_codes: &'a [u16],
    start_codes: &'a [u16],
    id_deltas: &'a [i16],
    id_range_offsets: &'a [u16],
    glyph_ids: &'a [u16],
}

impl<'a> CmapFormat4<'a> {
    /// Decodes the fields after the format word.
    ///
    /// The stored searchRange/entrySelector/rangeShift hints occupy six
    /// bytes in the stream but are regenerated from segCount instead of
    /// read: the reference manual recommends never trusting them, since
    /// they have been used as an attack vector.
    fn from_reader(
        reader: &mut AtlasByteReader,
        arena: &'a Arena,
    ) -> Result<Self, TableParseError> {
        let length = reader.read_u16()?;
        let language = reader.read_u16()?;
        let seg_count_x2 = reader.read_u16()?;
        let seg_count = seg_count_x2 / 2;

        reader.skip(3 * size_of::<u16>())?;
        let [search_range, entry_selector, range_shift] = binary_search_hints(seg_count, 2);

        let count = usize::from(seg_count);
        let end_codes = arena.alloc_slice::<u16>(count)?;
        for code in end_codes.iter_mut() {
            *code = reader.read_u16()?;
        }

        reader.skip(size_of::<u16>())?; // reservedPad

        let start_codes = arena.alloc_slice::<u16>(count)?;
        for code in start_codes.iter_mut() {
            *code = reader.read_u16()?;
        }

        let id_deltas = arena.alloc_slice::<i16>(count)?;
        for delta in id_deltas.iter_mut() {
            *delta = reader.read_i16()?;
        }

        let id_range_offsets = arena.alloc_slice::<u16>(count)?;
        for range_offset in id_range_offsets.iter_mut() {
            *range_offset = reader.read_u16()?;
        }

        // Everything up to here: the seven header words, the four
        // segment arrays and the reserved pad word. Whatever the
        // declared length has left over is the trailing glyph array.
        let consumed = 16 + count * 8;
        let remaining = usize::from(length)
            .checked_sub(consumed)
            .filter(|remaining| remaining % 2 == 0)
            .ok_or(TableParseError::MalformedSubtable {
                declared: length,
                consumed,
            })?;

        let glyph_ids = arena.alloc_slice::<u16>(remaining / 2)?;
        for id in glyph_ids.iter_mut() {
            *id = reader.read_u16()?;
        }

        Ok(Self {
            length,
            language,
            seg_count,
            search_range: search_range as u16,
            entry_selector: entry_selector as u16,
            range_shift: range_shift as u16,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_ids,
        })
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn language(&self) -> u16 {
        self.language
    }

    /// The number of mapping segments (segCountX2 / 2).
    pub fn seg_count(&self) -> u16 {
        self.seg_count
    }

    /// Derived binary-search hint, regenerated from segCount.
    pub fn search_range(&self) -> u16 {
        self.search_range
    }

    /// Derived binary-search hint, regenerated from segCount.
    pub fn entry_selector(&self) -> u16 {
        self.entry_selector
    }

    /// Derived binary-search hint, regenerated from segCount.
    pub fn range_shift(&self) -> u16 {
        self.range_shift
    }

    /// End character code for each segment; ascending, last = 0xFFFF.
    pub fn end_codes(&self) -> &'a [u16] {
        self.end_codes
    }

    /// Start character code for each segment.
    pub fn start_codes(&self) -> &'a [u16] {
        self.start_codes
    }

    /// Delta for all character codes in each segment, modulo 65536.
    pub fn id_deltas(&self) -> &'a [i16] {
        self.id_deltas
    }

    /// Offsets into the glyph-id array for each segment, or 0 for the
    /// plain delta mapping.
    pub fn id_range_offsets(&self) -> &'a [u16] {
        self.id_range_offsets
    }

    /// The trailing glyph-id array.
    pub fn glyph_ids(&self) -> &'a [u16] {
        self.glyph_ids
    }

    /// Looks up a BMP code point through the segment arrays.
    pub fn glyph_index(&self, code_point: u32) -> Option<u16> {
        if code_point > 0xFFFF {
            return None;
        }
        let code = code_point as u16;

        // Segments are sorted by endCode, so the candidate is the first
        // segment whose endCode is >= the code point.
        let segment = self.end_codes.partition_point(|&end| end < code);
        if segment == self.end_codes.len() {
            return None;
        }

        let start = self.start_codes[segment];
        if code < start {
            return None;
        }

        let delta = self.id_deltas[segment] as u16;
        let range_offset = self.id_range_offsets[segment];
        if range_offset == 0 {
            return Some(code.wrapping_add(delta));
        }

        // On disk idRangeOffset counts bytes from its own slot to the
        // target entry; the arrays are contiguous there, so with each
        // array unpacked it becomes an index into the trailing glyph
        // array: offset/2 + (code - start), minus the idRangeOffset
        // entries that were left after this segment's slot.
        let words = usize::from(range_offset / 2) + usize::from(code - start);
        let index = words.checked_sub(usize::from(self.seg_count) - segment)?;

        let glyph = *self.glyph_ids.get(index)?;
        if glyph == 0 {
            return None;
        }

        Some(glyph.wrapping_add(delta))
    }
}
