use crate::{
    AtlasTypeError,
    arena::Arena,
    buffer::AtlasByteReader,
    tables::{
        Tag, TableDirectory,
        cmap::{CmapHeader, CmapSubtable},
    },
};

/// A decoded font: the table directory plus the character-to-glyph
/// mapping, everything else left untouched in the file.
///
/// All variable-length storage lives in the arena the font was parsed
/// with, so a `Font` cannot outlive a `restore`/`reset` that would
/// reclaim it.
#[derive(Debug)]
pub struct Font<'a> {
    directory: TableDirectory<'a>,
    cmap: Option<CmapHeader<'a>>,
    subtable: Option<CmapSubtable<'a>>,
}

impl<'a> Font<'a> {
    /// Parses the table directory and, when a `cmap` table is present,
    /// its header and one subtable.
    ///
    /// Unicode-capable encoding records are tried first (Unicode
    /// platform, or Microsoft with a Unicode encoding), falling back
    /// to whatever record decodes. A record whose subtable is in an
    /// unsupported format or fails to decode is skipped rather than
    /// failing the font: the directory and any previously decoded
    /// structures stay usable, and the caller can still reach the
    /// offending record through [`Font::cmap`] to handle it itself.
    pub fn parse(data: &[u8], arena: &'a Arena) -> Result<Self, AtlasTypeError> {
        let mut reader = AtlasByteReader::new(data);
        let directory = TableDirectory::from_reader(&mut reader, arena)?;

        let Some(record) = directory.find(Tag::CMAP) else {
            return Ok(Self {
                directory,
                cmap: None,
                subtable: None,
            });
        };

        let table_start = record.offset() as usize;
        let cmap = CmapHeader::from_reader(&mut reader, arena, table_start)?;
        let subtable = Self::choose_subtable(&mut reader, arena, &cmap, table_start);

        Ok(Self {
            directory,
            cmap: Some(cmap),
            subtable,
        })
    }

    fn choose_subtable(
        reader: &mut AtlasByteReader,
        arena: &'a Arena,
        cmap: &CmapHeader<'a>,
        table_start: usize,
    ) -> Option<CmapSubtable<'a>> {
        let mut fallback = None;

        for record in cmap.records() {
            // A hostile offset saturates out of range and is then
            // rejected by the seek, not wrapped into the buffer.
            let offset = table_start.saturating_add(record.offset() as usize);

            // Subtables that fail to decode are skipped; anything they
            // allocated stays in the arena until the caller restores
            // or resets it, which is the arena trade-off.
            match CmapSubtable::from_reader(reader, arena, offset) {
                Ok(subtable) if record.is_unicode() => return Some(subtable),
                Ok(subtable) if fallback.is_none() => fallback = Some(subtable),
                Ok(_) | Err(_) => {}
            }
        }

        fallback
    }

    /// The decoded table directory.
    pub fn directory(&self) -> &TableDirectory<'a> {
        &self.directory
    }

    /// The cmap header, when the font has a `cmap` table at all.
    pub fn cmap(&self) -> Option<&CmapHeader<'a>> {
        self.cmap.as_ref()
    }

    /// The decoded cmap subtable the parse settled on, if any record
    /// carried a format this crate decodes.
    pub fn cmap_subtable(&self) -> Option<&CmapSubtable<'a>> {
        self.subtable.as_ref()
    }

    /// Resolves a character to its glyph id through the decoded cmap
    /// subtable. `None` when the font does not map it (or has no
    /// usable subtable).
    pub fn glyph_index(&self, c: char) -> Option<u16> {
        self.subtable.as_ref()?.glyph_index(u32::from(c))
    }
}
