use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $typ:ty) => {
        /// Reads a big-endian value of the target type and advances
        /// the cursor past it.
        pub fn $fn_name(&mut self) -> Result<$typ, AtlasByteReaderError> {
            let bytes = self.read_bytes(size_of::<$typ>())?;

            Ok(<$typ>::from_be_bytes(bytes.try_into().unwrap()))
        }
    };
}

/// Represents the possible errors that can occur when reading from
/// an `AtlasByteReader`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AtlasByteReaderError {
    /// A read was requested which would run past the end of the buffer.
    /// The buffer length is known up front, so this is reported instead
    /// of ever touching bytes outside of it.
    #[error("reading {wanted} bytes at offset {offset} would overrun the {length} byte buffer")]
    TruncatedBuffer {
        offset: usize,
        wanted: usize,
        length: usize,
    },

    /// A seek was requested to a position outside of the buffer.
    #[error("cannot seek to offset {0} in a {1} byte buffer")]
    SeekOutOfBounds(usize, usize),
}

/// A cursor over the raw bytes of a font file.
///
/// The whole file is held as one immutable slice and every multi-byte
/// field in a font is stored big-endian, so all of the `read_*` methods
/// go through a single macro-generated primitive. That keeps the
/// endianness handling in exactly one place.
pub struct AtlasByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AtlasByteReader<'a> {
    /// Returns a new reader positioned at the start of the slice.
    /// The slice is typically a whole font file read into memory,
    /// but any sub-slice works the same way.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The current cursor position, in bytes from the start.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// The total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Seeks to a specific position in the buffer, counted from the
    /// start of the file.
    ///
    /// # Examples
    ///
    /// ```
    /// use atlas_type::buffer::AtlasByteReader;
    ///
    /// // Two u32 values: 10 and 20 in big-endian
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = AtlasByteReader::new(&data);
    ///
    /// reader.seek_to(4).unwrap();
    /// assert_eq!(reader.read_u32().unwrap(), 20);
    /// ```
    pub fn seek_to(&mut self, pos: usize) -> Result<(), AtlasByteReaderError> {
        if pos > self.data.len() {
            return Err(AtlasByteReaderError::SeekOutOfBounds(pos, self.data.len()));
        }

        self.pos = pos;
        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor position.
    pub fn skip(&mut self, n: usize) -> Result<(), AtlasByteReaderError> {
        self.read_bytes(n).map(|_| ())
    }

    /// Returns the next n bytes and advances the cursor past them,
    /// or fails without moving when fewer than n bytes remain.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], AtlasByteReaderError> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());

        match end {
            Some(end) => {
                let bytes = &self.data[self.pos..end];
                self.pos = end;
                Ok(bytes)
            }
            None => Err(AtlasByteReaderError::TruncatedBuffer {
                offset: self.pos,
                wanted: n,
                length: self.data.len(),
            }),
        }
    }

    /// Reads a fixed-size chunk, e.g. the four bytes of a table tag.
    pub fn read_chunk<const N: usize>(&mut self) -> Result<[u8; N], AtlasByteReaderError> {
        let bytes = self.read_bytes(N)?;

        Ok(bytes.try_into().unwrap())
    }

    impl_read!(read_i32, i32);
    impl_read!(read_u32, u32);
    impl_read!(read_i16, i16);
    impl_read!(read_u16, u16);
    impl_read!(read_i8, i8);
    impl_read!(read_u8, u8);
}
