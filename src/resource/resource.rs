use std::io::{self, Cursor, Read};

use byteorder::ByteOrder;

/// Cursor over a borrowed byte buffer. All lump offsets in BSP/WAD files are
/// absolute, so decoding is seek-heavy; reads past the end of the buffer
/// surface as `io::ErrorKind::UnexpectedEof`.
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader {
            cursor: Cursor::new(data),
        }
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    pub fn seek(&mut self, offset: usize) {
        self.cursor.set_position(offset as u64);
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn read_bytes(&mut self, length: usize) -> io::Result<Vec<u8>> {
        let mut bytes: Vec<u8> = vec![0; length];
        self.cursor.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

impl<'a> Read for ByteReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

/// A fixed-layout record decodable from a [`ByteReader`]. `T` is the byte
/// order of the containing file format and `SIZE` the on-disk record size,
/// used to derive record counts from lump lengths.
pub trait Resource {
    type T: ByteOrder;
    const SIZE: usize;

    fn from_reader(reader: &mut ByteReader) -> io::Result<Self>
    where
        Self: Sized;
}

/// Read a fixed-width character field in full, returning the string length
/// up to the first NUL. The cursor always advances by `char_array.len()`.
pub fn read_char_array(reader: &mut ByteReader, char_array: &mut [u8]) -> io::Result<usize> {
    reader.cursor.read_exact(char_array)?;
    Ok(char_array
        .iter()
        .position(|&byte| byte == 0)
        .unwrap_or(char_array.len()))
}

/// Decode a NUL-padded character field as UTF-8, dropping the padding.
pub fn char_array_to_string(char_array: &[u8]) -> String {
    let end: usize = char_array
        .iter()
        .position(|&byte| byte == 0)
        .unwrap_or(char_array.len());
    String::from_utf8_lossy(&char_array[..end]).into_owned()
}
