//! Little-endian primitive encoding shared by the reader and writer.

use glam::IVec2;

use crate::format::FormatError;

#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn bool(&mut self, value: bool) {
        self.u8(value as u8);
    }

    pub fn ivec2(&mut self, value: IVec2) {
        self.i32(value.x);
        self.i32(value.y);
    }

    pub fn len_prefix(&mut self, len: usize) {
        self.i32(len as i32);
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn i32(&mut self) -> Result<i32, FormatError> {
        self.array().map(i32::from_le_bytes)
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        self.array::<1>().map(|b| b[0])
    }

    pub fn f32(&mut self) -> Result<f32, FormatError> {
        self.array().map(f32::from_le_bytes)
    }

    pub fn bool(&mut self) -> Result<bool, FormatError> {
        Ok(self.u8()? != 0)
    }

    pub fn ivec2(&mut self) -> Result<IVec2, FormatError> {
        Ok(IVec2::new(self.i32()?, self.i32()?))
    }

    /// A non-negative int32 count or length.
    pub fn count(&mut self) -> Result<usize, FormatError> {
        let offset = self.pos;
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| FormatError::NegativeLength { value, offset })
    }

    /// Split off the next `n` bytes as their own reader.
    pub fn sub(&mut self, n: usize) -> Result<ByteReader<'a>, FormatError> {
        self.bytes(n).map(ByteReader::new)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.bytes(n).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        let mut w = ByteWriter::new();
        w.i32(1);
        w.u8(7);
        w.ivec2(IVec2::new(-1, 2));
        assert_eq!(&w.as_slice()[..4], &[1, 0, 0, 0]);

        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(r.i32().unwrap(), 1);
        assert_eq!(r.u8().unwrap(), 7);
        assert_eq!(r.ivec2().unwrap(), IVec2::new(-1, 2));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn short_read_reports_truncation() {
        let mut r = ByteReader::new(&[1, 2]);
        assert_eq!(
            r.i32(),
            Err(FormatError::Truncated { offset: 0, needed: 2 })
        );
    }

    #[test]
    fn negative_length_rejected() {
        let bytes = (-5i32).to_le_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(
            r.count(),
            Err(FormatError::NegativeLength { value: -5, offset: 0 })
        );
    }
}
