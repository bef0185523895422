//! Fixed-count arrays and fixed-length ASCII strings

use super::{Codec, Reader, Writer};
use crate::error::{Error, Operation, PathSegment, Result};

/// `count` consecutive values of an inner codec.
#[derive(Debug, Clone, Copy)]
pub struct Array<C> {
    inner: C,
    count: usize,
}

impl<C: Codec> Array<C> {
    pub const fn new(inner: C, count: usize) -> Self {
        Self { inner, count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual == self.count {
            Ok(())
        } else {
            Err(Error::length(Operation::Encode, self.count, actual))
        }
    }
}

impl<C: Codec> Codec for Array<C> {
    type Value = Vec<C::Value>;

    fn size(&self) -> usize {
        self.count * self.inner.size()
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<Self::Value> {
        let mut values = Vec::with_capacity(self.count);
        for index in 0..self.count {
            let value = reader
                .scoped(PathSegment::Index(index), |r| self.inner.read(r))
                .map_err(|e| e.at_index(index))?;
            values.push(value);
        }
        Ok(values)
    }

    fn write(&self, writer: &mut Writer, value: &Self::Value) -> Result<()> {
        self.check_len(value.len())?;
        for (index, element) in value.iter().enumerate() {
            self.inner
                .write(writer, element)
                .map_err(|e| e.at_index(index))?;
        }
        Ok(())
    }

    fn validate(&self, value: &Self::Value) -> Result<()> {
        self.check_len(value.len())?;
        for (index, element) in value.iter().enumerate() {
            self.inner.validate(element).map_err(|e| e.at_index(index))?;
        }
        Ok(())
    }
}

/// A NUL-padded ASCII string occupying exactly `length` bytes.
///
/// Trailing NULs are stripped on decode. Strings shorter than `length` are
/// right-padded with NUL on encode.
#[derive(Debug, Clone, Copy)]
pub struct Ascii {
    length: usize,
}

impl Ascii {
    pub const fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn check(&self, value: &str) -> Result<()> {
        if !value.is_ascii() {
            return Err(Error::encoding(format!("{value:?} is not ASCII")));
        }
        if value.len() > self.length {
            return Err(Error::length(Operation::Encode, self.length, value.len()));
        }
        Ok(())
    }
}

impl Codec for Ascii {
    type Value = String;

    fn size(&self) -> usize {
        self.length
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<String> {
        let raw = reader.take(self.length)?;
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let text = &raw[..end];
        if !text.is_ascii() {
            return Err(Error::type_mismatch(
                Operation::Decode,
                format!("string bytes {text:02x?} are not ASCII"),
            ));
        }
        Ok(text.iter().map(|&b| char::from(b)).collect())
    }

    fn write(&self, writer: &mut Writer, value: &String) -> Result<()> {
        self.check(value)?;
        writer.put(value.as_bytes());
        writer.put_zeros(self.length - value.len());
        Ok(())
    }

    fn validate(&self, value: &String) -> Result<()> {
        self.check(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Endian, U16, U8};

    #[test]
    fn test_ascii_round_trip() {
        let codec = Ascii::new(8);
        let bytes = codec.encode(Endian::Big, &"hi".to_string()).unwrap();
        assert_eq!(bytes, vec![0x68, 0x69, 0, 0, 0, 0, 0, 0]);
        assert_eq!(codec.decode(Endian::Big, &bytes, 0).unwrap(), ("hi".to_string(), 8));
    }

    #[test]
    fn test_ascii_keeps_interior_nul() {
        let codec = Ascii::new(6);
        let bytes = [b'a', 0, b'b', 0, 0, 0];
        let (text, _) = codec.decode(Endian::Little, &bytes, 0).unwrap();
        assert_eq!(text, "a\0b");
        assert_eq!(codec.encode(Endian::Little, &text).unwrap(), bytes);
    }

    #[test]
    fn test_ascii_too_long() {
        let codec = Ascii::new(4);
        let err = codec.encode(Endian::Big, &"GSGMX".to_string()).unwrap_err();
        assert!(matches!(err, Error::Length { expected: 4, actual: 5, .. }));
    }

    #[test]
    fn test_ascii_rejects_non_ascii() {
        let codec = Ascii::new(8);
        assert!(matches!(
            codec.encode(Endian::Big, &"héllo".to_string()),
            Err(Error::Encoding { .. })
        ));
        assert!(matches!(
            codec.decode(Endian::Big, &[0xC3, 0xA9, 0, 0, 0, 0, 0, 0], 0),
            Err(Error::Type { op: Operation::Decode, .. })
        ));
    }

    #[test]
    fn test_array_threads_offset() {
        let codec = Array::new(U16, 3);
        assert_eq!(codec.size(), 6);
        let bytes = [0xAA, 0, 1, 0, 2, 0, 3];
        let (values, offset) = codec.decode(Endian::Big, &bytes, 1).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(offset, 7);
    }

    #[test]
    fn test_array_length_mismatch() {
        let codec = Array::new(U8, 4);
        let err = codec.encode(Endian::Big, &vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::Length { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_array_error_carries_index() {
        let codec = Array::new(crate::codec::Primitive::<u8>::bounded(0, 9), 4);
        let err = codec.encode(Endian::Big, &vec![0, 1, 10, 3]).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "[2]");
    }
}
