//! Declarative binary descriptors
//!
//! Every piece of a GMD file is described by an immutable codec value:
//!
//! - [`Primitive`] - a fixed-width scalar with an optional inclusive range
//! - [`RangeMapped`] - an integer wire value exposed as a float interval
//! - [`Array`] / [`Ascii`] - fixed-count sequences and NUL-padded strings
//! - [`Map`] - a bijection between a wire representation and a domain type
//! - [`Struct`] - a record of named field codecs with optional base fields
//! - [`FileCodec`] - a header plus pointer-located payload regions
//!
//! Endianness is never implicit. Callers pass it per call, and the file codec
//! derives it from the file's own endianness byte.

pub mod adaptor;
pub mod array;
pub mod file;
pub mod primitive;
pub mod structure;

use crate::error::{Error, FieldPath, Operation, PathSegment, Result};

pub use adaptor::{Map, MAT4, QUAT, VEC3, VEC4};
pub use array::{Array, Ascii};
pub use file::{ARRAY_POINTER, ArrayPointer, FileCodec, FileHeader, FileRecord, SIZED_POINTER, SizedPointer};
pub use primitive::{
    F16, F32, I8, I16, I32, I64, Primitive, RangeMapped, SNORM8, U8, U16, U32, U64, UNORM8,
    UNORM16,
};
pub use structure::{Struct, StructBuilder};

/// Byte order of a file or of a single codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn is_big(self) -> bool {
        matches!(self, Endian::Big)
    }

    pub fn from_big(big_endian: bool) -> Self {
        if big_endian { Endian::Big } else { Endian::Little }
    }
}

/// How decoding treats validator failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Validator failures abort the decode.
    #[default]
    Strict,
    /// Validator failures are logged as warnings and the value is kept.
    Lenient,
}

/// Options for a decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub strictness: Strictness,
}

impl DecodeOptions {
    #[must_use]
    pub fn lenient() -> Self {
        Self { strictness: Strictness::Lenient }
    }
}

/// Cursor over an in-memory buffer being decoded.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    endian: Endian,
    strictness: Strictness,
    path: FieldPath,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8], endian: Endian) -> Self {
        Self {
            bytes,
            pos: 0,
            endian,
            strictness: Strictness::Strict,
            path: FieldPath::new(),
        }
    }

    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Move the cursor to an absolute offset.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.bytes.len() {
            return Err(self.out_of_bounds(offset, 0));
        }
        self.pos = offset;
        Ok(())
    }

    /// Consume `length` bytes at the cursor.
    pub fn take(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(length)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.out_of_bounds(self.pos, length))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn out_of_bounds(&self, offset: usize, length: usize) -> Error {
        Error::Offset {
            op: Operation::Decode,
            path: FieldPath::new(),
            offset,
            length,
            available: self.bytes.len(),
        }
    }

    /// Run `f` with `segment` pushed onto the diagnostic path.
    pub(crate) fn scoped<T>(
        &mut self,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    /// Report a validator failure: an error when strict, a warning when lenient.
    pub fn reject(&self, message: String) -> Result<()> {
        match self.strictness {
            Strictness::Strict => Err(Error::validator(Operation::Decode, message)),
            Strictness::Lenient => {
                tracing::warn!(path = %self.path, "{message}");
                Ok(())
            }
        }
    }
}

/// Growable output buffer for encoding.
pub struct Writer {
    buf: Vec<u8>,
    endian: Endian,
}

impl Writer {
    #[must_use]
    pub fn new(endian: Endian) -> Self {
        Self { buf: Vec::new(), endian }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A fixed-size binary descriptor.
///
/// `read` and `write` thread a cursor; `decode` and `encode` are the
/// standalone entry points. Implementations check their own invariants inside
/// `read`/`write` as well, so a nested codec never emits an invalid value.
pub trait Codec: Send + Sync {
    /// Decoded domain value.
    type Value;

    /// Wire size in bytes.
    fn size(&self) -> usize;

    fn read(&self, reader: &mut Reader<'_>) -> Result<Self::Value>;

    fn write(&self, writer: &mut Writer, value: &Self::Value) -> Result<()>;

    /// Check that `value` can be encoded.
    fn validate(&self, value: &Self::Value) -> Result<()>;

    /// Decode one value at `offset`, returning it with the offset just past it.
    fn decode(&self, endian: Endian, bytes: &[u8], offset: usize) -> Result<(Self::Value, usize)> {
        let mut reader = Reader::new(bytes, endian);
        reader.seek(offset)?;
        let value = self.read(&mut reader)?;
        Ok((value, reader.pos()))
    }

    /// Validate and encode one value.
    fn encode(&self, endian: Endian, value: &Self::Value) -> Result<Vec<u8>> {
        self.validate(value)?;
        let mut writer = Writer::new(endian);
        self.write(&mut writer, value)?;
        Ok(writer.into_bytes())
    }
}

impl<C: Codec + ?Sized> Codec for &C {
    type Value = C::Value;

    fn size(&self) -> usize {
        (**self).size()
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<Self::Value> {
        (**self).read(reader)
    }

    fn write(&self, writer: &mut Writer, value: &Self::Value) -> Result<()> {
        (**self).write(writer, value)
    }

    fn validate(&self, value: &Self::Value) -> Result<()> {
        (**self).validate(value)
    }
}

/// Wire size of a descriptor.
pub fn size_of<C: Codec + ?Sized>(codec: &C) -> u32 {
    codec.size() as u32
}
