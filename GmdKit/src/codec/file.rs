//! Two-pass file codec
//!
//! A file is a fixed-size header followed by payload regions. The header
//! holds an [`ArrayPointer`] or [`SizedPointer`] for every region, so
//! offsets are only known once the body has been laid out:
//!
//! 1. regions are serialized in schema order into a body buffer, each
//!    pointer recording `header_size + body.len()` before its bytes are
//!    appended
//! 2. the header is assembled from the copied fields, the pointers and
//!    the derived `file_size`
//! 3. the header is encoded and the body appended to it
//!
//! Decoding reads the header, then materializes each region at the offset
//! its pointer names.

use lazy_static::lazy_static;

use super::structure::fields;
use super::{Codec, Endian, Reader, Strictness, Struct, Writer, U32};
use crate::error::{Error, FieldPath, Operation, PathSegment, Result};

/// Declare file regions on a [`FileCodec`] in layout order.
///
/// `name: CODEC` is an array region of `CODEC` elements located by the header's
/// `name` [`ArrayPointer`]; `bytes(name)` is a raw region located by a
/// [`SizedPointer`]. Header pointer and record member share the name.
macro_rules! regions {
    ($codec:expr;) => { $codec };
    ($codec:expr; bytes($name:ident) $(, $($rest:tt)*)?) => {
        $crate::codec::file::regions!(
            $codec.bytes(stringify!($name), |h| &h.$name, |h| &mut h.$name, |f| &f.$name, |f| &mut f.$name);
            $($($rest)*)?
        )
    };
    ($codec:expr; $name:ident : $element:expr $(, $($rest:tt)*)?) => {
        $crate::codec::file::regions!(
            $codec.array(stringify!($name), $element, |h| &h.$name, |h| &mut h.$name, |f| &f.$name, |f| &mut f.$name);
            $($($rest)*)?
        )
    };
}

/// Declare header fields copied verbatim into the record, as
/// `header.path => record_member`.
macro_rules! copied {
    ($codec:expr; $($($header:ident).+ => $member:ident),* $(,)?) => {
        $codec
            $(.copied(|h| &h.$($header).+, |h| &mut h.$($header).+, |f| &f.$member, |f| &mut f.$member))*
    };
}

pub(crate) use copied;
pub(crate) use regions;

/// `(offset, count)` locating a typed array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArrayPointer {
    pub offset: u32,
    pub count: u32,
}

/// `(offset, size)` locating a raw byte range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SizedPointer {
    pub offset: u32,
    pub size: u32,
}

lazy_static! {
    pub static ref ARRAY_POINTER: Struct<ArrayPointer> =
        fields!(Struct::<ArrayPointer>::builder("ArrayPointer"); offset: U32, count: U32)
            .build()
            .expect("ArrayPointer descriptor");
    pub static ref SIZED_POINTER: Struct<SizedPointer> =
        fields!(Struct::<SizedPointer>::builder("SizedPointer"); offset: U32, size: U32)
            .build()
            .expect("SizedPointer descriptor");
}

fn checked_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::encoding(format!("{what} {value} does not fit in 32 bits")))
}

/// A payload region: a header pointer plus the record member it materializes into.
trait Region<H, F>: Send + Sync {
    fn name(&self) -> &'static str;

    fn unpack(&self, reader: &mut Reader<'_>, header_size: usize, header: &H, file: &mut F) -> Result<()>;

    /// Append this region to `body` and record its pointer in `header`.
    fn pack(&self, body: &mut Writer, header_size: usize, file: &F, header: &mut H) -> Result<()>;
}

fn check_region(reader: &Reader<'_>, header_size: usize, offset: usize, length: usize) -> Result<()> {
    let end = offset.checked_add(length);
    let inside = end.is_some_and(|end| end <= reader.len());
    let clear_of_header = length == 0 || offset >= header_size;
    if inside && clear_of_header {
        Ok(())
    } else {
        Err(Error::Offset {
            op: Operation::Decode,
            path: FieldPath::new(),
            offset,
            length,
            available: reader.len(),
        })
    }
}

struct ArrayRegion<H, F, C: Codec> {
    name: &'static str,
    codec: C,
    pointer: fn(&H) -> &ArrayPointer,
    pointer_mut: fn(&mut H) -> &mut ArrayPointer,
    get: fn(&F) -> &Vec<C::Value>,
    get_mut: fn(&mut F) -> &mut Vec<C::Value>,
}

impl<H, F, C: Codec> Region<H, F> for ArrayRegion<H, F, C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn unpack(&self, reader: &mut Reader<'_>, header_size: usize, header: &H, file: &mut F) -> Result<()> {
        let pointer = (self.pointer)(header);
        let offset = pointer.offset as usize;
        let count = pointer.count as usize;
        let length = count.saturating_mul(self.codec.size());
        check_region(reader, header_size, offset, length)?;

        reader.seek(offset)?;
        let mut values = Vec::with_capacity(count);
        for index in 0..count {
            let value = reader
                .scoped(PathSegment::Index(index), |r| self.codec.read(r))
                .map_err(|e| e.at_index(index))?;
            values.push(value);
        }
        *(self.get_mut)(file) = values;
        Ok(())
    }

    fn pack(&self, body: &mut Writer, header_size: usize, file: &F, header: &mut H) -> Result<()> {
        let values = (self.get)(file);
        let offset = checked_u32(header_size + body.len(), "region offset")?;
        for (index, value) in values.iter().enumerate() {
            self.codec.validate(value).map_err(|e| e.at_index(index))?;
            self.codec.write(body, value).map_err(|e| e.at_index(index))?;
        }
        *(self.pointer_mut)(header) = ArrayPointer {
            offset,
            count: checked_u32(values.len(), "element count")?,
        };
        Ok(())
    }
}

struct BytesRegion<H, F> {
    name: &'static str,
    pointer: fn(&H) -> &SizedPointer,
    pointer_mut: fn(&mut H) -> &mut SizedPointer,
    get: fn(&F) -> &Vec<u8>,
    get_mut: fn(&mut F) -> &mut Vec<u8>,
}

impl<H, F> Region<H, F> for BytesRegion<H, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn unpack(&self, reader: &mut Reader<'_>, header_size: usize, header: &H, file: &mut F) -> Result<()> {
        let pointer = (self.pointer)(header);
        let offset = pointer.offset as usize;
        let size = pointer.size as usize;
        check_region(reader, header_size, offset, size)?;
        reader.seek(offset)?;
        *(self.get_mut)(file) = reader.take(size)?.to_vec();
        Ok(())
    }

    fn pack(&self, body: &mut Writer, header_size: usize, file: &F, header: &mut H) -> Result<()> {
        let bytes = (self.get)(file);
        let offset = checked_u32(header_size + body.len(), "region offset")?;
        body.put(bytes);
        *(self.pointer_mut)(header) = SizedPointer {
            offset,
            size: checked_u32(bytes.len(), "region size")?,
        };
        Ok(())
    }
}

/// A header field carried verbatim into the file record and back.
trait Copied<H, F>: Send + Sync {
    fn copy_in(&self, header: &H, file: &mut F);
    fn copy_out(&self, file: &F, header: &mut H);
}

struct CopiedField<H, F, V> {
    header: fn(&H) -> &V,
    header_mut: fn(&mut H) -> &mut V,
    file: fn(&F) -> &V,
    file_mut: fn(&mut F) -> &mut V,
}

impl<H, F, V: Clone> Copied<H, F> for CopiedField<H, F, V> {
    fn copy_in(&self, header: &H, file: &mut F) {
        (self.file_mut)(file).clone_from((self.header)(header));
    }

    fn copy_out(&self, file: &F, header: &mut H) {
        (self.header_mut)(header).clone_from((self.file)(file));
    }
}

/// Derived header fields the file codec maintains itself.
pub trait FileHeader: Default {
    fn file_size(&self) -> u32;
    fn set_file_size(&mut self, size: u32);
}

/// A decoded file record.
pub trait FileRecord: Default {
    /// Byte order the record is encoded with.
    fn endian(&self) -> Endian;
}

/// Pack/unpack of a file record `F` through its header `H`.
pub struct FileCodec<H: 'static, F: 'static, S: Codec<Value = H>> {
    name: &'static str,
    header: S,
    regions: Vec<Box<dyn Region<H, F>>>,
    copied: Vec<Box<dyn Copied<H, F>>>,
}

impl<H, F, S> FileCodec<H, F, S>
where
    H: FileHeader + 'static,
    F: FileRecord + 'static,
    S: Codec<Value = H>,
{
    pub fn new(name: &'static str, header: S) -> Self {
        Self {
            name,
            header,
            regions: Vec::new(),
            copied: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Size of the fixed header that precedes every region.
    pub fn header_size(&self) -> usize {
        self.header.size()
    }

    /// Region names in layout order.
    pub fn region_names(&self) -> Vec<&'static str> {
        self.regions.iter().map(|r| r.name()).collect()
    }

    /// Declare a region of `codec` elements located by an [`ArrayPointer`].
    #[must_use]
    pub fn array<C: Codec + 'static>(
        mut self,
        name: &'static str,
        codec: C,
        pointer: fn(&H) -> &ArrayPointer,
        pointer_mut: fn(&mut H) -> &mut ArrayPointer,
        get: fn(&F) -> &Vec<C::Value>,
        get_mut: fn(&mut F) -> &mut Vec<C::Value>,
    ) -> Self {
        self.regions.push(Box::new(ArrayRegion { name, codec, pointer, pointer_mut, get, get_mut }));
        self
    }

    /// Declare a raw byte region located by a [`SizedPointer`].
    #[must_use]
    pub fn bytes(
        mut self,
        name: &'static str,
        pointer: fn(&H) -> &SizedPointer,
        pointer_mut: fn(&mut H) -> &mut SizedPointer,
        get: fn(&F) -> &Vec<u8>,
        get_mut: fn(&mut F) -> &mut Vec<u8>,
    ) -> Self {
        self.regions.push(Box::new(BytesRegion { name, pointer, pointer_mut, get, get_mut }));
        self
    }

    /// Declare a header field copied verbatim into the record.
    #[must_use]
    pub fn copied<V: Clone + Send + Sync + 'static>(
        mut self,
        header: fn(&H) -> &V,
        header_mut: fn(&mut H) -> &mut V,
        file: fn(&F) -> &V,
        file_mut: fn(&mut F) -> &mut V,
    ) -> Self {
        self.copied.push(Box::new(CopiedField { header, header_mut, file, file_mut }));
        self
    }

    /// Decode the header only.
    pub fn decode_header(&self, bytes: &[u8], endian: Endian, strictness: Strictness) -> Result<H> {
        let mut reader = Reader::new(bytes, endian).with_strictness(strictness);
        self.header.read(&mut reader)
    }

    pub fn decode(&self, bytes: &[u8], endian: Endian, strictness: Strictness) -> Result<F> {
        let mut reader = Reader::new(bytes, endian).with_strictness(strictness);
        let header = self.header.read(&mut reader)?;
        let header_size = self.header.size();

        if u64::from(header.file_size()) != bytes.len() as u64 {
            reader
                .reject(format!(
                    "header claims {} bytes but the buffer holds {}",
                    header.file_size(),
                    bytes.len()
                ))
                .map_err(|e| e.in_field("file_size"))?;
        }

        let mut file = F::default();
        for copied in &self.copied {
            copied.copy_in(&header, &mut file);
        }
        for region in &self.regions {
            let name = region.name();
            reader
                .scoped(PathSegment::Field(name), |r| region.unpack(r, header_size, &header, &mut file))
                .map_err(|e| e.in_field(name))?;
        }
        Ok(file)
    }

    pub fn encode(&self, file: &F) -> Result<Vec<u8>> {
        let endian = file.endian();
        let header_size = self.header.size();
        let mut body = Writer::new(endian);
        let mut header = H::default();

        for region in &self.regions {
            let start = body.len();
            region
                .pack(&mut body, header_size, file, &mut header)
                .map_err(|e| e.in_field(region.name()))?;
            tracing::debug!(
                codec = self.name,
                region = region.name(),
                offset = header_size + start,
                length = body.len() - start,
                "packed region"
            );
        }
        for copied in &self.copied {
            copied.copy_out(file, &mut header);
        }
        header.set_file_size(checked_u32(header_size + body.len(), "file size")?);

        self.header.validate(&header)?;
        let mut out = Writer::new(endian);
        self.header.write(&mut out, &header)?;
        out.put(body.as_bytes());
        Ok(out.into_bytes())
    }
}
