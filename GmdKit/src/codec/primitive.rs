//! Fixed-width scalar codecs
//!
//! Integers may carry an inclusive `[lo, hi]` range that is enforced on both
//! decode and encode. Floats are pass-through: no range, and NaN payloads and
//! subnormals survive a round-trip bit-for-bit.

use std::fmt::{Debug, Display};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;

use super::{Codec, Endian, Reader, Writer};
use crate::error::{Error, Operation, Result};

/// A scalar type with a fixed wire width.
pub trait Scalar: Copy + PartialOrd + Debug + Display + Send + Sync + 'static {
    /// Wire width in bytes.
    const SIZE: usize;
    /// Whether values of this type are range-checked.
    const BOUNDED: bool;

    fn read_bytes(endian: Endian, bytes: &[u8]) -> Self;
    fn write_bytes(self, endian: Endian, out: &mut Writer);
}

/// An integer scalar that can back a [`RangeMapped`] codec.
pub trait IntScalar: Scalar {
    fn to_f64(self) -> f64;
    /// Convert a value already known to be in range.
    fn from_f64(value: f64) -> Self;
}

impl Scalar for u8 {
    const SIZE: usize = 1;
    const BOUNDED: bool = true;

    fn read_bytes(_endian: Endian, bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write_bytes(self, _endian: Endian, out: &mut Writer) {
        out.put(&[self]);
    }
}

impl Scalar for i8 {
    const SIZE: usize = 1;
    const BOUNDED: bool = true;

    fn read_bytes(_endian: Endian, bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_bytes(self, _endian: Endian, out: &mut Writer) {
        out.put(&[self as u8]);
    }
}

macro_rules! impl_scalar {
    ($ty:ty, $size:expr, $bounded:expr, $read:ident, $write:ident) => {
        impl Scalar for $ty {
            const SIZE: usize = $size;
            const BOUNDED: bool = $bounded;

            fn read_bytes(endian: Endian, bytes: &[u8]) -> Self {
                match endian {
                    Endian::Big => BigEndian::$read(bytes),
                    Endian::Little => LittleEndian::$read(bytes),
                }
            }

            fn write_bytes(self, endian: Endian, out: &mut Writer) {
                let mut buf = [0u8; $size];
                match endian {
                    Endian::Big => BigEndian::$write(&mut buf, self),
                    Endian::Little => LittleEndian::$write(&mut buf, self),
                }
                out.put(&buf);
            }
        }
    };
}

impl_scalar!(u16, 2, true, read_u16, write_u16);
impl_scalar!(i16, 2, true, read_i16, write_i16);
impl_scalar!(u32, 4, true, read_u32, write_u32);
impl_scalar!(i32, 4, true, read_i32, write_i32);
impl_scalar!(u64, 8, true, read_u64, write_u64);
impl_scalar!(i64, 8, true, read_i64, write_i64);
impl_scalar!(f32, 4, false, read_f32, write_f32);

impl Scalar for f16 {
    const SIZE: usize = 2;
    const BOUNDED: bool = false;

    fn read_bytes(endian: Endian, bytes: &[u8]) -> Self {
        f16::from_bits(u16::read_bytes(endian, bytes))
    }

    fn write_bytes(self, endian: Endian, out: &mut Writer) {
        self.to_bits().write_bytes(endian, out);
    }
}

macro_rules! impl_int_scalar {
    ($($ty:ty),*) => {
        $(
            impl IntScalar for $ty {
                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_int_scalar!(u8, i8, u16, i16, u32, i32);

/// A single fixed-width scalar.
#[derive(Debug, Clone, Copy)]
pub struct Primitive<T> {
    bounds: Option<(T, T)>,
}

impl<T: Scalar> Primitive<T> {
    /// Full range of the wire type.
    pub const fn new() -> Self {
        Self { bounds: None }
    }

    /// Restrict accepted values to `[lo, hi]`.
    pub const fn bounded(lo: T, hi: T) -> Self {
        Self { bounds: Some((lo, hi)) }
    }

    pub fn bounds(&self) -> Option<(T, T)> {
        self.bounds
    }

    fn check(&self, op: Operation, value: T) -> Result<()> {
        if !T::BOUNDED {
            return Ok(());
        }
        match self.bounds {
            Some((lo, hi)) if value < lo || value > hi => Err(Error::range(op, value, lo, hi)),
            _ => Ok(()),
        }
    }
}

impl<T: Scalar> Default for Primitive<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Codec for Primitive<T> {
    type Value = T;

    fn size(&self) -> usize {
        T::SIZE
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<T> {
        let value = T::read_bytes(reader.endian(), reader.take(T::SIZE)?);
        self.check(Operation::Decode, value)?;
        Ok(value)
    }

    fn write(&self, writer: &mut Writer, value: &T) -> Result<()> {
        self.check(Operation::Encode, *value)?;
        value.write_bytes(writer.endian(), writer);
        Ok(())
    }

    fn validate(&self, value: &T) -> Result<()> {
        self.check(Operation::Encode, *value)
    }
}

pub const U8: Primitive<u8> = Primitive::new();
pub const I8: Primitive<i8> = Primitive::new();
pub const U16: Primitive<u16> = Primitive::new();
pub const I16: Primitive<i16> = Primitive::new();
pub const U32: Primitive<u32> = Primitive::new();
pub const I32: Primitive<i32> = Primitive::new();
pub const U64: Primitive<u64> = Primitive::new();
pub const I64: Primitive<i64> = Primitive::new();
pub const F16: Primitive<f16> = Primitive::new();
pub const F32: Primitive<f32> = Primitive::new();

/// An integer wire domain `[a, b]` exposed as the float interval `[c, d]`.
///
/// Decode computes `c + (v - a)(d - c)/(b - a)` in f64 and narrows to f32.
/// Encode rounds `a + (f - c)(b - a)/(d - c)` to the nearest integer, which
/// makes it a right-inverse of decode on every wire value.
#[derive(Debug, Clone, Copy)]
pub struct RangeMapped<T> {
    wire_lo: T,
    wire_hi: T,
    lo: f32,
    hi: f32,
}

impl<T: IntScalar> RangeMapped<T> {
    pub const fn new(wire_lo: T, wire_hi: T, lo: f32, hi: f32) -> Self {
        Self { wire_lo, wire_hi, lo, hi }
    }

    fn wire(&self) -> Primitive<T> {
        Primitive::bounded(self.wire_lo, self.wire_hi)
    }

    pub fn to_float(&self, wire: T) -> f32 {
        let (a, b) = (self.wire_lo.to_f64(), self.wire_hi.to_f64());
        let (c, d) = (f64::from(self.lo), f64::from(self.hi));
        (c + (wire.to_f64() - a) * (d - c) / (b - a)) as f32
    }

    pub fn to_wire(&self, value: f32) -> Result<T> {
        if value.is_nan() {
            return Err(Error::type_mismatch(Operation::Encode, "NaN has no range-mapped encoding"));
        }
        if value < self.lo || value > self.hi {
            return Err(Error::range(Operation::Encode, value, self.lo, self.hi));
        }
        let (a, b) = (self.wire_lo.to_f64(), self.wire_hi.to_f64());
        let (c, d) = (f64::from(self.lo), f64::from(self.hi));
        let scaled = a + (f64::from(value) - c) * (b - a) / (d - c);
        Ok(T::from_f64(scaled.round().clamp(a, b)))
    }
}

impl<T: IntScalar> Codec for RangeMapped<T> {
    type Value = f32;

    fn size(&self) -> usize {
        T::SIZE
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<f32> {
        let wire = self.wire().read(reader)?;
        Ok(self.to_float(wire))
    }

    fn write(&self, writer: &mut Writer, value: &f32) -> Result<()> {
        let wire = self.to_wire(*value)?;
        self.wire().write(writer, &wire)
    }

    fn validate(&self, value: &f32) -> Result<()> {
        self.to_wire(*value).map(|_| ())
    }
}

/// `[0, 255]` ↔ `[0, 1]`
pub const UNORM8: RangeMapped<u8> = RangeMapped::new(0, 255, 0.0, 1.0);
/// `[0, 255]` ↔ `[-1, 1]`
pub const SNORM8: RangeMapped<u8> = RangeMapped::new(0, 255, -1.0, 1.0);
/// `[0, 65535]` ↔ `[0, 1]`
pub const UNORM16: RangeMapped<u16> = RangeMapped::new(0, 65535, 0.0, 1.0);
