//! Record codecs built from named field codecs
//!
//! A [`Struct`] is an ordered list of fields, each binding a codec to one
//! member of a domain record `T`. Records are decoded by starting from
//! `T::default()` and assigning every exported field in declaration order.
//!
//! Three kinds of field exist:
//!
//! - exported fields, bound to a member through a pair of accessors
//! - hidden fields (padding, reserved words) that are encoded from a fixed
//!   default and checked against it on decode
//! - base fields, taken from another `Struct` and placed ahead of the
//!   record's own fields
//!
//! Validators run after all fields are read, and again before every encode.
//! In lenient mode a failing validator is logged instead of aborting the
//! decode; encoding is always strict.

use std::fmt::Debug;
use std::sync::Arc;

use super::{Codec, Reader, Writer};
use crate::error::{Error, Operation, PathSegment, Result};

/// Declare struct fields on a [`StructBuilder`] in wire order.
///
/// `name: CODEC` binds the record member `name`; `hidden(name, CODEC, default)`
/// declares a field that never reaches the record.
macro_rules! fields {
    ($builder:expr;) => { $builder };
    ($builder:expr; hidden($name:ident, $codec:expr, $default:expr) $(, $($rest:tt)*)?) => {
        $crate::codec::structure::fields!(
            $builder.hidden(stringify!($name), $codec, $default); $($($rest)*)?
        )
    };
    ($builder:expr; $name:ident : $codec:expr $(, $($rest:tt)*)?) => {
        $crate::codec::structure::fields!(
            $builder.field(stringify!($name), $codec, |v| &v.$name, |v| &mut v.$name); $($($rest)*)?
        )
    };
}

pub(crate) use fields;

/// Post-decode check on a whole record.
pub type Validator<T> = Arc<dyn Fn(&T) -> std::result::Result<(), String> + Send + Sync>;

/// One field of a record `T`.
trait FieldCodec<T>: Send + Sync {
    fn name(&self) -> &'static str;
    fn size(&self) -> usize;
    fn read_into(&self, reader: &mut Reader<'_>, target: &mut T) -> Result<()>;
    fn write_from(&self, writer: &mut Writer, source: &T) -> Result<()>;
    fn validate(&self, source: &T) -> Result<()>;
}

struct Bound<T, C: Codec> {
    name: &'static str,
    codec: C,
    get: fn(&T) -> &C::Value,
    get_mut: fn(&mut T) -> &mut C::Value,
}

impl<T, C: Codec> FieldCodec<T> for Bound<T, C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn size(&self) -> usize {
        self.codec.size()
    }

    fn read_into(&self, reader: &mut Reader<'_>, target: &mut T) -> Result<()> {
        *(self.get_mut)(target) = self.codec.read(reader)?;
        Ok(())
    }

    fn write_from(&self, writer: &mut Writer, source: &T) -> Result<()> {
        self.codec.write(writer, (self.get)(source))
    }

    fn validate(&self, source: &T) -> Result<()> {
        self.codec.validate((self.get)(source))
    }
}

struct Hidden<C: Codec> {
    name: &'static str,
    codec: C,
    default: C::Value,
}

impl<T, C> FieldCodec<T> for Hidden<C>
where
    C: Codec,
    C::Value: PartialEq + Debug + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn size(&self) -> usize {
        self.codec.size()
    }

    fn read_into(&self, reader: &mut Reader<'_>, _target: &mut T) -> Result<()> {
        let value = self.codec.read(reader)?;
        if value != self.default {
            reader.reject(format!(
                "non-exported field holds {value:?}, expected {:?}",
                self.default
            ))?;
        }
        Ok(())
    }

    fn write_from(&self, writer: &mut Writer, _source: &T) -> Result<()> {
        self.codec.write(writer, &self.default)
    }

    fn validate(&self, _source: &T) -> Result<()> {
        self.codec.validate(&self.default)
    }
}

/// A base-record field seen through the derived record.
struct Projected<T, B> {
    inner: Arc<dyn FieldCodec<B> + Send + Sync>,
    get: fn(&T) -> &B,
    get_mut: fn(&mut T) -> &mut B,
}

impl<T, B> FieldCodec<T> for Projected<T, B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn read_into(&self, reader: &mut Reader<'_>, target: &mut T) -> Result<()> {
        self.inner.read_into(reader, (self.get_mut)(target))
    }

    fn write_from(&self, writer: &mut Writer, source: &T) -> Result<()> {
        self.inner.write_from(writer, (self.get)(source))
    }

    fn validate(&self, source: &T) -> Result<()> {
        self.inner.validate((self.get)(source))
    }
}

type FieldRef<T> = Arc<dyn FieldCodec<T> + Send + Sync>;

/// Codec for a record type `T`.
pub struct Struct<T> {
    name: &'static str,
    fields: Vec<FieldRef<T>>,
    validators: Vec<Validator<T>>,
}

impl<T: 'static> Struct<T> {
    pub fn builder(name: &'static str) -> StructBuilder<T> {
        StructBuilder {
            name,
            base_fields: Vec::new(),
            fields: Vec::new(),
            validators: Vec::new(),
            typed_bases: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field names in wire order, base fields first.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name()).collect()
    }
}

impl<T: Default + 'static> Codec for Struct<T> {
    type Value = T;

    fn size(&self) -> usize {
        self.fields.iter().map(|f| f.size()).sum()
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<T> {
        let mut value = T::default();
        for field in &self.fields {
            let name = field.name();
            reader
                .scoped(PathSegment::Field(name), |r| field.read_into(r, &mut value))
                .map_err(|e| e.in_field(name))?;
        }
        for validator in &self.validators {
            if let Err(message) = validator(&value) {
                reader.reject(format!("{}: {message}", self.name))?;
            }
        }
        Ok(value)
    }

    fn write(&self, writer: &mut Writer, value: &T) -> Result<()> {
        for field in &self.fields {
            field
                .write_from(writer, value)
                .map_err(|e| e.in_field(field.name()))?;
        }
        Ok(())
    }

    fn validate(&self, value: &T) -> Result<()> {
        for field in &self.fields {
            field.validate(value).map_err(|e| e.in_field(field.name()))?;
        }
        // Same checks as decode, always strict
        for validator in &self.validators {
            validator(value)
                .map_err(|message| Error::validator(Operation::Encode, format!("{}: {message}", self.name)))?;
        }
        Ok(())
    }
}

/// Incrementally declares a [`Struct`].
pub struct StructBuilder<T> {
    name: &'static str,
    base_fields: Vec<FieldRef<T>>,
    fields: Vec<FieldRef<T>>,
    validators: Vec<Validator<T>>,
    typed_bases: usize,
}

impl<T: 'static> StructBuilder<T> {
    /// Inherit every field and validator of `base`, ahead of this record's own fields.
    #[must_use]
    pub fn base<B: 'static>(
        mut self,
        base: &Struct<B>,
        get: fn(&T) -> &B,
        get_mut: fn(&mut T) -> &mut B,
    ) -> Self {
        if !base.fields.is_empty() {
            self.typed_bases += 1;
        }
        for field in &base.fields {
            self.base_fields.push(Arc::new(Projected {
                inner: Arc::clone(field),
                get,
                get_mut,
            }));
        }
        for validator in &base.validators {
            let validator = Arc::clone(validator);
            self.validators.push(Arc::new(move |value: &T| validator(get(value))));
        }
        self
    }

    /// Bind `codec` to a member of `T`.
    #[must_use]
    pub fn field<C>(
        mut self,
        name: &'static str,
        codec: C,
        get: fn(&T) -> &C::Value,
        get_mut: fn(&mut T) -> &mut C::Value,
    ) -> Self
    where
        C: Codec + 'static,
    {
        self.fields.push(Arc::new(Bound { name, codec, get, get_mut }));
        self
    }

    /// A field that is always written as `default` and never reaches `T`.
    #[must_use]
    pub fn hidden<C>(mut self, name: &'static str, codec: C, default: C::Value) -> Self
    where
        C: Codec + 'static,
        C::Value: PartialEq + Debug + Send + Sync + 'static,
    {
        self.fields.push(Arc::new(Hidden { name, codec, default }));
        self
    }

    /// Reject decoded records for which `check` returns an error message.
    #[must_use]
    pub fn validator(mut self, check: fn(&T) -> std::result::Result<(), String>) -> Self {
        self.validators.push(Arc::new(check));
        self
    }

    pub fn build(self) -> Result<Struct<T>> {
        if self.typed_bases > 1 {
            return Err(Error::Schema {
                descriptor: self.name,
                message: format!("{} bases declare fields; at most one may", self.typed_bases),
            });
        }

        let mut fields = self.base_fields;
        fields.extend(self.fields);

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(Error::Schema {
                    descriptor: self.name,
                    message: format!("field `{}` declared twice", field.name()),
                });
            }
        }

        Ok(Struct {
            name: self.name,
            fields,
            validators: self.validators,
        })
    }
}

/// Check used by validators of padding members.
pub(crate) fn require_zero<V: PartialEq + Default + Debug>(name: &str, value: &V) -> std::result::Result<(), String> {
    if *value == V::default() {
        Ok(())
    } else {
        Err(format!("{name} must be zero, found {value:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Array, Endian, F32, Primitive, Strictness, U8, U16, U32};
    use crate::error::Operation;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct TestBase {
        top_int: u32,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct TestStructure {
        base: TestBase,
        bottom_float: f32,
        array: Vec<u16>,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct TestNestedStructure {
        nested: TestStructure,
        extra: Vec<u8>,
    }

    fn base_codec() -> Struct<TestBase> {
        fields!(Struct::<TestBase>::builder("TestBase"); top_int: U32).build().unwrap()
    }

    fn structure_codec() -> &'static Struct<TestStructure> {
        let codec = fields!(
            Struct::<TestStructure>::builder("TestStructure").base(&base_codec(), |s| &s.base, |s| &mut s.base);
            bottom_float: F32,
            array: Array::new(U16, 6),
        )
        .build()
        .unwrap();
        Box::leak(Box::new(codec))
    }

    fn sample() -> TestStructure {
        TestStructure {
            base: TestBase { top_int: 1 },
            bottom_float: 0.0,
            array: vec![0, 1, 2, 3, 4, 5],
        }
    }

    const SAMPLE_BE: [u8; 20] = [
        0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 2, 0, 3, 0, 4, 0, 5,
    ];

    #[test]
    fn test_structure_with_base() {
        let codec = structure_codec();
        assert_eq!(codec.field_names(), vec!["top_int", "bottom_float", "array"]);
        assert_eq!(codec.size(), 20);

        let bytes = codec.encode(Endian::Big, &sample()).unwrap();
        assert_eq!(bytes, SAMPLE_BE.to_vec());
        assert_eq!(codec.decode(Endian::Big, &bytes, 0).unwrap(), (sample(), 20));
    }

    #[test]
    fn test_nested_structure() {
        let nested = fields!(
            Struct::<TestNestedStructure>::builder("TestNestedStructure");
            nested: structure_codec(),
            extra: Array::new(U8, 16),
        )
        .build()
        .unwrap();

        let value = TestNestedStructure { nested: sample(), extra: (0..16).collect() };
        let bytes = nested.encode(Endian::Big, &value).unwrap();

        let mut expected = SAMPLE_BE.to_vec();
        expected.extend(0..16u8);
        assert_eq!(bytes, expected);
        assert_eq!(nested.decode(Endian::Big, &bytes, 0).unwrap().0, value);
    }

    #[test]
    fn test_endianness_independence() {
        let codec = structure_codec();
        let value = TestStructure {
            base: TestBase { top_int: 0xDEAD_BEEF },
            bottom_float: -3.25,
            array: vec![1, 256, 65535, 0, 7, 9],
        };
        let big = codec.encode(Endian::Big, &value).unwrap();
        let little = codec.encode(Endian::Little, &value).unwrap();
        assert_ne!(big, little);
        assert_eq!(codec.decode(Endian::Big, &big, 0).unwrap().0, value);
        assert_eq!(codec.decode(Endian::Little, &little, 0).unwrap().0, value);
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Leaf {
        d: u8,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Inner {
        c: Vec<Leaf>,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Mid {
        b: Inner,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Outer {
        a: Mid,
    }

    #[test]
    fn test_field_path_propagation() {
        let leaf: &'static Struct<Leaf> = Box::leak(Box::new(
            fields!(Struct::<Leaf>::builder("Leaf"); d: Primitive::<u8>::bounded(0, 100)).build().unwrap(),
        ));
        let inner: &'static Struct<Inner> = Box::leak(Box::new(
            fields!(Struct::<Inner>::builder("Inner"); c: Array::new(leaf, 4)).build().unwrap(),
        ));
        let mid: &'static Struct<Mid> =
            Box::leak(Box::new(fields!(Struct::<Mid>::builder("Mid"); b: inner).build().unwrap()));
        let outer = fields!(Struct::<Outer>::builder("Outer"); a: mid).build().unwrap();

        let mut value = Outer::default();
        value.a.b.c = vec![Leaf { d: 1 }, Leaf { d: 2 }, Leaf { d: 200 }, Leaf { d: 3 }];

        let err = outer.encode(Endian::Little, &value).unwrap_err();
        assert!(matches!(err, Error::Range { op: Operation::Encode, .. }));
        assert_eq!(err.path().unwrap().to_string(), "a.b.c[2].d");

        // The same planted value is caught on decode with the same path
        let mut bytes = vec![1, 2, 3, 4];
        bytes[2] = 200;
        let err = outer.decode(Endian::Little, &bytes, 0).unwrap_err();
        assert!(matches!(err, Error::Range { op: Operation::Decode, .. }));
        assert_eq!(err.path().unwrap().to_string(), "a.b.c[2].d");
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Padded {
        value: u16,
        padding: u16,
    }

    fn padded_codec() -> Struct<Padded> {
        fields!(Struct::<Padded>::builder("Padded"); value: U16, padding: U16, hidden(reserved, U32, 0))
            .validator(|p| require_zero("padding", &p.padding))
            .build()
            .unwrap()
    }

    #[test]
    fn test_hidden_field_written_from_default() {
        let codec = padded_codec();
        let bytes = codec.encode(Endian::Big, &Padded { value: 5, padding: 0 }).unwrap();
        assert_eq!(bytes, vec![0, 5, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_validator_strict_and_lenient() {
        let codec = padded_codec();
        let bytes = [0, 5, 0, 1, 0, 0, 0, 0];

        let err = codec.decode(Endian::Big, &bytes, 0).unwrap_err();
        assert!(matches!(err, Error::Validator { op: Operation::Decode, .. }));

        let mut reader = Reader::new(&bytes, Endian::Big).with_strictness(Strictness::Lenient);
        let value = codec.read(&mut reader).unwrap();
        assert_eq!(value, Padded { value: 5, padding: 1 });
    }

    #[test]
    fn test_validator_runs_before_encode() {
        let codec = padded_codec();
        let invalid = Padded { value: 5, padding: 1 };
        let err = codec.validate(&invalid).unwrap_err();
        assert!(matches!(err, Error::Validator { op: Operation::Encode, .. }));
        assert_eq!(err.path().unwrap().to_string(), "<root>");

        let err = codec.encode(Endian::Big, &invalid).unwrap_err();
        assert!(matches!(err, Error::Validator { op: Operation::Encode, ref message, .. } if message.contains("padding")));
    }

    #[test]
    fn test_base_validator_runs_before_encode() {
        #[derive(Debug, Default)]
        struct Wrapper {
            inner: Padded,
            tail: u8,
        }
        let base = padded_codec();
        let codec = fields!(Struct::<Wrapper>::builder("Wrapper").base(&base, |w| &w.inner, |w| &mut w.inner); tail: U8)
            .build()
            .unwrap();
        let invalid = Wrapper { inner: Padded { value: 1, padding: 2 }, tail: 0 };
        assert!(matches!(codec.validate(&invalid), Err(Error::Validator { op: Operation::Encode, .. })));
    }

    #[test]
    fn test_hidden_field_mismatch_reports_path() {
        let codec = padded_codec();
        let bytes = [0, 5, 0, 0, 0, 0, 0, 9];
        let err = codec.decode(Endian::Big, &bytes, 0).unwrap_err();
        assert!(matches!(err, Error::Validator { .. }));
        assert_eq!(err.path().unwrap().to_string(), "reserved");
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = fields!(Struct::<Padded>::builder("Dup"); value: U16, padding: U16)
            .field("value", U16, |p| &p.value, |p| &mut p.value)
            .build();
        assert!(matches!(result, Err(Error::Schema { descriptor: "Dup", .. })));
    }

    #[test]
    fn test_two_typed_bases_rejected() {
        #[derive(Default)]
        struct Both {
            left: TestBase,
            right: TestBase,
        }
        let base = base_codec();
        let result = Struct::<Both>::builder("Both")
            .base(&base, |b| &b.left, |b| &mut b.left)
            .base(&base, |b| &b.right, |b| &mut b.right)
            .build();
        assert!(matches!(result, Err(Error::Schema { .. })));
    }

    #[test]
    fn test_empty_base_is_not_ambiguous() {
        #[derive(Default)]
        struct Marker;
        #[derive(Default)]
        struct WithMarker {
            marker: Marker,
            base: TestBase,
        }
        let marker = Struct::<Marker>::builder("Marker").build().unwrap();
        let codec = Struct::<WithMarker>::builder("WithMarker")
            .base(&marker, |w| &w.marker, |w| &mut w.marker)
            .base(&base_codec(), |w| &w.base, |w| &mut w.base)
            .build()
            .unwrap();
        assert_eq!(codec.field_names(), vec!["top_int"]);
    }
}
