//! Value adaptors: a codec plus a bijection onto a domain type

use glam::{Mat4, Quat, Vec3, Vec4};

use super::array::Array;
use super::primitive::{F32, Primitive};
use super::{Codec, Reader, Writer};
use crate::error::Result;

/// Wraps `inner` so its wire value maps to a domain type `T`.
///
/// `to_domain` may reject wire values that have no domain counterpart
/// (unknown enum discriminants, bad endianness bytes). Validation runs on the
/// wire value produced by `from_domain`.
pub struct Map<C: Codec, T> {
    inner: C,
    to_domain: fn(C::Value) -> Result<T>,
    from_domain: fn(&T) -> C::Value,
}

impl<C: Codec, T> Map<C, T> {
    pub const fn new(
        inner: C,
        to_domain: fn(C::Value) -> Result<T>,
        from_domain: fn(&T) -> C::Value,
    ) -> Self {
        Self { inner, to_domain, from_domain }
    }
}

impl<C: Codec, T> Codec for Map<C, T> {
    type Value = T;

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn read(&self, reader: &mut Reader<'_>) -> Result<T> {
        (self.to_domain)(self.inner.read(reader)?)
    }

    fn write(&self, writer: &mut Writer, value: &T) -> Result<()> {
        self.inner.write(writer, &(self.from_domain)(value))
    }

    fn validate(&self, value: &T) -> Result<()> {
        self.inner.validate(&(self.from_domain)(value))
    }
}

type Floats = Array<Primitive<f32>>;

fn vec3_from_wire(v: Vec<f32>) -> Result<Vec3> {
    Ok(Vec3::from_slice(&v))
}

fn vec3_to_wire(v: &Vec3) -> Vec<f32> {
    v.to_array().to_vec()
}

fn vec4_from_wire(v: Vec<f32>) -> Result<Vec4> {
    Ok(Vec4::from_slice(&v))
}

fn vec4_to_wire(v: &Vec4) -> Vec<f32> {
    v.to_array().to_vec()
}

// Wire order is x, y, z, w.
fn quat_from_wire(v: Vec<f32>) -> Result<Quat> {
    Ok(Quat::from_xyzw(v[0], v[1], v[2], v[3]))
}

fn quat_to_wire(q: &Quat) -> Vec<f32> {
    vec![q.x, q.y, q.z, q.w]
}

// 16 floats, one column after another.
fn mat4_from_wire(v: Vec<f32>) -> Result<Mat4> {
    Ok(Mat4::from_cols_slice(&v))
}

fn mat4_to_wire(m: &Mat4) -> Vec<f32> {
    m.to_cols_array().to_vec()
}

/// Three f32 as a [`Vec3`].
pub const VEC3: Map<Floats, Vec3> = Map::new(Array::new(F32, 3), vec3_from_wire, vec3_to_wire);
/// Four f32 as a [`Vec4`].
pub const VEC4: Map<Floats, Vec4> = Map::new(Array::new(F32, 4), vec4_from_wire, vec4_to_wire);
/// Four f32 in `[x, y, z, w]` order as a [`Quat`].
pub const QUAT: Map<Floats, Quat> = Map::new(Array::new(F32, 4), quat_from_wire, quat_to_wire);
/// Sixteen column-major f32 as a [`Mat4`].
pub const MAT4: Map<Floats, Mat4> = Map::new(Array::new(F32, 16), mat4_from_wire, mat4_to_wire);
