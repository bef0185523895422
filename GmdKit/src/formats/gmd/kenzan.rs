//! Older GMD layout (version majors 1 and 2)
//!
//! Differs from [`super::yk1`] in the bounds record, which carries an
//! orientation, and in the field order of meshes, materials and vertex
//! buffer layouts.

use glam::{Quat, Vec3};
use lazy_static::lazy_static;

use super::common::{INDEX_RANGE, IndexRange, RGB_UNORM8};
use super::file::{Family, GmdFileCodec, GmdFileData, GmdHeader, MeshMatrixList, file_codec};
use crate::codec::structure::fields;
use crate::codec::{F32, QUAT, Struct, U8, U32, U64, UNORM8, VEC3};

/// Marker for the older schema family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Kenzan;

pub type KenzanHeader = GmdHeader<Kenzan>;
pub type KenzanFile = GmdFileData<Kenzan>;

/// Oriented bounding sphere and box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub sphere_radius: f32,
    pub aabb_extents: Vec3,
    pub padding: f32,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    pub index: u32,
    pub node_index_1: u32,
    pub node_index_2: u32,
    pub drawlist_rel_ptr: u32,
    pub bbox: Bounds,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub index: u32,
    pub attribute_index: u32,
    pub vertex_buffer_index: u32,
    pub vertex_count: u32,
    pub triangle_list_indices: IndexRange,
    pub noreset_strip_indices: IndexRange,
    pub reset_strip_indices: IndexRange,
    pub matrixlist_length: u32,
    pub matrixlist_offset: u32,
    pub node_index: u32,
    pub object_index: u32,
    pub vertex_offset_from_index: u32,
    pub min_index: u32,
}

impl MeshMatrixList for Mesh {
    fn matrixlist(&self) -> (u32, u32) {
        (self.matrixlist_offset, self.matrixlist_length)
    }

    fn set_matrixlist(&mut self, offset: u32, length: u32) {
        self.matrixlist_offset = offset;
        self.matrixlist_length = length;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub power: f32,
    pub unk1: Vec3,
    pub specular: Vec3,
    pub diffuse: Vec3,
    pub opacity: f32,
    pub unk2: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBufferLayout {
    pub index: u32,
    pub vertex_count: u32,
    pub vertex_packing_flags: u64,
    pub bytes_per_vertex: u32,
    pub vertex_data_offset: u32,
    pub vertex_data_length: u32,
    pub padding: u32,
}

lazy_static! {
    pub static ref BOUNDS: Struct<Bounds> = fields!(
        Struct::<Bounds>::builder("KenzanBounds");
        center: VEC3,
        sphere_radius: F32,
        aabb_extents: VEC3,
        padding: F32,
        rotation: QUAT,
    )
    .build()
    .expect("KenzanBounds descriptor");

    pub static ref OBJECT: Struct<Object> = fields!(
        Struct::<Object>::builder("KenzanObject");
        index: U32,
        node_index_1: U32,
        node_index_2: U32,
        drawlist_rel_ptr: U32,
        bbox: &*BOUNDS,
    )
    .build()
    .expect("KenzanObject descriptor");

    pub static ref MESH: Struct<Mesh> = fields!(
        Struct::<Mesh>::builder("KenzanMesh");
        index: U32,
        attribute_index: U32,
        vertex_buffer_index: U32,
        vertex_count: U32,
        triangle_list_indices: &*INDEX_RANGE,
        noreset_strip_indices: &*INDEX_RANGE,
        reset_strip_indices: &*INDEX_RANGE,
        matrixlist_length: U32,
        matrixlist_offset: U32,
        node_index: U32,
        object_index: U32,
        vertex_offset_from_index: U32,
        min_index: U32,
    )
    .build()
    .expect("KenzanMesh descriptor");

    pub static ref MATERIAL: Struct<Material> = fields!(
        Struct::<Material>::builder("KenzanMaterial");
        power: F32,
        unk1: RGB_UNORM8,
        hidden(unk1_padding, U8, 0),
        specular: RGB_UNORM8,
        hidden(specular_padding, U8, 0),
        diffuse: RGB_UNORM8,
        opacity: UNORM8,
        unk2: F32,
    )
    .build()
    .expect("KenzanMaterial descriptor");

    pub static ref VERTEX_BUFFER_LAYOUT: Struct<VertexBufferLayout> = fields!(
        Struct::<VertexBufferLayout>::builder("KenzanVertexBufferLayout");
        index: U32,
        vertex_count: U32,
        vertex_packing_flags: U64,
        bytes_per_vertex: U32,
        vertex_data_offset: U32,
        vertex_data_length: U32,
        padding: U32,
    )
    .build()
    .expect("KenzanVertexBufferLayout descriptor");

    pub static ref FILE: GmdFileCodec<Kenzan> = file_codec::<Kenzan>().expect("Kenzan file descriptor");
}

impl Family for Kenzan {
    const NAME: &'static str = "kenzan";
    const HEADER_NAME: &'static str = "KenzanHeader";
    const MAJORS: &'static [u16] = &[1, 2];

    type Bounds = Bounds;
    type Object = Object;
    type Mesh = Mesh;
    type Material = Material;
    type VertexBufferLayout = VertexBufferLayout;

    fn bounds() -> &'static Struct<Bounds> {
        &BOUNDS
    }

    fn object() -> &'static Struct<Object> {
        &OBJECT
    }

    fn mesh() -> &'static Struct<Mesh> {
        &MESH
    }

    fn material() -> &'static Struct<Material> {
        &MATERIAL
    }

    fn vertex_buffer_layout() -> &'static Struct<VertexBufferLayout> {
        &VERTEX_BUFFER_LAYOUT
    }
}
