//! Header and file record layouts shared by the version families
//!
//! Both families declare the same pointer fields in the same order and differ
//! only in the record types those pointers locate. A [`Family`] names those
//! record types and their descriptors; [`GmdHeader`] and [`GmdFileData`] are
//! generic over it.

use std::fmt::Debug;

use glam::Mat4;

use super::bytestrings;
use super::common::{
    ATTRIBUTE, Attribute, BASE_HEADER, BaseHeader, CHECKSUM_STR, ChecksumStr, INT16_MATRIX_LISTS_BIT,
    MAGIC, NODE, Node, UNK12, UNK14, Version,
};
use crate::codec::file::{copied, regions};
use crate::codec::structure::fields;
use crate::codec::{
    ARRAY_POINTER, Array, ArrayPointer, Endian, FileCodec, FileHeader, FileRecord, MAT4,
    SIZED_POINTER, SizedPointer, Strictness, Struct, U16, U32,
};
use crate::error::{Error, FieldPath, Operation, Result};

/// Number of words in the trailing flags block.
pub const FLAG_COUNT: usize = 6;

/// Access to a mesh's slice of the matrix bytestring region.
pub trait MeshMatrixList {
    /// `(byte offset, index count)` of this mesh's bone-index list.
    fn matrixlist(&self) -> (u32, u32);
    fn set_matrixlist(&mut self, offset: u32, length: u32);
}

/// A schema family: the version majors it covers and its per-family records.
pub trait Family: Debug + Clone + Copy + Default + PartialEq + Send + Sync + 'static {
    const NAME: &'static str;
    const HEADER_NAME: &'static str;
    /// Version majors decoded with this family.
    const MAJORS: &'static [u16];

    type Bounds: Debug + Clone + Default + PartialEq + Send + Sync + 'static;
    type Object: Debug + Clone + Default + PartialEq + Send + Sync + 'static;
    type Mesh: Debug + Clone + Default + PartialEq + Send + Sync + MeshMatrixList + 'static;
    type Material: Debug + Clone + Default + PartialEq + Send + Sync + 'static;
    type VertexBufferLayout: Debug + Clone + Default + PartialEq + Send + Sync + 'static;

    fn bounds() -> &'static Struct<Self::Bounds>;
    fn object() -> &'static Struct<Self::Object>;
    fn mesh() -> &'static Struct<Self::Mesh>;
    fn material() -> &'static Struct<Self::Material>;
    fn vertex_buffer_layout() -> &'static Struct<Self::VertexBufferLayout>;

    fn supports(version: Version) -> bool {
        Self::MAJORS.contains(&version.major)
    }
}

/// On-disk header: the base header, region pointers, bounds and flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GmdHeader<F: Family> {
    pub base: BaseHeader,
    pub node_arr: ArrayPointer,
    pub obj_arr: ArrayPointer,
    pub mesh_arr: ArrayPointer,
    pub attribute_arr: ArrayPointer,
    pub material_arr: ArrayPointer,
    pub matrix_arr: ArrayPointer,
    pub vertex_buffer_arr: ArrayPointer,
    pub vertex_data: SizedPointer,
    pub texture_arr: ArrayPointer,
    pub shader_arr: ArrayPointer,
    pub node_name_arr: ArrayPointer,
    pub index_data: ArrayPointer,
    pub meshset_data: SizedPointer,
    pub mesh_matrix_bytestrings: SizedPointer,
    pub overall_bounds: F::Bounds,
    pub unk12: ArrayPointer,
    pub unk13: ArrayPointer,
    pub unk14: ArrayPointer,
    pub flags: Vec<u32>,
}

impl<F: Family> FileHeader for GmdHeader<F> {
    fn file_size(&self) -> u32 {
        self.base.file_size
    }

    fn set_file_size(&mut self, size: u32) {
        self.base.file_size = size;
    }
}

/// A decoded GMD file of family `F`.
#[derive(Debug, Clone, PartialEq)]
pub struct GmdFileData<F: Family> {
    pub magic: String,
    pub vertex_endian_check: u8,
    pub file_endian: Endian,
    pub version: Version,
    pub name: ChecksumStr,

    pub node_arr: Vec<Node>,
    pub obj_arr: Vec<F::Object>,
    pub mesh_arr: Vec<F::Mesh>,
    pub attribute_arr: Vec<Attribute>,
    pub material_arr: Vec<F::Material>,
    pub matrix_arr: Vec<Mat4>,
    pub vertex_buffer_arr: Vec<F::VertexBufferLayout>,
    pub vertex_data: Vec<u8>,
    pub texture_arr: Vec<ChecksumStr>,
    pub shader_arr: Vec<ChecksumStr>,
    pub node_name_arr: Vec<ChecksumStr>,
    pub index_data: Vec<u16>,
    pub meshset_data: Vec<u8>,
    pub mesh_matrix_bytestrings: Vec<u8>,
    pub overall_bounds: F::Bounds,
    pub unk12: Vec<Vec<f32>>,
    pub unk13: Vec<u32>,
    pub unk14: Vec<Vec<u32>>,
    pub flags: Vec<u32>,
}

impl<F: Family> Default for GmdFileData<F> {
    fn default() -> Self {
        Self {
            magic: MAGIC.to_string(),
            vertex_endian_check: 0,
            file_endian: Endian::Little,
            version: Version::new(F::MAJORS[0], 0),
            name: ChecksumStr::default(),
            node_arr: Vec::new(),
            obj_arr: Vec::new(),
            mesh_arr: Vec::new(),
            attribute_arr: Vec::new(),
            material_arr: Vec::new(),
            matrix_arr: Vec::new(),
            vertex_buffer_arr: Vec::new(),
            vertex_data: Vec::new(),
            texture_arr: Vec::new(),
            shader_arr: Vec::new(),
            node_name_arr: Vec::new(),
            index_data: Vec::new(),
            meshset_data: Vec::new(),
            mesh_matrix_bytestrings: Vec::new(),
            overall_bounds: F::Bounds::default(),
            unk12: Vec::new(),
            unk13: Vec::new(),
            unk14: Vec::new(),
            flags: vec![0; FLAG_COUNT],
        }
    }
}

impl<F: Family> FileRecord for GmdFileData<F> {
    fn endian(&self) -> Endian {
        self.file_endian
    }
}

impl<F: Family> GmdFileData<F> {
    pub fn vertices_big_endian(&self) -> bool {
        super::common::BIG_ENDIAN_VERTEX_MARKERS.contains(&self.vertex_endian_check)
    }

    /// Whether matrix bytestrings hold 16-bit bone indices.
    pub fn uses_int16_matrix_lists(&self) -> bool {
        self.flags
            .get(FLAG_COUNT - 1)
            .is_some_and(|word| word & INT16_MATRIX_LISTS_BIT != 0)
    }

    pub fn set_int16_matrix_lists(&mut self, enabled: bool) {
        self.flags.resize(FLAG_COUNT, 0);
        let word = &mut self.flags[FLAG_COUNT - 1];
        if enabled {
            *word |= INT16_MATRIX_LISTS_BIT;
        } else {
            *word &= !INT16_MATRIX_LISTS_BIT;
        }
    }

    /// Bone-index list of every mesh, in mesh order.
    pub fn mesh_matrix_lists(&self) -> Result<Vec<Vec<u16>>> {
        let wide = self.uses_int16_matrix_lists();
        self.mesh_arr
            .iter()
            .enumerate()
            .map(|(index, mesh)| {
                let (offset, length) = mesh.matrixlist();
                if length == 0 {
                    return Ok(Vec::new());
                }
                let list = bytestrings::read_list(&self.mesh_matrix_bytestrings, offset as usize, self.file_endian, wide)
                    .map_err(|e| e.in_field("mesh_matrix_bytestrings"))?;
                if list.len() != length as usize {
                    return Err(Error::validator(
                        Operation::Decode,
                        format!("bytestring at {offset} holds {} indices, mesh expects {length}", list.len()),
                    )
                    .in_field("matrixlist_length")
                    .at_index(index)
                    .in_field("mesh_arr"));
                }
                Ok(list)
            })
            .collect()
    }

    /// Replace the matrix bytestring region with `lists`, one per mesh, and
    /// point every mesh at its list.
    pub fn set_mesh_matrix_lists(&mut self, lists: &[Vec<u16>]) -> Result<()> {
        if lists.len() != self.mesh_arr.len() {
            return Err(Error::length(Operation::Encode, self.mesh_arr.len(), lists.len()).in_field("mesh_arr"));
        }
        let (bytes, locations) = bytestrings::pack_lists(lists, self.file_endian, self.uses_int16_matrix_lists())
            .map_err(|e| e.in_field("mesh_matrix_bytestrings"))?;
        for (mesh, (offset, length)) in self.mesh_arr.iter_mut().zip(locations) {
            mesh.set_matrixlist(offset, length);
        }
        self.mesh_matrix_bytestrings = bytes;
        Ok(())
    }
}

/// File codec of a family.
pub type GmdFileCodec<F> = FileCodec<GmdHeader<F>, GmdFileData<F>, Struct<GmdHeader<F>>>;

pub(crate) fn header_codec<F: Family>() -> Result<Struct<GmdHeader<F>>> {
    fields!(
        Struct::<GmdHeader<F>>::builder(F::HEADER_NAME).base(&*BASE_HEADER, |h| &h.base, |h| &mut h.base);
        node_arr: &*ARRAY_POINTER,
        obj_arr: &*ARRAY_POINTER,
        mesh_arr: &*ARRAY_POINTER,
        attribute_arr: &*ARRAY_POINTER,
        material_arr: &*ARRAY_POINTER,
        matrix_arr: &*ARRAY_POINTER,
        vertex_buffer_arr: &*ARRAY_POINTER,
        vertex_data: &*SIZED_POINTER,
        texture_arr: &*ARRAY_POINTER,
        shader_arr: &*ARRAY_POINTER,
        node_name_arr: &*ARRAY_POINTER,
        index_data: &*ARRAY_POINTER,
        meshset_data: &*SIZED_POINTER,
        mesh_matrix_bytestrings: &*SIZED_POINTER,
        overall_bounds: F::bounds(),
        unk12: &*ARRAY_POINTER,
        unk13: &*ARRAY_POINTER,
        unk14: &*ARRAY_POINTER,
        flags: Array::new(U32, FLAG_COUNT),
    )
    .build()
}

pub(crate) fn file_codec<F: Family>() -> Result<GmdFileCodec<F>> {
    let codec = FileCodec::<GmdHeader<F>, GmdFileData<F>, _>::new(F::NAME, header_codec::<F>()?);
    let codec = copied!(
        codec;
        base.magic => magic,
        base.vertex_endian_check => vertex_endian_check,
        base.file_endian => file_endian,
        base.version => version,
        base.name => name,
        overall_bounds => overall_bounds,
        flags => flags,
    );
    Ok(regions!(
        codec;
        node_arr: &*NODE,
        obj_arr: F::object(),
        mesh_arr: F::mesh(),
        attribute_arr: &*ATTRIBUTE,
        material_arr: F::material(),
        matrix_arr: MAT4,
        vertex_buffer_arr: F::vertex_buffer_layout(),
        bytes(vertex_data),
        texture_arr: &*CHECKSUM_STR,
        shader_arr: &*CHECKSUM_STR,
        node_name_arr: &*CHECKSUM_STR,
        index_data: U16,
        bytes(meshset_data),
        bytes(mesh_matrix_bytestrings),
        unk12: UNK12,
        unk13: U32,
        unk14: UNK14,
    ))
}

/// Decode a whole file with a family's codec.
pub(crate) fn decode_family<F: Family>(
    codec: &GmdFileCodec<F>,
    bytes: &[u8],
    endian: Endian,
    strictness: Strictness,
) -> Result<GmdFileData<F>> {
    let file = codec.decode(bytes, endian, strictness)?;
    tracing::debug!(
        family = F::NAME,
        version = %file.version,
        nodes = file.node_arr.len(),
        meshes = file.mesh_arr.len(),
        "decoded file"
    );
    Ok(file)
}

/// Encode a file with a family's codec, refusing versions the family does not cover.
pub(crate) fn encode_family<F: Family>(codec: &GmdFileCodec<F>, file: &GmdFileData<F>) -> Result<Vec<u8>> {
    if !F::supports(file.version) {
        return Err(Error::UnknownVersion {
            op: Operation::Encode,
            path: FieldPath::new(),
            major: file.version.major,
            minor: file.version.minor,
        }
        .in_field("version"));
    }
    codec.encode(file)
}
