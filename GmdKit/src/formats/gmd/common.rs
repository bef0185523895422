//! Records shared by every GMD version family

use std::fmt;
use std::ops::Range;

use glam::{Quat, Vec3, Vec4};
use lazy_static::lazy_static;

use crate::codec::structure::fields;
use crate::codec::{
    Array, Ascii, Codec, Endian, F32, I32, Map, Primitive, QUAT, RangeMapped, Struct, U8, U16, U32,
    U64, UNORM8, VEC4,
};
use crate::error::{Error, FieldPath, Operation, Result};

/// Magic tag at the start of every GMD file.
pub const MAGIC: &str = "GSGM";

/// Length of the text part of a [`ChecksumStr`].
pub const NAME_LENGTH: usize = 30;

/// Wire values of `vertex_endian_check` that mark big-endian vertex data.
pub const BIG_ENDIAN_VERTEX_MARKERS: [u8; 4] = [1, 2, 3, 6];

/// Float count of [`Attribute::extra_properties`].
pub const EXTRA_PROPERTIES: usize = 16;

/// Bit of the last flags word selecting 16-bit matrix bytestrings.
pub const INT16_MATRIX_LISTS_BIT: u32 = 1 << 31;

/// Combined `(major << 16) | minor` file version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn from_combined(combined: u32) -> Self {
        Self {
            major: (combined >> 16) as u16,
            minor: (combined & 0xFFFF) as u16,
        }
    }

    pub fn combined(self) -> u32 {
        (u32::from(self.major) << 16) | u32::from(self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A 30-byte ASCII name prefixed with a 16-bit checksum of its bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChecksumStr {
    pub checksum: u16,
    pub text: String,
}

impl ChecksumStr {
    /// Build a name with its checksum computed.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self { checksum: Self::checksum_of(&text), text }
    }

    /// Sum of the text's bytes, wrapping at 2^16.
    pub fn checksum_of(text: &str) -> u16 {
        text.bytes().fold(0u16, |sum, b| sum.wrapping_add(u16::from(b)))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_consistent(&self) -> bool {
        self.checksum == Self::checksum_of(&self.text)
    }
}

impl fmt::Display for ChecksumStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn checksum_matches(name: &ChecksumStr) -> std::result::Result<(), String> {
    if name.is_consistent() {
        Ok(())
    } else {
        Err(format!(
            "checksum {:#06x} does not match {:?} (expected {:#06x})",
            name.checksum,
            name.text,
            ChecksumStr::checksum_of(&name.text)
        ))
    }
}

fn endian_from_wire(value: u8) -> Result<Endian> {
    match value {
        0 => Ok(Endian::Little),
        1 => Ok(Endian::Big),
        other => Err(Error::Endianness {
            op: Operation::Decode,
            path: FieldPath::new(),
            value: other,
        }),
    }
}

fn endian_to_wire(endian: &Endian) -> u8 {
    u8::from(endian.is_big())
}

fn version_from_wire(combined: u32) -> Result<Version> {
    Ok(Version::from_combined(combined))
}

fn version_to_wire(version: &Version) -> u32 {
    version.combined()
}

/// The file-endianness byte: 0 little, 1 big.
pub const FILE_ENDIAN: Map<Primitive<u8>, Endian> = Map::new(U8, endian_from_wire, endian_to_wire);

/// The combined version word.
pub const VERSION: Map<Primitive<u32>, Version> = Map::new(U32, version_from_wire, version_to_wire);

/// Header fields common to every version family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseHeader {
    pub magic: String,
    pub vertex_endian_check: u8,
    pub file_endian: Endian,
    pub version: Version,
    pub file_size: u32,
    pub name: ChecksumStr,
}

impl BaseHeader {
    pub fn vertices_big_endian(&self) -> bool {
        BIG_ENDIAN_VERTEX_MARKERS.contains(&self.vertex_endian_check)
    }
}

fn magic_matches(header: &BaseHeader) -> std::result::Result<(), String> {
    if header.magic == MAGIC {
        Ok(())
    } else {
        Err(format!("magic must be {MAGIC:?}, found {:?}", header.magic))
    }
}

/// Stack operation applied when walking the node table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NodeStackOp {
    #[default]
    None = 0,
    Pop = 1,
    Push = 2,
    PopPush = 3,
}

impl NodeStackOp {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(NodeStackOp::None),
            1 => Ok(NodeStackOp::Pop),
            2 => Ok(NodeStackOp::Push),
            3 => Ok(NodeStackOp::PopPush),
            other => Err(Error::type_mismatch(Operation::Decode, format!("unknown node stack op {other}"))),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Kind of scene node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NodeType {
    #[default]
    MatrixTransform = 0,
    UnskinnedMesh = 1,
    SkinnedMesh = 2,
}

impl NodeType {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(NodeType::MatrixTransform),
            1 => Ok(NodeType::UnskinnedMesh),
            2 => Ok(NodeType::SkinnedMesh),
            other => Err(Error::type_mismatch(Operation::Decode, format!("unknown node type {other}"))),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

fn stack_op_to_wire(op: &NodeStackOp) -> u32 {
    op.as_u32()
}

fn node_type_to_wire(node_type: &NodeType) -> u32 {
    node_type.as_u32()
}

/// One entry of the node table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub index: i32,
    pub parent_of: i32,
    pub sibling_of: i32,
    pub object_index: i32,
    pub matrix_index: i32,
    pub stack_op: NodeStackOp,
    pub name_index: i32,
    pub node_type: NodeType,
    pub pos: Vec4,
    pub rot: Quat,
    pub scale: Vec4,
    pub bone_pos: Vec4,
    pub bone_axis: Quat,
    pub padding: Vec4,
}

/// A texture slot of an [`Attribute`]. `tex_index` is -1 when unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureIndex {
    pub padding: u32,
    pub tex_index: i32,
}

impl TextureIndex {
    pub const UNSET: Self = Self { padding: 0, tex_index: -1 };

    pub fn is_set(&self) -> bool {
        self.tex_index >= 0
    }
}

/// An attribute set: shader, material and texture bindings for a group of meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub index: u32,
    pub material_index: u32,
    pub shader_index: u32,
    /// First entry of this set's meshes in the meshset table.
    pub meshset_start: u32,
    pub meshset_count: u32,
    /// Kept exactly as stored.
    pub texture_init_count: u32,
    pub flags: u64,
    pub texture_diffuse: TextureIndex,
    pub texture_refl: TextureIndex,
    pub texture_multi: TextureIndex,
    pub texture_rm: TextureIndex,
    pub texture_ts: TextureIndex,
    pub texture_normal: TextureIndex,
    pub texture_rt: TextureIndex,
    pub texture_rd: TextureIndex,
    pub extra_properties: Vec<f32>,
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            index: 0,
            material_index: 0,
            shader_index: 0,
            meshset_start: 0,
            meshset_count: 0,
            texture_init_count: 0,
            flags: 0,
            texture_diffuse: TextureIndex::UNSET,
            texture_refl: TextureIndex::UNSET,
            texture_multi: TextureIndex::UNSET,
            texture_rm: TextureIndex::UNSET,
            texture_ts: TextureIndex::UNSET,
            texture_normal: TextureIndex::UNSET,
            texture_rt: TextureIndex::UNSET,
            texture_rd: TextureIndex::UNSET,
            extra_properties: vec![0.0; EXTRA_PROPERTIES],
        }
    }
}

impl Attribute {
    /// Texture slots in wire order.
    pub fn textures(&self) -> [&TextureIndex; 8] {
        [
            &self.texture_diffuse,
            &self.texture_refl,
            &self.texture_multi,
            &self.texture_rm,
            &self.texture_ts,
            &self.texture_normal,
            &self.texture_rt,
            &self.texture_rd,
        ]
    }
}

/// A run of entries in the index buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub start: u32,
    pub count: u32,
}

impl IndexRange {
    pub fn range(&self) -> Range<usize> {
        let start = self.start as usize;
        start..start + self.count as usize
    }
}

/// Three UNORM8 channels as an RGB colour.
pub type RgbUnorm8 = Map<Array<RangeMapped<u8>>, Vec3>;

fn rgb_from_wire(v: Vec<f32>) -> Result<Vec3> {
    Ok(Vec3::from_slice(&v))
}

fn rgb_to_wire(v: &Vec3) -> Vec<f32> {
    v.to_array().to_vec()
}

pub const RGB_UNORM8: RgbUnorm8 = Map::new(Array::new(UNORM8, 3), rgb_from_wire, rgb_to_wire);

/// Opaque per-attribute block of 32 floats.
pub const UNK12: Array<Primitive<f32>> = Array::new(F32, 32);

/// Opaque per-attribute block of 32 words.
pub const UNK14: Array<Primitive<u32>> = Array::new(U32, 32);

lazy_static! {
    pub static ref CHECKSUM_STR: Struct<ChecksumStr> = fields!(
        Struct::<ChecksumStr>::builder("ChecksumStr");
        checksum: U16,
        text: Ascii::new(NAME_LENGTH),
    )
    .validator(checksum_matches)
    .build()
    .expect("ChecksumStr descriptor");

    pub static ref BASE_HEADER: Struct<BaseHeader> = fields!(
        Struct::<BaseHeader>::builder("BaseHeader");
        magic: Ascii::new(4),
        vertex_endian_check: U8,
        file_endian: FILE_ENDIAN,
        hidden(padding, U16, 0),
        version: VERSION,
        file_size: U32,
        name: &*CHECKSUM_STR,
    )
    .validator(magic_matches)
    .build()
    .expect("BaseHeader descriptor");

    pub static ref NODE: Struct<Node> = fields!(
        Struct::<Node>::builder("Node");
        index: I32,
        parent_of: I32,
        sibling_of: I32,
        object_index: I32,
        matrix_index: I32,
        stack_op: Map::new(U32, NodeStackOp::from_u32, stack_op_to_wire),
        name_index: I32,
        node_type: Map::new(U32, NodeType::from_u32, node_type_to_wire),
        pos: VEC4,
        rot: QUAT,
        scale: VEC4,
        bone_pos: VEC4,
        bone_axis: QUAT,
        padding: VEC4,
    )
    .build()
    .expect("Node descriptor");

    pub static ref TEXTURE_INDEX: Struct<TextureIndex> = fields!(
        Struct::<TextureIndex>::builder("TextureIndex");
        padding: U32,
        tex_index: I32,
    )
    .build()
    .expect("TextureIndex descriptor");

    pub static ref ATTRIBUTE: Struct<Attribute> = fields!(
        Struct::<Attribute>::builder("Attribute");
        index: U32,
        material_index: U32,
        shader_index: U32,
        meshset_start: U32,
        meshset_count: U32,
        texture_init_count: U32,
        flags: U64,
        texture_diffuse: &*TEXTURE_INDEX,
        texture_refl: &*TEXTURE_INDEX,
        texture_multi: &*TEXTURE_INDEX,
        texture_rm: &*TEXTURE_INDEX,
        texture_ts: &*TEXTURE_INDEX,
        texture_normal: &*TEXTURE_INDEX,
        texture_rt: &*TEXTURE_INDEX,
        texture_rd: &*TEXTURE_INDEX,
        extra_properties: Array::new(F32, EXTRA_PROPERTIES),
    )
    .build()
    .expect("Attribute descriptor");

    pub static ref INDEX_RANGE: Struct<IndexRange> = fields!(
        Struct::<IndexRange>::builder("IndexRange");
        start: U32,
        count: U32,
    )
    .build()
    .expect("IndexRange descriptor");
}

/// Read only the base header of `bytes` with the given byte order.
pub fn read_base_header(bytes: &[u8], endian: Endian) -> Result<BaseHeader> {
    BASE_HEADER.decode(endian, bytes, 0).map(|(header, _)| header)
}
