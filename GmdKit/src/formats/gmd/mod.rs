//! GMD model containers
//!
//! A GMD file is a `GSGM` header followed by the tables that make up one
//! model: nodes, objects, meshes, attribute sets, materials, bone matrices,
//! vertex buffers and string tables. Two schema families exist:
//!
//! - [`kenzan`] - version majors 1 and 2
//! - [`yk1`] - version majors 3 and 4
//!
//! [`sniff`] reads the version and byte order, [`decode`] and [`encode`]
//! convert whole files.

pub mod bytestrings;
pub mod common;
pub mod dispatch;
pub mod file;
pub mod kenzan;
pub mod yk1;

pub use common::{
    Attribute, BaseHeader, ChecksumStr, IndexRange, MAGIC, Node, NodeStackOp, NodeType, TextureIndex,
    Version,
};
pub use dispatch::{BaseInfo, GmdFile, decode, decode_with, encode, sniff};
pub use file::{Family, GmdFileData, GmdHeader};
pub use kenzan::{Kenzan, KenzanFile};
pub use yk1::{Yk1, Yk1File};
