#![allow(non_snake_case)]
//! # GmdKit
//!
//! A pure-Rust codec for GMD model containers.
//!
//! ## Layers
//!
//! - **[`codec`]** - declarative descriptors: primitives, range-mapped
//!   integers, arrays, ASCII strings, adaptors, structures and the two-pass
//!   file codec
//! - **[`formats::gmd`]** - the GMD schema: shared header, per-version
//!   records and dispatch by version
//!
//! ## Quick Start
//!
//! ```no_run
//! use gmdkit::formats::gmd::{self, GmdFile};
//!
//! let bytes = std::fs::read("c_am_kiryu.gmd")?;
//! let file = gmd::decode(&bytes)?;
//! if let GmdFile::Yk1(yk1) = &file {
//!     println!("{} nodes, {} meshes", yk1.node_arr.len(), yk1.mesh_arr.len());
//! }
//! let rebuilt = gmd::encode(&file)?;
//! assert_eq!(rebuilt, bytes);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use gmdkit::prelude::*;
//!
//! let bytes = U32.encode(Endian::Big, &7)?;
//! assert_eq!(bytes, [0, 0, 0, 7]);
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `gmdkit` command-line binary

pub mod codec;
pub mod error;
pub mod formats;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::codec::{
        Array, Ascii, Codec, DecodeOptions, Endian, FileCodec, Map, Primitive, RangeMapped, Strictness,
        Struct, F16, F32, I8, I16, I32, I64, MAT4, QUAT, SNORM8, U8, U16, U32, U64, UNORM8, UNORM16,
        VEC3, VEC4,
    };
    pub use crate::error::{Error, FieldPath, Operation, Result};
    pub use crate::formats::gmd::{
        BaseInfo, GmdFile, GmdFileData, Kenzan, KenzanFile, Version, Yk1, Yk1File, decode, decode_with,
        encode, sniff,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
