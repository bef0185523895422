//! Version and endianness detection, and selection of the file codec
//!
//! ```no_run
//! use gmdkit::formats::gmd;
//!
//! let bytes = std::fs::read("c_am_kiryu.gmd")?;
//! let info = gmd::sniff(&bytes)?;
//! println!("GMD {} ({:?})", info.version, info.endian);
//!
//! let file = gmd::decode(&bytes)?;
//! assert_eq!(gmd::encode(&file)?, bytes);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use super::common::{BASE_HEADER, BaseHeader, ChecksumStr, FILE_ENDIAN, Version, read_base_header};
use super::file::{Family, decode_family, encode_family};
use super::kenzan::{self, Kenzan, KenzanFile};
use super::yk1::{self, Yk1, Yk1File};
use crate::codec::{Codec, DecodeOptions, Endian, Reader, Strictness};
use crate::error::{Error, FieldPath, Operation, Result};

/// Byte offset of the file-endianness byte.
const FILE_ENDIAN_OFFSET: usize = 5;

/// What the base header reveals without choosing a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseInfo {
    pub version: Version,
    pub endian: Endian,
    pub vertices_big_endian: bool,
    pub file_size: u32,
    pub name: ChecksumStr,
}

impl From<BaseHeader> for BaseInfo {
    fn from(header: BaseHeader) -> Self {
        Self {
            vertices_big_endian: header.vertices_big_endian(),
            version: header.version,
            endian: header.file_endian,
            file_size: header.file_size,
            name: header.name,
        }
    }
}

impl BaseInfo {
    /// Name of the schema family for this version, if supported.
    pub fn family(&self) -> Option<&'static str> {
        if Kenzan::supports(self.version) {
            Some(Kenzan::NAME)
        } else if Yk1::supports(self.version) {
            Some(Yk1::NAME)
        } else {
            None
        }
    }
}

/// A decoded file of any supported family.
#[derive(Debug, Clone, PartialEq)]
pub enum GmdFile {
    Kenzan(KenzanFile),
    Yk1(Yk1File),
}

impl From<KenzanFile> for GmdFile {
    fn from(file: KenzanFile) -> Self {
        GmdFile::Kenzan(file)
    }
}

impl From<Yk1File> for GmdFile {
    fn from(file: Yk1File) -> Self {
        GmdFile::Yk1(file)
    }
}

/// Expand `$body` once per family with `$file` bound to the inner record.
macro_rules! each_family {
    ($gmd:expr, $file:ident => $body:expr) => {
        match $gmd {
            GmdFile::Kenzan($file) => $body,
            GmdFile::Yk1($file) => $body,
        }
    };
}

impl GmdFile {
    pub fn family(&self) -> &'static str {
        match self {
            GmdFile::Kenzan(_) => Kenzan::NAME,
            GmdFile::Yk1(_) => Yk1::NAME,
        }
    }

    pub fn version(&self) -> Version {
        each_family!(self, file => file.version)
    }

    pub fn endian(&self) -> Endian {
        each_family!(self, file => file.file_endian)
    }

    pub fn name(&self) -> &ChecksumStr {
        each_family!(self, file => &file.name)
    }

    pub fn vertices_big_endian(&self) -> bool {
        each_family!(self, file => file.vertices_big_endian())
    }

    pub fn uses_int16_matrix_lists(&self) -> bool {
        each_family!(self, file => file.uses_int16_matrix_lists())
    }

    /// Element count (or byte size for raw regions) of every region, in layout order.
    pub fn region_sizes(&self) -> Vec<(&'static str, usize)> {
        each_family!(self, file => vec![
            ("node_arr", file.node_arr.len()),
            ("obj_arr", file.obj_arr.len()),
            ("mesh_arr", file.mesh_arr.len()),
            ("attribute_arr", file.attribute_arr.len()),
            ("material_arr", file.material_arr.len()),
            ("matrix_arr", file.matrix_arr.len()),
            ("vertex_buffer_arr", file.vertex_buffer_arr.len()),
            ("vertex_data", file.vertex_data.len()),
            ("texture_arr", file.texture_arr.len()),
            ("shader_arr", file.shader_arr.len()),
            ("node_name_arr", file.node_name_arr.len()),
            ("index_data", file.index_data.len()),
            ("meshset_data", file.meshset_data.len()),
            ("mesh_matrix_bytestrings", file.mesh_matrix_bytestrings.len()),
            ("unk12", file.unk12.len()),
            ("unk13", file.unk13.len()),
            ("unk14", file.unk14.len()),
        ])
    }

    /// Bone-index list of every mesh.
    pub fn mesh_matrix_lists(&self) -> Result<Vec<Vec<u16>>> {
        each_family!(self, file => file.mesh_matrix_lists())
    }
}

fn sniff_with(bytes: &[u8], strictness: Strictness) -> Result<BaseInfo> {
    // The endianness byte reads the same under either byte order
    let (endian, _) = FILE_ENDIAN
        .decode(Endian::Big, bytes, FILE_ENDIAN_OFFSET)
        .map_err(|e| e.in_field("file_endian"))?;

    let header = match strictness {
        Strictness::Strict => read_base_header(bytes, endian)?,
        Strictness::Lenient => {
            let mut reader = Reader::new(bytes, endian).with_strictness(strictness);
            BASE_HEADER.read(&mut reader)?
        }
    };
    let info = BaseInfo::from(header);
    tracing::debug!(
        version = %info.version,
        endian = ?info.endian,
        family = info.family().unwrap_or("unsupported"),
        "sniffed GMD header"
    );
    Ok(info)
}

/// Read the base header: version, byte order and name.
///
/// Succeeds for unsupported versions so callers can report what they found.
pub fn sniff(bytes: &[u8]) -> Result<BaseInfo> {
    sniff_with(bytes, Strictness::Strict)
}

pub fn decode(bytes: &[u8]) -> Result<GmdFile> {
    decode_with(bytes, DecodeOptions::default())
}

/// Decode with explicit options.
pub fn decode_with(bytes: &[u8], options: DecodeOptions) -> Result<GmdFile> {
    let info = sniff_with(bytes, options.strictness)?;
    let strictness = options.strictness;

    if Kenzan::supports(info.version) {
        decode_family(&*kenzan::FILE, bytes, info.endian, strictness).map(GmdFile::Kenzan)
    } else if Yk1::supports(info.version) {
        decode_family(&*yk1::FILE, bytes, info.endian, strictness).map(GmdFile::Yk1)
    } else {
        Err(Error::UnknownVersion {
            op: Operation::Decode,
            path: FieldPath::new(),
            major: info.version.major,
            minor: info.version.minor,
        }
        .in_field("version"))
    }
}

/// Encode using the record's own family, version and byte order.
pub fn encode(file: &GmdFile) -> Result<Vec<u8>> {
    let bytes = match file {
        GmdFile::Kenzan(file) => encode_family(&*kenzan::FILE, file)?,
        GmdFile::Yk1(file) => encode_family(&*yk1::FILE, file)?,
    };
    tracing::debug!(family = file.family(), size = bytes.len(), "encoded file");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gmd::common::MAGIC;
    use pretty_assertions::assert_eq;

    fn header_bytes(version: Version, endian: Endian) -> Vec<u8> {
        let header = BaseHeader {
            magic: MAGIC.to_string(),
            vertex_endian_check: u8::from(endian.is_big()),
            file_endian: endian,
            version,
            file_size: 48,
            name: ChecksumStr::new("sniffed"),
        };
        BASE_HEADER.encode(endian, &header).unwrap()
    }

    #[test]
    fn test_sniff_big_endian() {
        let bytes = header_bytes(Version::new(3, 0), Endian::Big);
        assert_eq!(bytes[5], 1);
        let info = sniff(&bytes).unwrap();
        assert_eq!(info.endian, Endian::Big);
        assert_eq!(info.version, Version::new(3, 0));
        assert!(info.vertices_big_endian);
        assert_eq!(info.family(), Some("yk1"));
        assert_eq!(info.name.as_str(), "sniffed");
    }

    #[test]
    fn test_sniff_unknown_version_still_reports() {
        let bytes = header_bytes(Version::new(9, 2), Endian::Little);
        let info = sniff(&bytes).unwrap();
        assert_eq!(info.family(), None);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownVersion { op: Operation::Decode, major: 9, minor: 2, .. }
        ));
        assert_eq!(err.path().unwrap().to_string(), "version");
    }

    #[test]
    fn test_sniff_short_buffer() {
        let bytes = header_bytes(Version::new(1, 0), Endian::Big);
        assert!(matches!(sniff(&bytes[..4]), Err(Error::Offset { .. })));
        assert!(matches!(sniff(&bytes[..20]), Err(Error::Offset { .. })));
    }

    #[test]
    fn test_encode_rejects_version_outside_family() {
        let mut file = Yk1File::default();
        file.version = Version::new(2, 0);
        let err = encode(&GmdFile::Yk1(file)).unwrap_err();
        assert!(matches!(err, Error::UnknownVersion { op: Operation::Encode, major: 2, .. }));
    }
}
