use gmdkit::formats::gmd::common::{Attribute, ChecksumStr, IndexRange, Node, NodeStackOp, NodeType, TextureIndex};
use gmdkit::formats::gmd::file::GmdHeader;
use gmdkit::formats::gmd::{kenzan, yk1};
use gmdkit::prelude::*;
use glam::{Mat4, Quat, Vec3, Vec4};
use pretty_assertions::assert_eq;

fn node(index: i32, node_type: NodeType, stack_op: NodeStackOp) -> Node {
    Node {
        index,
        parent_of: index - 1,
        sibling_of: -1,
        object_index: if node_type == NodeType::MatrixTransform { -1 } else { 0 },
        matrix_index: index,
        stack_op,
        name_index: index,
        node_type,
        pos: Vec4::new(0.0, 1.25, -0.5, 1.0),
        rot: Quat::from_xyzw(0.0, 0.38268343, 0.0, 0.9238795),
        scale: Vec4::ONE,
        bone_pos: Vec4::new(0.0, 1.25, -0.5, 1.0),
        bone_axis: Quat::IDENTITY,
        padding: Vec4::ZERO,
    }
}

fn attribute() -> Attribute {
    Attribute {
        meshset_count: 1,
        texture_init_count: 3,
        flags: 0x0000_0001_0000_0010,
        texture_diffuse: TextureIndex { padding: 0, tex_index: 0 },
        texture_normal: TextureIndex { padding: 0, tex_index: 1 },
        extra_properties: (0..16).map(|i| i as f32 * 0.25).collect(),
        ..Attribute::default()
    }
}

fn names(prefix: &str, count: usize) -> Vec<ChecksumStr> {
    (0..count).map(|i| ChecksumStr::new(format!("{prefix}_{i}"))).collect()
}

fn sample_yk1(endian: Endian) -> Yk1File {
    let mut file = Yk1File {
        file_endian: endian,
        vertex_endian_check: if endian.is_big() { 2 } else { 0 },
        version: Version::new(3, 2),
        name: ChecksumStr::new("c_am_sample"),
        node_arr: vec![
            node(0, NodeType::MatrixTransform, NodeStackOp::Push),
            node(1, NodeType::SkinnedMesh, NodeStackOp::Pop),
        ],
        obj_arr: vec![yk1::Object {
            index: 0,
            node_index_1: 1,
            node_index_2: 1,
            drawlist_rel_ptr: 0,
            bbox: yk1::Bounds {
                center: Vec3::new(0.0, 1.0, 0.0),
                sphere_radius: 1.5,
                aabb_extents: Vec3::new(0.5, 1.0, 0.5),
                padding: 0.0,
            },
        }],
        mesh_arr: vec![yk1::Mesh {
            vertex_count: 3,
            node_index: 1,
            triangle_list_indices: IndexRange { start: 0, count: 3 },
            noreset_strip_indices: IndexRange { start: 3, count: 3 },
            reset_strip_indices: IndexRange { start: 6, count: 0 },
            ..yk1::Mesh::default()
        }],
        attribute_arr: vec![attribute()],
        material_arr: vec![yk1::Material {
            diffuse: Vec3::ONE,
            opacity: 1.0,
            specular: Vec3::new(1.0, 0.0, 0.0),
            unk1: Vec3::ZERO,
            power: 16.0,
            unk2: 0.5,
        }],
        matrix_arr: vec![Mat4::IDENTITY, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))],
        vertex_buffer_arr: vec![yk1::VertexBufferLayout {
            vertex_count: 3,
            vertex_packing_flags: 0x0000_0000_0124_0067,
            vertex_data_length: 36,
            bytes_per_vertex: 12,
            ..yk1::VertexBufferLayout::default()
        }],
        vertex_data: (0..36).collect(),
        texture_arr: names("tex", 2),
        shader_arr: names("sd_skin", 1),
        node_name_arr: names("bone", 2),
        index_data: vec![0, 1, 2, 0, 1, 2],
        meshset_data: vec![0, 0, 0, 0],
        unk12: vec![(0..32).map(|i| i as f32).collect()],
        unk13: vec![7],
        unk14: vec![(0..32).collect()],
        ..Yk1File::default()
    };
    file.set_mesh_matrix_lists(&[vec![0, 1]]).unwrap();
    file
}

fn sample_kenzan(endian: Endian) -> KenzanFile {
    KenzanFile {
        file_endian: endian,
        vertex_endian_check: if endian.is_big() { 1 } else { 0 },
        version: Version::new(2, 0),
        name: ChecksumStr::new("kenzan_sample"),
        node_arr: vec![node(0, NodeType::UnskinnedMesh, NodeStackOp::None)],
        obj_arr: vec![kenzan::Object {
            bbox: kenzan::Bounds {
                center: Vec3::ZERO,
                sphere_radius: 2.0,
                aabb_extents: Vec3::ONE,
                padding: 0.0,
                rotation: Quat::from_xyzw(0.0, 0.0, 0.5, 0.75),
            },
            ..kenzan::Object::default()
        }],
        mesh_arr: vec![kenzan::Mesh {
            vertex_count: 4,
            triangle_list_indices: IndexRange { start: 0, count: 6 },
            min_index: 2,
            ..kenzan::Mesh::default()
        }],
        attribute_arr: vec![attribute()],
        material_arr: vec![kenzan::Material { power: 4.0, diffuse: Vec3::ONE, opacity: 1.0, ..kenzan::Material::default() }],
        matrix_arr: vec![Mat4::IDENTITY],
        vertex_buffer_arr: vec![kenzan::VertexBufferLayout {
            vertex_count: 4,
            bytes_per_vertex: 8,
            vertex_data_length: 32,
            ..kenzan::VertexBufferLayout::default()
        }],
        vertex_data: vec![0xAB; 32],
        texture_arr: names("tex", 1),
        shader_arr: names("sd_o1dzt", 1),
        node_name_arr: names("mesh", 1),
        index_data: vec![0, 1, 2, 2, 1, 3],
        overall_bounds: kenzan::Bounds { sphere_radius: 2.0, rotation: Quat::IDENTITY, ..kenzan::Bounds::default() },
        ..KenzanFile::default()
    }
}

#[test]
fn test_yk1_round_trip_both_endians() {
    for endian in [Endian::Big, Endian::Little] {
        let file = GmdFile::Yk1(sample_yk1(endian));
        let bytes = encode(&file).unwrap();

        let info = sniff(&bytes).unwrap();
        assert_eq!(info.endian, endian);
        assert_eq!(info.file_size as usize, bytes.len());
        assert_eq!(info.family(), Some("yk1"));

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, file);
        assert_eq!(encode(&decoded).unwrap(), bytes);
    }
}

#[test]
fn test_kenzan_round_trip() {
    for endian in [Endian::Big, Endian::Little] {
        let file = GmdFile::Kenzan(sample_kenzan(endian));
        let bytes = encode(&file).unwrap();
        assert_eq!(&bytes[0..4], b"GSGM");
        assert_eq!(bytes[5], u8::from(endian.is_big()));

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.family(), "kenzan");
        assert_eq!(decoded, file);
        assert_eq!(encode(&decoded).unwrap(), bytes);
    }
}

#[test]
fn test_regions_are_contiguous_after_header() {
    let file = sample_yk1(Endian::Big);
    let bytes = encode(&GmdFile::Yk1(file.clone())).unwrap();
    let header: GmdHeader<Yk1> = yk1::FILE.decode_header(&bytes, Endian::Big, Strictness::Strict).unwrap();

    assert_eq!(header.node_arr.offset, 240);
    assert_eq!(header.node_arr.count, 2);
    assert_eq!(header.obj_arr.offset, 240 + 2 * 128);
    assert_eq!(header.mesh_arr.offset, header.obj_arr.offset + 48);
    assert_eq!(header.vertex_data.size, 36);
    assert_eq!(header.unk14.offset + 128, header.base.file_size);
    assert_eq!(header.base.file_size as usize, bytes.len());
}

#[test]
fn test_two_pass_single_element() {
    let file = Yk1File { node_arr: vec![Node::default()], ..Yk1File::default() };
    let bytes = encode(&GmdFile::Yk1(file)).unwrap();
    let header = yk1::FILE.decode_header(&bytes, Endian::Little, Strictness::Strict).unwrap();
    let header_size = yk1::FILE.header_size() as u32;

    assert_eq!(header.node_arr.offset, header_size);
    assert_eq!(header.node_arr.count, 1);
    assert_eq!(header.base.file_size, header_size + 128);

    let file = Yk1File { unk13: vec![0xFEED], ..Yk1File::default() };
    let bytes = encode(&GmdFile::Yk1(file)).unwrap();
    let header = yk1::FILE.decode_header(&bytes, Endian::Little, Strictness::Strict).unwrap();
    assert_eq!(header.unk13.offset, header_size);
    assert_eq!(header.unk13.count, 1);
    assert_eq!(header.base.file_size, header_size + 4);
}

#[test]
fn test_reversed_magic_rejected() {
    let mut bytes = encode(&GmdFile::Yk1(sample_yk1(Endian::Big))).unwrap();
    bytes[0..4].copy_from_slice(b"MGSG");
    assert!(matches!(decode(&bytes), Err(Error::Validator { .. })));
}

#[test]
fn test_nonzero_mesh_padding_strict_and_lenient() {
    let mut file = sample_yk1(Endian::Little);
    let mut bytes = encode(&GmdFile::Yk1(file.clone())).unwrap();
    let header = yk1::FILE.decode_header(&bytes, Endian::Little, Strictness::Strict).unwrap();
    let padding = header.mesh_arr.offset as usize + 60;
    bytes[padding..padding + 4].copy_from_slice(&5u32.to_le_bytes());

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::Validator { op: Operation::Decode, .. }));
    assert_eq!(err.path().unwrap().to_string(), "mesh_arr[0]");

    file.mesh_arr[0].padding = 5;
    let lenient = decode_with(&bytes, DecodeOptions::lenient()).unwrap();
    assert_eq!(lenient, GmdFile::Yk1(file.clone()));

    // A lenient decode does not make the record writable
    let err = encode(&lenient).unwrap_err();
    assert!(matches!(err, Error::Validator { op: Operation::Encode, .. }));
    assert_eq!(err.path().unwrap().to_string(), "mesh_arr[0]");
}

#[test]
fn test_encode_rejects_what_decode_would_reject() {
    let mut file = sample_yk1(Endian::Big);
    file.mesh_arr[0].padding = 5;
    let err = encode(&GmdFile::Yk1(file)).unwrap_err();
    assert!(matches!(err, Error::Validator { op: Operation::Encode, ref message, .. } if message.contains("padding")));

    let mut file = sample_yk1(Endian::Big);
    file.texture_arr[0].text = "tex_renamed".to_string();
    let err = encode(&GmdFile::Yk1(file)).unwrap_err();
    assert!(matches!(err, Error::Validator { op: Operation::Encode, .. }));
    assert_eq!(err.path().unwrap().to_string(), "texture_arr[0]");

    let mut file = sample_kenzan(Endian::Little);
    file.name.text = "renamed".to_string();
    let err = encode(&GmdFile::Kenzan(file)).unwrap_err();
    assert!(matches!(err, Error::Validator { op: Operation::Encode, .. }));
    assert_eq!(err.path().unwrap().to_string(), "name");

    let file = Yk1File { magic: "ABCD".to_string(), ..sample_yk1(Endian::Little) };
    let err = encode(&GmdFile::Yk1(file)).unwrap_err();
    assert!(matches!(err, Error::Validator { op: Operation::Encode, ref message, .. } if message.contains("magic")));
}

#[test]
fn test_every_supported_major_round_trips() {
    for endian in [Endian::Big, Endian::Little] {
        let files = [
            GmdFile::Kenzan(KenzanFile { version: Version::new(1, 3), ..sample_kenzan(endian) }),
            GmdFile::Kenzan(KenzanFile { version: Version::new(2, 0), ..sample_kenzan(endian) }),
            GmdFile::Yk1(Yk1File { version: Version::new(3, 2), ..sample_yk1(endian) }),
            GmdFile::Yk1(Yk1File { version: Version::new(4, 1), ..sample_yk1(endian) }),
        ];
        for file in files {
            let bytes = encode(&file).unwrap();
            let info = sniff(&bytes).unwrap();
            assert_eq!(info.version, file.version());
            assert_eq!(info.family(), Some(file.family()));

            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded.family(), file.family());
            assert_eq!(decoded, file);
            assert_eq!(encode(&decoded).unwrap(), bytes);
        }
    }
}

#[test]
fn test_node_error_path_on_encode() {
    let mut file = sample_yk1(Endian::Big);
    file.texture_arr[1].text = "x".repeat(31);
    let err = encode(&GmdFile::Yk1(file)).unwrap_err();
    assert!(matches!(err, Error::Length { op: Operation::Encode, expected: 30, actual: 31, .. }));
    assert_eq!(err.path().unwrap().to_string(), "texture_arr[1].text");
}

#[test]
fn test_truncated_file() {
    let bytes = encode(&GmdFile::Yk1(sample_yk1(Endian::Big))).unwrap();
    let truncated = &bytes[..bytes.len() - 10];
    assert!(decode(truncated).is_err());

    let err = decode_with(truncated, DecodeOptions::lenient()).unwrap_err();
    assert!(matches!(err, Error::Offset { op: Operation::Decode, .. }));
}

#[test]
fn test_matrix_lists() {
    let mut file = sample_yk1(Endian::Big);
    assert!(!file.uses_int16_matrix_lists());
    assert_eq!(file.mesh_matrix_lists().unwrap(), vec![vec![0, 1]]);
    assert_eq!(file.mesh_matrix_bytestrings, vec![2, 0, 1]);

    file.set_int16_matrix_lists(true);
    assert_eq!(file.flags[5], 1 << 31);
    file.set_mesh_matrix_lists(&[vec![0, 300]]).unwrap();
    assert_eq!(file.mesh_matrix_bytestrings, vec![0, 2, 0, 0, 1, 44]);
    assert_eq!((file.mesh_arr[0].matrixlist_offset, file.mesh_arr[0].matrixlist_length), (0, 2));

    let decoded = decode(&encode(&GmdFile::Yk1(file)).unwrap()).unwrap();
    assert!(decoded.uses_int16_matrix_lists());
    assert_eq!(decoded.mesh_matrix_lists().unwrap(), vec![vec![0, 300]]);
}

#[test]
fn test_narrow_matrix_list_rejects_wide_index() {
    let mut file = sample_yk1(Endian::Little);
    let err = file.set_mesh_matrix_lists(&[vec![256]]).unwrap_err();
    assert!(matches!(err, Error::Range { .. }));
}

#[test]
fn test_unknown_version_on_decode() {
    let mut file = sample_kenzan(Endian::Big);
    file.version = Version::new(1, 5);
    let mut bytes = encode(&GmdFile::Kenzan(file)).unwrap();
    // Patch the major to an unsupported value
    bytes[8..10].copy_from_slice(&7u16.to_be_bytes());

    assert_eq!(sniff(&bytes).unwrap().version, Version::new(7, 5));
    assert!(matches!(decode(&bytes), Err(Error::UnknownVersion { major: 7, minor: 5, .. })));
}

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use pretty_assertions::assert_eq;
    use gmdkit::cli::commands::{inspect, roundtrip};
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_command_writes_identical_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("sample.gmd");
        let output = dir.path().join("rebuilt.gmd");
        let bytes = encode(&GmdFile::Kenzan(sample_kenzan(Endian::Big))).unwrap();
        std::fs::write(&input, &bytes).unwrap();

        roundtrip::execute(&input, Some(&output), false).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), bytes);
        assert!(roundtrip::roundtrip_bytes(&bytes, DecodeOptions::default()).unwrap().identical());
    }

    #[test]
    fn test_roundtrip_reports_trailing_bytes() {
        let mut bytes = encode(&GmdFile::Yk1(sample_yk1(Endian::Little))).unwrap();
        let original_len = bytes.len();
        bytes.push(0);

        assert!(roundtrip::roundtrip_bytes(&bytes, DecodeOptions::default()).is_err());

        let report = roundtrip::roundtrip_bytes(&bytes, DecodeOptions::lenient()).unwrap();
        assert!(!report.identical());
        assert_eq!(report.first_difference, Some(original_len));
    }

    #[test]
    fn test_inspect_json() {
        let bytes = encode(&GmdFile::Yk1(sample_yk1(Endian::Big))).unwrap();
        let inspection = inspect::inspect_bytes(&bytes, DecodeOptions::default()).unwrap();
        let json = serde_json::to_value(&inspection).unwrap();

        assert_eq!(json["family"], "yk1");
        assert_eq!(json["version"], "3.2");
        assert_eq!(json["big_endian"], true);
        assert_eq!(json["regions"][0]["name"], "node_arr");
        assert_eq!(json["regions"][0]["count"], 2);
    }
}
