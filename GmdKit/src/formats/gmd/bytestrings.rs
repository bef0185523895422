//! Matrix bytestrings
//!
//! A skinned mesh names the bones that influence it through a bone-index list
//! stored in the `mesh_matrix_bytestrings` region. Each list is a count
//! followed by that many indices, all 8-bit, or all 16-bit when the file's
//! int16 flag is set.

use crate::codec::{Codec, Endian, Primitive, Reader, Writer};
use crate::error::{Error, Operation, PathSegment, Result};

const NARROW: Primitive<u8> = Primitive::new();
const WIDE: Primitive<u16> = Primitive::new();
/// Bone indices that fit an 8-bit list.
const NARROW_INDEX: Primitive<u16> = Primitive::bounded(0, u8::MAX as u16);

fn read_entry(reader: &mut Reader<'_>, wide: bool) -> Result<u16> {
    if wide {
        WIDE.read(reader)
    } else {
        NARROW.read(reader).map(u16::from)
    }
}

fn write_entry(writer: &mut Writer, value: u16, wide: bool) -> Result<()> {
    if wide {
        WIDE.write(writer, &value)
    } else {
        NARROW_INDEX.validate(&value)?;
        NARROW.write(writer, &(value as u8))
    }
}

/// Read the list starting at `offset`.
pub fn read_list(bytes: &[u8], offset: usize, endian: Endian, wide: bool) -> Result<Vec<u16>> {
    let mut reader = Reader::new(bytes, endian);
    reader.seek(offset)?;
    let count = read_entry(&mut reader, wide)?;
    (0..usize::from(count))
        .map(|index| {
            reader
                .scoped(PathSegment::Index(index), |r| read_entry(r, wide))
                .map_err(|e| e.at_index(index))
        })
        .collect()
}

/// Append one list to `writer`.
pub fn write_list(writer: &mut Writer, list: &[u16], wide: bool) -> Result<()> {
    let count = u16::try_from(list.len()).map_err(|_| Error::range(Operation::Encode, list.len(), 0, u16::MAX))?;
    write_entry(writer, count, wide)?;
    for (index, &value) in list.iter().enumerate() {
        write_entry(writer, value, wide).map_err(|e| e.at_index(index))?;
    }
    Ok(())
}

/// Pack `lists` back to back, returning the region and each list's
/// `(offset, count)`. Empty lists take no space and are located at `(0, 0)`.
pub fn pack_lists(lists: &[Vec<u16>], endian: Endian, wide: bool) -> Result<(Vec<u8>, Vec<(u32, u32)>)> {
    let mut writer = Writer::new(endian);
    let mut locations = Vec::with_capacity(lists.len());
    for (index, list) in lists.iter().enumerate() {
        if list.is_empty() {
            locations.push((0, 0));
            continue;
        }
        let offset = u32::try_from(writer.len()).map_err(|_| Error::encoding("bytestring region exceeds 4 GiB"))?;
        write_list(&mut writer, list, wide).map_err(|e| e.at_index(index))?;
        // write_list already bounded the length to u16
        locations.push((offset, list.len() as u32));
    }
    Ok((writer.into_bytes(), locations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_narrow_lists() {
        let lists = vec![vec![1, 2, 3], vec![], vec![200]];
        let (bytes, locations) = pack_lists(&lists, Endian::Little, false).unwrap();
        assert_eq!(bytes, vec![3, 1, 2, 3, 1, 200]);
        assert_eq!(locations, vec![(0, 3), (0, 0), (4, 1)]);
        assert_eq!(read_list(&bytes, 4, Endian::Little, false).unwrap(), vec![200]);
    }

    #[test]
    fn test_wide_lists_follow_endianness() {
        let lists = vec![vec![0x0102, 300]];
        let (big, _) = pack_lists(&lists, Endian::Big, true).unwrap();
        assert_eq!(big, vec![0, 2, 1, 2, 1, 44]);
        let (little, _) = pack_lists(&lists, Endian::Little, true).unwrap();
        assert_eq!(little, vec![2, 0, 2, 1, 44, 1]);
        assert_eq!(read_list(&big, 0, Endian::Big, true).unwrap(), lists[0]);
    }

    #[test]
    fn test_narrow_index_out_of_range() {
        let err = pack_lists(&[vec![1], vec![5, 256]], Endian::Big, false).unwrap_err();
        match &err {
            Error::Range { op: Operation::Encode, value, lo, hi, .. } => {
                assert_eq!((value.as_str(), lo.as_str(), hi.as_str()), ("256", "0", "255"));
            }
            other => panic!("expected a range error, got {other:?}"),
        }
        assert_eq!(err.path().unwrap().to_string(), "[1][1]");
    }

    #[test]
    fn test_truncated_list() {
        let err = read_list(&[4, 1, 2], 0, Endian::Big, false).unwrap_err();
        assert!(matches!(err, Error::Offset { .. }));
        assert_eq!(err.path().unwrap().to_string(), "[2]");
    }
}
