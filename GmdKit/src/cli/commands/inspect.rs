//! CLI command for summarising a decoded GMD file

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::codec::DecodeOptions;
use crate::formats::gmd;

#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub name: &'static str,
    pub count: usize,
}

/// Header facts and table sizes of one file.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub family: &'static str,
    pub version: String,
    pub big_endian: bool,
    pub vertices_big_endian: bool,
    pub int16_matrix_lists: bool,
    pub name: String,
    pub file_size: usize,
    pub regions: Vec<RegionSummary>,
}

pub fn inspect_bytes(bytes: &[u8], options: DecodeOptions) -> crate::Result<Inspection> {
    let file = gmd::decode_with(bytes, options)?;
    Ok(Inspection {
        family: file.family(),
        version: file.version().to_string(),
        big_endian: file.endian().is_big(),
        vertices_big_endian: file.vertices_big_endian(),
        int16_matrix_lists: file.uses_int16_matrix_lists(),
        name: file.name().to_string(),
        file_size: bytes.len(),
        regions: file
            .region_sizes()
            .into_iter()
            .map(|(name, count)| RegionSummary { name, count })
            .collect(),
    })
}

pub fn execute(input: &Path, json: bool, lenient: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let inspection = inspect_bytes(&bytes, super::decode_options(lenient))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    println!("GMD File Information");
    println!("====================");
    println!("Name:        {}", inspection.name);
    println!("Version:     {} ({})", inspection.version, inspection.family);
    println!("Byte order:  {}", if inspection.big_endian { "big-endian" } else { "little-endian" });
    println!("Vertices:    {}", if inspection.vertices_big_endian { "big-endian" } else { "little-endian" });
    println!("Bone lists:  {}-bit", if inspection.int16_matrix_lists { 16 } else { 8 });
    println!("File size:   {} bytes", inspection.file_size);
    println!();
    println!("Regions:");
    println!("--------");
    for region in &inspection.regions {
        println!("  {:24} {:>8}", region.name, region.count);
    }
    Ok(())
}
