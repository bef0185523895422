//! CLI command for reading the base header only

use std::path::Path;

use anyhow::Context;

use crate::formats::gmd;

pub fn execute(input: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let info = gmd::sniff(&bytes)?;

    println!("Version:  {}", info.version);
    println!("Family:   {}", info.family().unwrap_or("unsupported"));
    println!("Endian:   {:?}", info.endian);
    println!("Vertices: {}", if info.vertices_big_endian { "big-endian" } else { "little-endian" });
    println!("Name:     {}", info.name);
    Ok(())
}
