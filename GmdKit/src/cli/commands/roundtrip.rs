//! CLI command for the byte-identical round-trip self-check

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use crate::codec::DecodeOptions;
use crate::formats::gmd;

/// Outcome of re-encoding a decoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundtripReport {
    pub encoded: Vec<u8>,
    /// First offset where the re-encoded bytes differ, or the shorter length.
    pub first_difference: Option<usize>,
}

impl RoundtripReport {
    pub fn identical(&self) -> bool {
        self.first_difference.is_none()
    }
}

/// Decode `bytes`, encode the result and compare.
pub fn roundtrip_bytes(bytes: &[u8], options: DecodeOptions) -> crate::Result<RoundtripReport> {
    let file = gmd::decode_with(bytes, options)?;
    let encoded = gmd::encode(&file)?;
    let first_difference = bytes
        .iter()
        .zip(&encoded)
        .position(|(a, b)| a != b)
        .or_else(|| (bytes.len() != encoded.len()).then(|| bytes.len().min(encoded.len())));
    Ok(RoundtripReport { encoded, first_difference })
}

pub fn execute(input: &Path, output: Option<&Path>, lenient: bool) -> anyhow::Result<ExitCode> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let report = roundtrip_bytes(&bytes, super::decode_options(lenient))
        .with_context(|| format!("round-tripping {}", input.display()))?;

    if let Some(output) = output {
        std::fs::write(output, &report.encoded).with_context(|| format!("writing {}", output.display()))?;
        println!("Written to: {}", output.display());
    }

    match report.first_difference {
        None => {
            println!("{}: identical ({} bytes)", input.display(), bytes.len());
            Ok(ExitCode::SUCCESS)
        }
        Some(offset) => {
            println!(
                "{}: differs at offset {offset:#x} (input {} bytes, output {} bytes)",
                input.display(),
                bytes.len(),
                report.encoded.len()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
