use clap::Subcommand;
use std::path::PathBuf;
use std::process::ExitCode;

pub mod inspect;
pub mod roundtrip;
pub mod sniff;

#[derive(Subcommand)]
pub enum Commands {
    /// Decode and re-encode a GMD file, failing unless the bytes match
    Roundtrip {
        /// Source GMD file
        input: PathBuf,

        /// Write the re-encoded bytes here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Log validator failures instead of rejecting the file
        #[arg(long)]
        lenient: bool,
    },

    /// Show the header and table sizes of a GMD file
    Inspect {
        /// Source GMD file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Log validator failures instead of rejecting the file
        #[arg(long)]
        lenient: bool,
    },

    /// Show the version and byte order of a GMD file
    Sniff {
        /// Source GMD file
        input: PathBuf,
    },
}

impl Commands {
    pub fn execute(self) -> anyhow::Result<ExitCode> {
        match self {
            Commands::Roundtrip { input, output, lenient } => {
                roundtrip::execute(&input, output.as_deref(), lenient)
            }
            Commands::Inspect { input, json, lenient } => {
                inspect::execute(&input, json, lenient)?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Sniff { input } => {
                sniff::execute(&input)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Decode options for the `--lenient` flag.
fn decode_options(lenient: bool) -> crate::codec::DecodeOptions {
    if lenient {
        crate::codec::DecodeOptions::lenient()
    } else {
        crate::codec::DecodeOptions::default()
    }
}
