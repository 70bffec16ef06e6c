//! CLI argument definitions using clap.
//!
//! Commands:
//! - scribe validate --schema <file> <data>
//! - scribe convert <in> <out> [--schema <file>]
//! - scribe codegen --schema <file>
//! - scribe guess-schema <data> [<schema-out>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scribe - schema-governed data exchange for scientific payloads
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a data file (json/h5) against a schema
    Validate {
        /// Schema file
        #[arg(long)]
        schema: PathBuf,

        /// Data file to validate
        data: PathBuf,

        /// Log progress events
        #[arg(long, short)]
        verbose: bool,
    },

    /// Convert a data file from one format to another
    Convert {
        /// Input data file
        input: PathBuf,

        /// Output data file; format inferred from the suffix
        output: PathBuf,

        /// Schema file; defaults to the `any` schema
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Generate Rust record types from a schema
    Codegen {
        /// Schema file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Guess a schema from a data file
    GuessSchema {
        /// Data file to inspect
        data: PathBuf,

        /// Where to write the guessed schema; stdout when absent
        schema_out: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
