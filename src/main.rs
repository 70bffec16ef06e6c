//! scribe CLI entry point.
//!
//! main only parses arguments, dispatches, and maps the error kind to
//! the process exit code: 0 ok, 1 validation failure, 2 and above for
//! everything else. Errors are reported on stderr through their
//! `Display`; structured log events are reserved for `--verbose` runs
//! and emitted by the commands themselves.

use std::process;

use scribe::cli::{run_command, Cli};

fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = run_command(cli.command) {
        eprintln!("{}: {}", e.code(), e);
        process::exit(e.exit_code());
    }
}
