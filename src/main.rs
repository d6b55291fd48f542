//! metacat CLI entry point
//!
//! Parses arguments and delegates to the CLI module. Errors have already
//! been written to stdout as a JSON envelope; the process exits non-zero.

use metacat::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
