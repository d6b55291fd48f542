//! Command-line front end
//!
//! Provides:
//! - ingest: create records from JSON
//! - query: search with a JSON filter
//! - update / delete: match-by-attribute replacement and removal
//! - fields: list the resolved schema
//! - ping: backend availability

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Order};
pub use commands::{execute, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{filter_from_json, metacard_from_json, metacard_to_json, write_error, write_response};
