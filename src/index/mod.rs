//! Search index client subsystem
//!
//! The catalog talks to its backend only through [`IndexClient`].
//! [`MemoryIndex`] is the in-process implementation used by the command
//! line tool and the tests.
//!
//! # Invariants
//!
//! - Documents are unique by `id_txt`; adding an existing key replaces it
//! - A committed batch becomes visible all at once
//! - Result order is deterministic: sort clauses, then unique key

mod client;
mod errors;
mod eval;
mod memory;

pub use client::{IndexClient, QueryResponse, ScoredDocument};
pub use errors::{IndexError, IndexResult};
pub use memory::MemoryIndex;
