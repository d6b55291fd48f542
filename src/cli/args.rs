//! CLI argument definitions using clap
//!
//! Commands:
//! - metacat ingest [--file <path>]
//! - metacat query [--filter <json>] [--sort <property>] [--order asc|desc]
//! - metacat update --attribute <name> [--file <path>]
//! - metacat delete --attribute <name> <value>...
//! - metacat fields
//! - metacat ping

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::query::SortOrder;

/// metacat - schema-resolving metadata catalog over a search index
#[derive(Parser, Debug)]
#[command(name = "metacat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./metacat.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create records from a JSON object or array
    Ingest {
        /// Read records from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Search the catalog
    Query {
        /// JSON filter expression; matches everything when omitted
        #[arg(long)]
        filter: Option<String>,

        /// Sort property, or RELEVANCE, DISTANCE, TEMPORAL
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, value_enum, default_value_t = Order::Desc)]
        order: Order,

        /// 1-based index of the first result
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        start: i64,

        /// Results per page; zero or less returns everything
        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,

        /// Format hint as name=FORMAT, repeatable
        #[arg(long = "hint")]
        hints: Vec<String>,
    },

    /// Replace records matched by an attribute value
    Update {
        /// Attribute used to locate stored records
        #[arg(long)]
        attribute: String,

        /// Read [{"match": ..., "metacard": {...}}] from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete records matched by attribute values
    Delete {
        /// Attribute used to locate stored records
        #[arg(long)]
        attribute: String,

        /// Values to match
        values: Vec<String>,
    },

    /// List every known attribute and the formats it is indexed under
    Fields,

    /// Check that the index is available
    Ping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Ascending,
            Order::Desc => SortOrder::Descending,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
