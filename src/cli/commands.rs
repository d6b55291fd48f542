//! CLI command implementations
//!
//! Every command:
//! 1. Loads configuration and installs the tracing subscriber
//! 2. Opens the index snapshot named by `index_path`
//! 3. Runs one catalog operation
//! 4. Saves the snapshot if the operation wrote anything
//! 5. Writes one JSON response to stdout

use std::path::Path;

use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{
    filter_from_json, metacard_from_json, metacard_to_json, metacards_from_json, read_input,
    source_response_to_json, write_error, write_response,
};
use crate::catalog::{CatalogProvider, DeleteRequest, UpdateRequest};
use crate::config::CatalogConfig;
use crate::index::{IndexClient, MemoryIndex};
use crate::query::{Filter, QueryRequest, SortBy};
use crate::record::{AttributeFormat, AttributeValue};

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = run_command(cli);
    if let Err(e) = &result {
        write_error(e.code(), &e.to_string())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = CatalogConfig::load(&cli.config)?;
    init_tracing(&config.log_level);

    let index_path = config
        .index_path
        .clone()
        .ok_or_else(|| CliError::input("config has no index_path"))?;
    let index = MemoryIndex::open(&index_path)?;
    debug!(path = %index_path.display(), documents = index.len(), "opened index snapshot");

    let provider = CatalogProvider::new(index, config);
    let (data, mutated) = execute(&provider, cli.command)?;

    if mutated {
        provider.client().save_snapshot(&index_path)?;
    }

    write_response(data)
}

/// Installs a stderr subscriber. RUST_LOG wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs one command, returning its response data and whether it wrote.
pub fn execute<C: IndexClient>(provider: &CatalogProvider<C>, command: Command) -> CliResult<(Value, bool)> {
    match command {
        Command::Ingest { file } => ingest(provider, file.as_deref()).map(|data| (data, true)),
        Command::Query {
            filter,
            sort,
            order,
            start,
            page_size,
            hints,
        } => {
            let filter = match filter {
                Some(text) => filter_from_json(&serde_json::from_str(&text)?)?,
                None => Filter::Include,
            };
            let mut request = QueryRequest::new(filter)
                .with_start_index(start)
                .with_page_size(page_size.unwrap_or(provider.config().default_page_size));
            if let Some(property) = sort {
                request = request.with_sort(SortBy::new(property, order.into()));
            }
            for hint in &hints {
                let (property, format) = parse_hint(hint)?;
                request = request.with_type_hint(property, format);
            }

            let response = provider.query(&request)?;
            Ok((source_response_to_json(&response), false))
        }
        Command::Update { attribute, file } => update(provider, attribute, file.as_deref()).map(|data| (data, true)),
        Command::Delete { attribute, values } => {
            let request = DeleteRequest::new(attribute, values.into_iter().map(AttributeValue::String));
            let response = provider.delete(request)?;
            let deleted: Vec<Value> = response.deleted.iter().map(metacard_to_json).collect();
            Ok((json!({ "deleted": deleted }), true))
        }
        Command::Fields => {
            let fields: serde_json::Map<String, Value> = provider
                .resolver()
                .known_attributes()
                .into_iter()
                .map(|(name, formats)| {
                    let formats: Vec<&str> = formats.iter().map(AttributeFormat::as_str).collect();
                    (name, json!(formats))
                })
                .collect();
            Ok((Value::Object(fields), false))
        }
        Command::Ping => Ok((json!({ "available": provider.is_available() }), false)),
    }
}

fn ingest<C: IndexClient>(provider: &CatalogProvider<C>, file: Option<&Path>) -> CliResult<Value> {
    let input = read_input(file)?;
    let metacards = metacards_from_json(&input, provider.resolver())?;
    let response = provider.create(metacards)?;
    let created: Vec<Value> = response.created.iter().map(metacard_to_json).collect();
    Ok(json!({ "created": created }))
}

/// Input is `[{"match": <value>, "metacard": {...}}, ...]`.
fn update<C: IndexClient>(provider: &CatalogProvider<C>, attribute: String, file: Option<&Path>) -> CliResult<Value> {
    let input = read_input(file)?;
    let entries = input
        .as_array()
        .ok_or_else(|| CliError::input("update input must be an array"))?;

    let format = provider.resolver().declared_format(&attribute);
    let mut request = UpdateRequest::new(attribute);
    for entry in entries {
        let key = entry
            .get("match")
            .ok_or_else(|| CliError::input("update entry needs 'match'"))?;
        let key = AttributeValue::from_json(key, format).map_err(|e| CliError::input(e.to_string()))?;
        let metacard = entry
            .get("metacard")
            .ok_or_else(|| CliError::input("update entry needs 'metacard'"))?;
        request = request.with_update(key, metacard_from_json(metacard, provider.resolver())?);
    }

    let response = provider.update(request)?;
    let updates: Vec<Value> = response
        .updates
        .iter()
        .map(|u| json!({ "old": metacard_to_json(&u.old), "new": metacard_to_json(&u.new) }))
        .collect();
    Ok(json!({ "updated": updates }))
}

/// Parses `name=FORMAT`.
fn parse_hint(hint: &str) -> CliResult<(String, AttributeFormat)> {
    let (property, format) = hint
        .split_once('=')
        .ok_or_else(|| CliError::input(format!("hint '{}' is not name=FORMAT", hint)))?;
    let format = format.trim().parse::<AttributeFormat>().map_err(CliError::Input)?;
    Ok((property.trim().to_string(), format))
}
