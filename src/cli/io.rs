//! JSON I/O handling for CLI
//!
//! - Input: a JSON document from a file or stdin
//! - Output: a single JSON object on stdout
//! - Records are flat objects keyed by attribute name; arrays hold
//!   multi-valued attributes

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use serde_json::{json, Map, Value};

use super::errors::{CliError, CliResult};
use crate::catalog::{SearchResult, SourceResponse};
use crate::query::{CompareOp, Filter, SpatialOp, TemporalOp};
use crate::record::{AttributeFormat, AttributeValue, Metacard, MetacardType};
use crate::schema::SchemaResolver;

/// Key naming the record's type: a registered type name or a full type object.
pub const TYPE_KEY: &str = "metacard-type";
/// Key carrying the record's source attribution.
pub const SOURCE_KEY: &str = "source-id";

/// Read a JSON document from `file`, or from stdin when `None`
pub fn read_input(file: Option<&Path>) -> CliResult<Value> {
    let content = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };

    if content.trim().is_empty() {
        return Err(CliError::input("empty input"));
    }
    Ok(serde_json::from_str(&content)?)
}

/// Decodes one record.
///
/// Attribute formats come from the record's type, then from whatever the
/// resolver has already seen. Undeclared attributes keep their JSON type.
pub fn metacard_from_json(value: &Value, resolver: &SchemaResolver) -> CliResult<Metacard> {
    let object = value
        .as_object()
        .ok_or_else(|| CliError::input("a record must be a JSON object"))?;

    let metacard_type = match object.get(TYPE_KEY) {
        None => resolver
            .metacard_type(MetacardType::BASIC)
            .unwrap_or_else(|| Arc::new(MetacardType::basic())),
        Some(Value::String(name)) => resolver
            .metacard_type(name)
            .ok_or_else(|| CliError::input(format!("unknown metacard type '{}'", name)))?,
        Some(declared) => {
            let declared: MetacardType = serde_json::from_value(declared.clone())?;
            resolver.add_metacard_type(declared)
        }
    };

    let mut card = Metacard::new(Arc::clone(&metacard_type));
    for (name, raw) in object {
        if name == TYPE_KEY {
            continue;
        }
        if name == SOURCE_KEY {
            let source = raw
                .as_str()
                .ok_or_else(|| CliError::input("source-id must be a string"))?;
            card.set_source_id(source);
            continue;
        }

        let format = metacard_type
            .descriptor(name)
            .map(|d| d.format)
            .or_else(|| resolver.declared_format(name));
        let values = match raw {
            Value::Null => continue,
            Value::Array(items) if format != Some(AttributeFormat::Object) => items
                .iter()
                .map(|item| decode_value(name, item, format))
                .collect::<CliResult<Vec<_>>>()?,
            single => vec![decode_value(name, single, format)?],
        };
        card.set_values(name, values);
    }
    Ok(card)
}

fn decode_value(name: &str, raw: &Value, format: Option<AttributeFormat>) -> CliResult<AttributeValue> {
    AttributeValue::from_json(raw, format).map_err(|e| CliError::input(format!("attribute '{}': {}", name, e)))
}

/// Decodes a single record or an array of records.
pub fn metacards_from_json(value: &Value, resolver: &SchemaResolver) -> CliResult<Vec<Metacard>> {
    match value {
        Value::Array(items) => items.iter().map(|item| metacard_from_json(item, resolver)).collect(),
        single => Ok(vec![metacard_from_json(single, resolver)?]),
    }
}

pub fn metacard_to_json(card: &Metacard) -> Value {
    let mut object = Map::new();
    object.insert(TYPE_KEY.to_string(), json!(card.metacard_type().name));
    if let Some(source) = card.source_id() {
        object.insert(SOURCE_KEY.to_string(), json!(source));
    }
    for attribute in card.attributes() {
        let value = match attribute.values.as_slice() {
            [single] => single.to_json(),
            many => Value::Array(many.iter().map(AttributeValue::to_json).collect()),
        };
        object.insert(attribute.name.clone(), value);
    }
    Value::Object(object)
}

pub fn search_result_to_json(result: &SearchResult) -> Value {
    json!({
        "metacard": metacard_to_json(&result.metacard),
        "relevance": result.relevance_score,
        "distance": result.distance_in_meters,
    })
}

pub fn source_response_to_json(response: &SourceResponse) -> Value {
    json!({
        "hits": response.hits,
        "results": response.results.iter().map(search_result_to_json).collect::<Vec<_>>(),
        "warnings": response.processing_details,
    })
}

/// Decodes a filter expression.
///
/// Shapes:
/// - `"include"` / `"exclude"`
/// - `{"and": [..]}`, `{"or": [..]}`, `{"not": {..}}`, `{"ids": [..]}`
/// - `{"property": "title", "op": "like", "value": "Flag*"}`
///
/// Spatial ops take WKT as the value; `dwithin` and `beyond` also take
/// `distance` in meters. `between` and `during` take a two-element array.
/// `relative` takes a number of seconds.
pub fn filter_from_json(value: &Value) -> CliResult<Filter> {
    match value {
        Value::String(s) if s.eq_ignore_ascii_case("include") => Ok(Filter::Include),
        Value::String(s) if s.eq_ignore_ascii_case("exclude") => Ok(Filter::Exclude),
        Value::Object(object) => {
            if let Some(children) = object.get("and") {
                return Ok(Filter::and(filter_list(children)?));
            }
            if let Some(children) = object.get("or") {
                return Ok(Filter::or(filter_list(children)?));
            }
            if let Some(child) = object.get("not") {
                return Ok(Filter::not(filter_from_json(child)?));
            }
            if let Some(ids) = object.get("ids") {
                let ids = ids
                    .as_array()
                    .ok_or_else(|| CliError::input("'ids' must be an array"))?
                    .iter()
                    .map(|id| id.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| CliError::input("ids must be strings"))?;
                return Ok(Filter::Ids(ids));
            }
            leaf_filter(object)
        }
        other => Err(CliError::input(format!("unrecognized filter: {}", other))),
    }
}

fn filter_list(value: &Value) -> CliResult<Vec<Filter>> {
    value
        .as_array()
        .ok_or_else(|| CliError::input("logical operators take an array of filters"))?
        .iter()
        .map(filter_from_json)
        .collect()
}

fn leaf_filter(object: &Map<String, Value>) -> CliResult<Filter> {
    let property = object
        .get("property")
        .and_then(Value::as_str)
        .ok_or_else(|| CliError::input("filter needs a 'property'"))?;
    let op = object
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| CliError::input("filter needs an 'op'"))?
        .to_ascii_lowercase();
    let value = object.get("value").unwrap_or(&Value::Null);

    let compare = |op: CompareOp| -> CliResult<Filter> { Ok(Filter::compare(property, op, literal(value)?)) };

    match op.as_str() {
        "=" | "eq" => compare(CompareOp::Eq),
        "!=" | "ne" => compare(CompareOp::Ne),
        "<" | "lt" => compare(CompareOp::Lt),
        "<=" | "le" => compare(CompareOp::Le),
        ">" | "gt" => compare(CompareOp::Gt),
        ">=" | "ge" => compare(CompareOp::Ge),
        "between" => {
            let (lower, upper) = pair(value)?;
            Ok(Filter::between(property, literal(lower)?, literal(upper)?))
        }
        "like" => Ok(Filter::like(property, text(value, "pattern")?)),
        "ilike" => Ok(Filter::ilike(property, text(value, "pattern")?)),
        "is_null" | "isnull" => Ok(Filter::is_null(property)),
        "during" => {
            let (start, end) = pair(value)?;
            Ok(Filter::temporal(
                property,
                TemporalOp::During {
                    start: date(start)?,
                    end: date(end)?,
                },
            ))
        }
        "before" => Ok(Filter::temporal(property, TemporalOp::Before(date(value)?))),
        "after" => Ok(Filter::temporal(property, TemporalOp::After(date(value)?))),
        "relative" => {
            let seconds = value
                .as_i64()
                .ok_or_else(|| CliError::input("'relative' takes a number of seconds"))?;
            Ok(Filter::temporal(property, TemporalOp::Relative(Duration::seconds(seconds))))
        }
        "intersects" => spatial(property, SpatialOp::Intersects, value),
        "within" => spatial(property, SpatialOp::Within, value),
        "contains" => spatial(property, SpatialOp::Contains, value),
        "disjoint" => spatial(property, SpatialOp::Disjoint, value),
        "dwithin" => spatial(property, SpatialOp::DWithin { meters: meters(object)? }, value),
        "beyond" => spatial(property, SpatialOp::Beyond { meters: meters(object)? }, value),
        other => Err(CliError::input(format!("unknown filter op '{}'", other))),
    }
}

fn literal(value: &Value) -> CliResult<AttributeValue> {
    match value {
        Value::Null => Err(CliError::input("filter needs a 'value'")),
        other => AttributeValue::from_json(other, None).map_err(|e| CliError::input(e.to_string())),
    }
}

fn text<'a>(value: &'a Value, what: &str) -> CliResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| CliError::input(format!("{} must be a string", what)))
}

fn pair(value: &Value) -> CliResult<(&Value, &Value)> {
    match value.as_array().map(Vec::as_slice) {
        Some([first, second]) => Ok((first, second)),
        _ => Err(CliError::input("expected a two-element array")),
    }
}

fn date(value: &Value) -> CliResult<chrono::DateTime<chrono::Utc>> {
    AttributeValue::from_json(value, Some(AttributeFormat::Date))
        .ok()
        .and_then(|v| v.as_date())
        .ok_or_else(|| CliError::input(format!("not a date: {}", value)))
}

fn meters(object: &Map<String, Value>) -> CliResult<f64> {
    object
        .get("distance")
        .and_then(Value::as_f64)
        .ok_or_else(|| CliError::input("distance filters need 'distance' in meters"))
}

fn spatial(property: &str, op: SpatialOp, value: &Value) -> CliResult<Filter> {
    Ok(Filter::spatial(property, op, text(value, "WKT")?))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_envelope(&mut io::stdout(), &json!({ "status": "ok", "data": data }))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_envelope(
        &mut io::stdout(),
        &json!({
            "status": "error",
            "code": code,
            "message": message
        }),
    )
}

fn write_envelope<W: Write>(out: &mut W, envelope: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, envelope)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
