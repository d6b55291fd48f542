//! Typed attribute values and format coercion

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use super::format::AttributeFormat;
use crate::geo;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Xml(String),
    Date(DateTime<Utc>),
    Boolean(bool),
    Binary(Vec<u8>),
    /// Well-known text.
    Geometry(String),
    Object(Value),
    Integer(i32),
    Long(i64),
    Short(i16),
    Float(f32),
    Double(f64),
}

/// A value could not be represented in the requested format.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot coerce {value} to {format}: {reason}")]
pub struct CoercionError {
    pub value: String,
    pub format: AttributeFormat,
    pub reason: String,
}

impl CoercionError {
    fn new(value: &AttributeValue, format: AttributeFormat, reason: impl Into<String>) -> Self {
        let mut shown = value.to_string();
        if shown.len() > 64 {
            let mut cut = 64;
            while !shown.is_char_boundary(cut) {
                cut -= 1;
            }
            shown.truncate(cut);
            shown.push_str("...");
        }
        Self {
            value: shown,
            format,
            reason: reason.into(),
        }
    }
}

impl AttributeValue {
    /// The format this value carries without any declared descriptor.
    pub fn natural_format(&self) -> AttributeFormat {
        match self {
            AttributeValue::String(_) => AttributeFormat::String,
            AttributeValue::Xml(_) => AttributeFormat::Xml,
            AttributeValue::Date(_) => AttributeFormat::Date,
            AttributeValue::Boolean(_) => AttributeFormat::Boolean,
            AttributeValue::Binary(_) => AttributeFormat::Binary,
            AttributeValue::Geometry(_) => AttributeFormat::Geometry,
            AttributeValue::Object(_) => AttributeFormat::Object,
            AttributeValue::Integer(_) => AttributeFormat::Integer,
            AttributeValue::Long(_) => AttributeFormat::Long,
            AttributeValue::Short(_) => AttributeFormat::Short,
            AttributeValue::Float(_) => AttributeFormat::Float,
            AttributeValue::Double(_) => AttributeFormat::Double,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Xml(s) | AttributeValue::Geometry(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Integral view of numeric values, if lossless.
    fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(i64::from(*v)),
            AttributeValue::Long(v) => Some(*v),
            AttributeValue::Short(v) => Some(i64::from(*v)),
            AttributeValue::Float(v) => whole_i64(f64::from(*v)),
            AttributeValue::Double(v) => whole_i64(*v),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(v) => Some(f64::from(*v)),
            AttributeValue::Long(v) => Some(*v as f64),
            AttributeValue::Short(v) => Some(f64::from(*v)),
            AttributeValue::Float(v) => Some(f64::from(*v)),
            AttributeValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Converts this value into the canonical variant for `format`.
    ///
    /// Widening and lossless conversions succeed; anything that would
    /// change meaning (non-numeric text under a numeric format, malformed
    /// geometry, out-of-range integers) is an error.
    pub fn coerce(&self, format: AttributeFormat) -> Result<AttributeValue, CoercionError> {
        if self.natural_format() == format {
            if let AttributeValue::Geometry(wkt) = self {
                geo::parse_wkt(wkt).map_err(|e| CoercionError::new(self, format, e.to_string()))?;
            }
            return Ok(self.clone());
        }

        let fail = |reason: &str| CoercionError::new(self, format, reason);

        match format {
            AttributeFormat::String => match self {
                AttributeValue::Binary(_) => Err(fail("binary content has no text form")),
                other => Ok(AttributeValue::String(other.to_string())),
            },
            AttributeFormat::Xml => match self {
                AttributeValue::String(s) => Ok(AttributeValue::Xml(s.clone())),
                _ => Err(fail("only text can be stored as XML")),
            },
            AttributeFormat::Date => match self {
                AttributeValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                    .map(|d| AttributeValue::Date(d.with_timezone(&Utc)))
                    .map_err(|e| fail(&e.to_string())),
                AttributeValue::Long(millis) => Utc
                    .timestamp_millis_opt(*millis)
                    .single()
                    .map(AttributeValue::Date)
                    .ok_or_else(|| fail("epoch milliseconds out of range")),
                _ => Err(fail("not a timestamp")),
            },
            AttributeFormat::Boolean => match self {
                AttributeValue::String(s) if s.eq_ignore_ascii_case("true") => Ok(AttributeValue::Boolean(true)),
                AttributeValue::String(s) if s.eq_ignore_ascii_case("false") => Ok(AttributeValue::Boolean(false)),
                _ => Err(fail("not a boolean")),
            },
            AttributeFormat::Binary => Err(fail("only binary content can be stored as BINARY")),
            AttributeFormat::Geometry => match self {
                AttributeValue::String(wkt) => {
                    geo::parse_wkt(wkt).map_err(|e| fail(&e.to_string()))?;
                    Ok(AttributeValue::Geometry(wkt.clone()))
                }
                _ => Err(fail("geometry must be well-known text")),
            },
            AttributeFormat::Object => match self {
                AttributeValue::String(s) => Ok(AttributeValue::Object(
                    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone())),
                )),
                other => Ok(AttributeValue::Object(other.to_json())),
            },
            AttributeFormat::Integer => self
                .integral(format)?
                .try_into()
                .map(AttributeValue::Integer)
                .map_err(|_| fail("out of range for INTEGER")),
            AttributeFormat::Long => self.integral(format).map(AttributeValue::Long),
            AttributeFormat::Short => self
                .integral(format)?
                .try_into()
                .map(AttributeValue::Short)
                .map_err(|_| fail("out of range for SHORT")),
            AttributeFormat::Float => self.floating(format).map(|v| AttributeValue::Float(v as f32)),
            AttributeFormat::Double => self.floating(format).map(AttributeValue::Double),
        }
    }

    fn integral(&self, format: AttributeFormat) -> Result<i64, CoercionError> {
        if let AttributeValue::String(s) = self {
            return s
                .trim()
                .parse::<i64>()
                .map_err(|_| CoercionError::new(self, format, "not an integer"));
        }
        self.as_i64()
            .ok_or_else(|| CoercionError::new(self, format, "not an integral number"))
    }

    fn floating(&self, format: AttributeFormat) -> Result<f64, CoercionError> {
        if let AttributeValue::String(s) = self {
            return s
                .trim()
                .parse::<f64>()
                .map_err(|_| CoercionError::new(self, format, "not a number"));
        }
        self.as_f64()
            .ok_or_else(|| CoercionError::new(self, format, "not a number"))
    }

    /// JSON form used by the command line codec.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::String(s) | AttributeValue::Xml(s) | AttributeValue::Geometry(s) => json!(s),
            AttributeValue::Date(d) => json!(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            AttributeValue::Boolean(b) => json!(b),
            AttributeValue::Binary(bytes) => json!(BASE64.encode(bytes)),
            AttributeValue::Object(v) => v.clone(),
            AttributeValue::Integer(v) => json!(v),
            AttributeValue::Long(v) => json!(v),
            AttributeValue::Short(v) => json!(v),
            AttributeValue::Float(v) => json!(v),
            AttributeValue::Double(v) => json!(v),
        }
    }

    /// Reads a JSON value, using `format` when the attribute is declared.
    pub fn from_json(value: &Value, format: Option<AttributeFormat>) -> Result<AttributeValue, CoercionError> {
        let natural = match value {
            Value::String(s) => AttributeValue::String(s.clone()),
            Value::Bool(b) => AttributeValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Long(i),
                None => AttributeValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            other => AttributeValue::Object(other.clone()),
        };
        match (format, &natural) {
            (Some(AttributeFormat::Binary), AttributeValue::String(s)) => BASE64
                .decode(s)
                .map(AttributeValue::Binary)
                .map_err(|e| CoercionError::new(&natural, AttributeFormat::Binary, e.to_string())),
            (Some(AttributeFormat::Object), _) => Ok(AttributeValue::Object(value.clone())),
            (Some(format), _) => natural.coerce(format),
            (None, _) => Ok(natural),
        }
    }

}

/// `v` as an `i64` when it is a whole number inside the `i64` range.
fn whole_i64(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
    (v.fract() == 0.0 && in_range).then_some(v as i64)
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) | AttributeValue::Xml(s) | AttributeValue::Geometry(s) => write!(f, "{}", s),
            AttributeValue::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            AttributeValue::Object(v) => write!(f, "{}", v),
            AttributeValue::Integer(v) => write!(f, "{}", v),
            AttributeValue::Long(v) => write!(f, "{}", v),
            AttributeValue::Short(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Double(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(d: DateTime<Utc>) -> Self {
        AttributeValue::Date(d)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Long(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Double(v)
    }
}
