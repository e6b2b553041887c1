//! The closed set of cell types.
//!
//! Each [`CellType`] variant is a pure capability: [`CellType::test`] answers
//! whether a raw value fits, [`CellType::cast`] converts it to the native
//! [`Value`]. Variants carry a total specificity order used as the tie-break
//! when guessing; [`CellType::String`] is the least specific and accepts
//! anything, so guessing always has an answer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{
    data::{
        Value, parse_boolean, parse_decimal_literal, parse_guid, parse_naive_date,
        parse_naive_datetime,
    },
    error::{Result, RowSetError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Boolean,
    Integer,
    Decimal,
    Float,
    Date,
    DateTime,
    Guid,
    String,
}

const BY_SPECIFICITY: [CellType; 8] = [
    CellType::Boolean,
    CellType::Integer,
    CellType::Decimal,
    CellType::Float,
    CellType::Date,
    CellType::DateTime,
    CellType::Guid,
    CellType::String,
];

impl CellType {
    /// All variants, most specific first.
    pub fn by_specificity() -> &'static [CellType] {
        &BY_SPECIFICITY
    }

    /// Rank in the specificity order; lower is more specific.
    pub fn specificity(&self) -> usize {
        BY_SPECIFICITY
            .iter()
            .position(|candidate| candidate == self)
            .unwrap_or(BY_SPECIFICITY.len())
    }

    pub fn is_more_specific_than(&self, other: &CellType) -> bool {
        self.specificity() < other.specificity()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::String => "string",
            CellType::Integer => "integer",
            CellType::Decimal => "decimal",
            CellType::Float => "float",
            CellType::Boolean => "boolean",
            CellType::Date => "date",
            CellType::DateTime => "datetime",
            CellType::Guid => "guid",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "string", "integer", "decimal", "float", "boolean", "date", "datetime", "guid",
        ]
    }

    /// Whether `raw` (already known to be non-empty) can be read as this type.
    pub fn test(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        match self {
            CellType::String => true,
            CellType::Integer => trimmed.parse::<i64>().is_ok(),
            CellType::Decimal => parse_decimal_literal(trimmed).is_ok(),
            CellType::Float => looks_numeric(trimmed) && trimmed.parse::<f64>().is_ok(),
            CellType::Boolean => parse_boolean(trimmed).is_ok(),
            CellType::Date => parse_naive_date(trimmed).is_ok(),
            CellType::DateTime => parse_naive_datetime(trimmed).is_ok(),
            CellType::Guid => parse_guid(trimmed).is_ok(),
        }
    }

    /// Casts raw text. Blank input casts to `None` for every type.
    pub fn cast(&self, raw: &str) -> Result<Option<Value>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let fail = || RowSetError::Cast {
            column: None,
            value: raw.to_string(),
            target: *self,
        };
        let parsed = match self {
            CellType::String => Value::String(raw.to_string()),
            CellType::Integer => Value::Integer(trimmed.parse().map_err(|_| fail())?),
            CellType::Decimal => {
                Value::Decimal(parse_decimal_literal(trimmed).map_err(|_| fail())?)
            }
            CellType::Float => {
                if !looks_numeric(trimmed) {
                    return Err(fail());
                }
                Value::Float(trimmed.parse().map_err(|_| fail())?)
            }
            CellType::Boolean => Value::Boolean(parse_boolean(trimmed).map_err(|_| fail())?),
            CellType::Date => Value::Date(parse_naive_date(trimmed).map_err(|_| fail())?),
            CellType::DateTime => {
                Value::DateTime(parse_naive_datetime(trimmed).map_err(|_| fail())?)
            }
            CellType::Guid => Value::Guid(parse_guid(trimmed).map_err(|_| fail())?),
        };
        Ok(Some(parsed))
    }

    /// Casts a value that may already be native. Values already of this type
    /// pass through; anything else is rendered and re-parsed.
    pub fn cast_value(&self, value: &Value) -> Result<Option<Value>> {
        if self.holds(value) {
            return Ok(Some(value.clone()));
        }
        match value {
            Value::String(raw) => self.cast(raw),
            other => self.cast(&other.as_display()),
        }
    }

    fn holds(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (CellType::String, Value::String(_))
                | (CellType::Integer, Value::Integer(_))
                | (CellType::Decimal, Value::Decimal(_))
                | (CellType::Float, Value::Float(_))
                | (CellType::Boolean, Value::Boolean(_))
                | (CellType::Date, Value::Date(_))
                | (CellType::DateTime, Value::DateTime(_))
                | (CellType::Guid, Value::Guid(_))
        )
    }
}

// Rejects the textual infinities and NaN that `f64::from_str` accepts.
fn looks_numeric(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellType {
    type Err = RowSetError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "string" | "str" | "text" => Ok(CellType::String),
            "integer" | "int" => Ok(CellType::Integer),
            "decimal" | "numeric" => Ok(CellType::Decimal),
            "float" | "double" => Ok(CellType::Float),
            "boolean" | "bool" => Ok(CellType::Boolean),
            "date" => Ok(CellType::Date),
            "datetime" | "date-time" | "timestamp" => Ok(CellType::DateTime),
            "guid" | "uuid" => Ok(CellType::Guid),
            _ => Err(RowSetError::InvalidPolicy(format!(
                "Unknown column type '{value}'. Supported types: {}",
                CellType::variants().join(", ")
            ))),
        }
    }
}

impl Serialize for CellType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CellType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        CellType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}
