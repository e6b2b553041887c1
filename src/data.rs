use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Native representation of a cell value.
///
/// Format collaborators only ever produce [`Value::String`]; every other
/// variant is the result of a cast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Guid(Uuid),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::Float(f) => {
                // Whole numbers within the exactly representable range print
                // without a fractional part.
                if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Guid(g) => g.to_string(),
        }
    }

}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

pub fn parse_boolean(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" => Ok(true),
        "false" | "f" | "no" | "n" => Ok(false),
        _ => bail!("Failed to parse '{value}' as boolean"),
    }
}

/// Parses a plain decimal literal. Thousands separators are accepted when
/// they group digits in threes.
pub fn parse_decimal_literal(value: &str) -> Result<Decimal> {
    let trimmed = value.trim();
    let normalized = strip_thousands_separators(trimmed)
        .ok_or_else(|| anyhow!("Failed to parse '{value}' as decimal"))?;
    normalized
        .parse::<Decimal>()
        .with_context(|| format!("Failed to parse '{value}' as decimal"))
}

pub fn parse_guid(value: &str) -> Result<Uuid> {
    let trimmed = value.trim().trim_matches(|c| matches!(c, '{' | '}'));
    Uuid::parse_str(trimmed).with_context(|| format!("Failed to parse '{value}' as GUID"))
}

fn strip_thousands_separators(value: &str) -> Option<String> {
    if !value.contains(',') {
        return Some(value.to_string());
    }
    let (sign, body) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value),
    };
    let (integer, fraction) = match body.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (body, None),
    };
    let mut groups = integer.split(',');
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 {
        return None;
    }
    let mut digits = head.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    let mut normalized = format!("{sign}{digits}");
    if let Some(frac) = fraction {
        normalized.push('.');
        normalized.push_str(frac);
    }
    Some(normalized)
}

/// Tokens that stand in for "no value" in hand-maintained spreadsheets.
pub fn is_placeholder_token(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    let stripped = lowered.trim_start_matches('#');
    if stripped.is_empty() {
        return !lowered.is_empty();
    }
    matches!(
        stripped,
        "na" | "n/a" | "n.a." | "null" | "none" | "nil" | "unknown" | "missing"
    ) || stripped.chars().all(|c| c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_naive_date_supports_multiple_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_naive_date("2024-05-06").unwrap(), expected);
        assert_eq!(parse_naive_date("06/05/2024").unwrap(), expected);
        assert_eq!(parse_naive_date("2024/05/06").unwrap(), expected);
    }

    #[test]
    fn parse_naive_datetime_supports_multiple_formats() {
        let expected =
            NaiveDateTime::parse_from_str("2024-05-06 14:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            parse_naive_datetime("2024-05-06T14:30:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_naive_datetime("2024-05-06T14:30:00Z").unwrap(),
            expected
        );
        assert_eq!(parse_naive_datetime("2024-05-06 14:30").unwrap(), expected);
    }

    #[test]
    fn parse_boolean_accepts_common_spellings() {
        assert!(parse_boolean("Yes").unwrap());
        assert!(!parse_boolean(" f ").unwrap());
        assert!(parse_boolean("maybe").is_err());
    }

    #[test]
    fn parse_decimal_literal_handles_grouping() {
        assert_eq!(
            parse_decimal_literal("1,234.50").unwrap(),
            Decimal::new(123450, 2)
        );
        assert_eq!(parse_decimal_literal("-12.5").unwrap(), Decimal::new(-125, 1));
        assert!(parse_decimal_literal("1,23.5").is_err());
        assert!(parse_decimal_literal("abc").is_err());
    }

    #[test]
    fn parse_guid_accepts_braces() {
        let raw = "{550e8400-e29b-41d4-a716-446655440000}";
        assert_eq!(
            parse_guid(raw).unwrap(),
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
        );
        assert!(parse_guid("not-a-guid").is_err());
    }

    #[test]
    fn float_display_keeps_magnitude() {
        assert_eq!(Value::Float(42.0).as_display(), "42");
        assert_eq!(Value::Float(-3.5).as_display(), "-3.5");
        assert_eq!(Value::Float(1e20).as_display(), "100000000000000000000");
        assert_eq!(Value::Float(-1e19).as_display(), "-10000000000000000000");
    }

    #[test]
    fn placeholder_tokens_are_recognized() {
        assert!(is_placeholder_token("N/A"));
        assert!(is_placeholder_token("#NULL"));
        assert!(is_placeholder_token("---"));
        assert!(!is_placeholder_token(""));
        assert!(!is_placeholder_token("0"));
    }

    #[test]
    fn float_display_drops_trailing_zero_fraction() {
        assert_eq!(Value::Float(3.0).as_display(), "3");
        assert_eq!(Value::Float(2.5).as_display(), "2.5");
        assert_eq!(Value::Decimal(Decimal::new(1050, 2)).as_display(), "10.5");
    }
}
