//! Typed cell values.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One spreadsheet cell.
///
/// Serialized untagged so that persisted rows read as plain JSON arrays
/// (`["id", "ana", 12, 7.5]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

pub(crate) static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Reads the cell as a decimal, normalizing `,` to `.` for text cells.
    ///
    /// Returns `None` for empty or unparseable cells.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Number(value) if value.is_finite() => Some(*value),
            Self::Text(value) => value
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            _ => None,
        }
    }

    /// Reads the cell as a non-negative whole number.
    pub fn as_whole(&self) -> Option<u32> {
        match self {
            Self::Integer(value) => u32::try_from(*value).ok(),
            Self::Number(value) if value.fract() == 0.0 && *value >= 0.0 => {
                u32::try_from(*value as i64).ok()
            }
            Self::Text(value) => value.trim().parse::<u32>().ok(),
            _ => None,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::CellValue;

    #[test]
    fn decimal_reads_numbers_and_locale_text() {
        assert_eq!(CellValue::Integer(7).as_decimal(), Some(7.0));
        assert_eq!(CellValue::Number(7.5).as_decimal(), Some(7.5));
        assert_eq!(CellValue::text("7,5").as_decimal(), Some(7.5));
        assert_eq!(CellValue::text("n/a").as_decimal(), None);
        assert_eq!(CellValue::Empty.as_decimal(), None);
    }

    #[test]
    fn whole_rejects_fractions() {
        assert_eq!(CellValue::Number(12.0).as_whole(), Some(12));
        assert_eq!(CellValue::Number(12.5).as_whole(), None);
        assert_eq!(CellValue::Integer(-1).as_whole(), None);
        assert_eq!(CellValue::text(" 9 ").as_whole(), Some(9));
    }

    #[test]
    fn untagged_json_keeps_numeric_typing() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"["ana", 12, 7.5, null, true]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                CellValue::text("ana"),
                CellValue::Integer(12),
                CellValue::Number(7.5),
                CellValue::Empty,
                CellValue::Bool(true),
            ]
        );
        assert_eq!(serde_json::to_string(&cells).unwrap(), r#"["ana",12,7.5,null,true]"#);
    }

    #[test]
    fn empty_text_collapses_to_empty() {
        assert_eq!(CellValue::text(""), CellValue::Empty);
        assert!(CellValue::text("   ").is_empty());
    }
}
