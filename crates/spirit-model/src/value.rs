use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scalar value carried by a result record.
///
/// This is the canonical serde format used across the engine and IPC
/// boundaries: a tagged enum in the shape `{ "type": "...", "value": ... }`.
///
/// Raw measurement payloads arrive as free text; [`ResultValue::parse`] is
/// deliberately lenient so that a column mixing numbers and annotations
/// ("12.5", "BQL", "") degrades to text/blank instead of erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ResultValue {
    Blank,
    Number(f64),
    Text(String),
}

impl ResultValue {
    /// Lenient parse of a raw value string.
    ///
    /// Empty (after trimming) becomes [`ResultValue::Blank`]; a finite
    /// floating-point literal becomes [`ResultValue::Number`]; everything
    /// else is kept verbatim as [`ResultValue::Text`]. Never fails.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ResultValue::Blank;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => ResultValue::Number(n),
            _ => ResultValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ResultValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, ResultValue::Blank)
    }

    /// Display-oriented string for this value (not a stable serialization).
    pub fn display_string(&self) -> String {
        match self {
            ResultValue::Blank => String::new(),
            ResultValue::Number(n) => format_number(*n),
            ResultValue::Text(s) => s.clone(),
        }
    }

    /// Converts this value into a typed key part suitable for grouping and
    /// sorting.
    pub fn to_key_part(&self) -> KeyPart {
        match self {
            ResultValue::Blank => KeyPart::Blank,
            ResultValue::Number(n) => KeyPart::Number(OrderedFloat(*n)),
            ResultValue::Text(s) => KeyPart::Text(s.clone()),
        }
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        ResultValue::parse(value)
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        ResultValue::parse(&value)
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        ResultValue::Number(value)
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        ResultValue::Number(value as f64)
    }
}

/// Shortest round-trip rendering; `10.0` displays as `"10"`.
fn format_number(n: f64) -> String {
    format!("{n}")
}

/// Atom of a grouping/sorting key.
///
/// Missing dimension components map to [`KeyPart::Blank`]; all blanks
/// compare equal so records lacking a component group together instead of
/// being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum KeyPart {
    Number(OrderedFloat<f64>),
    Text(String),
    Blank,
}

impl KeyPart {
    fn kind_rank(&self) -> u8 {
        match self {
            KeyPart::Number(_) => 0,
            KeyPart::Text(_) => 1,
            KeyPart::Blank => 2,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, KeyPart::Blank)
    }

    /// Human-friendly rendering of a key item value.
    pub fn display_string(&self) -> String {
        match self {
            KeyPart::Blank => String::new(),
            KeyPart::Number(n) => format_number(n.0),
            KeyPart::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Text(value.to_string())
    }
}

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Number(OrderedFloat(value))
    }
}

/// Case-insensitive text ordering with a deterministic case-sensitive
/// tiebreak so the overall ordering stays total.
fn cmp_text_case_insensitive(a: &str, b: &str) -> Ordering {
    let mut a_iter = a.chars().flat_map(|c| c.to_uppercase());
    let mut b_iter = b.chars().flat_map(|c| c.to_uppercase());
    loop {
        match (a_iter.next(), b_iter.next()) {
            (Some(ac), Some(bc)) => match ac.cmp(&bc) {
                Ordering::Equal => continue,
                ord => return ord,
            },
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return a.cmp(b),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        // Fixed cross-type ordering (numbers, then text, blanks last)
        // keeps mixed-type dimensions totally ordered.
        let rank_cmp = self.kind_rank().cmp(&other.kind_rank());
        if rank_cmp != Ordering::Equal {
            return rank_cmp;
        }
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a.cmp(b),
            (KeyPart::Text(a), KeyPart::Text(b)) => cmp_text_case_insensitive(a, b),
            _ => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_lenient() {
        assert_eq!(ResultValue::parse("12.5"), ResultValue::Number(12.5));
        assert_eq!(ResultValue::parse("  42 "), ResultValue::Number(42.0));
        assert_eq!(
            ResultValue::parse("BQL"),
            ResultValue::Text("BQL".to_string())
        );
        assert_eq!(ResultValue::parse("   "), ResultValue::Blank);
        // Non-finite literals are kept as text, not numbers.
        assert_eq!(
            ResultValue::parse("NaN"),
            ResultValue::Text("NaN".to_string())
        );
        assert_eq!(
            ResultValue::parse("inf"),
            ResultValue::Text("inf".to_string())
        );
    }

    #[test]
    fn key_parts_order_numbers_then_text_then_blank() {
        let mut parts = vec![
            KeyPart::Blank,
            KeyPart::from("beta"),
            KeyPart::from(10.0),
            KeyPart::from("Alpha"),
            KeyPart::from(2.0),
        ];
        parts.sort();
        assert_eq!(
            parts,
            vec![
                KeyPart::from(2.0),
                KeyPart::from(10.0),
                KeyPart::from("Alpha"),
                KeyPart::from("beta"),
                KeyPart::Blank,
            ]
        );
    }

    #[test]
    fn blanks_group_together() {
        assert_eq!(KeyPart::Blank.cmp(&KeyPart::Blank), Ordering::Equal);
    }

    #[test]
    fn number_display_drops_trailing_zero() {
        assert_eq!(ResultValue::Number(10.0).display_string(), "10");
        assert_eq!(ResultValue::Number(0.25).display_string(), "0.25");
    }
}
