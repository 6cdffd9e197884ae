//! Loose accessors over schema-less store documents.
//!
//! Source collections hand back JSON objects whose fields may be missing, renamed
//! between producers, or stored with the wrong scalar type. Every lookup takes a
//! list of aliases and returns the first usable value.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

pub(crate) struct Document<'a> {
    value: &'a Value,
}

impl<'a> Document<'a> {
    pub(crate) fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn field(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.value.get(*key))
            .find(|v| !v.is_null())
    }

    /// First non-blank string, with numbers and booleans stringified.
    pub(crate) fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.value.get(*key))
            .find_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
    }

    /// Numbers, or strings that parse as numbers.
    pub(crate) fn number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .filter_map(|key| self.value.get(*key))
            .find_map(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .filter(|n| n.is_finite())
    }

    /// Non-negative count, rounded to the nearest whole number.
    pub(crate) fn whole_number(&self, keys: &[&str]) -> Option<u32> {
        self.number(keys)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32)
    }

    pub(crate) fn minutes(&self, keys: &[&str]) -> Option<u32> {
        self.whole_number(keys)
    }

    /// Accepts `YYYY-MM-DD` or any RFC 3339 timestamp.
    pub(crate) fn date(&self, keys: &[&str]) -> Option<NaiveDate> {
        let raw = self.text(keys)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(&raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }

    pub(crate) fn timestamp(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        let raw = self.text(keys)?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// A list of strings; a single string is treated as a one-element list.
    pub(crate) fn list(&self, keys: &[&str]) -> Vec<String> {
        match self.field(keys) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_uses_first_present_alias() {
        let doc = json!({ "theatreName": "Theatre 4", "theatre": null });
        let document = Document::new(&doc);
        assert_eq!(
            document.text(&["theatre", "theatreName"]),
            Some("Theatre 4".to_string())
        );
        assert_eq!(document.text(&["missing"]), None);
    }

    #[test]
    fn number_accepts_numeric_strings() {
        let doc = json!({ "bookedMinutes": "180", "capacity": 6 });
        let document = Document::new(&doc);
        assert_eq!(document.minutes(&["bookedMinutes"]), Some(180));
        assert_eq!(document.number(&["capacity"]), Some(6.0));
    }

    #[test]
    fn whole_number_rounds_and_rejects_negatives() {
        let doc = json!({ "experience": "7.6", "capacity": -2, "beds": 12 });
        let document = Document::new(&doc);
        assert_eq!(document.whole_number(&["experience"]), Some(8));
        assert_eq!(document.whole_number(&["capacity"]), None);
        assert_eq!(document.whole_number(&["capacity", "beds"]), Some(12));
    }

    #[test]
    fn date_accepts_plain_and_rfc3339() {
        let doc = json!({ "a": "2026-10-16", "b": "2026-10-17T08:30:00Z", "c": "soon" });
        let document = Document::new(&doc);
        assert_eq!(
            document.date(&["a"]),
            NaiveDate::from_ymd_opt(2026, 10, 16)
        );
        assert_eq!(
            document.date(&["b"]),
            NaiveDate::from_ymd_opt(2026, 10, 17)
        );
        assert_eq!(document.date(&["c"]), None);
    }

    #[test]
    fn list_wraps_single_strings() {
        let doc = json!({ "skills": "laparoscopic", "equipment": ["c-arm", "", "laser"] });
        let document = Document::new(&doc);
        assert_eq!(document.list(&["skills"]), vec!["laparoscopic"]);
        assert_eq!(document.list(&["equipment"]), vec!["c-arm", "laser"]);
    }
}
