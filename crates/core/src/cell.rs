//! Cell identity.
//!
//! A `CellId` is derived from the interval kind and the cell's ordinal (or
//! from a caller-supplied phase id). The same config always yields the same
//! ids, which is what lets undo records and stored field maps survive a
//! regeneration.

use serde::{Deserialize, Serialize};

/// Stable identifier of one timeline cell (`sec-0`, `day-12`, `date-2025-01-05`, `phase-3`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CellId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CellId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind-specific detail carried by a generated cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CellDetail {
    Second { seconds: u32 },
    Hour { hours: u32 },
    Day { day: u32 },
    Week { week: u32 },
    /// `date` is ISO `YYYY-MM-DD`; `day` is the 1-based position in the range.
    Date { date: String, day: u32 },
    Phase {
        name: String,
        duration_days: u32,
        glyph: String,
    },
}

/// One addressable slot of the timeline grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub label: String,
    /// 0-based position in the generated sequence.
    pub ordinal: usize,
    pub detail: CellDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_id_display_and_eq() {
        let a = CellId::from("sec-0");
        let b = CellId::new(String::from("sec-0"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "sec-0");
        assert_eq!(a.as_str(), "sec-0");
    }

    #[test]
    fn test_cell_id_serializes_as_plain_string() {
        let id = CellId::from("day-3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"day-3\"");
    }

    #[test]
    fn test_phase_detail_fields_are_camel_case() {
        let detail = CellDetail::Phase { name: "Drying".into(), duration_days: 5, glyph: "🫙".into() };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "kind": "phase", "name": "Drying", "durationDays": 5, "glyph": "🫙" })
        );
        assert_eq!(serde_json::from_value::<CellDetail>(value).unwrap(), detail);
    }
}
