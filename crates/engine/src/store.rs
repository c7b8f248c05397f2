//! Per-cell field storage.
//!
//! Holds one `CellFields` entry per cell id, created lazily on the first
//! write. Two historical encodings of persisted cell data exist (fields at the
//! root of the entry, or nested under `data`); `import_entry` folds both into
//! the canonical shape and nothing past this module branches on encoding.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use pipegrid_core::CellId;

/// Ordered field map of one cell.
pub type FieldMap = IndexMap<String, Value>;

/// Structural keys. Never stored as fields and never counted as data.
pub const RESERVED_KEYS: &[&str] = &[
    "timestamp", "label", "date", "phase", "day", "week", "hours", "seconds", "meta", "_meta",
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// True for values that do not count as data: null, blank strings, empty arrays and objects.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Bookkeeping refreshed on every write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellMeta {
    pub completion_percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Canonical per-cell data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellFields {
    pub fields: FieldMap,
    pub meta: CellMeta,
}

impl CellFields {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Keys holding a non-empty value.
    pub fn filled_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(k, v)| !is_reserved(k) && !is_empty_value(v))
            .map(|(k, _)| k.as_str())
    }

    pub fn has_data(&self) -> bool {
        self.filled_keys().next().is_some()
    }
}

/// Field maps keyed by cell id.
#[derive(Debug, Default)]
pub struct CellDataStore {
    entries: FxHashMap<CellId, CellFields>,
    /// Number of assignable catalog fields; 0 when no catalog is known.
    completion_base: usize,
}

impl CellDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size completion percentages against this many assignable fields.
    pub fn set_completion_base(&mut self, fields: usize) {
        self.completion_base = fields;
        let ids: Vec<CellId> = self.entries.keys().cloned().collect();
        for id in ids {
            self.refresh_completion(&id);
        }
    }

    pub fn get_fields(&self, id: &CellId) -> Option<&CellFields> {
        self.entries.get(id)
    }

    pub fn get(&self, id: &CellId, key: &str) -> Option<&Value> {
        self.entries.get(id).and_then(|e| e.get(key))
    }

    /// Write or delete one field. `None` (or a JSON null) deletes the key.
    ///
    /// Returns the previous value. Reserved keys are ignored. Deleting from a
    /// cell that has no entry does not create one.
    pub fn set_field(&mut self, id: &CellId, key: &str, value: Option<Value>) -> Option<Value> {
        if is_reserved(key) {
            log::warn!("ignoring write to reserved key '{}' on {}", key, id);
            return None;
        }

        let previous = match value {
            Some(v) if !v.is_null() => {
                let entry = self.entries.entry(id.clone()).or_default();
                entry.fields.insert(key.to_string(), v)
            }
            _ => match self.entries.get_mut(id) {
                Some(entry) => entry.fields.shift_remove(key),
                None => return None,
            },
        };

        self.touch(id);
        previous
    }

    pub fn has_data(&self, id: &CellId) -> bool {
        self.entries.get(id).is_some_and(CellFields::has_data)
    }

    /// Ids of every entry, sorted.
    pub fn ids(&self) -> Vec<CellId> {
        let mut ids: Vec<CellId> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn touch(&mut self, id: &CellId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.meta.last_modified = Some(Utc::now());
        }
        self.refresh_completion(id);
    }

    fn refresh_completion(&mut self, id: &CellId) {
        let base = self.completion_base;
        if let Some(entry) = self.entries.get_mut(id) {
            let filled = entry.filled_keys().count();
            entry.meta.completion_percentage = completion(filled, base);
        }
    }

    /// Load one persisted entry in either encoding.
    ///
    /// Accepts `{timestamp, data: {...}, _meta}` and `{timestamp, key: value, ...}`
    /// (or both at once; root keys win). Returns the id of the entry, or None
    /// when the value is not an object with a `timestamp`/`id`.
    pub fn import_entry(&mut self, raw: &Value) -> Option<CellId> {
        let obj = raw.as_object()?;
        let id = obj
            .get("timestamp")
            .or_else(|| obj.get("id"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(CellId::from)?;

        let mut fields = FieldMap::new();
        if let Some(Value::Object(nested)) = obj.get("data") {
            for (k, v) in nested {
                if !is_reserved(k) && !v.is_null() {
                    fields.insert(k.clone(), v.clone());
                }
            }
        }
        for (k, v) in obj {
            if k == "data" || k == "id" || is_reserved(k) || v.is_null() {
                continue;
            }
            fields.insert(k.clone(), v.clone());
        }

        let meta = obj
            .get("_meta")
            .or_else(|| obj.get("meta"))
            .and_then(|m| serde_json::from_value::<CellMeta>(m.clone()).ok())
            .unwrap_or_default();

        if fields.is_empty() && meta == CellMeta::default() {
            return Some(id);
        }

        let entry = self.entries.entry(id.clone()).or_default();
        entry.fields.extend(fields);
        entry.meta = meta;
        Some(id)
    }

    /// Load a batch of persisted entries. Returns how many were recognised.
    pub fn import<'a>(&mut self, raw: impl IntoIterator<Item = &'a Value>) -> usize {
        raw.into_iter().filter_map(|v| self.import_entry(v)).count()
    }

    /// Canonical encoding of every entry, sorted by id.
    pub fn export(&self) -> Vec<Value> {
        self.ids()
            .into_iter()
            .filter_map(|id| {
                let entry = self.entries.get(&id)?;
                let data: Map<String, Value> =
                    entry.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                Some(json!({
                    "timestamp": id.as_str(),
                    "data": data,
                    "_meta": entry.meta,
                }))
            })
            .collect()
    }
}

fn completion(filled: usize, base: usize) -> u8 {
    if base == 0 {
        return if filled > 0 { 100 } else { 0 };
    }
    let pct = (filled as f64 / base as f64 * 100.0).round();
    pct.min(100.0) as u8
}
