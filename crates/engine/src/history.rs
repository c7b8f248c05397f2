/// Undo history for timeline assignments.
///
/// Each operator action becomes one `ActionRecord` holding the prior value of
/// every field it touched. Undo only: there is no redo stack, so undoing twice
/// walks back two actions.

use serde::Serialize;
use serde_json::Value;

use pipegrid_core::CellId;

/// Maximum number of records kept.
pub const MAX_HISTORY: usize = 50;

/// Value a field held before a change.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum PriorValue {
    /// The field did not exist; undo deletes it.
    Absent,
    Value(Value),
}

impl PriorValue {
    pub fn from_option(value: Option<Value>) -> Self {
        match value {
            Some(v) if !v.is_null() => PriorValue::Value(v),
            _ => PriorValue::Absent,
        }
    }

    /// The value to write back on undo (`None` deletes).
    pub fn into_option(self) -> Option<Value> {
        match self {
            PriorValue::Absent => None,
            PriorValue::Value(v) => Some(v),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub cell_id: CellId,
    pub field: String,
    pub previous: PriorValue,
}

/// What produced a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Drop,
    ConfirmedDrop,
    Edit,
    AssignSelection,
    AssignRange,
    AssignAll,
    AssignFromSource,
    Clear,
    DeleteFields,
    Paste,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Drop => "drop",
            ActionKind::ConfirmedDrop => "confirmed-drop",
            ActionKind::Edit => "edit",
            ActionKind::AssignSelection => "assign-selection",
            ActionKind::AssignRange => "assign-range",
            ActionKind::AssignAll => "assign-all",
            ActionKind::AssignFromSource => "assign-from-source",
            ActionKind::Clear => "clear",
            ActionKind::DeleteFields => "delete-fields",
            ActionKind::Paste => "paste",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionRecord {
    pub id: u64,
    pub kind: ActionKind,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug)]
pub struct ActionHistory {
    records: Vec<ActionRecord>,
    max_entries: usize,
    next_id: u64,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            records: Vec::new(),
            max_entries: max_entries.max(1),
            next_id: 1,
        }
    }

    /// Build a record with the next id. Does not push it.
    pub fn record(&mut self, kind: ActionKind, changes: Vec<FieldChange>) -> ActionRecord {
        let id = self.next_id;
        self.next_id += 1;
        ActionRecord { id, kind, changes }
    }

    /// Append a record, evicting the oldest once over capacity. Empty records are dropped.
    pub fn push(&mut self, record: ActionRecord) {
        if record.changes.is_empty() {
            return;
        }
        self.records.push(record);

        if self.records.len() > self.max_entries {
            self.records.remove(0);
        }
    }

    /// Pop the most recent record. The caller writes the prior values back.
    pub fn undo(&mut self) -> Option<ActionRecord> {
        self.records.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&ActionRecord> {
        self.records.last()
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
