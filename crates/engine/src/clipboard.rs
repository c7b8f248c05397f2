//! Cell copy/paste.
//!
//! Copying one cell and pasting writes its fields onto every target. Copying
//! several cells pastes them positionally onto the first N targets.

use pipegrid_core::CellId;

use crate::bulk::{PlannedWrite, WritePlan};
use crate::history::ActionKind;
use crate::store::{CellDataStore, FieldMap};

#[derive(Debug, Clone, PartialEq)]
pub enum Clipboard {
    Single { source: CellId, fields: FieldMap },
    Bulk(Vec<(CellId, FieldMap)>),
}

impl Clipboard {
    /// Snapshot the fields of `ids`. None when `ids` is empty.
    pub fn capture(ids: &[CellId], store: &CellDataStore) -> Option<Self> {
        let snapshot = |id: &CellId| store.get_fields(id).map(|f| f.fields.clone()).unwrap_or_default();
        match ids {
            [] => None,
            [one] => Some(Clipboard::Single { source: one.clone(), fields: snapshot(one) }),
            many => Some(Clipboard::Bulk(many.iter().map(|id| (id.clone(), snapshot(id))).collect())),
        }
    }

    /// Number of cells copied.
    pub fn len(&self) -> usize {
        match self {
            Clipboard::Single { .. } => 1,
            Clipboard::Bulk(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn plan_paste(&self, targets: &[CellId]) -> WritePlan {
        let mut plan = WritePlan::new(ActionKind::Paste);
        match self {
            Clipboard::Single { fields, .. } => {
                for target in targets {
                    for (key, value) in fields {
                        plan.writes.push(PlannedWrite::set(target.clone(), key, value.clone()));
                    }
                }
            }
            Clipboard::Bulk(entries) => {
                for ((_, fields), target) in entries.iter().zip(targets) {
                    for (key, value) in fields {
                        plan.writes.push(PlannedWrite::set(target.clone(), key, value.clone()));
                    }
                }
            }
        }
        plan
    }
}
