//! Bulk assignment planning.
//!
//! Every mutation is planned first and committed second. A `WritePlan` is the
//! fully validated list of field writes an operation will perform; once a plan
//! exists, committing it cannot fail, so no bulk operation is ever partially
//! applied.
//!
//! Destructive operations are two-phase: `Timeline::stage` returns a
//! `StagedIntent` carrying a preview and the config revision it was planned
//! against, and `Timeline::commit` applies exactly that preview (or rejects it
//! if the timeline was reconfigured in between).

use rustc_hash::FxHashSet;
use serde_json::Value;

use pipegrid_core::{Cell, CellId};

use crate::attributes::AttributeCatalog;
use crate::error::EngineError;
use crate::history::ActionKind;
use crate::store::{is_empty_value, is_reserved, CellDataStore};

/// One field write. `value: None` deletes the key.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    pub cell_id: CellId,
    pub field: String,
    pub value: Option<Value>,
}

impl PlannedWrite {
    pub fn set(cell_id: CellId, field: &str, value: Value) -> Self {
        Self { cell_id, field: field.to_string(), value: Some(value) }
    }

    pub fn delete(cell_id: CellId, field: &str) -> Self {
        Self { cell_id, field: field.to_string(), value: None }
    }
}

/// Validated writes of one operator action.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePlan {
    pub kind: ActionKind,
    pub writes: Vec<PlannedWrite>,
}

impl WritePlan {
    pub fn new(kind: ActionKind) -> Self {
        Self { kind, writes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Number of distinct cells touched.
    pub fn cell_count(&self) -> usize {
        self.writes
            .iter()
            .map(|w| &w.cell_id)
            .collect::<FxHashSet<_>>()
            .len()
    }
}

/// Read-only view of the timeline a plan is computed against.
pub struct PlanContext<'a> {
    pub cells: &'a [Cell],
    pub selected: &'a [CellId],
    pub store: &'a CellDataStore,
    pub catalog: &'a AttributeCatalog,
}

impl<'a> PlanContext<'a> {
    pub fn position(&self, id: &CellId) -> Option<usize> {
        self.cells.iter().position(|c| &c.id == id)
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.position(id).is_some()
    }

    /// Selected ids that are still part of the timeline, in selection order.
    pub fn live_selection(&self) -> Vec<CellId> {
        self.selected.iter().filter(|id| self.contains(id)).cloned().collect()
    }

    /// Explicit targets (all must exist) or the live selection.
    pub(crate) fn targets(&self, explicit: Option<&[CellId]>) -> Result<Vec<CellId>, EngineError> {
        let targets = match explicit {
            Some(ids) => {
                if let Some(unknown) = ids.iter().find(|id| !self.contains(id)) {
                    return Err(EngineError::UnknownCell(unknown.clone()));
                }
                ids.to_vec()
            }
            None => self.live_selection(),
        };
        if targets.is_empty() {
            return Err(EngineError::EmptySelection);
        }
        Ok(targets)
    }
}

/// Reject keys that cannot be written directly.
pub fn check_assignable(key: &str, catalog: &AttributeCatalog) -> Result<(), EngineError> {
    if key.trim().is_empty() || is_reserved(key) {
        return Err(EngineError::ReservedField(key.to_string()));
    }
    if catalog.is_computed(key) {
        return Err(EngineError::ComputedField(key.to_string()));
    }
    Ok(())
}

/// A bulk operation, before it is planned.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkIntent {
    /// Write `value` to every selected cell.
    AssignSelection { key: String, value: Value },
    /// Write `value` to the inclusive ordinal range between two cells.
    AssignRange { key: String, start: CellId, end: CellId, value: Value },
    /// Write `value` to every generated cell.
    AssignAll { key: String, value: Value },
    /// Copy `key` from `source` to the targets (None = selection).
    AssignFromSource { source: CellId, key: String, targets: Option<Vec<CellId>> },
    /// Remove every field from the targets (None = selection).
    ClearCells { targets: Option<Vec<CellId>> },
    /// Remove the given fields from the targets (None = selection).
    DeleteFields { keys: Vec<String>, targets: Option<Vec<CellId>> },
}

impl BulkIntent {
    pub fn kind(&self) -> ActionKind {
        match self {
            BulkIntent::AssignSelection { .. } => ActionKind::AssignSelection,
            BulkIntent::AssignRange { .. } => ActionKind::AssignRange,
            BulkIntent::AssignAll { .. } => ActionKind::AssignAll,
            BulkIntent::AssignFromSource { .. } => ActionKind::AssignFromSource,
            BulkIntent::ClearCells { .. } => ActionKind::Clear,
            BulkIntent::DeleteFields { .. } => ActionKind::DeleteFields,
        }
    }

    /// Validate and compute the writes. Nothing is mutated.
    pub fn plan(&self, ctx: &PlanContext<'_>) -> Result<WritePlan, EngineError> {
        let mut plan = WritePlan::new(self.kind());

        match self {
            BulkIntent::AssignSelection { key, value } => {
                check_assignable(key, ctx.catalog)?;
                for id in ctx.targets(None)? {
                    plan.writes.push(PlannedWrite::set(id, key, value.clone()));
                }
            }
            BulkIntent::AssignRange { key, start, end, value } => {
                check_assignable(key, ctx.catalog)?;
                let (Some(a), Some(b)) = (ctx.position(start), ctx.position(end)) else {
                    return Err(EngineError::RangeResolution { start: start.clone(), end: end.clone() });
                };
                let (lo, hi) = (a.min(b), a.max(b));
                for cell in &ctx.cells[lo..=hi] {
                    plan.writes.push(PlannedWrite::set(cell.id.clone(), key, value.clone()));
                }
            }
            BulkIntent::AssignAll { key, value } => {
                check_assignable(key, ctx.catalog)?;
                if ctx.cells.is_empty() {
                    return Err(EngineError::ConfigurationIncomplete);
                }
                for cell in ctx.cells {
                    plan.writes.push(PlannedWrite::set(cell.id.clone(), key, value.clone()));
                }
            }
            BulkIntent::AssignFromSource { source, key, targets } => {
                check_assignable(key, ctx.catalog)?;
                if !ctx.contains(source) {
                    return Err(EngineError::UnknownCell(source.clone()));
                }
                let value = ctx
                    .store
                    .get(source, key)
                    .filter(|v| !is_empty_value(v))
                    .cloned()
                    .ok_or_else(|| EngineError::MissingSourceValue { source: source.clone(), key: key.clone() })?;
                for id in ctx.targets(targets.as_deref())? {
                    plan.writes.push(PlannedWrite::set(id, key, value.clone()));
                }
            }
            BulkIntent::ClearCells { targets } => {
                for id in ctx.targets(targets.as_deref())? {
                    if let Some(fields) = ctx.store.get_fields(&id) {
                        for key in fields.fields.keys() {
                            plan.writes.push(PlannedWrite::delete(id.clone(), key));
                        }
                    }
                }
            }
            BulkIntent::DeleteFields { keys, targets } => {
                for id in ctx.targets(targets.as_deref())? {
                    for key in keys {
                        if ctx.store.get(&id, key).is_some() {
                            plan.writes.push(PlannedWrite::delete(id.clone(), key));
                        }
                    }
                }
            }
        }

        Ok(plan)
    }
}

/// An intent planned against a specific config revision, awaiting commit.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedIntent {
    pub(crate) intent: BulkIntent,
    pub(crate) revision: u64,
    pub(crate) preview: WritePlan,
}

impl StagedIntent {
    pub fn intent(&self) -> &BulkIntent {
        &self.intent
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Writes the intent would perform if committed now.
    pub fn preview(&self) -> &WritePlan {
        &self.preview
    }

    /// Confirmation text for the operator.
    pub fn summary(&self) -> String {
        let cells = self.preview.cell_count();
        let writes = self.preview.writes.len();
        match &self.intent {
            BulkIntent::AssignSelection { key, .. }
            | BulkIntent::AssignRange { key, .. }
            | BulkIntent::AssignAll { key, .. }
            | BulkIntent::AssignFromSource { key, .. } => format!("assign '{key}' to {cells} cell(s)"),
            BulkIntent::ClearCells { .. } => format!("clear {writes} field(s) from {cells} cell(s)"),
            BulkIntent::DeleteFields { keys, .. } => {
                format!("delete {} field(s) ({writes} value(s)) from {cells} cell(s)", keys.len())
            }
        }
    }
}
