//! Drop dispatch: decides whether dropped content is written directly or
//! needs operator confirmation first.
//!
//! A `Single` field is written immediately. `Multi` and `Grouped` content
//! always opens a confirmation (`PendingDrop`) since several values have to be
//! checked per target. Both paths end in one `WritePlan`, so both produce
//! exactly one undo record.

use serde_json::Value;

use pipegrid_core::CellId;

use crate::attributes::AttributeCatalog;
use crate::bulk::{check_assignable, PlanContext, PlannedWrite, WritePlan};
use crate::error::EngineError;
use crate::history::ActionKind;
use crate::presets::GroupedPreset;
use crate::selection::SelectionMode;
use crate::store::{is_empty_value, FieldMap};

/// One field carried by dragged content.
#[derive(Debug, Clone, PartialEq)]
pub struct DropItem {
    pub key: String,
    pub label: String,
    pub default_value: Option<Value>,
}

impl DropItem {
    pub fn new(key: &str, label: &str) -> Self {
        Self { key: key.to_string(), label: label.to_string(), default_value: None }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// What was dropped onto a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentDescriptor {
    Single { key: String, label: String, default_value: Option<Value> },
    Multi { items: Vec<DropItem> },
    Grouped { group: GroupedPreset },
}

impl ContentDescriptor {
    pub fn single(key: &str, label: &str, default_value: Option<Value>) -> Self {
        ContentDescriptor::Single { key: key.to_string(), label: label.to_string(), default_value }
    }
}

impl From<DropItem> for ContentDescriptor {
    fn from(item: DropItem) -> Self {
        ContentDescriptor::Single { key: item.key, label: item.label, default_value: item.default_value }
    }
}

/// Where a pending confirmation came from.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingSource {
    Multi,
    Grouped { preset_id: String, name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingField {
    pub key: String,
    pub label: String,
    pub value: Value,
}

/// A target field that already holds a value the confirmation would overwrite.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub cell_id: CellId,
    pub field: String,
    pub current: Value,
}

/// A Multi/Grouped drop waiting for the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDrop {
    pub drop_cell: CellId,
    pub targets: Vec<CellId>,
    pub fields: Vec<PendingField>,
    pub conflicts: Vec<Conflict>,
    pub source: PendingSource,
    /// Config revision the drop was made against.
    pub revision: u64,
}

impl PendingDrop {
    /// Edit the value the confirmation will write. Returns false for unknown keys.
    pub fn set_value(&mut self, key: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(field) => {
                field.value = value;
                true
            }
            None => false,
        }
    }

    /// Untick a field so it is not written.
    pub fn remove_field(&mut self, key: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.key != key);
        self.conflicts.retain(|c| c.field != key);
        self.fields.len() != before
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Writes for the confirmed values. Empty values are skipped, as are
    /// targets for which `is_live` is false.
    pub(crate) fn to_plan(&self, is_live: impl Fn(&CellId) -> bool) -> WritePlan {
        let mut plan = WritePlan::new(ActionKind::ConfirmedDrop);
        for target in self.targets.iter().filter(|id| is_live(id)) {
            for field in self.fields.iter().filter(|f| !is_empty_value(&f.value)) {
                plan.writes.push(PlannedWrite::set(target.clone(), &field.key, field.value.clone()));
            }
        }
        plan
    }
}

/// Result of a drop, as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Written directly; carries the commit summary.
    Applied(crate::timeline::CommitSummary),
    /// A confirmation is now open.
    NeedsConfirmation(PendingDrop),
    /// Nothing to do (empty group or item list).
    Ignored,
}

/// What the timeline should do with a drop.
#[derive(Debug)]
pub(crate) enum DropPlan {
    Direct(WritePlan),
    Confirm(PendingDrop),
    Ignored,
}

/// Cells a drop applies to: the selection when the drop cell is part of it, or
/// when mass-assign mode holds a selection; otherwise just the drop cell.
pub fn drop_targets(drop_cell: &CellId, selected: &[CellId], mode: SelectionMode) -> Vec<CellId> {
    let in_selection = selected.contains(drop_cell);
    let mass = mode == SelectionMode::MassAssign && !selected.is_empty();
    if in_selection || mass {
        selected.to_vec()
    } else {
        vec![drop_cell.clone()]
    }
}

/// Value written for a field dropped without an explicit value.
///
/// The descriptor's default wins, then the pre-configured defaults map, then
/// the catalog item's type default, then an empty string.
pub fn resolve_default(key: &str, explicit: Option<&Value>, defaults: &FieldMap, catalog: &AttributeCatalog) -> Value {
    if let Some(v) = explicit.filter(|v| !v.is_null()) {
        return v.clone();
    }
    if let Some(v) = defaults.get(key).filter(|v| !v.is_null()) {
        return v.clone();
    }
    match catalog.item(key) {
        Some(item) => item
            .default_value
            .clone()
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| item.item_type.empty_value()),
        None => Value::String(String::new()),
    }
}

pub(crate) fn plan_drop(
    content: &ContentDescriptor,
    drop_cell: &CellId,
    mode: SelectionMode,
    ctx: &PlanContext<'_>,
    defaults: &FieldMap,
    revision: u64,
) -> Result<DropPlan, EngineError> {
    if !ctx.contains(drop_cell) {
        return Err(EngineError::UnknownCell(drop_cell.clone()));
    }
    let targets: Vec<CellId> = drop_targets(drop_cell, &ctx.live_selection(), mode);

    let (fields, source) = match content {
        ContentDescriptor::Single { key, default_value, .. } => {
            check_assignable(key, ctx.catalog)?;
            let value = resolve_default(key, default_value.as_ref(), defaults, ctx.catalog);
            let mut plan = WritePlan::new(ActionKind::Drop);
            for id in targets {
                plan.writes.push(PlannedWrite::set(id, key, value.clone()));
            }
            return Ok(DropPlan::Direct(plan));
        }
        ContentDescriptor::Multi { items } => {
            let fields = items
                .iter()
                .map(|item| PendingField {
                    key: item.key.clone(),
                    label: item.label.clone(),
                    value: resolve_default(&item.key, item.default_value.as_ref(), defaults, ctx.catalog),
                })
                .collect::<Vec<_>>();
            (fields, PendingSource::Multi)
        }
        ContentDescriptor::Grouped { group } => {
            let fields = group
                .fields
                .iter()
                .map(|f| PendingField {
                    key: f.key.clone(),
                    label: ctx.catalog.item(&f.key).map(|i| i.label.clone()).unwrap_or_else(|| f.key.clone()),
                    value: f.value.clone(),
                })
                .collect::<Vec<_>>();
            (fields, PendingSource::Grouped { preset_id: group.id.clone(), name: group.name.clone() })
        }
    };

    if fields.is_empty() {
        log::warn!("drop on {} carried no fields, ignoring", drop_cell);
        return Ok(DropPlan::Ignored);
    }
    for field in &fields {
        check_assignable(&field.key, ctx.catalog)?;
    }

    let mut conflicts = Vec::new();
    for id in &targets {
        for field in &fields {
            if let Some(current) = ctx.store.get(id, &field.key).filter(|v| !is_empty_value(v)) {
                conflicts.push(Conflict { cell_id: id.clone(), field: field.key.clone(), current: current.clone() });
            }
        }
    }

    Ok(DropPlan::Confirm(PendingDrop {
        drop_cell: drop_cell.clone(),
        targets,
        fields,
        conflicts,
        source,
        revision,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeItem, AttributeSection, ItemType};
    use serde_json::json;

    fn id(s: &str) -> CellId {
        CellId::from(s)
    }

    fn catalog() -> AttributeCatalog {
        let mut lamp = AttributeItem::new("lampPower", "Lamp power", ItemType::Slider);
        lamp.default_value = Some(json!(600));
        AttributeCatalog::new(vec![AttributeSection {
            id: "env".into(),
            label: "Environment".into(),
            icon: None,
            items: vec![
                AttributeItem::new("temperature", "Temperature", ItemType::Number),
                AttributeItem::new("organic", "Organic", ItemType::Checkbox),
                lamp,
            ],
        }])
    }

    #[test]
    fn test_drop_targets() {
        let sel = vec![id("day-1"), id("day-2")];
        assert_eq!(drop_targets(&id("day-2"), &sel, SelectionMode::Normal), sel);
        assert_eq!(drop_targets(&id("day-5"), &sel, SelectionMode::Normal), vec![id("day-5")]);
        assert_eq!(drop_targets(&id("day-5"), &sel, SelectionMode::MassAssign), sel);
        assert_eq!(drop_targets(&id("day-5"), &[], SelectionMode::MassAssign), vec![id("day-5")]);
    }

    #[test]
    fn test_default_resolution_order() {
        let cat = catalog();
        let mut defaults = FieldMap::new();
        defaults.insert("temperature".into(), json!(22));

        assert_eq!(resolve_default("temperature", Some(&json!(18)), &defaults, &cat), json!(18));
        assert_eq!(resolve_default("temperature", None, &defaults, &cat), json!(22));
        assert_eq!(resolve_default("temperature", Some(&Value::Null), &FieldMap::new(), &cat), json!(0));
        assert_eq!(resolve_default("lampPower", None, &FieldMap::new(), &cat), json!(600));
        assert_eq!(resolve_default("organic", None, &FieldMap::new(), &cat), json!(false));
        assert_eq!(resolve_default("notes", None, &FieldMap::new(), &cat), json!(""));
        // An explicit empty string is a real default
        assert_eq!(resolve_default("temperature", Some(&json!("")), &defaults, &cat), json!(""));
    }

    #[test]
    fn test_pending_edits() {
        let mut pending = PendingDrop {
            drop_cell: id("day-1"),
            targets: vec![id("day-1"), id("day-2")],
            fields: vec![
                PendingField { key: "a".into(), label: "A".into(), value: json!(1) },
                PendingField { key: "b".into(), label: "B".into(), value: json!("") },
            ],
            conflicts: vec![Conflict { cell_id: id("day-2"), field: "a".into(), current: json!(9) }],
            source: PendingSource::Multi,
            revision: 1,
        };

        // "b" is empty, so only "a" is written
        assert_eq!(pending.to_plan(|_| true).writes.len(), 2);
        assert!(pending.set_value("b", json!("x")));
        assert!(!pending.set_value("zzz", json!(1)));
        assert_eq!(pending.to_plan(|_| true).writes.len(), 4);
        assert_eq!(pending.to_plan(|c| c.as_str() == "day-1").writes.len(), 2);

        assert!(pending.remove_field("a"));
        assert!(!pending.has_conflicts());
        assert_eq!(pending.to_plan(|_| true).kind, ActionKind::ConfirmedDrop);
    }
}
