//! The timeline: cells, field data, selection, history and presets behind one
//! single-writer API.
//!
//! Every mutation follows the same path: plan (validate, no writes), then
//! `apply`, which captures prior values, writes through the store, emits one
//! `DataChanged` per field and pushes one `ActionRecord`. A plan that exists
//! cannot fail halfway, so undo always reverses a whole operator action.

use rustc_hash::FxHashSet;
use serde_json::Value;

use pipegrid_core::{Cell, CellId, ConfigField, Point, TimelineConfig};

use crate::attributes::AttributeCatalog;
use crate::bulk::{check_assignable, BulkIntent, PlanContext, PlannedWrite, StagedIntent, WritePlan};
use crate::clipboard::Clipboard;
use crate::dispatch::{self, ContentDescriptor, DropOutcome, DropPlan, PendingDrop};
use crate::error::EngineError;
use crate::events::{ConfigChangedEvent, DataChangedEvent, EventCallback, TimelineEvent};
use crate::generator::{generate_with_report, GenerationStatus};
use crate::history::{ActionHistory, ActionKind, ActionRecord, FieldChange, PriorValue};
use crate::presets::{GroupedPreset, PresetDraft, PresetField, PresetRegistry};
use crate::selection::{
    CellBox, DragPhase, Modifiers, PointerCapture, SelectionController, SelectionMode, SelectionOutcome,
    SelectionState,
};
use crate::store::{CellDataStore, CellFields, FieldMap};

/// What a commit did.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    /// Id of the pushed record; None when nothing was written.
    pub record_id: Option<u64>,
    pub kind: ActionKind,
    pub cells: usize,
    pub changes: usize,
}

/// What an undo did.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoSummary {
    pub record_id: u64,
    pub kind: ActionKind,
    pub restored: usize,
    /// Changes whose cell no longer exists.
    pub skipped: usize,
}

pub struct Timeline {
    config: TimelineConfig,
    cells: Vec<Cell>,
    live: FxHashSet<CellId>,
    status: GenerationStatus,
    /// Bumped on every reconfiguration.
    revision: u64,
    store: CellDataStore,
    selection: SelectionController,
    history: ActionHistory,
    presets: PresetRegistry,
    catalog: AttributeCatalog,
    defaults: FieldMap,
    pending: Option<PendingDrop>,
    clipboard: Option<Clipboard>,
    on_event: Option<EventCallback>,
}

impl Timeline {
    pub fn new(config: TimelineConfig) -> Self {
        Self::with_selection(config, SelectionController::new())
    }

    /// Use a custom marquee drag threshold (pixels).
    pub fn with_threshold(config: TimelineConfig, threshold: f32) -> Self {
        Self::with_selection(config, SelectionController::with_threshold(threshold))
    }

    fn with_selection(config: TimelineConfig, selection: SelectionController) -> Self {
        let mut timeline = Self {
            config: TimelineConfig::default(),
            cells: Vec::new(),
            live: FxHashSet::default(),
            status: GenerationStatus::ConfigurationIncomplete,
            revision: 0,
            store: CellDataStore::new(),
            selection,
            history: ActionHistory::new(),
            presets: PresetRegistry::new(),
            catalog: AttributeCatalog::default(),
            defaults: FieldMap::new(),
            pending: None,
            clipboard: None,
            on_event: None,
        };
        timeline.set_config(config);
        timeline
    }

    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.on_event = Some(callback);
    }

    fn emit(&mut self, event: TimelineEvent) {
        if let Some(cb) = self.on_event.as_mut() {
            cb(event);
        }
    }

    // ===== Configuration =====

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Replace the config and regenerate the cells wholesale.
    ///
    /// Clears the selection and cancels any drag. Stored field data is kept:
    /// it is keyed by stable ids, so cells that come back find their data.
    pub fn set_config(&mut self, config: TimelineConfig) {
        let generation = generate_with_report(&config);
        match generation.status {
            GenerationStatus::ConfigurationIncomplete => log::debug!("timeline needs configuration"),
            GenerationStatus::InvalidDates => log::warn!("invalid date range, timeline is empty"),
            _ => {}
        }

        self.config = config;
        self.live = generation.cells.iter().map(|c| c.id.clone()).collect();
        self.cells = generation.cells;
        self.status = generation.status;
        self.revision += 1;
        log::debug!("timeline regenerated: {} cells (revision {})", self.cells.len(), self.revision);

        let had_selection = !self.selection.is_empty();
        let had_drag = self.selection.phase() != DragPhase::Idle;
        self.selection.reset();
        if had_drag {
            self.emit(TimelineEvent::MarqueeChanged(None));
        }
        if had_selection {
            self.emit(TimelineEvent::SelectionChanged(Vec::new()));
        }
    }

    /// Operator edit of a count bound. The value is clamped to the kind's cap,
    /// reported through `ConfigChanged`, and the timeline regenerates.
    pub fn edit_bounds(&mut self, field: ConfigField, value: u32) -> u32 {
        let mut config = self.config.clone();
        let stored = config.set_count(field, value);
        if stored < value {
            log::warn!("{} = {} exceeds the cap, clamped to {}", field.as_str(), value, stored);
        }
        self.emit(TimelineEvent::ConfigChanged(ConfigChangedEvent { field, value: stored }));
        self.set_config(config);
        stored
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.live.contains(id)
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ===== Data =====

    pub fn store(&self) -> &CellDataStore {
        &self.store
    }

    pub fn fields(&self, id: &CellId) -> Option<&CellFields> {
        self.store.get_fields(id)
    }

    pub fn has_data(&self, id: &CellId) -> bool {
        self.store.has_data(id)
    }

    /// Load persisted cell data (either encoding). Not recorded in history.
    pub fn import_data(&mut self, entries: &[Value]) -> usize {
        self.store.import(entries)
    }

    pub fn export_data(&self) -> Vec<Value> {
        self.store.export()
    }

    pub fn set_catalog(&mut self, catalog: AttributeCatalog) {
        self.store.set_completion_base(catalog.assignable_count());
        self.catalog = catalog;
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    /// Pre-configured per-field defaults used when dropped content has none.
    pub fn set_defaults(&mut self, defaults: FieldMap) {
        self.defaults = defaults;
    }

    pub fn defaults(&self) -> &FieldMap {
        &self.defaults
    }

    /// Value of a computed field: the product of its numeric source fields.
    pub fn computed_value(&self, id: &CellId, key: &str) -> Option<Value> {
        let item = self.catalog.item(key).filter(|i| i.is_computed())?;
        if item.derived_from.is_empty() {
            return None;
        }
        let mut product = 1.0_f64;
        for source in &item.derived_from {
            let v = self.store.get(id, source)?;
            let n = v.as_f64().or_else(|| v.as_str()?.trim().parse().ok())?;
            product *= n;
        }
        serde_json::Number::from_f64(product).map(Value::Number)
    }

    /// Number of cells holding at least one value.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| self.store.has_data(&c.id)).count()
    }

    /// Share of cells holding data, 0..=100.
    pub fn completion_percent(&self) -> u8 {
        if self.cells.is_empty() {
            return 0;
        }
        (self.filled_count() as f64 / self.cells.len() as f64 * 100.0).round() as u8
    }

    // ===== Selection =====

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn set_pointer_capture(&mut self, capture: Box<dyn PointerCapture>) {
        self.selection.set_capture(capture);
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        let had_selection = !self.selection.is_empty();
        self.selection.set_mode(mode);
        if had_selection {
            self.emit(TimelineEvent::SelectionChanged(Vec::new()));
        }
    }

    pub fn click(&mut self, id: &CellId, modifiers: Modifiers) -> SelectionOutcome {
        if !self.contains(id) {
            log::warn!("click on unknown cell {}", id);
            return SelectionOutcome::Unchanged;
        }
        let outcome = self.selection.click(id, modifiers, &self.cells);
        self.selection_changed();
        outcome
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.cells);
        self.selection_changed();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.selection_changed();
    }

    /// Replace the selection. Unknown ids are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = CellId>) {
        let ids: Vec<CellId> = ids.into_iter().filter(|id| self.contains(id)).collect();
        self.selection.set_selection(ids);
        self.selection_changed();
    }

    pub fn pointer_down(&mut self, screen: Point, content: Point, cell: Option<CellId>, modifiers: Modifiers) {
        let cell = cell.filter(|id| self.contains(id));
        self.selection.pointer_down(screen, content, cell, modifiers);
    }

    pub fn pointer_move(&mut self, screen: Point, content: Point) {
        if self.selection.pointer_move(screen, content) {
            let marquee = self.selection.marquee();
            self.emit(TimelineEvent::MarqueeChanged(marquee));
        }
    }

    /// Release. `boxes` are the realized cell boxes in scroll-relative coordinates.
    pub fn pointer_up(&mut self, screen: Point, content: Point, boxes: &[CellBox]) -> SelectionOutcome {
        let was_dragging = self.selection.phase() == DragPhase::Dragging;
        let outcome = self.selection.pointer_up(screen, content, boxes, &self.cells);
        if was_dragging {
            self.emit(TimelineEvent::MarqueeChanged(None));
        }
        if outcome != SelectionOutcome::Unchanged {
            self.selection_changed();
        }
        outcome
    }

    /// Pointer capture lost. No selection change.
    pub fn cancel_drag(&mut self) {
        let was_dragging = self.selection.phase() == DragPhase::Dragging;
        self.selection.cancel_drag();
        if was_dragging {
            self.emit(TimelineEvent::MarqueeChanged(None));
        }
    }

    fn selection_changed(&mut self) {
        let ids = self.selection.selected_ids();
        self.emit(TimelineEvent::SelectionChanged(ids));
    }

    // ===== Commit path =====

    fn plan_context<'a>(&'a self, selected: &'a [CellId]) -> PlanContext<'a> {
        PlanContext {
            cells: &self.cells,
            selected,
            store: &self.store,
            catalog: &self.catalog,
        }
    }

    fn apply(&mut self, plan: WritePlan) -> CommitSummary {
        let kind = plan.kind;
        let cells = plan.cell_count();
        let revision = self.revision;

        let mut changes = Vec::with_capacity(plan.writes.len());
        for write in plan.writes {
            let previous = self.store.set_field(&write.cell_id, &write.field, write.value.clone());
            changes.push(FieldChange {
                cell_id: write.cell_id.clone(),
                field: write.field.clone(),
                previous: PriorValue::from_option(previous),
            });
            self.emit(TimelineEvent::DataChanged(DataChangedEvent {
                revision,
                cell_id: write.cell_id,
                field: write.field,
                value: write.value,
            }));
        }

        let count = changes.len();
        if count == 0 {
            return CommitSummary { record_id: None, kind, cells, changes: 0 };
        }
        let record = self.history.record(kind, changes);
        let record_id = record.id;
        self.history.push(record);
        log::debug!("{}: {} change(s) on {} cell(s)", kind.as_str(), count, cells);

        CommitSummary { record_id: Some(record_id), kind, cells, changes: count }
    }

    fn notice(&mut self, summary: &CommitSummary) {
        let msg = format!("{}: {} change(s) on {} cell(s)", summary.kind.as_str(), summary.changes, summary.cells);
        self.emit(TimelineEvent::Notice(msg));
    }

    // ===== Drops =====

    /// Content dropped onto `drop_cell`.
    ///
    /// Single fields are written at once; Multi and Grouped content opens a
    /// confirmation that replaces any confirmation already open.
    pub fn drop_content(&mut self, content: &ContentDescriptor, drop_cell: &CellId) -> Result<DropOutcome, EngineError> {
        let selected = self.selection.selected_ids();
        let plan = {
            let ctx = self.plan_context(&selected);
            dispatch::plan_drop(content, drop_cell, self.selection.mode(), &ctx, &self.defaults, self.revision)?
        };

        match plan {
            DropPlan::Direct(plan) => {
                let summary = self.apply(plan);
                self.notice(&summary);
                Ok(DropOutcome::Applied(summary))
            }
            DropPlan::Confirm(pending) => {
                if self.pending.is_some() {
                    log::debug!("replacing open confirmation");
                }
                self.pending = Some(pending.clone());
                Ok(DropOutcome::NeedsConfirmation(pending))
            }
            DropPlan::Ignored => Ok(DropOutcome::Ignored),
        }
    }

    pub fn pending_drop(&self) -> Option<&PendingDrop> {
        self.pending.as_ref()
    }

    /// Edit values (or untick fields) before confirming.
    pub fn pending_drop_mut(&mut self) -> Option<&mut PendingDrop> {
        self.pending.as_mut()
    }

    /// Write the open confirmation. A confirmation made before the last
    /// reconfiguration is closed unwritten with `StaleIntent`.
    pub fn confirm_drop(&mut self) -> Result<CommitSummary, EngineError> {
        let pending = self.pending.as_ref().ok_or(EngineError::NoPendingDrop)?;
        if pending.revision != self.revision {
            let staged = pending.revision;
            self.pending = None;
            log::warn!("confirmation dropped: timeline reconfigured since the drop");
            return Err(EngineError::StaleIntent { staged, current: self.revision });
        }
        for field in &pending.fields {
            check_assignable(&field.key, &self.catalog)?;
        }
        let Some(pending) = self.pending.take() else {
            return Err(EngineError::NoPendingDrop);
        };
        let plan = pending.to_plan(|id| self.live.contains(id));
        let summary = self.apply(plan);
        self.notice(&summary);
        Ok(summary)
    }

    /// Close the open confirmation without writing anything.
    pub fn dismiss_drop(&mut self) -> Result<PendingDrop, EngineError> {
        self.pending.take().ok_or(EngineError::NoPendingDrop)
    }

    // ===== Entry surface =====

    /// Write (or delete with `None`) one field of one cell.
    pub fn edit_field(&mut self, id: &CellId, key: &str, value: Option<Value>) -> Result<CommitSummary, EngineError> {
        self.edit_fields(id, [(key.to_string(), value)])
    }

    /// Write several fields of one cell as one undoable action.
    pub fn edit_fields(
        &mut self,
        id: &CellId,
        values: impl IntoIterator<Item = (String, Option<Value>)>,
    ) -> Result<CommitSummary, EngineError> {
        if !self.contains(id) {
            return Err(EngineError::UnknownCell(id.clone()));
        }
        let mut plan = WritePlan::new(ActionKind::Edit);
        for (key, value) in values {
            check_assignable(&key, &self.catalog)?;
            plan.writes.push(match value {
                Some(v) => PlannedWrite::set(id.clone(), &key, v),
                None => PlannedWrite::delete(id.clone(), &key),
            });
        }
        Ok(self.apply(plan))
    }

    // ===== Bulk =====

    /// Plan an intent without writing. Commit it with `commit`.
    pub fn stage(&self, intent: BulkIntent) -> Result<StagedIntent, EngineError> {
        let selected = self.selection.selected_ids();
        let preview = intent.plan(&self.plan_context(&selected))?;
        log::debug!("staged {} ({} write(s))", intent.kind().as_str(), preview.writes.len());
        Ok(StagedIntent { intent, revision: self.revision, preview })
    }

    /// Apply a staged intent exactly as previewed.
    pub fn commit(&mut self, staged: StagedIntent) -> Result<CommitSummary, EngineError> {
        if staged.revision != self.revision {
            return Err(EngineError::StaleIntent { staged: staged.revision, current: self.revision });
        }
        let clears = matches!(staged.intent, BulkIntent::ClearCells { .. });
        let summary = self.apply(staged.preview);
        if clears && !self.selection.is_empty() {
            self.selection.clear();
            self.selection_changed();
        }
        self.notice(&summary);
        Ok(summary)
    }

    fn run(&mut self, intent: BulkIntent) -> Result<CommitSummary, EngineError> {
        let staged = self.stage(intent)?;
        self.commit(staged)
    }

    pub fn assign_to_selection(&mut self, key: &str, value: Value) -> Result<CommitSummary, EngineError> {
        self.run(BulkIntent::AssignSelection { key: key.to_string(), value })
    }

    pub fn assign_to_range(
        &mut self,
        key: &str,
        start: &CellId,
        end: &CellId,
        value: Value,
    ) -> Result<CommitSummary, EngineError> {
        self.run(BulkIntent::AssignRange { key: key.to_string(), start: start.clone(), end: end.clone(), value })
    }

    pub fn assign_to_all(&mut self, key: &str, value: Value) -> Result<CommitSummary, EngineError> {
        self.run(BulkIntent::AssignAll { key: key.to_string(), value })
    }

    /// Copy `key` from `source` to the selection.
    pub fn assign_from_source(&mut self, source: &CellId, key: &str) -> Result<CommitSummary, EngineError> {
        self.run(BulkIntent::AssignFromSource { source: source.clone(), key: key.to_string(), targets: None })
    }

    // ===== Clipboard =====

    /// Copy the fields of `ids` (None = selection). Returns the number of cells copied.
    pub fn copy_cells(&mut self, ids: Option<Vec<CellId>>) -> Result<usize, EngineError> {
        let selected = self.selection.selected_ids();
        let targets = self.plan_context(&selected).targets(ids.as_deref())?;
        let clip = Clipboard::capture(&targets, &self.store).ok_or(EngineError::EmptySelection)?;
        let n = clip.len();
        self.clipboard = Some(clip);
        Ok(n)
    }

    /// Paste onto `ids` (None = selection).
    pub fn paste(&mut self, ids: Option<Vec<CellId>>) -> Result<CommitSummary, EngineError> {
        let clip = self.clipboard.as_ref().ok_or(EngineError::NothingToPaste)?;
        let selected = self.selection.selected_ids();
        let targets = self.plan_context(&selected).targets(ids.as_deref())?;
        let plan = clip.plan_paste(&targets);
        let summary = self.apply(plan);
        self.notice(&summary);
        Ok(summary)
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    // ===== Undo =====

    /// Reverse the most recent action. Changes on vanished cells are skipped.
    pub fn undo(&mut self) -> Option<UndoSummary> {
        let record = self.history.undo()?;
        let (record_id, kind) = (record.id, record.kind);
        let revision = self.revision;

        let mut restored = 0;
        let mut skipped = 0;
        for change in record.changes.into_iter().rev() {
            if !self.contains(&change.cell_id) {
                skipped += 1;
                continue;
            }
            let value = change.previous.into_option();
            self.store.set_field(&change.cell_id, &change.field, value.clone());
            self.emit(TimelineEvent::DataChanged(DataChangedEvent {
                revision,
                cell_id: change.cell_id,
                field: change.field,
                value,
            }));
            restored += 1;
        }
        log::debug!("undo {} #{}: restored {}, skipped {}", kind.as_str(), record_id, restored, skipped);

        Some(UndoSummary { record_id, kind, restored, skipped })
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn history(&self) -> &[ActionRecord] {
        self.history.records()
    }

    // ===== Presets =====

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn presets_mut(&mut self) -> &mut PresetRegistry {
        &mut self.presets
    }

    pub fn create_preset(&mut self, draft: PresetDraft) -> Result<GroupedPreset, EngineError> {
        for field in &draft.fields {
            check_assignable(&field.key, &self.catalog)?;
        }
        self.presets.create(draft)
    }

    pub fn update_preset(&mut self, id: &str, draft: PresetDraft) -> Result<GroupedPreset, EngineError> {
        for field in &draft.fields {
            check_assignable(&field.key, &self.catalog)?;
        }
        self.presets.update(id, draft)
    }

    pub fn remove_preset(&mut self, id: &str) -> Result<GroupedPreset, EngineError> {
        self.presets.remove(id)
    }

    /// Save a cell's current non-empty fields as a new grouped preset.
    pub fn preset_from_cell(&mut self, id: &CellId, name: &str, emoji: Option<&str>) -> Result<GroupedPreset, EngineError> {
        if !self.contains(id) {
            return Err(EngineError::UnknownCell(id.clone()));
        }
        let fields: Vec<PresetField> = match self.store.get_fields(id) {
            Some(entry) => entry
                .filled_keys()
                .filter(|k| !self.catalog.is_computed(k))
                .filter_map(|k| entry.get(k).map(|v| PresetField::new(k, v.clone())))
                .collect(),
            None => Vec::new(),
        };
        if fields.is_empty() {
            return Err(EngineError::InvalidPreset(format!("cell '{id}' has no data")));
        }

        let mut draft = PresetDraft::new(name);
        draft.emoji = emoji.map(str::to_string);
        draft.fields = fields;
        self.create_preset(draft)
    }

    /// Drop a stored preset onto a cell. Always goes through confirmation.
    pub fn apply_preset(&mut self, preset_id: &str, drop_cell: &CellId) -> Result<DropOutcome, EngineError> {
        let group = self
            .presets
            .get(preset_id)
            .cloned()
            .ok_or_else(|| EngineError::PresetNotFound(preset_id.to_string()))?;
        self.drop_content(&ContentDescriptor::Grouped { group }, drop_cell)
    }
}
