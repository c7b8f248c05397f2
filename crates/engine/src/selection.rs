//! Selection controller.
//!
//! Tracks which cells are selected, independently of their data, and runs the
//! pointer state machine:
//!
//! ```text
//! Idle --down--> PotentialDrag --move > threshold--> Dragging
//!   ^                 |                                  |
//!   +------up (click)-+------------up (marquee)----------+
//! ```
//!
//! The selection is never updated while dragging; the marquee is resolved
//! once, on pointer-up. Global move/up listeners are represented by a
//! `CaptureGuard` held by the drag session, so they are detached on release,
//! on cancellation, on reset and when the controller itself is dropped.

use indexmap::IndexSet;

use pipegrid_core::{Cell, CellId, Point, Rect};

/// Pointer travel, in screen pixels, before a press becomes a marquee drag.
pub const DEFAULT_DRAG_THRESHOLD: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Clicking a cell opens its entry surface.
    #[default]
    Normal,
    /// Clicking a cell toggles it in the selection.
    MassAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Ctrl on Windows/Linux, Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, shift: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true, shift: false };
    pub const SHIFT: Modifiers = Modifiers { ctrl: false, shift: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    PotentialDrag,
    Dragging,
}

/// Marquee rectangle for overlay rendering, in scroll-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Marquee {
    pub origin: Point,
    pub current: Point,
    /// False until the drag threshold has been crossed.
    pub visible: bool,
}

impl Marquee {
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.origin, self.current)
    }
}

/// A realized cell box, in scroll-relative coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CellBox {
    pub id: CellId,
    pub rect: Rect,
}

impl CellBox {
    pub fn new(id: impl Into<CellId>, rect: Rect) -> Self {
        Self { id: id.into(), rect }
    }
}

/// Snapshot of the selection for hosts and telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub selected_ids: Vec<CellId>,
    pub mode: SelectionMode,
    pub marquee: Option<Marquee>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Unchanged,
    Changed,
    /// A plain click in normal mode: the host opens the entry surface for this cell.
    OpenEntry(CellId),
}

/// Releases the host's global pointer listeners when dropped.
pub struct CaptureGuard {
    detach: Option<Box<dyn FnOnce()>>,
}

impl CaptureGuard {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self { detach: Some(Box::new(detach)) }
    }

    /// A guard with nothing to release.
    pub fn noop() -> Self {
        Self { detach: None }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGuard").field("armed", &self.detach.is_some()).finish()
    }
}

/// Host hook that attaches global move/up listeners for the duration of a drag.
pub trait PointerCapture {
    fn attach(&mut self) -> CaptureGuard;
}

#[derive(Debug)]
struct DragSession {
    origin_screen: Point,
    origin_content: Point,
    current_content: Point,
    origin_cell: Option<CellId>,
    modifiers: Modifiers,
    dragging: bool,
    _capture: CaptureGuard,
}

impl DragSession {
    fn marquee(&self) -> Marquee {
        Marquee {
            origin: self.origin_content,
            current: self.current_content,
            visible: self.dragging,
        }
    }
}

pub struct SelectionController {
    selected: IndexSet<CellId>,
    mode: SelectionMode,
    /// Ordinal anchor for shift-click ranges.
    anchor: Option<CellId>,
    threshold: f32,
    session: Option<DragSession>,
    capture: Option<Box<dyn PointerCapture>>,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_DRAG_THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            selected: IndexSet::new(),
            mode: SelectionMode::Normal,
            anchor: None,
            threshold: threshold.max(0.0),
            session: None,
            capture: None,
        }
    }

    pub fn set_capture(&mut self, capture: Box<dyn PointerCapture>) {
        self.capture = Some(capture);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    // ===== Queries =====

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selected(&self) -> impl Iterator<Item = &CellId> {
        self.selected.iter()
    }

    pub fn selected_ids(&self) -> Vec<CellId> {
        self.selected.iter().cloned().collect()
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn phase(&self) -> DragPhase {
        match &self.session {
            None => DragPhase::Idle,
            Some(s) if s.dragging => DragPhase::Dragging,
            Some(_) => DragPhase::PotentialDrag,
        }
    }

    /// Current marquee while a press is in flight.
    pub fn marquee(&self) -> Option<Marquee> {
        self.session.as_ref().map(DragSession::marquee)
    }

    pub fn state(&self) -> SelectionState {
        SelectionState {
            selected_ids: self.selected_ids(),
            mode: self.mode,
            marquee: self.marquee(),
        }
    }

    // ===== Mutations =====

    /// Switch mode. The selection is cleared either way.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.cancel_drag();
        self.mode = mode;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    /// Replace the selection.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = CellId>) {
        self.selected = ids.into_iter().collect();
        self.anchor = self.selected.first().cloned();
    }

    pub fn select_all(&mut self, cells: &[Cell]) {
        self.set_selection(cells.iter().map(|c| c.id.clone()));
    }

    /// Drop ids that are no longer part of the timeline.
    pub fn retain(&mut self, mut keep: impl FnMut(&CellId) -> bool) {
        self.selected.retain(|id| keep(id));
        if self.anchor.as_ref().is_some_and(|a| !keep(a)) {
            self.anchor = None;
        }
    }

    /// Clear the selection and cancel any drag. Called on every config change.
    pub fn reset(&mut self) {
        self.cancel_drag();
        self.clear();
    }

    /// Click on a cell, outside of the pointer state machine.
    pub fn click(&mut self, cell: &CellId, modifiers: Modifiers, cells: &[Cell]) -> SelectionOutcome {
        if modifiers.shift {
            if let Some(range) = self.anchor.as_ref().and_then(|a| ordinal_range(cells, a, cell)) {
                if !modifiers.ctrl {
                    self.selected.clear();
                }
                self.selected.extend(range);
                return SelectionOutcome::Changed;
            }
        }

        if modifiers.ctrl || self.mode == SelectionMode::MassAssign {
            if !self.selected.shift_remove(cell) {
                self.selected.insert(cell.clone());
            }
            self.anchor = Some(cell.clone());
            return SelectionOutcome::Changed;
        }

        self.selected.clear();
        self.selected.insert(cell.clone());
        self.anchor = Some(cell.clone());
        SelectionOutcome::OpenEntry(cell.clone())
    }

    // ===== Pointer state machine =====

    /// Primary-button press. `cell` is the cell under the pointer, if any.
    pub fn pointer_down(&mut self, screen: Point, content: Point, cell: Option<CellId>, modifiers: Modifiers) {
        self.cancel_drag();

        let capture = match self.capture.as_mut() {
            Some(c) => c.attach(),
            None => CaptureGuard::noop(),
        };
        self.session = Some(DragSession {
            origin_screen: screen,
            origin_content: content,
            current_content: content,
            origin_cell: cell,
            modifiers,
            dragging: false,
            _capture: capture,
        });
    }

    /// Pointer movement while pressed. Returns true when the marquee is visible.
    pub fn pointer_move(&mut self, screen: Point, content: Point) -> bool {
        let threshold = self.threshold;
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.current_content = content;
        if !session.dragging && session.origin_screen.distance(screen) > threshold {
            log::debug!("marquee drag started");
            session.dragging = true;
        }
        session.dragging
    }

    /// Release. Resolves the marquee against `boxes`, or the press as a click.
    pub fn pointer_up(&mut self, screen: Point, content: Point, boxes: &[CellBox], cells: &[Cell]) -> SelectionOutcome {
        self.pointer_move(screen, content);
        let Some(session) = self.session.take() else {
            return SelectionOutcome::Unchanged;
        };

        if session.dragging {
            let area = session.marquee().rect();
            let hits: IndexSet<CellId> = boxes
                .iter()
                .filter(|b| area.intersects(&b.rect))
                .map(|b| b.id.clone())
                .collect();
            log::debug!("marquee selected {} cell(s)", hits.len());
            self.anchor = hits.first().cloned();
            self.selected = hits;
            return SelectionOutcome::Changed;
        }

        let Some(cell) = session.origin_cell else {
            return SelectionOutcome::Unchanged;
        };
        // A release that never crossed the threshold selects exactly the origin
        // cell, whatever the mode; it never toggles.
        self.selected.clear();
        self.selected.insert(cell.clone());
        self.anchor = Some(cell.clone());
        let plain = !session.modifiers.ctrl && !session.modifiers.shift;
        if plain && self.mode == SelectionMode::Normal {
            SelectionOutcome::OpenEntry(cell)
        } else {
            SelectionOutcome::Changed
        }
    }

    /// Pointer capture lost (focus loss, window blur). The selection is left untouched.
    pub fn cancel_drag(&mut self) {
        if self.session.take().is_some() {
            log::debug!("drag cancelled");
        }
    }
}

/// Ids between two cells (inclusive, by ordinal), or None if either is missing.
fn ordinal_range(cells: &[Cell], a: &CellId, b: &CellId) -> Option<Vec<CellId>> {
    let ia = cells.iter().position(|c| &c.id == a)?;
    let ib = cells.iter().position(|c| &c.id == b)?;
    let (lo, hi) = (ia.min(ib), ia.max(ib));
    Some(cells[lo..=hi].iter().map(|c| c.id.clone()).collect())
}
