//! End-to-end operator scenarios against the public `Timeline` API.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use pipegrid_core::{Cell, CellDetail, CellId, ConfigField, Phase, Point, Rect, TimelineConfig};
use pipegrid_engine::selection::CaptureGuard;
use pipegrid_engine::{
    generate, CellBox, ContentDescriptor, DropItem, DropOutcome, EngineError, EventCollector, GenerationStatus,
    Modifiers, PointerCapture, PresetDraft, SelectionMode, SelectionOutcome, Timeline, TimelineEvent,
};

fn id(s: &str) -> CellId {
    CellId::from(s)
}

fn p(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

fn ids(cells: &[Cell]) -> Vec<&str> {
    cells.iter().map(|c| c.id.as_str()).collect()
}

/// Row-major gapless grid of 40x30 boxes.
fn layout(cells: &[Cell], cols: usize) -> Vec<CellBox> {
    cells
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (row, col) = ((i / cols) as f32, (i % cols) as f32);
            CellBox::new(c.id.clone(), Rect::new(col * 40.0, row * 30.0, 40.0, 30.0))
        })
        .collect()
}

fn with_collector(tl: &mut Timeline) -> Rc<RefCell<EventCollector>> {
    let events = Rc::new(RefCell::new(EventCollector::new()));
    let sink = Rc::clone(&events);
    tl.set_event_callback(Box::new(move |e| sink.borrow_mut().push(e)));
    events
}

#[test]
fn date_range_is_inclusive() {
    let cells = generate(&TimelineConfig::date_range("2025-01-01", "2025-01-05"));
    assert_eq!(
        ids(&cells),
        vec![
            "date-2025-01-01",
            "date-2025-01-02",
            "date-2025-01-03",
            "date-2025-01-04",
            "date-2025-01-05"
        ]
    );
    assert_eq!(cells[0].label, "01/01");
}

#[test]
fn invalid_or_missing_bounds_degrade_to_empty() {
    let tl = Timeline::new(TimelineConfig::date_range("2025-02-10", "2025-02-01"));
    assert!(tl.cells().is_empty());
    assert_eq!(tl.status(), GenerationStatus::InvalidDates);

    let tl = Timeline::new(TimelineConfig::date_range("soon", "2025-02-01"));
    assert_eq!(tl.status(), GenerationStatus::InvalidDates);

    let tl = Timeline::new(TimelineConfig::default());
    assert!(tl.cells().is_empty());
    assert_eq!(tl.status(), GenerationStatus::ConfigurationIncomplete);
}

#[test]
fn caps_per_kind() {
    assert_eq!(generate(&TimelineConfig::hours(1000)).len(), 336);
    assert_eq!(generate(&TimelineConfig::days(1000)).len(), 365);
    assert_eq!(generate(&TimelineConfig::weeks(60)).len(), 52);
    assert_eq!(generate(&TimelineConfig::date_range("2025-01-01", "2027-01-01")).len(), 365);

    let hours = generate(&TimelineConfig::hours(336));
    assert_eq!(hours[0].label, "1h");
    assert_eq!(hours[335].label, "336h");
    let weeks = generate(&TimelineConfig::weeks(52));
    assert_eq!(weeks[51].label, "S52");
}

#[test]
fn default_phases() {
    let cells = generate(&TimelineConfig::phases(Vec::new()));
    assert_eq!(cells.len(), 12);
    assert_eq!(cells[0].id.as_str(), "phase-0");
    match &cells[11].detail {
        CellDetail::Phase { duration_days, .. } => assert_eq!(*duration_days, 14),
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn caller_phase_ids_never_collide() {
    let phase = |id: Option<&str>| Phase { id: id.map(String::from), name: String::new(), duration: None, glyph: None };
    let mut tl = Timeline::new(TimelineConfig::phases(vec![phase(Some("phase-1")), phase(None), phase(None)]));
    assert_eq!(ids(tl.cells()), vec!["phase-1", "phase-1-2", "phase-2"]);

    // Each cell owns its own field map
    tl.edit_field(&id("phase-1"), "temperature", Some(json!(22))).unwrap();
    assert!(!tl.has_data(&id("phase-1-2")));
}

#[test]
fn set_field_round_trip() {
    let mut tl = Timeline::new(TimelineConfig::days(3));
    tl.edit_field(&id("day-1"), "temperature", Some(json!(20))).unwrap();
    assert_eq!(tl.fields(&id("day-1")).unwrap().get("temperature"), Some(&json!(20)));
    assert!(tl.has_data(&id("day-1")));

    tl.edit_field(&id("day-1"), "temperature", None).unwrap();
    assert!(tl.fields(&id("day-1")).unwrap().get("temperature").is_none());
    assert!(!tl.has_data(&id("day-1")));
}

#[test]
fn marquee_selects_exactly_row_one() {
    let mut tl = Timeline::new(TimelineConfig::days(10));
    let events = with_collector(&mut tl);
    let boxes = layout(tl.cells(), 5);

    tl.pointer_down(p(300.0, 200.0), p(0.0, 0.0), Some(id("day-1")), Modifiers::NONE);
    tl.pointer_move(p(400.0, 215.0), p(100.0, 15.0));
    tl.pointer_move(p(500.0, 230.0), p(200.0, 30.0));
    // Nothing selected while dragging
    assert!(tl.selection().is_empty());

    let out = tl.pointer_up(p(500.0, 230.0), p(200.0, 30.0), &boxes);
    assert_eq!(out, SelectionOutcome::Changed);
    assert_eq!(
        tl.selection().selected_ids(),
        vec![id("day-1"), id("day-2"), id("day-3"), id("day-4"), id("day-5")]
    );

    let events = events.borrow();
    let marquees: Vec<_> = events
        .events()
        .iter()
        .filter_map(|e| match e {
            TimelineEvent::MarqueeChanged(m) => Some(*m),
            _ => None,
        })
        .collect();
    assert_eq!(marquees.len(), 3);
    assert!(marquees[0].is_some_and(|m| m.visible));
    assert_eq!(marquees[2], None);
    assert_eq!(events.last_selection().map(<[CellId]>::len), Some(5));
}

#[test]
fn click_without_threshold_selects_origin_cell() {
    let mut tl = Timeline::new(TimelineConfig::days(10));
    let boxes = layout(tl.cells(), 5);
    tl.set_selection(vec![id("day-1"), id("day-2")]);

    tl.pointer_down(p(45.0, 35.0), p(45.0, 35.0), Some(id("day-7")), Modifiers::NONE);
    tl.pointer_move(p(48.0, 38.0), p(48.0, 38.0));
    let out = tl.pointer_up(p(48.0, 38.0), p(48.0, 38.0), &boxes);
    assert_eq!(out, SelectionOutcome::OpenEntry(id("day-7")));
    assert_eq!(tl.selection().selected_ids(), vec![id("day-7")]);
}

#[test]
fn mass_assign_release_below_threshold_selects_only_origin() {
    let mut tl = Timeline::new(TimelineConfig::days(10));
    let boxes = layout(tl.cells(), 5);
    tl.set_mode(SelectionMode::MassAssign);
    tl.set_selection(vec![id("day-1"), id("day-2")]);

    tl.pointer_down(p(20.0, 15.0), p(20.0, 15.0), Some(id("day-1")), Modifiers::NONE);
    let out = tl.pointer_up(p(21.0, 15.0), p(21.0, 15.0), &boxes);
    assert_eq!(out, SelectionOutcome::Changed);
    assert_eq!(tl.selection().selected_ids(), vec![id("day-1")]);
}

#[derive(Default)]
struct Listeners(Rc<RefCell<i32>>);

impl PointerCapture for Listeners {
    fn attach(&mut self) -> CaptureGuard {
        *self.0.borrow_mut() += 1;
        let live = Rc::clone(&self.0);
        CaptureGuard::new(move || *live.borrow_mut() -= 1)
    }
}

#[test]
fn drag_listeners_never_leak() {
    let live = Rc::new(RefCell::new(0));
    let mut tl = Timeline::new(TimelineConfig::days(10));
    tl.set_pointer_capture(Box::new(Listeners(Rc::clone(&live))));

    tl.pointer_down(p(0.0, 0.0), p(0.0, 0.0), None, Modifiers::NONE);
    assert_eq!(*live.borrow(), 1);
    tl.pointer_move(p(50.0, 50.0), p(50.0, 50.0));
    // Reconfiguration mid-drag cancels it
    tl.edit_bounds(ConfigField::TotalDays, 20);
    assert_eq!(*live.borrow(), 0);

    tl.pointer_down(p(0.0, 0.0), p(0.0, 0.0), None, Modifiers::NONE);
    tl.cancel_drag();
    assert_eq!(*live.borrow(), 0);

    tl.pointer_down(p(0.0, 0.0), p(0.0, 0.0), None, Modifiers::NONE);
    drop(tl);
    assert_eq!(*live.borrow(), 0);
}

#[test]
fn cancelled_drag_keeps_selection() {
    let mut tl = Timeline::new(TimelineConfig::days(10));
    tl.set_selection(vec![id("day-9")]);
    tl.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Some(id("day-1")), Modifiers::NONE);
    tl.pointer_move(p(120.0, 40.0), p(120.0, 40.0));
    tl.cancel_drag();
    assert_eq!(tl.selection().selected_ids(), vec![id("day-9")]);
}

#[test]
fn assign_to_all_twenty_cells() {
    let mut tl = Timeline::new(TimelineConfig::days(20));
    let summary = tl.assign_to_all("yield", json!(12)).unwrap();
    assert_eq!(summary.changes, 20);
    for cell in tl.cells() {
        assert!(tl.has_data(&cell.id));
        assert_eq!(tl.fields(&cell.id).unwrap().get("yield"), Some(&json!(12)));
    }
    assert_eq!(tl.history().len(), 1);
    assert_eq!(tl.filled_count(), 20);
    assert_eq!(tl.completion_percent(), 100);
}

#[test]
fn range_resolution_failure_writes_nothing() {
    let mut tl = Timeline::new(TimelineConfig::days(5));
    let err = tl.assign_to_range("yield", &id("day-2"), &id("day-40"), json!(1)).unwrap_err();
    assert_eq!(err, EngineError::RangeResolution { start: id("day-2"), end: id("day-40") });
    assert!(tl.store().is_empty());
    assert!(tl.history().is_empty());
}

#[test]
fn bulk_without_target_is_rejected() {
    let mut tl = Timeline::new(TimelineConfig::days(5));
    assert_eq!(tl.assign_to_selection("yield", json!(1)), Err(EngineError::EmptySelection));

    let mut empty = Timeline::new(TimelineConfig::default());
    assert_eq!(empty.assign_to_all("yield", json!(1)), Err(EngineError::ConfigurationIncomplete));
}

#[test]
fn single_empty_default_on_mass_selection() {
    let mut tl = Timeline::new(TimelineConfig::days(8));
    tl.set_mode(SelectionMode::MassAssign);
    for d in ["day-1", "day-3", "day-5"] {
        assert_eq!(tl.click(&id(d), Modifiers::NONE), SelectionOutcome::Changed);
    }

    let content = ContentDescriptor::single("notes", "Notes", Some(json!("")));
    let out = tl.drop_content(&content, &id("day-3")).unwrap();
    assert!(matches!(out, DropOutcome::Applied(_)));

    for d in ["day-1", "day-3", "day-5"] {
        assert_eq!(tl.store().get(&id(d), "notes"), Some(&json!("")));
    }
    assert_eq!(tl.history().len(), 1);
    assert_eq!(tl.history()[0].changes.len(), 3);
}

#[test]
fn grouped_preset_goes_through_confirmation() {
    let mut tl = Timeline::new(TimelineConfig::weeks(8));
    let preset = tl
        .create_preset(
            PresetDraft::new("Veg indoor")
                .emoji("🌱")
                .field("light", json!("18/6"))
                .field("temperature", json!(24)),
        )
        .unwrap();
    tl.set_selection(vec![id("week-1"), id("week-2")]);

    let out = tl.apply_preset(&preset.id, &id("week-2")).unwrap();
    let DropOutcome::NeedsConfirmation(pending) = out else {
        panic!("grouped content must be confirmed");
    };
    assert_eq!(pending.targets, vec![id("week-1"), id("week-2")]);
    assert!(tl.store().is_empty());

    let summary = tl.confirm_drop().unwrap();
    assert_eq!(summary.changes, 4);
    assert_eq!(tl.history().len(), 1);

    tl.undo();
    assert!(tl.store().ids().iter().all(|c| !tl.has_data(c)));
}

#[test]
fn confirmation_made_before_reconfiguration_is_rejected() {
    let mut tl = Timeline::new(TimelineConfig::days(10));
    tl.set_selection(vec![id("day-2"), id("day-9")]);
    let content = ContentDescriptor::Multi { items: vec![DropItem::new("ph", "pH").with_default(json!(6.2))] };
    tl.drop_content(&content, &id("day-2")).unwrap();

    tl.edit_bounds(ConfigField::TotalDays, 5);
    assert!(matches!(tl.confirm_drop(), Err(EngineError::StaleIntent { .. })));
    assert!(tl.store().get(&id("day-2"), "ph").is_none());
    assert!(tl.history().is_empty());
    // Closed, not left open
    assert_eq!(tl.confirm_drop(), Err(EngineError::NoPendingDrop));
}

#[test]
fn data_changed_per_field_per_commit() {
    let mut tl = Timeline::new(TimelineConfig::days(4));
    let events = with_collector(&mut tl);
    tl.assign_to_range("yield", &id("day-3"), &id("day-1"), json!(2)).unwrap();
    tl.undo();

    let events = events.borrow();
    let changes = events.data_changed();
    assert_eq!(changes.len(), 6);
    assert!(changes[..3].iter().all(|c| c.value == Some(json!(2))));
    assert!(changes[3..].iter().all(|c| c.value.is_none()));
    assert_eq!(events.notices().len(), 1);
}

#[test]
fn persisted_data_in_either_encoding() {
    let mut tl = Timeline::new(TimelineConfig::days(3));
    let n = tl.import_data(&[
        json!({"timestamp": "day-1", "data": {"temperature": 21}}),
        json!({"timestamp": "day-2", "temperature": 23, "label": "J2"}),
    ]);
    assert_eq!(n, 2);
    assert_eq!(tl.store().get(&id("day-1"), "temperature"), Some(&json!(21)));
    assert_eq!(tl.store().get(&id("day-2"), "temperature"), Some(&json!(23)));
    assert!(tl.history().is_empty());

    let exported = tl.export_data();
    assert_eq!(exported[1]["data"]["temperature"], json!(23));
}
