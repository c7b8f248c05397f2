//! Test harness for timeline operations with event tracking.
//!
//! `TimelineHarness` wraps a `Timeline` whose events land in a shared
//! `EventCollector`, so tests can assert on both state and notifications.
//! Also provides layout and pointer-capture fakes for selection tests.

use std::cell::{Cell as StdCell, Ref, RefCell};
use std::rc::Rc;

use pipegrid_core::{Cell, Rect, TimelineConfig};

use crate::attributes::{AttributeCatalog, AttributeItem, AttributeSection, ItemType};
use crate::events::EventCollector;
use crate::selection::{CaptureGuard, CellBox, PointerCapture};
use crate::timeline::Timeline;

pub struct TimelineHarness {
    timeline: Timeline,
    events: Rc<RefCell<EventCollector>>,
}

impl TimelineHarness {
    pub fn new(config: TimelineConfig) -> Self {
        let events = Rc::new(RefCell::new(EventCollector::new()));
        let sink = Rc::clone(&events);
        let mut timeline = Timeline::new(config);
        timeline.set_event_callback(Box::new(move |e| sink.borrow_mut().push(e)));
        Self { timeline, events }
    }

    pub fn timeline(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn events(&self) -> Ref<'_, EventCollector> {
        self.events.borrow()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Catalog with a few climate fields and a computed `area = length * width`.
pub fn sample_catalog() -> AttributeCatalog {
    let mut area = AttributeItem::new("area", "Area", ItemType::Computed);
    area.derived_from = vec!["length".into(), "width".into()];

    AttributeCatalog::new(vec![
        AttributeSection {
            id: "climate".into(),
            label: "Climate".into(),
            icon: None,
            items: vec![
                AttributeItem::new("temperature", "Temperature", ItemType::Number),
                AttributeItem::new("humidity", "Humidity", ItemType::Slider),
            ],
        },
        AttributeSection {
            id: "space".into(),
            label: "Space".into(),
            icon: None,
            items: vec![
                AttributeItem::new("length", "Length", ItemType::Number),
                AttributeItem::new("width", "Width", ItemType::Number),
                area,
            ],
        },
    ])
}

/// Lay cells out row-major in a gapless grid of `cols` columns.
pub fn grid_boxes(cells: &[Cell], cols: usize, width: f32, height: f32) -> Vec<CellBox> {
    cells
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (row, col) = (i / cols, i % cols);
            CellBox::new(c.id.clone(), Rect::new(col as f32 * width, row as f32 * height, width, height))
        })
        .collect()
}

/// Shared (attached, detached) counters.
#[derive(Clone, Default)]
pub struct CaptureCounts(Rc<StdCell<(usize, usize)>>);

impl CaptureCounts {
    pub fn get(&self) -> (usize, usize) {
        self.0.get()
    }
}

/// Pointer capture that counts attach/detach calls.
#[derive(Default)]
pub struct CountingCapture {
    counts: CaptureCounts,
}

impl CountingCapture {
    pub fn counts(&self) -> CaptureCounts {
        self.counts.clone()
    }
}

impl PointerCapture for CountingCapture {
    fn attach(&mut self) -> CaptureGuard {
        let cell = Rc::clone(&self.counts.0);
        let (a, d) = cell.get();
        cell.set((a + 1, d));
        CaptureGuard::new(move || {
            let (a, d) = cell.get();
            cell.set((a, d + 1));
        })
    }
}
