//! Change notifications for the hosting surface.
//!
//! Data events are the only ones correctness depends on: every committed field
//! write produces exactly one `DataChanged`. Selection, marquee and notice
//! events are informational and may be ignored.

use serde_json::Value;

use pipegrid_core::{CellId, ConfigField};

use crate::selection::Marquee;

/// Events emitted by `Timeline`.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// One field of one cell was written (`value: None` means deleted).
    DataChanged(DataChangedEvent),

    /// The selected set changed.
    SelectionChanged(Vec<CellId>),

    /// Marquee moved, appeared or went away (None = no drag in flight).
    MarqueeChanged(Option<Marquee>),

    /// The operator edited a timeline bound.
    ConfigChanged(ConfigChangedEvent),

    /// Informational message after a bulk operation.
    Notice(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataChangedEvent {
    /// Config revision the write belongs to.
    pub revision: u64,
    pub cell_id: CellId,
    pub field: String,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChangedEvent {
    pub field: ConfigField,
    /// Value after clamping to the per-kind cap.
    pub value: u32,
}

/// Callback type for receiving timeline events.
pub type EventCallback = Box<dyn FnMut(TimelineEvent)>;

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<TimelineEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn data_changed(&self) -> Vec<&DataChangedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TimelineEvent::DataChanged(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn config_changed(&self) -> Vec<&ConfigChangedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TimelineEvent::ConfigChanged(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TimelineEvent::Notice(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Most recent selection reported, if any.
    pub fn last_selection(&self) -> Option<&[CellId]> {
        self.events.iter().rev().find_map(|e| match e {
            TimelineEvent::SelectionChanged(ids) => Some(ids.as_slice()),
            _ => None,
        })
    }
}
