pub mod attributes;
pub mod bulk;
pub mod clipboard;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod generator;
pub mod history;
pub mod presets;
pub mod selection;
pub mod store;
pub mod timeline;

#[cfg(test)]
pub mod harness;

pub use attributes::{AttributeCatalog, AttributeItem, AttributeSection, ItemType};
pub use bulk::{BulkIntent, PlannedWrite, StagedIntent, WritePlan};
pub use dispatch::{ContentDescriptor, DropItem, DropOutcome, PendingDrop};
pub use error::EngineError;
pub use events::{EventCollector, TimelineEvent};
pub use generator::{generate, generate_with_report, Generation, GenerationStatus};
pub use history::{ActionKind, ActionRecord, PriorValue};
pub use presets::{GroupedPreset, PresetDraft, PresetField, PresetRegistry};
pub use selection::{CellBox, Modifiers, PointerCapture, SelectionController, SelectionMode, SelectionOutcome};
pub use store::{CellDataStore, CellFields, FieldMap};
pub use timeline::{CommitSummary, Timeline, UndoSummary};
