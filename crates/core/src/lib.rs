//! Shared types for the pipeline timeline: cell identity, interval
//! configuration and the geometry used by marquee selection.
//!
//! No engine behavior lives here. Everything is plain data so the engine,
//! the catalog and the CLI can agree on one vocabulary.

pub mod cell;
pub mod config;
pub mod geometry;

pub use cell::{Cell, CellDetail, CellId};
pub use config::{ConfigField, IntervalKind, Phase, PipelineType, TimelineConfig};
pub use geometry::{Point, Rect};
