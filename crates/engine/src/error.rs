use std::fmt;

use pipegrid_core::CellId;

/// Errors surfaced to the hosting surface by operator-invoked operations.
///
/// Generation and store-level problems never show up here; they resolve to
/// empty or no-op results plus a status flag.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The timeline has no cells because its bounds are missing.
    ConfigurationIncomplete,
    /// One or both range endpoints are not in the current cell sequence.
    RangeResolution { start: CellId, end: CellId },
    /// A bulk operation had no target cells.
    EmptySelection,
    /// The referenced cell is not part of the current timeline.
    UnknownCell(CellId),
    /// Direct writes to derived fields are rejected.
    ComputedField(String),
    /// Structural keys (timestamp, label, ...) cannot be assigned.
    ReservedField(String),
    /// Confirm/dismiss called with no confirmation open.
    NoPendingDrop,
    /// A staged intent was committed after the timeline was reconfigured.
    StaleIntent { staged: u64, current: u64 },
    PresetNotFound(String),
    InvalidPreset(String),
    /// Paste called with an empty clipboard.
    NothingToPaste,
    /// Assign-from-source found no value for the field in the source cell.
    MissingSourceValue { source: CellId, key: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationIncomplete => write!(f, "timeline needs configuration"),
            Self::RangeResolution { start, end } => {
                write!(f, "cannot resolve range '{start}'..'{end}' in the current timeline")
            }
            Self::EmptySelection => write!(f, "no cells selected"),
            Self::UnknownCell(id) => write!(f, "unknown cell '{id}'"),
            Self::ComputedField(key) => write!(f, "field '{key}' is computed and cannot be assigned"),
            Self::ReservedField(key) => write!(f, "field '{key}' is reserved"),
            Self::NoPendingDrop => write!(f, "no confirmation is pending"),
            Self::StaleIntent { staged, current } => {
                write!(f, "timeline changed since the operation was staged (revision {staged} -> {current})")
            }
            Self::PresetNotFound(id) => write!(f, "preset not found: {id}"),
            Self::InvalidPreset(msg) => write!(f, "invalid preset: {msg}"),
            Self::NothingToPaste => write!(f, "clipboard is empty"),
            Self::MissingSourceValue { source, key } => {
                write!(f, "cell '{source}' has no value for '{key}'")
            }
        }
    }
}

impl std::error::Error for EngineError {}
