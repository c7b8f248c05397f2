//! Preset and defaults catalog, shared between the timeline host and the CLI.
//!
//! Local JSON files are the source of truth on this machine. A remote
//! catalog, when configured, is read first and written best-effort; any
//! remote failure degrades to the local copy.
//!
//! No GUI concepts. No retries. Blocking I/O, called outside the interaction loop.

mod error;
mod local;
mod remote;
mod synced;

use pipegrid_core::PipelineType;
use pipegrid_engine::{FieldMap, GroupedPreset};

pub use error::CatalogError;
pub use local::{LocalCatalog, DEFAULTS_FILE, PRESETS_FILE};
pub use remote::RemoteCatalog;
pub use synced::{SyncState, Synced, SyncedCatalog};

/// Storage for grouped presets and the pre-configured defaults map,
/// partitioned by pipeline type.
pub trait CatalogBackend {
    fn list_presets(&self, pipeline: PipelineType) -> Result<Vec<GroupedPreset>, CatalogError>;

    /// Store a new preset. The backend may assign a different id.
    fn create_preset(&self, pipeline: PipelineType, preset: &GroupedPreset) -> Result<GroupedPreset, CatalogError>;

    /// Insert or replace a preset by id.
    fn put_preset(&self, pipeline: PipelineType, preset: &GroupedPreset) -> Result<GroupedPreset, CatalogError>;

    fn delete_preset(&self, pipeline: PipelineType, id: &str) -> Result<(), CatalogError>;

    fn load_defaults(&self, pipeline: PipelineType) -> Result<FieldMap, CatalogError>;

    fn save_defaults(&self, pipeline: PipelineType, defaults: &FieldMap) -> Result<(), CatalogError>;
}
