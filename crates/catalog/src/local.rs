//! File-backed catalog.
//!
//! Layout: `<root>/<pipeline>/grouped-presets.json` (array, creation order)
//! and `<root>/<pipeline>/defaults.json` (object). Missing files read as empty.

use std::fs;
use std::path::{Path, PathBuf};

use pipegrid_core::PipelineType;
use pipegrid_engine::{FieldMap, GroupedPreset};

use crate::{CatalogBackend, CatalogError};

pub const PRESETS_FILE: &str = "grouped-presets.json";
pub const DEFAULTS_FILE: &str = "defaults.json";

#[derive(Debug, Clone)]
pub struct LocalCatalog {
    root: PathBuf,
}

impl LocalCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn presets_path(&self, pipeline: PipelineType) -> PathBuf {
        self.root.join(pipeline.as_str()).join(PRESETS_FILE)
    }

    pub fn defaults_path(&self, pipeline: PipelineType) -> PathBuf {
        self.root.join(pipeline.as_str()).join(DEFAULTS_FILE)
    }

    /// Overwrite the whole preset list (used when mirroring a remote listing).
    pub fn replace_presets(&self, pipeline: PipelineType, presets: &[GroupedPreset]) -> Result<(), CatalogError> {
        write_json(&self.presets_path(pipeline), &presets)
    }

    pub fn get_preset(&self, pipeline: PipelineType, id: &str) -> Result<Option<GroupedPreset>, CatalogError> {
        Ok(self.list_presets(pipeline)?.into_iter().find(|p| p.id == id))
    }
}

impl CatalogBackend for LocalCatalog {
    fn list_presets(&self, pipeline: PipelineType) -> Result<Vec<GroupedPreset>, CatalogError> {
        Ok(read_json(&self.presets_path(pipeline))?.unwrap_or_default())
    }

    fn create_preset(&self, pipeline: PipelineType, preset: &GroupedPreset) -> Result<GroupedPreset, CatalogError> {
        self.put_preset(pipeline, preset)
    }

    fn put_preset(&self, pipeline: PipelineType, preset: &GroupedPreset) -> Result<GroupedPreset, CatalogError> {
        let mut presets = self.list_presets(pipeline)?;
        match presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset.clone(),
            None => presets.push(preset.clone()),
        }
        self.replace_presets(pipeline, &presets)?;
        Ok(preset.clone())
    }

    fn delete_preset(&self, pipeline: PipelineType, id: &str) -> Result<(), CatalogError> {
        let mut presets = self.list_presets(pipeline)?;
        let before = presets.len();
        presets.retain(|p| p.id != id);
        if presets.len() == before {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        self.replace_presets(pipeline, &presets)
    }

    fn load_defaults(&self, pipeline: PipelineType) -> Result<FieldMap, CatalogError> {
        Ok(read_json(&self.defaults_path(pipeline))?.unwrap_or_default())
    }

    fn save_defaults(&self, pipeline: PipelineType, defaults: &FieldMap) -> Result<(), CatalogError> {
        write_json(&self.defaults_path(pipeline), defaults)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, CatalogError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| CatalogError::Parse(format!("{}: {}", path.display(), e)))
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CatalogError::PersistenceUnavailable(format!("{}: {}", parent.display(), e)))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| CatalogError::Parse(e.to_string()))?;

    // Write-then-rename: readers see the old file or the new one.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| CatalogError::Io(format!("{}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path).map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}
