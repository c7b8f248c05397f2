//! Local-first catalog with optional remote sync.
//!
//! Reads try the remote, mirror the result locally, and fall back to the
//! local copy when the remote fails. Writes land locally first, then go to
//! the remote best-effort. Local-only (`local_`) ids are never sent to the
//! remote as resource ids: creating such a preset asks the remote to mint a
//! real id and the local copy is re-keyed on success.

use pipegrid_core::PipelineType;
use pipegrid_engine::presets::is_local_id;
use pipegrid_engine::{FieldMap, GroupedPreset};

use crate::local::LocalCatalog;
use crate::remote::RemoteCatalog;
use crate::{CatalogBackend, CatalogError};

/// Whether the remote leg of a call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    LocalOnly,
}

/// Result of a synced call: the value plus how far it got.
#[derive(Debug, Clone, PartialEq)]
pub struct Synced<T> {
    pub value: T,
    pub state: SyncState,
}

impl<T> Synced<T> {
    fn new(value: T, state: SyncState) -> Self {
        Self { value, state }
    }

    pub fn is_synced(&self) -> bool {
        self.state == SyncState::Synced
    }
}

pub struct SyncedCatalog {
    local: LocalCatalog,
    remote: Option<RemoteCatalog>,
}

impl SyncedCatalog {
    pub fn new(local: LocalCatalog, remote: Option<RemoteCatalog>) -> Self {
        Self { local, remote }
    }

    pub fn local_only(local: LocalCatalog) -> Self {
        Self::new(local, None)
    }

    pub fn local(&self) -> &LocalCatalog {
        &self.local
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// List presets. On remote success the local file becomes the remote
    /// listing followed by any presets that only exist locally.
    ///
    /// The remote copy wins unless the local copy of the same id has a later
    /// `updated_at` (an edit saved while the remote was down). Such edits are
    /// pushed again; if that push fails the local copy is kept and the listing
    /// reports `LocalOnly`.
    pub fn list_presets(&self, pipeline: PipelineType) -> Result<Synced<Vec<GroupedPreset>>, CatalogError> {
        let Some(remote) = &self.remote else {
            return Ok(Synced::new(self.local.list_presets(pipeline)?, SyncState::LocalOnly));
        };

        match remote.list_presets(pipeline) {
            Ok(listed) => {
                let ours = self.local.list_presets(pipeline)?;
                let mut state = SyncState::Synced;
                let mut presets = Vec::with_capacity(listed.len());
                for theirs in listed {
                    match ours.iter().find(|p| p.id == theirs.id) {
                        Some(edited) if edited.updated_at > theirs.updated_at => {
                            match remote.put_preset(pipeline, edited) {
                                Ok(stored) => presets.push(stored),
                                Err(e) => {
                                    log::warn!("could not push offline edit of preset {} ({})", edited.id, e);
                                    state = SyncState::LocalOnly;
                                    presets.push(edited.clone());
                                }
                            }
                        }
                        _ => presets.push(theirs),
                    }
                }
                presets.extend(ours.into_iter().filter(|p| p.is_local()));
                self.local.replace_presets(pipeline, &presets)?;
                Ok(Synced::new(presets, state))
            }
            Err(e) => {
                log::warn!("remote catalog unavailable ({}); using local presets", e);
                Ok(Synced::new(self.local.list_presets(pipeline)?, SyncState::LocalOnly))
            }
        }
    }

    /// Store a preset locally, then push it. A `local_` preset is created
    /// remotely and re-keyed under the id the remote returns.
    pub fn save_preset(&self, pipeline: PipelineType, preset: &GroupedPreset) -> Result<Synced<GroupedPreset>, CatalogError> {
        self.local.put_preset(pipeline, preset)?;

        let Some(remote) = &self.remote else {
            return Ok(Synced::new(preset.clone(), SyncState::LocalOnly));
        };

        if is_local_id(&preset.id) {
            match remote.create_preset(pipeline, preset) {
                Ok(created) if !created.is_local() => {
                    self.local.delete_preset(pipeline, &preset.id)?;
                    self.local.put_preset(pipeline, &created)?;
                    Ok(Synced::new(created, SyncState::Synced))
                }
                Ok(_) => {
                    log::warn!("remote kept local id for preset {}; not re-keyed", preset.id);
                    Ok(Synced::new(preset.clone(), SyncState::LocalOnly))
                }
                Err(e) => {
                    log::warn!("could not push preset {} ({}); kept locally", preset.id, e);
                    Ok(Synced::new(preset.clone(), SyncState::LocalOnly))
                }
            }
        } else {
            match remote.put_preset(pipeline, preset) {
                Ok(stored) => {
                    if stored != *preset && stored.id == preset.id {
                        self.local.put_preset(pipeline, &stored)?;
                    }
                    Ok(Synced::new(stored, SyncState::Synced))
                }
                Err(e) => {
                    log::warn!("could not update preset {} remotely ({}); kept locally", preset.id, e);
                    Ok(Synced::new(preset.clone(), SyncState::LocalOnly))
                }
            }
        }
    }

    /// Delete locally, then remotely unless the id is local-only.
    /// Deleting an id unknown to both sides is `NotFound`.
    pub fn delete_preset(&self, pipeline: PipelineType, id: &str) -> Result<Synced<()>, CatalogError> {
        let local_result = self.local.delete_preset(pipeline, id);
        let found_locally = match local_result {
            Ok(()) => true,
            Err(CatalogError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };

        let remote = match &self.remote {
            Some(remote) if !is_local_id(id) => remote,
            _ if found_locally => return Ok(Synced::new((), SyncState::LocalOnly)),
            _ => return Err(CatalogError::NotFound(id.to_string())),
        };

        match remote.delete_preset(pipeline, id) {
            Ok(()) => Ok(Synced::new((), SyncState::Synced)),
            Err(CatalogError::NotFound(_)) if found_locally => Ok(Synced::new((), SyncState::Synced)),
            Err(CatalogError::NotFound(_)) => Err(CatalogError::NotFound(id.to_string())),
            Err(e) => {
                log::warn!("could not delete preset {} remotely ({})", id, e);
                if found_locally {
                    Ok(Synced::new((), SyncState::LocalOnly))
                } else {
                    Err(e)
                }
            }
        }
    }

    pub fn load_defaults(&self, pipeline: PipelineType) -> Result<Synced<FieldMap>, CatalogError> {
        let Some(remote) = &self.remote else {
            return Ok(Synced::new(self.local.load_defaults(pipeline)?, SyncState::LocalOnly));
        };

        match remote.load_defaults(pipeline) {
            Ok(defaults) => {
                self.local.save_defaults(pipeline, &defaults)?;
                Ok(Synced::new(defaults, SyncState::Synced))
            }
            Err(e) => {
                log::warn!("remote catalog unavailable ({}); using local defaults", e);
                Ok(Synced::new(self.local.load_defaults(pipeline)?, SyncState::LocalOnly))
            }
        }
    }

    pub fn save_defaults(&self, pipeline: PipelineType, defaults: &FieldMap) -> Result<Synced<()>, CatalogError> {
        self.local.save_defaults(pipeline, defaults)?;

        let Some(remote) = &self.remote else {
            return Ok(Synced::new((), SyncState::LocalOnly));
        };

        match remote.save_defaults(pipeline, defaults) {
            Ok(()) => Ok(Synced::new((), SyncState::Synced)),
            Err(e) => {
                log::warn!("could not push defaults ({}); kept locally", e);
                Ok(Synced::new((), SyncState::LocalOnly))
            }
        }
    }
}
