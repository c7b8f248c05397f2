// Synced catalog against a mock remote: fallback, write-through, re-keying.

use std::time::Duration;

use chrono::Utc;
use httpmock::prelude::*;
use serde_json::json;

use pipegrid_catalog::{CatalogBackend, CatalogError, LocalCatalog, RemoteCatalog, SyncState, SyncedCatalog};
use pipegrid_core::PipelineType;
use pipegrid_engine::{FieldMap, GroupedPreset, PresetDraft, PresetRegistry};

fn remote(server: &MockServer) -> RemoteCatalog {
    RemoteCatalog::new(&server.base_url(), Some("tok".into()), Duration::from_secs(5)).unwrap()
}

fn local_preset(name: &str) -> GroupedPreset {
    let mut registry = PresetRegistry::new();
    registry
        .create(PresetDraft::new(name).field("temperature", json!(24)))
        .unwrap()
}

fn server_preset(id: &str, name: &str) -> GroupedPreset {
    let now = Utc::now();
    GroupedPreset {
        id: id.into(),
        name: name.into(),
        emoji: None,
        description: None,
        fields: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn list_mirrors_remote_and_keeps_unsynced_local_presets() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalCatalog::new(dir.path());
    let pending = local_preset("Offline draft");
    local.put_preset(PipelineType::Culture, &pending).unwrap();
    let mut stale = server_preset("5", "Stale");
    stale.updated_at = stale.updated_at - chrono::Duration::days(30);
    local.put_preset(PipelineType::Culture, &stale).unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/presets").query_param("pipelineType", "culture");
        then.status(200).json_body(json!([
            { "id": 5, "name": "Fresh", "fields": [] },
            { "id": 6, "name": "New on server", "fields": [] }
        ]));
    });

    let catalog = SyncedCatalog::new(local, Some(remote(&server)));
    let listed = catalog.list_presets(PipelineType::Culture).unwrap();

    assert_eq!(listed.state, SyncState::Synced);
    let names: Vec<_> = listed.value.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Fresh", "New on server", "Offline draft"]);

    let on_disk = catalog.local().list_presets(PipelineType::Culture).unwrap();
    assert_eq!(on_disk, listed.value);
}

#[test]
fn list_falls_back_to_local_when_remote_fails() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalCatalog::new(dir.path());
    local.put_preset(PipelineType::Culture, &server_preset("5", "Cached")).unwrap();

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/presets");
        then.status(500).body("boom");
    });

    let catalog = SyncedCatalog::new(local, Some(remote(&server)));
    let listed = catalog.list_presets(PipelineType::Culture).unwrap();

    mock.assert();
    assert_eq!(listed.state, SyncState::LocalOnly);
    assert_eq!(listed.value.len(), 1);
    assert_eq!(listed.value[0].name, "Cached");
}

#[test]
fn list_pushes_newer_offline_edits_instead_of_overwriting() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalCatalog::new(dir.path());
    local.put_preset(PipelineType::Culture, &server_preset("5", "Edited offline")).unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/presets");
        then.status(200).json_body(json!([
            { "id": 5, "name": "Server copy", "fields": [], "updatedAt": "2024-01-01T00:00:00Z" }
        ]));
    });
    let put = server.mock(|when, then| {
        when.method(PUT).path("/api/presets/5");
        then.status(200);
    });

    let catalog = SyncedCatalog::new(local, Some(remote(&server)));
    let listed = catalog.list_presets(PipelineType::Culture).unwrap();

    put.assert();
    assert_eq!(listed.state, SyncState::Synced);
    assert_eq!(listed.value[0].name, "Edited offline");
    let on_disk = catalog.local().get_preset(PipelineType::Culture, "5").unwrap().unwrap();
    assert_eq!(on_disk.name, "Edited offline");
}

#[test]
fn list_keeps_offline_edit_when_push_fails() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalCatalog::new(dir.path());
    local.put_preset(PipelineType::Culture, &server_preset("5", "Edited offline")).unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/presets");
        then.status(200).json_body(json!([
            { "id": 5, "name": "Server copy", "fields": [], "updatedAt": "2024-01-01T00:00:00Z" },
            { "id": 6, "name": "Other", "fields": [], "updatedAt": "2024-01-01T00:00:00Z" }
        ]));
    });
    server.mock(|when, then| {
        when.method(PUT).path("/api/presets/5");
        then.status(503);
    });

    let catalog = SyncedCatalog::new(local, Some(remote(&server)));
    let listed = catalog.list_presets(PipelineType::Culture).unwrap();

    assert_eq!(listed.state, SyncState::LocalOnly);
    let names: Vec<_> = listed.value.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Edited offline", "Other"]);
}

#[test]
fn saving_local_preset_rekeys_under_server_id() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/presets");
        then.status(201).json_body(json!({
            "id": 41, "name": "Offline draft",
            "fields": [{ "key": "temperature", "value": 24 }]
        }));
    });

    let catalog = SyncedCatalog::new(LocalCatalog::new(dir.path()), Some(remote(&server)));
    let draft = local_preset("Offline draft");
    let saved = catalog.save_preset(PipelineType::Culture, &draft).unwrap();

    create.assert();
    assert!(saved.is_synced());
    assert_eq!(saved.value.id, "41");

    let on_disk = catalog.local().list_presets(PipelineType::Culture).unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].id, "41");
}

#[test]
fn saving_keeps_local_copy_when_remote_is_down() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/presets");
        then.status(503);
    });

    let catalog = SyncedCatalog::new(LocalCatalog::new(dir.path()), Some(remote(&server)));
    let draft = local_preset("Offline draft");
    let saved = catalog.save_preset(PipelineType::Culture, &draft).unwrap();

    assert_eq!(saved.state, SyncState::LocalOnly);
    assert_eq!(saved.value.id, draft.id);
    assert!(catalog.local().get_preset(PipelineType::Culture, &draft.id).unwrap().is_some());
}

#[test]
fn local_ids_are_never_sent_as_resource_ids() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalCatalog::new(dir.path());
    let draft = local_preset("Offline draft");
    local.put_preset(PipelineType::Culture, &draft).unwrap();

    let server = MockServer::start();
    let any_delete = server.mock(|when, then| {
        when.method(DELETE).path_includes("/api/presets/");
        then.status(200);
    });

    let catalog = SyncedCatalog::new(local, Some(remote(&server)));
    let deleted = catalog.delete_preset(PipelineType::Culture, &draft.id).unwrap();

    assert_eq!(deleted.state, SyncState::LocalOnly);
    any_delete.assert_hits(0);
    assert!(catalog.local().list_presets(PipelineType::Culture).unwrap().is_empty());
}

#[test]
fn deleting_unknown_id_without_remote_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = SyncedCatalog::local_only(LocalCatalog::new(dir.path()));
    assert!(matches!(
        catalog.delete_preset(PipelineType::Culture, "17"),
        Err(CatalogError::NotFound(_))
    ));
}

#[test]
fn defaults_write_through_and_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let get = server.mock(|when, then| {
        when.method(GET).path("/api/defaults").query_param("pipelineType", "extraction");
        then.status(200).json_body(json!({ "solvent": "ethanol" }));
    });

    let catalog = SyncedCatalog::new(LocalCatalog::new(dir.path()), Some(remote(&server)));
    let loaded = catalog.load_defaults(PipelineType::Extraction).unwrap();
    get.assert();
    assert!(loaded.is_synced());
    assert_eq!(loaded.value.get("solvent"), Some(&json!("ethanol")));

    // The mirrored copy serves reads once the remote goes away.
    let offline = SyncedCatalog::local_only(LocalCatalog::new(dir.path()));
    let cached = offline.load_defaults(PipelineType::Extraction).unwrap();
    assert_eq!(cached.state, SyncState::LocalOnly);
    assert_eq!(cached.value, loaded.value);

    let mut updated = FieldMap::new();
    updated.insert("solvent".into(), json!("butane"));
    let saved = offline.save_defaults(PipelineType::Extraction, &updated).unwrap();
    assert_eq!(saved.state, SyncState::LocalOnly);
    assert_eq!(offline.load_defaults(PipelineType::Extraction).unwrap().value, updated);
}
