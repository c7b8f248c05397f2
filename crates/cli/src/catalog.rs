// pgrid presets / defaults / settings - catalog access from the shell

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{json, Value};

use pipegrid_catalog::{CatalogError, LocalCatalog, RemoteCatalog, SyncState, SyncedCatalog};
use pipegrid_config::Settings;
use pipegrid_core::PipelineType;
use pipegrid_engine::store::is_reserved;
use pipegrid_engine::{EngineError, GroupedPreset, PresetDraft, PresetRegistry};

use crate::{CatalogArgs, CliError, DefaultsCommands, PresetCommands};

/// Effective catalog location after applying flags over settings.
struct Resolved {
    pipeline: PipelineType,
    dir: PathBuf,
    remote_url: Option<String>,
}

fn resolve(settings: &Settings, args: &CatalogArgs) -> Resolved {
    let remote_url = if args.offline {
        None
    } else {
        args.remote
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .or_else(|| settings.effective_remote_url())
            .map(String::from)
    };
    Resolved {
        pipeline: args.pipeline.unwrap_or(settings.pipeline_type),
        dir: args.catalog_dir.clone().unwrap_or_else(|| settings.effective_catalog_dir()),
        remote_url,
    }
}

fn open_catalog(settings: &Settings, args: &CatalogArgs) -> Result<(SyncedCatalog, PipelineType), CliError> {
    let resolved = resolve(settings, args);
    let remote = match &resolved.remote_url {
        Some(url) => {
            let timeout = Duration::from_secs(settings.remote_timeout_secs.max(1));
            Some(RemoteCatalog::new(url, args.token.clone(), timeout).map_err(CliError::catalog)?)
        }
        None => None,
    };
    log::debug!(
        "catalog {} (pipeline {}, remote {})",
        resolved.dir.display(),
        resolved.pipeline,
        resolved.remote_url.as_deref().unwrap_or("none")
    );
    Ok((SyncedCatalog::new(LocalCatalog::new(resolved.dir), remote), resolved.pipeline))
}

/// Parse `KEY=VALUE`. VALUE is JSON when it parses as JSON, otherwise plain text.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), CliError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::usage(format!("expected KEY=VALUE, got {:?}", raw)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::usage(format!("empty key in {:?}", raw)));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn sync_label(state: SyncState) -> &'static str {
    match state {
        SyncState::Synced => "synced",
        SyncState::LocalOnly => "local",
    }
}

fn engine_error(err: EngineError) -> CliError {
    match err {
        EngineError::ReservedField(_) | EngineError::InvalidPreset(_) => CliError::usage(err.to_string()),
        other => CliError::runtime(other.to_string()),
    }
}

// ============================================================================
// presets
// ============================================================================

pub fn cmd_presets(command: PresetCommands, settings: &Settings, args: &CatalogArgs) -> Result<(), CliError> {
    let (catalog, pipeline) = open_catalog(settings, args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        PresetCommands::List { json } => {
            let listed = catalog.list_presets(pipeline).map_err(CliError::catalog)?;
            if json {
                let doc = json!({
                    "pipeline": pipeline.as_str(),
                    "sync": sync_label(listed.state),
                    "presets": listed.value,
                });
                writeln!(out, "{}", doc).map_err(CliError::io)?;
            } else {
                for preset in &listed.value {
                    writeln!(out, "{}", preset_line(preset)).map_err(CliError::io)?;
                }
            }
        }
        PresetCommands::Add { name, fields, emoji, description, json } => {
            let mut draft = PresetDraft::new(name);
            for raw in &fields {
                let (key, value) = parse_assignment(raw)?;
                draft = draft.field(key, value);
            }
            if let Some(emoji) = emoji {
                draft = draft.emoji(emoji);
            }
            if let Some(description) = description {
                draft = draft.description(description);
            }

            let preset = PresetRegistry::new().create(draft).map_err(engine_error)?;
            let saved = catalog.save_preset(pipeline, &preset).map_err(CliError::catalog)?;
            if json {
                let doc = json!({ "sync": sync_label(saved.state), "preset": saved.value });
                writeln!(out, "{}", doc).map_err(CliError::io)?;
            } else {
                writeln!(out, "{}", saved.value.id).map_err(CliError::io)?;
            }
        }
        PresetCommands::Remove { id } => {
            catalog.delete_preset(pipeline, &id).map_err(|e| match e {
                CatalogError::NotFound(_) => {
                    CliError::catalog(e).with_hint(format!("list ids with `pgrid presets list -p {}`", pipeline))
                }
                other => CliError::catalog(other),
            })?;
        }
    }
    Ok(())
}

fn preset_line(preset: &GroupedPreset) -> String {
    let fields: Vec<String> = preset
        .fields
        .iter()
        .map(|f| format!("{}={}", f.key, f.value))
        .collect();
    let name = match &preset.emoji {
        Some(emoji) => format!("{} {}", emoji, preset.name),
        None => preset.name.clone(),
    };
    format!("{}\t{}\t{}", preset.id, name, fields.join(" "))
}

// ============================================================================
// defaults
// ============================================================================

pub fn cmd_defaults(command: DefaultsCommands, settings: &Settings, args: &CatalogArgs) -> Result<(), CliError> {
    let (catalog, pipeline) = open_catalog(settings, args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        DefaultsCommands::Get { key: Some(key), json } => {
            let loaded = catalog.load_defaults(pipeline).map_err(CliError::catalog)?;
            let value = loaded
                .value
                .get(&key)
                .ok_or_else(|| CliError::runtime(format!("no default for '{}'", key)))?;
            if json {
                writeln!(out, "{}", value).map_err(CliError::io)?;
            } else {
                writeln!(out, "{}", display_value(value)).map_err(CliError::io)?;
            }
        }
        DefaultsCommands::Get { key: None, json } => {
            let loaded = catalog.load_defaults(pipeline).map_err(CliError::catalog)?;
            if json {
                let doc = json!({
                    "pipeline": pipeline.as_str(),
                    "sync": sync_label(loaded.state),
                    "defaults": loaded.value,
                });
                writeln!(out, "{}", doc).map_err(CliError::io)?;
            } else {
                for (key, value) in &loaded.value {
                    writeln!(out, "{}={}", key, value).map_err(CliError::io)?;
                }
            }
        }
        DefaultsCommands::Set { assignments } => {
            let parsed = assignments
                .iter()
                .map(|raw| parse_assignment(raw))
                .collect::<Result<Vec<_>, _>>()?;
            if let Some((key, _)) = parsed.iter().find(|(k, _)| is_reserved(k)) {
                return Err(CliError::usage(format!("field '{}' is reserved", key)));
            }

            let mut defaults = catalog.load_defaults(pipeline).map_err(CliError::catalog)?.value;
            for (key, value) in parsed {
                defaults.insert(key, value);
            }
            catalog.save_defaults(pipeline, &defaults).map_err(CliError::catalog)?;
        }
        DefaultsCommands::Unset { keys } => {
            let mut defaults = catalog.load_defaults(pipeline).map_err(CliError::catalog)?.value;
            let before = defaults.len();
            for key in &keys {
                defaults.shift_remove(key);
            }
            if defaults.len() != before {
                catalog.save_defaults(pipeline, &defaults).map_err(CliError::catalog)?;
            }
        }
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// settings
// ============================================================================

pub fn cmd_settings(
    settings: &Settings,
    path: Option<&Path>,
    args: &CatalogArgs,
    json: bool,
) -> Result<(), CliError> {
    let path = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(Settings::config_path_display);
    let resolved = resolve(settings, args);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        let doc = json!({
            "path": path,
            "pipeline": resolved.pipeline.as_str(),
            "marqueeThreshold": settings.effective_threshold(),
            "catalogDir": resolved.dir.display().to_string(),
            "remoteUrl": resolved.remote_url,
            "remoteTimeoutSecs": settings.remote_timeout_secs,
        });
        writeln!(out, "{}", doc).map_err(CliError::io)?;
    } else {
        writeln!(out, "settings:   {}", path).map_err(CliError::io)?;
        writeln!(out, "pipeline:   {}", resolved.pipeline).map_err(CliError::io)?;
        writeln!(out, "threshold:  {}px", settings.effective_threshold()).map_err(CliError::io)?;
        writeln!(out, "catalog:    {}", resolved.dir.display()).map_err(CliError::io)?;
        let remote = match &resolved.remote_url {
            Some(url) => writeln!(out, "remote:     {} ({}s timeout)", url, settings.remote_timeout_secs),
            None => writeln!(out, "remote:     (local only)"),
        };
        remote.map_err(CliError::io)?;
    }
    Ok(())
}
