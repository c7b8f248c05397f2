//! Remote catalog HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//!
//! Wire contract:
//!   GET    /api/presets?pipelineType=<p>&type=grouped   -> [preset]
//!   POST   /api/presets                                 -> preset (server id)
//!   PUT    /api/presets/{id}                            -> preset
//!   DELETE /api/presets/{id}
//!   GET    /api/defaults?pipelineType=<p>               -> {key: value}
//!   PUT    /api/defaults?pipelineType=<p>

use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::{RequestBuilder, Response};
use serde_json::{json, Value};

use pipegrid_core::PipelineType;
use pipegrid_engine::{FieldMap, GroupedPreset};

use crate::{CatalogBackend, CatalogError};

const PRESET_TYPE: &str = "grouped";

/// Remote catalog client (blocking).
#[derive(Clone)]
pub struct RemoteCatalog {
    http: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
}

impl RemoteCatalog {
    pub fn new(api_base: &str, token: Option<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("pgrid/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, CatalogError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(CatalogError::Http(status, body));
        }

        Ok(response)
    }

    /// Decode a preset body; an empty body echoes `fallback`.
    fn preset_response(response: Response, fallback: &GroupedPreset) -> Result<GroupedPreset, CatalogError> {
        let text = response.text().map_err(|e| CatalogError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(fallback.clone());
        }
        let value: Value = serde_json::from_str(&text).map_err(|e| CatalogError::Parse(e.to_string()))?;
        preset_from_json(value)
    }
}

impl CatalogBackend for RemoteCatalog {
    fn list_presets(&self, pipeline: PipelineType) -> Result<Vec<GroupedPreset>, CatalogError> {
        let url = format!("{}/api/presets", self.api_base);
        let request = self
            .http
            .get(&url)
            .query(&[("pipelineType", pipeline.as_str()), ("type", PRESET_TYPE)]);
        let json: Value = self.send(request)?.json().map_err(|e| CatalogError::Parse(e.to_string()))?;

        let items = json
            .as_array()
            .ok_or_else(|| CatalogError::Parse("expected an array of presets".into()))?;

        // Servers that ignore the type filter return every kind.
        items
            .iter()
            .filter(|p| p.get("type").and_then(Value::as_str).map_or(true, |t| t == PRESET_TYPE))
            .cloned()
            .map(preset_from_json)
            .collect()
    }

    fn create_preset(&self, pipeline: PipelineType, preset: &GroupedPreset) -> Result<GroupedPreset, CatalogError> {
        let url = format!("{}/api/presets", self.api_base);
        let request = self.http.post(&url).json(&preset_body(pipeline, preset));
        let created = Self::preset_response(self.send(request)?, preset)?;
        log::debug!("remote created preset {} ({})", created.id, created.name);
        Ok(created)
    }

    fn put_preset(&self, pipeline: PipelineType, preset: &GroupedPreset) -> Result<GroupedPreset, CatalogError> {
        let url = format!("{}/api/presets/{}", self.api_base, preset.id);
        let request = self.http.put(&url).json(&preset_body(pipeline, preset));
        Self::preset_response(self.send(request)?, preset)
    }

    fn delete_preset(&self, _pipeline: PipelineType, id: &str) -> Result<(), CatalogError> {
        let url = format!("{}/api/presets/{}", self.api_base, id);
        match self.send(self.http.delete(&url)) {
            Err(CatalogError::Http(404, _)) => Err(CatalogError::NotFound(id.to_string())),
            other => other.map(|_| ()),
        }
    }

    fn load_defaults(&self, pipeline: PipelineType) -> Result<FieldMap, CatalogError> {
        let url = format!("{}/api/defaults", self.api_base);
        let request = self.http.get(&url).query(&[("pipelineType", pipeline.as_str())]);
        let json: Value = self.send(request)?.json().map_err(|e| CatalogError::Parse(e.to_string()))?;
        match json {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(FieldMap::new()),
            _ => Err(CatalogError::Parse("expected a defaults object".into())),
        }
    }

    fn save_defaults(&self, pipeline: PipelineType, defaults: &FieldMap) -> Result<(), CatalogError> {
        let url = format!("{}/api/defaults", self.api_base);
        let request = self
            .http
            .put(&url)
            .query(&[("pipelineType", pipeline.as_str())])
            .json(defaults);
        self.send(request).map(|_| ())
    }
}

// ── Free functions ──────────────────────────────────────────────────

fn preset_body(pipeline: PipelineType, preset: &GroupedPreset) -> Value {
    json!({
        "name": preset.name,
        "emoji": preset.emoji,
        "description": preset.description,
        "fields": preset.fields,
        "type": PRESET_TYPE,
        "pipelineType": pipeline.as_str(),
    })
}

/// Decode a server preset. Numeric ids become strings; missing timestamps read as now.
fn preset_from_json(mut value: Value) -> Result<GroupedPreset, CatalogError> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| CatalogError::Parse("expected a preset object".into()))?;

    let id = match obj.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(CatalogError::Parse("Missing id in response".into())),
    };
    obj.insert("id".into(), Value::String(id));

    let now = json!(Utc::now());
    for key in ["createdAt", "updatedAt"] {
        if obj.get(key).map_or(true, Value::is_null) {
            obj.insert(key.into(), now.clone());
        }
    }
    if obj.get("fields").map_or(true, Value::is_null) {
        obj.insert("fields".into(), json!([]));
    }

    serde_json::from_value(value).map_err(|e| CatalogError::Parse(e.to_string()))
}
