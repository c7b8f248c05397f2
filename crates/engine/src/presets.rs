//! Grouped presets: named, reusable bundles of (field, value) pairs.
//!
//! The registry is the in-memory view; durability is the catalog crate's job.
//! Presets created here get a `local_` id until a remote store assigns one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::store::is_reserved;

/// Prefix of ids minted locally, never pushed to a remote catalog.
pub const LOCAL_ID_PREFIX: &str = "local_";

pub fn new_local_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4())
}

pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetField {
    pub key: String,
    pub value: Value,
}

impl PresetField {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self { key: key.into(), value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedPreset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<PresetField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupedPreset {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    pub fn is_local(&self) -> bool {
        is_local_id(&self.id)
    }
}

/// User-editable part of a preset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresetDraft {
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<PresetField>,
}

impl PresetDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.push(PresetField::new(key, value));
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::InvalidPreset("name is required".into()));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.key.trim().is_empty() {
                return Err(EngineError::InvalidPreset(format!("field {} has no key", i + 1)));
            }
            if is_reserved(&field.key) {
                return Err(EngineError::ReservedField(field.key.clone()));
            }
            if self.fields[..i].iter().any(|f| f.key == field.key) {
                return Err(EngineError::InvalidPreset(format!("duplicate field '{}'", field.key)));
            }
        }
        Ok(())
    }
}

/// In-memory preset list, in creation order.
#[derive(Debug, Default)]
pub struct PresetRegistry {
    presets: Vec<GroupedPreset>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, draft: PresetDraft) -> Result<GroupedPreset, EngineError> {
        draft.validate()?;
        let now = Utc::now();
        let preset = GroupedPreset {
            id: new_local_id(),
            name: draft.name.trim().to_string(),
            emoji: draft.emoji,
            description: draft.description,
            fields: draft.fields,
            created_at: now,
            updated_at: now,
        };
        log::debug!("created preset {} ({})", preset.id, preset.name);
        self.presets.push(preset.clone());
        Ok(preset)
    }

    pub fn update(&mut self, id: &str, draft: PresetDraft) -> Result<GroupedPreset, EngineError> {
        draft.validate()?;
        let preset = self
            .presets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::PresetNotFound(id.to_string()))?;

        preset.name = draft.name.trim().to_string();
        preset.emoji = draft.emoji;
        preset.description = draft.description;
        preset.fields = draft.fields;
        preset.updated_at = Utc::now().max(preset.created_at);
        Ok(preset.clone())
    }

    pub fn remove(&mut self, id: &str) -> Result<GroupedPreset, EngineError> {
        let idx = self
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::PresetNotFound(id.to_string()))?;
        Ok(self.presets.remove(idx))
    }

    pub fn list(&self) -> &[GroupedPreset] {
        &self.presets
    }

    pub fn get(&self, id: &str) -> Option<&GroupedPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Insert or replace by id (presets fetched from a catalog).
    pub fn upsert(&mut self, preset: GroupedPreset) {
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn replace_all(&mut self, presets: Vec<GroupedPreset>) {
        self.presets = presets;
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> PresetDraft {
        PresetDraft::new("Flowering indoor")
            .emoji("🌸")
            .field("temperature", json!(24))
            .field("humidity", json!(50))
    }

    #[test]
    fn test_create_list_get() {
        let mut reg = PresetRegistry::new();
        let p = reg.create(draft()).unwrap();
        assert!(p.id.starts_with("local_"));
        assert!(p.is_local());
        assert_eq!(p.created_at, p.updated_at);
        assert_eq!(reg.list().len(), 1);
        assert_eq!(reg.get(&p.id).unwrap().field("humidity"), Some(&json!(50)));
    }

    #[test]
    fn test_update_and_remove() {
        let mut reg = PresetRegistry::new();
        let p = reg.create(draft()).unwrap();
        let updated = reg
            .update(&p.id, PresetDraft::new("Late flower").field("temperature", json!(20)))
            .unwrap();
        assert_eq!(updated.id, p.id);
        assert_eq!(updated.name, "Late flower");
        assert_eq!(updated.fields.len(), 1);
        assert!(updated.updated_at >= updated.created_at);

        reg.remove(&p.id).unwrap();
        assert!(reg.is_empty());
        assert_eq!(reg.remove(&p.id), Err(EngineError::PresetNotFound(p.id.clone())));
    }

    #[test]
    fn test_validation() {
        let mut reg = PresetRegistry::new();
        assert!(matches!(reg.create(PresetDraft::new("  ")), Err(EngineError::InvalidPreset(_))));
        assert!(matches!(
            reg.create(PresetDraft::new("x").field("a", json!(1)).field("a", json!(2))),
            Err(EngineError::InvalidPreset(_))
        ));
        assert_eq!(
            reg.create(PresetDraft::new("x").field("label", json!("y"))),
            Err(EngineError::ReservedField("label".into()))
        );
        assert!(reg.is_empty());
        assert!(matches!(reg.update("nope", draft()), Err(EngineError::PresetNotFound(_))));
    }

    #[test]
    fn test_serde_shape() {
        let mut reg = PresetRegistry::new();
        let p = reg.create(draft()).unwrap();
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["emoji"], "🌸");
        assert_eq!(v["fields"][0]["key"], "temperature");
        assert!(v["createdAt"].is_string());
        let back: GroupedPreset = serde_json::from_value(v).unwrap();
        assert_eq!(back, p);
    }
}
