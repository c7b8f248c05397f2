//! Attribute catalog consumed from the hosting surface.
//!
//! The catalog lists the fields an operator can assign, grouped in ordered
//! sections. The engine only needs it for three things: refusing writes to
//! computed fields, picking a type default when a dropped field carries no
//! value, and sizing the per-cell completion percentage.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Input widget type of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Text,
    Number,
    Slider,
    Stepper,
    Select,
    Multiselect,
    Date,
    #[serde(alias = "boolean")]
    Checkbox,
    Textarea,
    /// Length x width x height.
    Dimensions,
    /// Value plus period.
    Frequency,
    /// Derived and read-only.
    Computed,
}

impl ItemType {
    /// Value written when a field of this type is dropped without a default.
    pub fn empty_value(&self) -> Value {
        match self {
            ItemType::Number | ItemType::Slider | ItemType::Stepper => json!(0),
            ItemType::Checkbox => json!(false),
            ItemType::Multiselect => json!([]),
            _ => json!(""),
        }
    }
}

/// One assignable field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttributeItem {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Source fields a computed item is derived from (product of their numeric values).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub derived_from: Vec<String>,
}

impl AttributeItem {
    pub fn new(key: &str, label: &str, item_type: ItemType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            item_type,
            ..Self::default()
        }
    }

    pub fn is_computed(&self) -> bool {
        self.item_type == ItemType::Computed
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeSection {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub items: Vec<AttributeItem>,
}

/// Ordered sections of assignable fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeCatalog {
    pub sections: Vec<AttributeSection>,
}

impl AttributeCatalog {
    pub fn new(sections: Vec<AttributeSection>) -> Self {
        Self { sections }
    }

    pub fn items(&self) -> impl Iterator<Item = &AttributeItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn item(&self, key: &str) -> Option<&AttributeItem> {
        self.items().find(|item| item.key == key)
    }

    pub fn is_computed(&self, key: &str) -> bool {
        self.item(key).is_some_and(AttributeItem::is_computed)
    }

    /// Number of assignable (non-computed) items.
    pub fn assignable_count(&self) -> usize {
        self.items().filter(|item| !item.is_computed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }
}
