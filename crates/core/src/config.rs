// Timeline interval configuration
// Supplied by the hosting surface; the JSON shape matches what the process
// screens already persist (camelCase, `type` for the interval kind).

use serde::{Deserialize, Serialize};

/// Interval granularity of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntervalKind {
    #[serde(alias = "seconde", alias = "seconds")]
    Second,
    #[serde(alias = "heure", alias = "hours")]
    Hour,
    #[serde(alias = "jour", alias = "days")]
    Day,
    #[serde(alias = "date", alias = "dates")]
    DateRange,
    #[serde(alias = "semaine", alias = "weeks")]
    Week,
    #[serde(alias = "phases")]
    Phase,
}

impl IntervalKind {
    /// Hard ceiling on the number of cells for this kind, if any.
    pub fn cap(&self) -> Option<u32> {
        match self {
            IntervalKind::Second => Some(900),
            IntervalKind::Hour => Some(336),
            IntervalKind::Day | IntervalKind::DateRange => Some(365),
            IntervalKind::Week => Some(52),
            IntervalKind::Phase => None,
        }
    }

    /// Id prefix used for generated cells.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            IntervalKind::Second => "sec",
            IntervalKind::Hour => "hour",
            IntervalKind::Day => "day",
            IntervalKind::DateRange => "date",
            IntervalKind::Week => "week",
            IntervalKind::Phase => "phase",
        }
    }

    /// The count field that bounds this kind (None for date ranges and phases).
    pub fn count_field(&self) -> Option<ConfigField> {
        match self {
            IntervalKind::Second => Some(ConfigField::TotalSeconds),
            IntervalKind::Hour => Some(ConfigField::TotalHours),
            IntervalKind::Day => Some(ConfigField::TotalDays),
            IntervalKind::Week => Some(ConfigField::TotalWeeks),
            IntervalKind::DateRange | IntervalKind::Phase => None,
        }
    }
}

/// Logical pipeline the timeline belongs to. Partitions the preset catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineType {
    #[default]
    Culture,
    Curing,
    Separation,
    Extraction,
}

impl PipelineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineType::Culture => "culture",
            PipelineType::Curing => "curing",
            PipelineType::Separation => "separation",
            PipelineType::Extraction => "extraction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "culture" => Some(PipelineType::Culture),
            "curing" => Some(PipelineType::Curing),
            "separation" => Some(PipelineType::Separation),
            "extraction" => Some(PipelineType::Extraction),
            _ => None,
        }
    }
}

impl std::fmt::Display for PipelineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One phase of a phase-based timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase {
    /// Caller-supplied stable id; falls back to `phase-{index}` when absent or repeated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Duration in days; 7 when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(rename = "emoji", skip_serializing_if = "Option::is_none")]
    pub glyph: Option<String>,
}

impl Phase {
    pub fn new(id: &str, name: &str, duration: u32, glyph: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            duration: Some(duration),
            glyph: Some(glyph.to_string()),
        }
    }
}

/// Editable bound of a timeline config (the `onConfigChange` field names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigField {
    TotalSeconds,
    TotalHours,
    TotalDays,
    TotalWeeks,
}

impl ConfigField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::TotalSeconds => "totalSeconds",
            ConfigField::TotalHours => "totalHours",
            ConfigField::TotalDays => "totalDays",
            ConfigField::TotalWeeks => "totalWeeks",
        }
    }

    pub fn kind(&self) -> IntervalKind {
        match self {
            ConfigField::TotalSeconds => IntervalKind::Second,
            ConfigField::TotalHours => IntervalKind::Hour,
            ConfigField::TotalDays => IntervalKind::Day,
            ConfigField::TotalWeeks => IntervalKind::Week,
        }
    }
}

/// Interval configuration of a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfig {
    #[serde(rename = "type")]
    pub kind: Option<IntervalKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_weeks: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<Phase>,
}

impl TimelineConfig {
    pub fn seconds(n: u32) -> Self {
        Self { kind: Some(IntervalKind::Second), total_seconds: Some(n), ..Self::default() }
    }

    pub fn hours(n: u32) -> Self {
        Self { kind: Some(IntervalKind::Hour), total_hours: Some(n), ..Self::default() }
    }

    pub fn days(n: u32) -> Self {
        Self { kind: Some(IntervalKind::Day), total_days: Some(n), ..Self::default() }
    }

    pub fn weeks(n: u32) -> Self {
        Self { kind: Some(IntervalKind::Week), total_weeks: Some(n), ..Self::default() }
    }

    pub fn date_range(start: &str, end: &str) -> Self {
        Self {
            kind: Some(IntervalKind::DateRange),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            ..Self::default()
        }
    }

    pub fn phases(phases: Vec<Phase>) -> Self {
        Self { kind: Some(IntervalKind::Phase), phases, ..Self::default() }
    }

    /// Read a count bound.
    pub fn count(&self, field: ConfigField) -> Option<u32> {
        match field {
            ConfigField::TotalSeconds => self.total_seconds,
            ConfigField::TotalHours => self.total_hours,
            ConfigField::TotalDays => self.total_days,
            ConfigField::TotalWeeks => self.total_weeks,
        }
    }

    /// Write a count bound, clamped to the kind's ceiling. Returns the stored value.
    pub fn set_count(&mut self, field: ConfigField, value: u32) -> u32 {
        let clamped = match field.kind().cap() {
            Some(cap) => value.min(cap),
            None => value,
        };
        let slot = match field {
            ConfigField::TotalSeconds => &mut self.total_seconds,
            ConfigField::TotalHours => &mut self.total_hours,
            ConfigField::TotalDays => &mut self.total_days,
            ConfigField::TotalWeeks => &mut self.total_weeks,
        };
        *slot = Some(clamped);
        clamped
    }
}
