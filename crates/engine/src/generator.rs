//! Interval cell generation.
//!
//! `generate` turns a `TimelineConfig` into the ordered cell sequence. It is a
//! pure function: no clock reads, no randomness, so regenerating from the same
//! config always yields the same ids.

use chrono::{DateTime, Duration, NaiveDate};
use rustc_hash::FxHashSet;

use pipegrid_core::{Cell, CellDetail, CellId, IntervalKind, Phase, TimelineConfig};

/// Non-fatal outcome flag of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Ok,
    /// Bounds missing (or zero); the host should show a "needs configuration" affordance.
    ConfigurationIncomplete,
    /// The requested count exceeded the kind's ceiling and was clamped.
    CapExceeded { requested: u32, cap: u32 },
    /// Date range endpoints did not parse, or start is after end.
    InvalidDates,
}

/// Cells plus the status flag describing how they were produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub cells: Vec<Cell>,
    pub status: GenerationStatus,
}

impl Generation {
    fn empty(status: GenerationStatus) -> Self {
        Self { cells: Vec::new(), status }
    }
}

/// Generate the ordered cells for a config.
pub fn generate(config: &TimelineConfig) -> Vec<Cell> {
    generate_with_report(config).cells
}

/// Generate the cells and report whether bounds were missing, clamped or invalid.
pub fn generate_with_report(config: &TimelineConfig) -> Generation {
    let Some(kind) = config.kind else {
        return Generation::empty(GenerationStatus::ConfigurationIncomplete);
    };

    match kind {
        IntervalKind::Second | IntervalKind::Hour | IntervalKind::Day | IntervalKind::Week => {
            counted(kind, config)
        }
        IntervalKind::DateRange => date_range(config),
        IntervalKind::Phase => phases(config),
    }
}

fn counted(kind: IntervalKind, config: &TimelineConfig) -> Generation {
    let requested = kind
        .count_field()
        .and_then(|field| config.count(field))
        .unwrap_or(0);
    if requested == 0 {
        return Generation::empty(GenerationStatus::ConfigurationIncomplete);
    }

    let (count, status) = clamp(kind, requested);
    let prefix = kind.id_prefix();
    let cells = (0..count)
        .map(|i| {
            let ordinal = i as usize;
            match kind {
                IntervalKind::Second => Cell {
                    id: CellId::new(format!("{prefix}-{i}")),
                    label: format!("{i}s"),
                    ordinal,
                    detail: CellDetail::Second { seconds: i },
                },
                IntervalKind::Hour => Cell {
                    id: CellId::new(format!("{prefix}-{}", i + 1)),
                    label: format!("{}h", i + 1),
                    ordinal,
                    detail: CellDetail::Hour { hours: i + 1 },
                },
                IntervalKind::Day => Cell {
                    id: CellId::new(format!("{prefix}-{}", i + 1)),
                    label: format!("J{}", i + 1),
                    ordinal,
                    detail: CellDetail::Day { day: i + 1 },
                },
                _ => Cell {
                    id: CellId::new(format!("{prefix}-{}", i + 1)),
                    label: format!("S{}", i + 1),
                    ordinal,
                    detail: CellDetail::Week { week: i + 1 },
                },
            }
        })
        .collect();

    Generation { cells, status }
}

fn clamp(kind: IntervalKind, requested: u32) -> (u32, GenerationStatus) {
    match kind.cap() {
        Some(cap) if requested > cap => {
            log::warn!("{:?} timeline requested {} cells, clamped to {}", kind, requested, cap);
            (cap, GenerationStatus::CapExceeded { requested, cap })
        }
        _ => (requested, GenerationStatus::Ok),
    }
}

/// Parse `YYYY-MM-DD`, or an RFC 3339 timestamp truncated to its date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn date_range(config: &TimelineConfig) -> Generation {
    let (Some(start), Some(end)) = (config.start.as_deref(), config.end.as_deref()) else {
        return Generation::empty(GenerationStatus::ConfigurationIncomplete);
    };
    if start.trim().is_empty() || end.trim().is_empty() {
        return Generation::empty(GenerationStatus::ConfigurationIncomplete);
    }

    let (Some(start), Some(end)) = (parse_date(start), parse_date(end)) else {
        log::debug!("date range has unparsable endpoints");
        return Generation::empty(GenerationStatus::InvalidDates);
    };
    if start > end {
        return Generation::empty(GenerationStatus::InvalidDates);
    }

    let span = (end - start).num_days() + 1;
    let requested = u32::try_from(span).unwrap_or(u32::MAX);
    let (count, status) = clamp(IntervalKind::DateRange, requested);

    let cells = (0..count)
        .map(|i| {
            let date = start + Duration::days(i64::from(i));
            let iso = date.format("%Y-%m-%d").to_string();
            Cell {
                id: CellId::new(format!("date-{iso}")),
                label: date.format("%d/%m").to_string(),
                ordinal: i as usize,
                detail: CellDetail::Date { date: iso, day: i + 1 },
            }
        })
        .collect();

    Generation { cells, status }
}

/// Default duration of a phase without one, in days.
pub const DEFAULT_PHASE_DURATION: u32 = 7;
/// Glyph of a phase without one.
pub const DEFAULT_PHASE_GLYPH: &str = "🌿";

/// Built-in culture phase sequence used when a phase timeline has no explicit list.
pub fn default_phases() -> Vec<Phase> {
    vec![
        Phase::new("phase-0", "Graine (J0)", 0, "🌰"),
        Phase::new("phase-1", "Germination", 3, "🌱"),
        Phase::new("phase-2", "Plantule", 7, "🌿"),
        Phase::new("phase-3", "Début Croissance", 14, "🌳"),
        Phase::new("phase-4", "Milieu Croissance", 14, "🌳"),
        Phase::new("phase-5", "Fin Croissance", 7, "🌳"),
        Phase::new("phase-6", "Début Stretch", 7, "🌲"),
        Phase::new("phase-7", "Milieu Stretch", 7, "🌲"),
        Phase::new("phase-8", "Fin Stretch", 7, "🌲"),
        Phase::new("phase-9", "Début Floraison", 21, "🌸"),
        Phase::new("phase-10", "Milieu Floraison", 21, "🌺"),
        Phase::new("phase-11", "Fin Floraison", 14, "🏵️"),
    ]
}

fn phases(config: &TimelineConfig) -> Generation {
    let defaults;
    let list: &[Phase] = if config.phases.is_empty() {
        defaults = default_phases();
        &defaults
    } else {
        &config.phases
    };

    let mut used = FxHashSet::default();
    let cells = list
        .iter()
        .enumerate()
        .map(|(i, phase)| {
            let id = unique_phase_id(phase.id.as_deref(), i, &mut used);
            let name = if phase.name.trim().is_empty() {
                format!("Phase {}", i + 1)
            } else {
                phase.name.clone()
            };
            Cell {
                id: CellId::new(id),
                label: name.clone(),
                ordinal: i,
                detail: CellDetail::Phase {
                    name,
                    duration_days: phase.duration.unwrap_or(DEFAULT_PHASE_DURATION),
                    glyph: phase
                        .glyph
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PHASE_GLYPH.to_string()),
                },
            }
        })
        .collect();

    Generation { cells, status: GenerationStatus::Ok }
}

/// The phase's own id, or `phase-{i}`. A repeated id falls back to the
/// positional one, then to `phase-{i}-{n}`.
fn unique_phase_id(given: Option<&str>, i: usize, used: &mut FxHashSet<String>) -> String {
    let positional = format!("phase-{i}");
    let preferred = match given {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => positional.clone(),
    };
    if used.insert(preferred.clone()) {
        return preferred;
    }
    log::warn!("duplicate phase id '{}' at position {}", preferred, i);
    if used.insert(positional.clone()) {
        return positional;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{positional}-{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
