// pgrid cells - print a generated timeline

use std::io::{self, Write};

use serde_json::{json, Value};

use pipegrid_core::{Cell, CellDetail, TimelineConfig};
use pipegrid_engine::{generate_with_report, GenerationStatus};

use crate::{CliError, KindArg};

pub fn cmd_cells(
    kind: KindArg,
    total: Option<u32>,
    start: Option<String>,
    end: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let config = build_config(kind, total, start, end)?;
    let generation = generate_with_report(&config);

    match generation.status {
        GenerationStatus::ConfigurationIncomplete => {
            return Err(CliError::usage("timeline needs configuration").with_hint(match kind {
                KindArg::Dates => "pass --start and --end",
                _ => "pass --total with a positive count",
            }));
        }
        GenerationStatus::InvalidDates => {
            return Err(CliError::usage("invalid date range")
                .with_hint("dates are YYYY-MM-DD and --start must not be after --end"));
        }
        GenerationStatus::CapExceeded { requested, cap } => {
            log::warn!("requested {} intervals; clamped to {}", requested, cap);
        }
        GenerationStatus::Ok => {}
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let doc = json!({
            "status": status_json(&generation.status),
            "count": generation.cells.len(),
            "cells": generation.cells,
        });
        writeln!(out, "{}", doc).map_err(CliError::io)?;
    } else {
        for cell in &generation.cells {
            writeln!(out, "{}\t{}\t{}", cell.id, cell.label, detail_text(cell)).map_err(CliError::io)?;
        }
    }
    Ok(())
}

fn build_config(
    kind: KindArg,
    total: Option<u32>,
    start: Option<String>,
    end: Option<String>,
) -> Result<TimelineConfig, CliError> {
    if kind != KindArg::Dates && (start.is_some() || end.is_some()) {
        return Err(CliError::usage("--start/--end only apply to --kind dates"));
    }
    if matches!(kind, KindArg::Dates | KindArg::Phases) && total.is_some() {
        return Err(CliError::usage("--total does not apply to dates or phases"));
    }

    let n = total.unwrap_or(0);
    Ok(match kind {
        KindArg::Seconds => TimelineConfig::seconds(n),
        KindArg::Hours => TimelineConfig::hours(n),
        KindArg::Days => TimelineConfig::days(n),
        KindArg::Weeks => TimelineConfig::weeks(n),
        KindArg::Dates => TimelineConfig::date_range(
            start.as_deref().unwrap_or_default(),
            end.as_deref().unwrap_or_default(),
        ),
        KindArg::Phases => TimelineConfig::phases(Vec::new()),
    })
}

fn status_json(status: &GenerationStatus) -> Value {
    match status {
        GenerationStatus::Ok => json!("ok"),
        GenerationStatus::ConfigurationIncomplete => json!("configurationIncomplete"),
        GenerationStatus::InvalidDates => json!("invalidDates"),
        GenerationStatus::CapExceeded { requested, cap } => {
            json!({ "capExceeded": { "requested": requested, "cap": cap } })
        }
    }
}

fn detail_text(cell: &Cell) -> String {
    match &cell.detail {
        CellDetail::Second { seconds } => format!("{}s", seconds),
        CellDetail::Hour { hours } => format!("{}h", hours),
        CellDetail::Day { day } => format!("day {}", day),
        CellDetail::Week { week } => format!("week {}", week),
        CellDetail::Date { date, .. } => date.clone(),
        CellDetail::Phase { glyph, duration_days, .. } => format!("{} {}d", glyph, duration_days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipegrid_core::IntervalKind;

    #[test]
    fn test_build_config_per_kind() {
        let cfg = build_config(KindArg::Hours, Some(5), None, None).unwrap();
        assert_eq!(cfg.kind, Some(IntervalKind::Hour));
        assert_eq!(cfg.total_hours, Some(5));

        let cfg = build_config(KindArg::Dates, None, Some("2025-01-01".into()), Some("2025-01-03".into())).unwrap();
        assert_eq!(cfg.start.as_deref(), Some("2025-01-01"));
    }

    #[test]
    fn test_mismatched_bounds_are_usage_errors() {
        let err = build_config(KindArg::Days, None, Some("2025-01-01".into()), None).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        let err = build_config(KindArg::Phases, Some(3), None, None).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }

    #[test]
    fn test_status_json_shapes() {
        assert_eq!(status_json(&GenerationStatus::Ok), json!("ok"));
        assert_eq!(
            status_json(&GenerationStatus::CapExceeded { requested: 400, cap: 365 }),
            json!({ "capExceeded": { "requested": 400, "cap": 365 } })
        );
    }
}
