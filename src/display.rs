//! # Table renderers
//!
//! Terminal tables for the objects a user inspects before submitting a ToO request,
//! built with [`comfy-table`]:
//!
//! - [`queue_table`] – the triggers of a local [`crate::api::Queue`],
//! - [`trigger_table`] – the exposures planned by a multi-day campaign,
//! - [`field_table`] – the ZTF fields able to observe a target.
//!
//! All tables use the `UTF8_FULL` preset with dynamic column widths; numeric columns are
//! right-aligned.
//!
//! [`comfy-table`]: https://crates.io/crates/comfy-table
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};

use crate::api::Trigger;
use crate::fields::grid::FieldCandidate;
use crate::multiday_plan::PlannedTrigger;
use crate::time::mjd_to_iso_seconds;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    table
}

fn right(content: impl ToString) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

/// Local queue triggers, one row per target of each trigger.
pub fn queue_table<'a>(triggers: impl Iterator<Item = (&'a usize, &'a Trigger)>) -> Table {
    let mut table = new_table(&[
        "#",
        "Queue name",
        "Start (UTC)",
        "End (UTC)",
        "Field",
        "Filter",
        "Exposure [s]",
        "Subprogram",
    ]);

    for (index, trigger) in triggers {
        let [start, end] = trigger.validity_window_mjd;
        for target in &trigger.targets {
            table.add_row(Row::from(vec![
                right(index),
                Cell::new(&trigger.queue_name),
                Cell::new(mjd_to_iso_seconds(start)),
                Cell::new(mjd_to_iso_seconds(end)),
                right(target.field_id),
                right(target.filter_id),
                right(target.exposure_time),
                Cell::new(&target.subprogram_name),
            ]));
        }
    }
    table
}

/// Exposures planned by a campaign.
pub fn trigger_table(triggers: &[PlannedTrigger]) -> Table {
    let mut table = new_table(&["Start (UTC)", "MJD", "Field", "Filter", "Exposure [s]"]);
    for trigger in triggers {
        table.add_row(Row::from(vec![
            Cell::new(mjd_to_iso_seconds(trigger.mjd_start)),
            right(format!("{:.6}", trigger.mjd_start)),
            right(trigger.field_id),
            right(trigger.filter_id),
            right(trigger.exposure_time),
        ]));
    }
    table
}

/// Candidate fields, best first.
pub fn field_table(candidates: &[FieldCandidate]) -> Table {
    let mut table = new_table(&[
        "Field",
        "RA [deg]",
        "Dec [deg]",
        "Coverage [%]",
        "Separation [deg]",
        "E(B-V)",
    ]);
    for candidate in candidates {
        let field = &candidate.field;
        table.add_row(Row::from(vec![
            right(field.id),
            right(format!("{:.4}", field.ra)),
            right(format!("{:.4}", field.dec)),
            right(format!("{:.1}", candidate.coverage * 100.0)),
            right(format!("{:.2}", candidate.separation)),
            right(field.ebv.map_or_else(|| "-".to_string(), |e| format!("{e:.3}"))),
        ]));
    }
    table
}

#[cfg(test)]
mod display_test {
    use super::*;
    use crate::fields::grid::Field;

    #[test]
    fn test_trigger_table() {
        let rendered = trigger_table(&[PlannedTrigger {
            mjd_start: 59702.44097222222,
            field_id: 593,
            filter_id: 1,
            exposure_time: 300,
        }])
        .to_string();
        assert!(rendered.contains("2022-05-03 10:35:00"));
        assert!(rendered.contains("593"));
        assert!(rendered.contains("Exposure [s]"));
    }

    #[test]
    fn test_field_table() {
        let rendered = field_table(&[FieldCandidate {
            field: Field {
                id: 720,
                ra: 224.3,
                dec: 41.35,
                ebv: None,
                galactic_longitude: None,
                galactic_latitude: None,
            },
            coverage: 0.875,
            separation: 1.2,
        }])
        .to_string();
        assert!(rendered.contains("720"));
        assert!(rendered.contains("87.5"));
    }
}
