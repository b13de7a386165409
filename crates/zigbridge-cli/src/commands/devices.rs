//! `zigbridge devices` -- list lights, sensors, and groups.

use std::collections::HashMap;

use tabled::{Table, Tabled, settings::Style};

use zigbridge_api::DeviceEntry;

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::error::CliError;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Model")]
    model: String,
}

fn rows(category: &'static str, entries: &HashMap<String, DeviceEntry>) -> Vec<DeviceRow> {
    let mut rows: Vec<DeviceRow> = entries
        .iter()
        .map(|(id, entry)| DeviceRow {
            category,
            id: id.clone(),
            name: entry.name.clone(),
            kind: entry.kind.clone().unwrap_or_default(),
            model: entry.modelid.clone().unwrap_or_default(),
        })
        .collect();
    // HashMap iteration order is arbitrary; present IDs sorted.
    rows.sort_by(|a, b| a.id.cmp(&b.id));
    rows
}

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = super::connect_paired(global)?;
    let bridge = session.bridge;

    let state = bridge.full_state().await.ok_or(CliError::StateUnavailable)?;

    let wanted = |category: &str| args.category.as_deref().is_none_or(|c| c == category);

    let mut all = Vec::new();
    if wanted("lights") {
        all.extend(rows("lights", &state.lights));
    }
    if wanted("sensors") {
        all.extend(rows("sensors", &state.sensors));
    }
    if wanted("groups") {
        all.extend(rows("groups", &state.groups));
    }

    if global.quiet {
        return Ok(());
    }
    if all.is_empty() {
        eprintln!("No devices known to the gateway.");
    } else {
        println!("{}", Table::new(&all).with(Style::rounded()));
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
