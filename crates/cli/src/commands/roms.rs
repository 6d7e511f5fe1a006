// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::Table;
use romswitch::roms::{InstalledRoms, RomRegistry};
use std::path::PathBuf;

pub fn render(slot_roots: &[PathBuf]) -> Table {
    let registry = if slot_roots.is_empty() {
        InstalledRoms::default()
    } else {
        InstalledRoms::new(slot_roots.iter().cloned())
    };

    let mut table = Table::new();
    table.set_header(vec!["ROM", "System"]);
    for rom in registry.installed() {
        let system = rom
            .system_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![rom.id, system]);
    }
    table
}

pub fn run(slot_roots: &[PathBuf]) -> anyhow::Result<()> {
    println!("{}", render(slot_roots));
    Ok(())
}
