// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use comfy_table::Table;
use romswitch::digest::DigestRecord;
use romswitch::ChecksumStore;
use std::path::Path;

/// Table of recorded digests, optionally limited to one ROM.
pub fn render(path: &Path, rom_id: Option<&str>) -> anyhow::Result<Table> {
    let store = ChecksumStore::load(path)
        .with_context(|| format!("Failed to load checksums from {:?}", path))?;

    let mut table = Table::new();
    table.set_header(vec!["ROM", "Image", "Algorithm", "Digest"]);
    for (key, value) in store.entries() {
        let (rom, image) = key.split_once('/').unwrap_or((key, ""));
        if rom_id.is_some_and(|id| id != rom) {
            continue;
        }
        let (algorithm, digest) = match value.parse::<DigestRecord>() {
            Ok(record) => (record.algorithm.to_string(), abbreviate(&record.hex_digest)),
            Err(e) => ("invalid".to_string(), e.to_string()),
        };
        table.add_row(vec![rom.to_string(), image.to_string(), algorithm, digest]);
    }
    Ok(table)
}

fn abbreviate(hex: &str) -> String {
    if hex.chars().count() > 16 {
        format!("{}…", hex.chars().take(16).collect::<String>())
    } else {
        hex.to_string()
    }
}

pub fn run(path: &Path, rom_id: Option<&str>) -> anyhow::Result<()> {
    println!("{}", render(path, rom_id)?);
    Ok(())
}
