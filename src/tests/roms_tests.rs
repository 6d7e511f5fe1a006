// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::config::PRIMARY_ROM_ID;
use crate::roms::{InstalledRoms, RomRegistry};
use tempfile::tempdir;

#[test]
fn test_primary_always_installed() {
    let dir = tempdir().unwrap();
    let roms = InstalledRoms::new([dir.path().join("nothing-here")]);
    let installed = roms.installed();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].id, PRIMARY_ROM_ID);
    assert!(roms.find_by_id(PRIMARY_ROM_ID).is_some());
}

#[test]
fn test_slots_require_system_dir() {
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache");
    let data = dir.path().join("data");
    std::fs::create_dir_all(cache.join("multi-slot-1").join("system")).unwrap();
    std::fs::create_dir_all(data.join("data-slot-a").join("system")).unwrap();
    std::fs::create_dir_all(data.join("not-a-rom")).unwrap();
    std::fs::write(data.join("stray-file"), b"").unwrap();

    let roms = InstalledRoms::new([cache, data.clone()]);
    let ids: Vec<String> = roms.installed().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["primary", "multi-slot-1", "data-slot-a"]);

    let rom = roms.find_by_id("data-slot-a").unwrap();
    assert_eq!(rom.system_path, Some(data.join("data-slot-a").join("system")));
    assert!(roms.find_by_id("not-a-rom").is_none());
    assert!(roms.find_by_id("../data").is_none());
}
