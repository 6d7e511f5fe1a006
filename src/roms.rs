// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Installed ROM registry.

use crate::config::{PRIMARY_ROM_ID, ROM_SLOT_ROOTS};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    pub id: String,
    /// System directory of the ROM. `None` for the primary ROM.
    pub system_path: Option<PathBuf>,
}

/// Source of truth for which ROM ids exist.
pub trait RomRegistry: Send + Sync {
    fn installed(&self) -> Vec<Rom>;

    fn find_by_id(&self, id: &str) -> Option<Rom> {
        self.installed().into_iter().find(|rom| rom.id == id)
    }
}

/// Registry backed by slot directories on disk.
///
/// The primary ROM always exists. Every subdirectory of a slot root that
/// contains a `system` directory is a secondary ROM named after the
/// subdirectory.
#[derive(Debug, Clone)]
pub struct InstalledRoms {
    slot_roots: Vec<PathBuf>,
}

impl Default for InstalledRoms {
    fn default() -> Self {
        Self::new(ROM_SLOT_ROOTS.iter().copied())
    }
}

impl InstalledRoms {
    pub fn new<I, P>(slot_roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            slot_roots: slot_roots.into_iter().map(Into::into).collect(),
        }
    }
}

impl RomRegistry for InstalledRoms {
    fn installed(&self) -> Vec<Rom> {
        let mut roms = vec![Rom {
            id: PRIMARY_ROM_ID.to_string(),
            system_path: None,
        }];

        for root in &self.slot_roots {
            let entries = match std::fs::read_dir(root) {
                Ok(entries) => entries,
                Err(_) => continue,
            };

            let mut found: Vec<Rom> = entries
                .filter_map(Result::ok)
                .filter_map(|entry| {
                    let id = entry.file_name().into_string().ok()?;
                    let system = entry.path().join("system");
                    system.is_dir().then(|| Rom {
                        id,
                        system_path: Some(system),
                    })
                })
                .collect();
            found.sort_by(|a, b| a.id.cmp(&b.id));

            for rom in found {
                if roms.iter().all(|known| known.id != rom.id) {
                    roms.push(rom);
                }
            }
        }

        roms
    }
}
