// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::checksums::ChecksumStore;
use crate::config::SwitcherConfig;
use crate::permissions::PermissionOps;
use crate::roms::InstalledRoms;
use crate::switcher::Switcher;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const ROM_ID: &str = "dual";
pub const OTHER_ROM_ID: &str = "data-slot-test";

/// Records calls instead of touching ownership or labels.
#[derive(Default)]
pub struct RecordingPermissions {
    pub calls: Mutex<Vec<String>>,
    pub label: Option<String>,
    pub fail_chown: bool,
    pub fail_chmod: bool,
    pub fail_set_label: bool,
}

impl RecordingPermissions {
    pub fn with_label(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn denied() -> io::Error {
    io::Error::from_raw_os_error(libc::EPERM)
}

impl PermissionOps for RecordingPermissions {
    fn create_empty_file(&self, path: &Path) -> io::Result<()> {
        self.record(format!("touch {}", path.file_name().unwrap().to_string_lossy()));
        Ok(())
    }

    fn chown_recursive(&self, _path: &Path, uid: u32, gid: u32) -> io::Result<()> {
        self.record(format!("chown {}:{}", uid, gid));
        if self.fail_chown {
            Err(denied())
        } else {
            Ok(())
        }
    }

    fn chmod_recursive(&self, _path: &Path, mode: u32) -> io::Result<()> {
        self.record(format!("chmod {:o}", mode));
        if self.fail_chmod {
            Err(denied())
        } else {
            Ok(())
        }
    }

    fn get_label(&self, _path: &Path) -> io::Result<String> {
        self.label
            .clone()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENODATA))
    }

    fn set_label_recursive(&self, _path: &Path, label: &str) -> io::Result<()> {
        self.record(format!("label {}", label));
        if self.fail_set_label {
            Err(denied())
        } else {
            Ok(())
        }
    }
}

/// Scratch device layout: image storage, checksum file, a by-name block
/// device directory and one secondary ROM slot.
pub struct Fixture {
    pub dir: TempDir,
    pub config: SwitcherConfig,
    pub slot_root: PathBuf,
    pub by_name: PathBuf,
    pub boot_dev: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let slot_root = root.join("slots");
        std::fs::create_dir_all(slot_root.join(ROM_ID).join("system")).unwrap();
        std::fs::create_dir_all(slot_root.join(OTHER_ROM_ID).join("system")).unwrap();

        let by_name = root.join("by-name");
        std::fs::create_dir_all(&by_name).unwrap();
        std::fs::create_dir_all(root.join("dev-block")).unwrap();

        let owner = std::fs::metadata(root).unwrap();
        let config = SwitcherConfig {
            multiboot_dir: root.join("MultiBoot"),
            checksums_path: root.join("multiboot").join("checksums.prop"),
            label_reference: root.join("media"),
            dev_block_dir: root.join("dev-block"),
            media_uid: 1023,
            media_gid: 1023,
            checksums_uid: owner.uid(),
            checksums_gid: owner.gid(),
        };

        let boot_dev = by_name.join("boot");
        std::fs::write(&boot_dev, b"").unwrap();

        Self {
            dir,
            config,
            slot_root,
            by_name,
            boot_dev,
        }
    }

    pub fn switcher(&self, perms: Arc<RecordingPermissions>) -> Switcher {
        let roms = Arc::new(InstalledRoms::new([self.slot_root.clone()]));
        Switcher::new(self.config.clone(), roms, perms)
    }

    pub fn rom_dir(&self, rom_id: &str) -> PathBuf {
        self.config.rom_dir(rom_id)
    }

    pub fn write_image(&self, rom_id: &str, name: &str, data: &[u8]) -> PathBuf {
        let rom_dir = self.rom_dir(rom_id);
        std::fs::create_dir_all(&rom_dir).unwrap();
        let path = rom_dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Empty file standing in for a block device.
    pub fn add_block_dev(&self, partition: &str) -> PathBuf {
        let path = self.by_name.join(partition);
        std::fs::write(&path, b"").unwrap();
        path
    }

    pub fn block_dev_dirs(&self) -> Vec<PathBuf> {
        vec![self.by_name.clone()]
    }

    pub fn store(&self) -> ChecksumStore {
        ChecksumStore::load_or_empty(self.config.checksums_path.clone())
            .with_owner(self.config.checksums_uid, self.config.checksums_gid)
    }

    /// Write raw property lines to the checksum file.
    pub fn seed_raw(&self, lines: &[(&str, &str)]) {
        let path = &self.config.checksums_path;
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let text: String = lines.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect();
        std::fs::write(path, text).unwrap();
    }

    pub fn read(&self, path: &Path) -> Vec<u8> {
        std::fs::read(path).unwrap()
    }
}
