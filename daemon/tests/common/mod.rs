// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![allow(dead_code)]

use romswitch::permissions::PermissionOps;
use romswitch::roms::InstalledRoms;
use romswitch::{Switcher, SwitcherConfig};
use romswitch_daemon::server::Daemon;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ROM_ID: &str = "dual";

/// Leaves ownership and labels alone.
pub struct NoopPermissions;

impl PermissionOps for NoopPermissions {
    fn create_empty_file(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn chown_recursive(&self, _path: &Path, _uid: u32, _gid: u32) -> io::Result<()> {
        Ok(())
    }

    fn chmod_recursive(&self, _path: &Path, _mode: u32) -> io::Result<()> {
        Ok(())
    }

    fn get_label(&self, _path: &Path) -> io::Result<String> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn set_label_recursive(&self, _path: &Path, _label: &str) -> io::Result<()> {
        Ok(())
    }
}

pub struct TestDevice {
    pub dir: TempDir,
    pub config: SwitcherConfig,
    pub boot_dev: PathBuf,
}

impl TestDevice {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("slots").join(ROM_ID).join("system")).unwrap();
        std::fs::create_dir_all(root.join("by-name")).unwrap();

        let owner = std::fs::metadata(root).unwrap();
        let config = SwitcherConfig {
            multiboot_dir: root.join("MultiBoot"),
            checksums_path: root.join("multiboot").join("checksums.prop"),
            label_reference: root.join("media"),
            dev_block_dir: root.join("dev-block"),
            media_uid: owner.uid(),
            media_gid: owner.gid(),
            checksums_uid: owner.uid(),
            checksums_gid: owner.gid(),
        };

        let boot_dev = root.join("by-name").join("boot");
        std::fs::write(&boot_dev, b"").unwrap();

        Self { dir, config, boot_dev }
    }

    pub fn daemon(&self) -> Arc<Daemon> {
        self.daemon_with_idle_timeout(None)
    }

    pub fn daemon_with_idle_timeout(&self, timeout: Option<Duration>) -> Arc<Daemon> {
        let roms = Arc::new(InstalledRoms::new([self.dir.path().join("slots")]));
        let switcher = Switcher::new(self.config.clone(), roms, Arc::new(NoopPermissions));
        Arc::new(Daemon::new(switcher).with_idle_timeout(timeout))
    }

    pub fn write_boot_image(&self, data: &[u8]) {
        let rom_dir = self.config.rom_dir(ROM_ID);
        std::fs::create_dir_all(&rom_dir).unwrap();
        std::fs::write(rom_dir.join("boot.img"), data).unwrap();
    }
}
