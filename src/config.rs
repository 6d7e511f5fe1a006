// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! On-device paths, identities and limits.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shared storage holding one image directory per ROM.
pub const MULTIBOOT_DIR: &str = "/data/media/0/MultiBoot";

/// Root-only property file mapping `<rom_id>/<image>` to a digest record.
pub const CHECKSUMS_PATH: &str = "/data/multiboot/checksums.prop";

/// Path whose security label is copied onto [`MULTIBOOT_DIR`].
pub const LABEL_REFERENCE_PATH: &str = "/data/media/0";

/// Android `media_rw` uid and gid.
pub const AID_MEDIA_RW: u32 = 1023;

/// Directory holding raw block device nodes.
pub const DEV_BLOCK_DIR: &str = "/dev/block";

/// Embedded storage partitions are probed directly under [`DEV_BLOCK_DIR`].
pub const EMMC_PREFIX: &str = "mmcblk";

/// File name of the boot image inside a ROM directory.
pub const BOOT_IMAGE: &str = "boot.img";

/// Extension of flashable images.
pub const IMAGE_EXT: &str = ".img";

/// Partitions (other than boot) that may be flashed from a ROM directory.
pub const EXTRA_IMAGE_WHITELIST: &[&str] = &["mdm", "modem"];

/// Marker that keeps the media scanner out of [`MULTIBOOT_DIR`].
pub const NOMEDIA_FILE: &str = ".nomedia";

/// Mode of ROM image directories and their contents after fix-up.
pub const IMAGE_DIR_MODE: u32 = 0o775;

/// Mode of the checksum property file.
pub const CHECKSUMS_MODE: u32 = 0o700;

/// Where the ROM registry looks for secondary ROMs.
pub const ROM_SLOT_ROOTS: &[&str] = &["/system/multiboot", "/cache/multiboot", "/data/multiboot"];

/// Id of the ROM installed on the stock system partition.
pub const PRIMARY_ROM_ID: &str = "primary";

/// Paths and identities used by [`crate::switcher::Switcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherConfig {
    pub multiboot_dir: PathBuf,
    pub checksums_path: PathBuf,
    pub label_reference: PathBuf,
    pub dev_block_dir: PathBuf,
    pub media_uid: u32,
    pub media_gid: u32,
    /// Owner of the checksum file.
    pub checksums_uid: u32,
    pub checksums_gid: u32,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            multiboot_dir: PathBuf::from(MULTIBOOT_DIR),
            checksums_path: PathBuf::from(CHECKSUMS_PATH),
            label_reference: PathBuf::from(LABEL_REFERENCE_PATH),
            dev_block_dir: PathBuf::from(DEV_BLOCK_DIR),
            media_uid: AID_MEDIA_RW,
            media_gid: AID_MEDIA_RW,
            checksums_uid: 0,
            checksums_gid: 0,
        }
    }
}

impl SwitcherConfig {
    /// Image directory of a single ROM.
    pub fn rom_dir(&self, rom_id: &str) -> PathBuf {
        self.multiboot_dir.join(rom_id)
    }
}
