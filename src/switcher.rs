// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! ROM switching: verify-then-flash of a ROM's image set.
//!
//! Every image is read into memory before any digest is checked, and the
//! flash phase writes those same buffers. Nothing is re-read from disk after
//! verification, so a source image swapped in between cannot be flashed.

use crate::blockdev::BlockDevResolver;
use crate::checksums::{ChecksumLookup, ChecksumStore};
use crate::config::{SwitcherConfig, BOOT_IMAGE, IMAGE_DIR_MODE};
use crate::digest::sha512_hex;
use crate::error::{SwitchError, SwitchResult};
use crate::images::{build_image_set, Flashable};
use crate::permissions::{fix_permissions, PermissionOps};
use crate::roms::RomRegistry;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchRomResult {
    Succeeded,
    Failed,
    /// Some image has no recorded checksum.
    ChecksumNotFound,
    /// Some image has a malformed or mismatching checksum. Takes precedence
    /// over [`SwitchRomResult::ChecksumNotFound`].
    ChecksumInvalid,
}

impl SwitchRomResult {
    pub fn as_str(self) -> &'static str {
        match self {
            SwitchRomResult::Succeeded => "succeeded",
            SwitchRomResult::Failed => "failed",
            SwitchRomResult::ChecksumNotFound => "checksum_not_found",
            SwitchRomResult::ChecksumInvalid => "checksum_invalid",
        }
    }
}

pub struct Switcher {
    config: SwitcherConfig,
    roms: Arc<dyn RomRegistry>,
    perms: Arc<dyn PermissionOps>,
}

impl Switcher {
    pub fn new(config: SwitcherConfig, roms: Arc<dyn RomRegistry>, perms: Arc<dyn PermissionOps>) -> Self {
        Self { config, roms, perms }
    }

    fn load_checksums(&self) -> ChecksumStore {
        ChecksumStore::load_or_empty(self.config.checksums_path.clone())
            .with_owner(self.config.checksums_uid, self.config.checksums_gid)
    }

    /// Check the ROM id and create its image directory.
    fn prepare_rom_dir(&self, rom_id: &str) -> SwitchResult<PathBuf> {
        if self.roms.find_by_id(rom_id).is_none() {
            return Err(SwitchError::UnknownRom(rom_id.to_string()));
        }

        let rom_dir = self.config.rom_dir(rom_id);
        fs::DirBuilder::new()
            .recursive(true)
            .mode(IMAGE_DIR_MODE)
            .create(&rom_dir)
            .map_err(|source| SwitchError::CreateDir {
                path: rom_dir.clone(),
                source,
            })?;

        Ok(rom_dir)
    }

    /// Re-apply ownership, mode and labels to the image storage.
    pub fn fix_permissions(&self) -> SwitchResult<()> {
        fix_permissions(self.perms.as_ref(), &self.config)?;
        Ok(())
    }

    /// Switch to `rom_id`.
    ///
    /// Flashes the ROM's boot image to `boot_block_dev` and its whitelisted
    /// extra images to devices found in `block_dev_dirs`. With
    /// `force_update_checksums`, the digests of the images as read now are
    /// recorded before verification and the store is persisted afterwards.
    ///
    /// If one image's checksum is missing and another's is invalid, the
    /// result is always [`SwitchRomResult::ChecksumInvalid`].
    pub fn switch_rom(
        &self,
        rom_id: &str,
        boot_block_dev: &Path,
        block_dev_dirs: &[PathBuf],
        force_update_checksums: bool,
    ) -> SwitchRomResult {
        tracing::debug!("Attempting to switch to {}", rom_id);
        tracing::debug!("Force update checksums: {}", force_update_checksums);

        let rom_dir = match self.prepare_rom_dir(rom_id) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!("{}", e);
                return SwitchRomResult::Failed;
            }
        };

        let resolver = BlockDevResolver::new(block_dev_dirs.iter().cloned())
            .with_dev_block_dir(self.config.dev_block_dir.clone());
        let mut flashables = build_image_set(&rom_dir, boot_block_dev, &resolver);

        if let Err(e) = read_images(&mut flashables) {
            tracing::error!("{}", e);
            return SwitchRomResult::Failed;
        }

        let mut store = self.load_checksums();
        if let Err(result) = verify_checksums(&mut flashables, &mut store, rom_id, force_update_checksums) {
            return result;
        }

        if let Err(e) = flash_images(&flashables) {
            tracing::error!("{}", e);
            return SwitchRomResult::Failed;
        }
        drop(flashables);

        if force_update_checksums {
            tracing::debug!("Updating checksums file");
            // Logged by the store; the images are already flashed.
            let _ = store.persist();
        }

        if let Err(e) = self.fix_permissions() {
            tracing::error!("{}", e);
            return SwitchRomResult::Failed;
        }

        SwitchRomResult::Succeeded
    }

    /// Capture the current boot partition as `rom_id`'s boot image.
    ///
    /// Reads `boot_block_dev`, records its digest as `<rom_id>/boot.img` and
    /// writes it to the ROM directory. Checksums of other images are never
    /// touched, so an unrelated change to them is not legitimized here.
    pub fn set_kernel(&self, rom_id: &str, boot_block_dev: &Path) -> SwitchResult<()> {
        tracing::debug!("Attempting to set the kernel for {}", rom_id);

        let rom_dir = self.prepare_rom_dir(rom_id)?;
        let boot_image = rom_dir.join(BOOT_IMAGE);

        let data = fs::read(boot_block_dev).map_err(|source| SwitchError::Read {
            path: boot_block_dev.to_path_buf(),
            source,
        })?;
        let hash = sha512_hex(&data);

        let mut store = self.load_checksums();
        store.update(rom_id, BOOT_IMAGE, &hash);

        write_file(&boot_image, &data)?;
        drop(data);

        tracing::debug!("Updating checksums file");
        let _ = store.persist();

        self.fix_permissions()
    }
}

/// Read every source image into its buffer. Stops at the first failure.
pub fn read_images(flashables: &mut [Flashable]) -> SwitchResult<()> {
    for f in flashables.iter_mut() {
        f.data = fs::read(&f.image).map_err(|source| SwitchError::Read {
            path: f.image.clone(),
            source,
        })?;
        tracing::debug!("{:?}: Read {} bytes", f.image, f.size());
    }
    Ok(())
}

/// Hash the buffered images and check them against the store.
///
/// Malformed or mismatching entries fail immediately with
/// [`SwitchRomResult::ChecksumInvalid`]. Missing entries are only reported
/// once every image has been checked.
pub fn verify_checksums(
    flashables: &mut [Flashable],
    store: &mut ChecksumStore,
    rom_id: &str,
    force_update: bool,
) -> Result<(), SwitchRomResult> {
    for f in flashables.iter_mut() {
        let image_name = f.image_name();
        let hash = sha512_hex(&f.data);

        if force_update {
            store.update(rom_id, &image_name, &hash);
        }

        match store.get(rom_id, &image_name) {
            ChecksumLookup::Malformed => return Err(SwitchRomResult::ChecksumInvalid),
            ChecksumLookup::Found(expected) => {
                if expected != hash {
                    tracing::error!(
                        "{:?}: Checksum ({}) does not match expected ({})",
                        f.image,
                        hash,
                        expected
                    );
                    return Err(SwitchRomResult::ChecksumInvalid);
                }
                f.expected_hash = Some(expected);
            }
            ChecksumLookup::NotFound => {}
        }
    }

    if let Some(f) = flashables.iter().find(|f| f.expected_hash.is_none()) {
        tracing::error!("{:?}: Checksum does not exist", f.image);
        return Err(SwitchRomResult::ChecksumNotFound);
    }

    Ok(())
}

/// Write each buffer to its block device, in order.
pub fn flash_images(flashables: &[Flashable]) -> SwitchResult<()> {
    for f in flashables {
        tracing::debug!("Flashing {:?} to {:?}", f.image, f.block_dev);

        let write_err = |source: io::Error| SwitchError::Write {
            path: f.block_dev.clone(),
            source,
        };
        let mut dev = OpenOptions::new().write(true).open(&f.block_dev).map_err(write_err)?;
        dev.write_all(&f.data).map_err(write_err)?;
        dev.sync_all().map_err(write_err)?;
    }
    Ok(())
}

fn write_file(path: &Path, data: &[u8]) -> SwitchResult<()> {
    let write_err = |source: io::Error| SwitchError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(data).map_err(write_err)?;
    file.sync_all().map_err(write_err)
}
