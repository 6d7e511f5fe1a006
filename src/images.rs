// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Image set discovery for a ROM directory.

use crate::blockdev::BlockDevResolver;
use crate::config::{BOOT_IMAGE, EXTRA_IMAGE_WHITELIST, IMAGE_EXT};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// One image pending verification and flashing.
///
/// `data` holds the image contents once read; it is dropped with the
/// `Flashable`.
#[derive(Default)]
pub struct Flashable {
    pub image: PathBuf,
    pub block_dev: PathBuf,
    pub expected_hash: Option<String>,
    pub data: Vec<u8>,
}

impl fmt::Debug for Flashable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flashable")
            .field("image", &self.image)
            .field("block_dev", &self.block_dev)
            .field("expected_hash", &self.expected_hash)
            .field("size", &self.size())
            .finish()
    }
}

impl Flashable {
    pub fn new(image: impl Into<PathBuf>, block_dev: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            block_dev: block_dev.into(),
            ..Self::default()
        }
    }

    /// File name of the source image, used as the checksum key suffix.
    pub fn image_name(&self) -> String {
        self.image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Boot image first, then whitelisted extra images.
///
/// The boot image always maps to `boot_block_dev`. A failure to scan for
/// extras is logged and yields just the boot image.
pub fn build_image_set(
    rom_dir: &Path,
    boot_block_dev: &Path,
    resolver: &BlockDevResolver,
) -> Vec<Flashable> {
    let mut flashables = vec![Flashable::new(rom_dir.join(BOOT_IMAGE), boot_block_dev)];

    match find_extra_images(rom_dir, resolver) {
        Ok(extras) => flashables.extend(extras),
        Err(e) => tracing::warn!("{:?}: Failed to find extra images: {}", rom_dir, e),
    }

    flashables
}

/// Partition name for an extra image file name, if it is one.
fn extra_partition(name: &str) -> Option<&str> {
    if name == IMAGE_EXT || name.starts_with(BOOT_IMAGE) {
        return None;
    }
    name.strip_suffix(IMAGE_EXT)
}

pub fn is_whitelisted(partition: &str) -> bool {
    EXTRA_IMAGE_WHITELIST.contains(&partition)
}

/// Scan `rom_dir` for flashable images other than the boot image.
pub fn find_extra_images(rom_dir: &Path, resolver: &BlockDevResolver) -> io::Result<Vec<Flashable>> {
    let mut names: Vec<String> = std::fs::read_dir(rom_dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let mut extras = Vec::new();
    for name in names {
        let Some(partition) = extra_partition(&name) else {
            continue;
        };

        if !is_whitelisted(partition) {
            tracing::warn!("Partition {} is not whitelisted for flashing", partition);
            continue;
        }

        let Some(block_dev) = resolver.resolve(partition) else {
            tracing::warn!("Couldn't find block device for partition {}", partition);
            continue;
        };

        let image = rom_dir.join(&name);
        tracing::debug!("Found extra image: {:?} -> {:?}", image, block_dev);
        extras.push(Flashable::new(image, block_dev));
    }

    Ok(extras)
}
