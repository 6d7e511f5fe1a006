// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Partition name to block device lookup.

use crate::config::{DEV_BLOCK_DIR, EMMC_PREFIX};
use std::path::{Path, PathBuf};

/// Non-recursive search for block devices by partition name.
#[derive(Debug, Clone)]
pub struct BlockDevResolver {
    dev_block_dir: PathBuf,
    search_dirs: Vec<PathBuf>,
}

impl BlockDevResolver {
    pub fn new<I, P>(search_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dev_block_dir: PathBuf::from(DEV_BLOCK_DIR),
            search_dirs: search_dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Directory probed directly for embedded storage partitions.
    pub fn with_dev_block_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dev_block_dir = dir.into();
        self
    }

    /// Find the device node for `partition`.
    ///
    /// `mmcblk*` names are tried under `/dev/block` first. Otherwise each
    /// search directory is probed in order and the first hit wins.
    pub fn resolve(&self, partition: &str) -> Option<PathBuf> {
        if partition.starts_with(EMMC_PREFIX) {
            let path = self.dev_block_dir.join(partition);
            if exists(&path) {
                return Some(path);
            }
        }

        self.search_dirs
            .iter()
            .map(|dir| dir.join(partition))
            .find(|path| exists(path))
    }
}

// Like stat(2): follows symlinks, by-name links are the common case.
fn exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}
