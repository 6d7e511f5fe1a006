// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Persistent checksum store.
//!
//! Maps `<rom_id>/<image>` to a serialized [`DigestRecord`]. The store is
//! loaded in full at the start of an operation, edited in memory and written
//! back in full only when the caller asks for it. It has no notion of which
//! keys belong to which ROM beyond the key prefix.

use crate::config::CHECKSUMS_MODE;
use crate::digest::{DigestParseError, DigestRecord};
use romswitch_props::{PersistOptions, Properties};
use std::io;
use std::path::PathBuf;

/// Outcome of a checksum lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumLookup {
    /// Hex SHA-512 digest recorded for the image.
    Found(String),
    NotFound,
    /// An entry exists but is not a valid `sha512:<digest>` record.
    Malformed,
}

#[derive(Debug, Clone)]
pub struct ChecksumStore {
    path: PathBuf,
    props: Properties,
    uid: u32,
    gid: u32,
}

impl ChecksumStore {
    /// Empty store that persists to `path`, owned by root.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            props: Properties::default(),
            uid: 0,
            gid: 0,
        }
    }

    pub fn load(path: impl Into<PathBuf>) -> romswitch_props::Result<Self> {
        let mut store = Self::new(path);
        store.props = romswitch_props::load(&store.path)?;
        Ok(store)
    }

    /// Load the store, falling back to an empty one if the file can't be read.
    pub fn load_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(path.clone()) {
            Ok(store) => store,
            Err(romswitch_props::PropsError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{:?}: No checksums file yet", path);
                Self::new(path)
            }
            Err(e) => {
                tracing::error!("{:?}: Failed to load properties: {}", path, e);
                Self::new(path)
            }
        }
    }

    /// Owner applied to the file by [`ChecksumStore::persist`].
    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Raw serialized record for a key, if any.
    pub fn raw(&self, rom_id: &str, image: &str) -> Option<&str> {
        self.props.get(&Self::key(rom_id, image)).map(String::as_str)
    }

    /// All raw entries, sorted by key.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .props
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }

    pub fn key(rom_id: &str, image: &str) -> String {
        format!("{}/{}", rom_id, image)
    }

    pub fn get(&self, rom_id: &str, image: &str) -> ChecksumLookup {
        let key = Self::key(rom_id, image);
        let Some(value) = self.props.get(&key) else {
            return ChecksumLookup::NotFound;
        };

        match value.parse::<DigestRecord>() {
            Ok(record) => ChecksumLookup::Found(record.hex_digest),
            Err(DigestParseError::UnsupportedAlgorithm(algo)) => {
                tracing::error!("{:?}: Invalid hash algorithm: {}", self.path, algo);
                ChecksumLookup::Malformed
            }
            Err(DigestParseError::MissingSeparator) => {
                tracing::error!("{:?}: Invalid checksum property: {}={}", self.path, key, value);
                ChecksumLookup::Malformed
            }
        }
    }

    /// Record `sha512` as the digest of `image` for `rom_id`, replacing any entry.
    pub fn update(&mut self, rom_id: &str, image: &str, sha512: &str) {
        let record = DigestRecord::sha512(sha512);
        self.props.insert(Self::key(rom_id, image), record.to_string());
    }

    /// Write the whole store back to its path.
    ///
    /// Ownership and mode failures are logged by the property writer; only a
    /// failed write is returned.
    pub fn persist(&self) -> romswitch_props::Result<()> {
        let opts = PersistOptions {
            uid: self.uid,
            gid: self.gid,
            mode: CHECKSUMS_MODE,
            ..PersistOptions::default()
        };

        romswitch_props::persist(&self.path, &self.props, opts).map_err(|e| {
            tracing::warn!("{:?}: Failed to write new properties: {}", self.path, e);
            e
        })
    }
}
