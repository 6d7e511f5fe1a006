// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Digest records stored in the checksum file.
//!
//! A record is serialized as `<algorithm>:<hex digest>`. Only `sha512` is
//! accepted; anything else is a malformed record rather than a parse panic.

use core::fmt;
use core::str::FromStr;
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Length of a hex-encoded SHA-512 digest.
pub const SHA512_HEX_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha512,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DigestParseError {
    #[error("missing ':' between algorithm and digest")]
    MissingSeparator,
    #[error("invalid hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Algorithm-tagged hex digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRecord {
    pub algorithm: HashAlgorithm,
    pub hex_digest: String,
}

impl DigestRecord {
    pub fn sha512(hex_digest: impl Into<String>) -> Self {
        Self {
            algorithm: HashAlgorithm::Sha512,
            hex_digest: hex_digest.into(),
        }
    }
}

impl FromStr for DigestRecord {
    type Err = DigestParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (algo, hash) = value
            .split_once(':')
            .ok_or(DigestParseError::MissingSeparator)?;
        let algorithm = HashAlgorithm::from_name(algo)
            .ok_or_else(|| DigestParseError::UnsupportedAlgorithm(algo.to_string()))?;

        Ok(Self {
            algorithm,
            hex_digest: hash.to_string(),
        })
    }
}

impl fmt::Display for DigestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex_digest)
    }
}

/// Lowercase hex SHA-512 of `data`.
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}
