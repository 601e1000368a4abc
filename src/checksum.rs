//! Content verification for downloaded artifacts.
//!
//! An expected digest travels with the dependency that declared it and is
//! checked against the downloaded bytes before the cache entry is published.
//! Supported algorithms: SHA-256 (recommended), SHA-512, BLAKE3.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256, Sha512};

/// An expected digest, as a lowercase or uppercase hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    Sha256(String),
    Sha512(String),
    Blake3(String),
}

impl Checksum {
    pub fn algorithm(&self) -> &'static str {
        match self {
            Checksum::Sha256(_) => "sha256",
            Checksum::Sha512(_) => "sha512",
            Checksum::Blake3(_) => "blake3",
        }
    }

    pub fn expected(&self) -> &str {
        match self {
            Checksum::Sha256(hex) | Checksum::Sha512(hex) | Checksum::Blake3(hex) => hex,
        }
    }

    /// Digest `file` with this checksum's algorithm, returning lowercase hex.
    pub fn compute(&self, file: &Path) -> io::Result<String> {
        match self {
            Checksum::Sha256(_) => hash_file::<Sha256>(file),
            Checksum::Sha512(_) => hash_file::<Sha512>(file),
            Checksum::Blake3(_) => blake3_file(file),
        }
    }

    pub fn matches(&self, actual: &str) -> bool {
        self.expected().eq_ignore_ascii_case(actual)
    }
}

/// SHA-256 of a file, used for cache-entry metadata independent of any
/// caller-declared checksum.
pub fn sha256_file(file: &Path) -> io::Result<String> {
    hash_file::<Sha256>(file)
}

fn hash_file<D: Digest>(file: &Path) -> io::Result<String> {
    let mut f = File::open(file)?;
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = f.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn blake3_file(file: &Path) -> io::Result<String> {
    let mut f = File::open(file)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = f.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
