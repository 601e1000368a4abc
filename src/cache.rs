//! On-disk artifact cache, addressed by coordinate and source URL.
//!
//! Entry layout: `<root>/<group>/<file-name>-<url-digest>/<file-name>`, with a
//! `source.json` sidecar recording where the bytes came from. Entries are
//! published atomically: the body streams to a temp file in the entry
//! directory and is renamed into place only after it verifies, so a cancelled
//! or failed download never leaves a partial entry visible. Concurrent
//! fetchers of the same entry serialize on an advisory `.lock` file; unrelated
//! entries download in parallel.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use fs2::FileExt;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::checksum::{self, Checksum};
use crate::coordinate::Coordinate;
use crate::output;
use crate::resolve::ResolveError;

/// Default connect/read timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Timeout from `QUARRY_HTTP_TIMEOUT` or the default, read once and clamped
/// to 5-300 seconds.
fn http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var("QUARRY_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        Duration::from_secs(secs.clamp(5, 300))
    })
}

/// Provenance sidecar written next to each cached artifact.
#[derive(Serialize)]
struct SourceRecord<'a> {
    url: &'a str,
    group: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classifier: Option<&'a str>,
    ext: &'a str,
    sha256: &'a str,
}

/// Durable store for downloaded artifacts.
#[derive(Debug)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user default location, falling back to a temp dir on systems
    /// without a cache directory convention.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("quarry")
            .join("artifacts")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the cached file for `coordinate` fetched from `url`, downloading
    /// it first if no entry exists.
    pub fn fetch(
        &self,
        coordinate: &Coordinate,
        url: &str,
        expected: Option<&Checksum>,
    ) -> Result<PathBuf, ResolveError> {
        let dir = self.entry_dir(coordinate, url);
        let dest = dir.join(coordinate.file_name());
        if dest.is_file() {
            return Ok(dest);
        }

        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
        let lock_path = dir.join(".lock");
        let lock = File::create(&lock_path).map_err(|e| io_error(&lock_path, e))?;
        lock.lock_exclusive().map_err(|e| io_error(&lock_path, e))?;

        // Another fetcher may have published the entry while we waited.
        if dest.is_file() {
            return Ok(dest);
        }

        let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| io_error(&dir, e))?;
        download(url, &mut temp)?;
        temp.flush().map_err(|e| io_error(temp.path(), e))?;

        let file_sha256 = verify(temp.path(), url, expected)?;

        temp.persist(&dest).map_err(|e| io_error(&dest, e.error))?;

        let record = SourceRecord {
            url,
            group: coordinate.group(),
            name: coordinate.name(),
            version: coordinate.version(),
            classifier: coordinate.classifier(),
            ext: coordinate.ext(),
            sha256: &file_sha256,
        };
        if let Err(e) = write_source_record(&dir, &record) {
            output::warning(&format!("could not record provenance for {url}: {e}"));
        }

        Ok(dest)
    }

    /// One directory per coordinate+URL pair; the URL digest keeps two sources
    /// that happen to share a file name apart.
    fn entry_dir(&self, coordinate: &Coordinate, url: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        self.root
            .join(coordinate.group().replace(':', "_"))
            .join(format!("{}-{}", coordinate.file_name(), &digest[..12]))
    }
}

/// Check the downloaded bytes against the caller's expected digest (if any)
/// and return the file's SHA-256 for the provenance record.
fn verify(path: &Path, url: &str, expected: Option<&Checksum>) -> Result<String, ResolveError> {
    let mut file_sha256 = None;
    if let Some(expected) = expected {
        let actual = expected.compute(path).map_err(|e| io_error(path, e))?;
        if !expected.matches(&actual) {
            return Err(ResolveError::ChecksumMismatch {
                url: url.to_string(),
                algorithm: expected.algorithm(),
                expected: expected.expected().to_lowercase(),
                actual,
            });
        }
        if matches!(expected, Checksum::Sha256(_)) {
            file_sha256 = Some(actual);
        }
    }
    match file_sha256 {
        Some(hash) => Ok(hash),
        None => checksum::sha256_file(path).map_err(|e| io_error(path, e)),
    }
}

fn write_source_record(dir: &Path, record: &SourceRecord<'_>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(dir.join("source.json"), json)
}

/// Stream `url` into `dest`, with a spinner that upgrades to a sized bar once
/// Content-Length is known.
fn download(url: &str, dest: &mut impl Write) -> Result<u64, ResolveError> {
    let file_label = url.rsplit('/').next().unwrap_or("artifact");
    let pb = output::download_spinner(&format!("downloading {file_label}"));

    let response = ureq::get(url)
        .timeout(http_timeout())
        .call()
        .map_err(|e| {
            pb.finish_and_clear();
            match e {
                ureq::Error::Status(status, _) => ResolveError::HttpStatus {
                    url: url.to_string(),
                    status,
                },
                other => ResolveError::Network {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            }
        })?;

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        output::download_bar(&pb, len);
    }

    let mut reader = response.into_reader();
    let copied = (|| -> io::Result<u64> {
        let mut buffer = [0u8; 8192];
        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            dest.write_all(&buffer[..n])?;
            total += n as u64;
            pb.set_position(total);
        }
        Ok(total)
    })();
    pb.finish_and_clear();

    let total = copied.map_err(|e| ResolveError::Network {
        url: url.to_string(),
        reason: format!("transfer failed: {e}"),
    })?;
    output::detail(&format!("downloaded {file_label} ({total} bytes)"));
    Ok(total)
}

fn io_error(path: &Path, source: io::Error) -> ResolveError {
    ResolveError::Io {
        path: path.to_path_buf(),
        source,
    }
}
