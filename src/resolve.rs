//! Detached dependency references and their resolution.
//!
//! A [`DetachedDependency`] binds one coordinate to the session's registry and
//! artifact cache. It is not part of any shared, named dependency scope:
//! nothing else can pull it in transitively, and resolving it affects nothing
//! but its own cache entry. Resolution is lazy and blocking; the first call
//! downloads (or finds the cached file), later calls return the memoized path.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::archive::{ArchiveError, ArchiveTree};
use crate::cache::ArtifactCache;
use crate::checksum::Checksum;
use crate::coordinate::Coordinate;
use crate::repository::RepositoryRegistry;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no repository admits group '{group}' for {coordinate}")]
    NoRepository { group: String, coordinate: String },
    #[error("download of {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("download of {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("i/o failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{algorithm} mismatch for {url}\n  expected: {expected}\n  got:      {actual}")]
    ChecksumMismatch {
        url: String,
        algorithm: &'static str,
        expected: String,
        actual: String,
    },
}

/// A standalone, resolvable reference to one ad-hoc artifact.
#[derive(Debug)]
pub struct DetachedDependency {
    coordinate: Coordinate,
    registry: Arc<RepositoryRegistry>,
    cache: Arc<ArtifactCache>,
    checksum: Option<Checksum>,
    resolved: OnceLock<PathBuf>,
}

impl DetachedDependency {
    pub(crate) fn new(
        coordinate: Coordinate,
        registry: Arc<RepositoryRegistry>,
        cache: Arc<ArtifactCache>,
        checksum: Option<Checksum>,
    ) -> Self {
        Self {
            coordinate,
            registry,
            cache,
            checksum,
            resolved: OnceLock::new(),
        }
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    /// Resolve to the single backing file, downloading on first access.
    ///
    /// Blocks the calling thread on network I/O; no session-wide lock is held,
    /// so unrelated resolutions proceed concurrently.
    pub fn resolve(&self) -> Result<&Path, ResolveError> {
        if let Some(path) = self.resolved.get() {
            return Ok(path);
        }
        let group = self.coordinate.group();
        let repository =
            self.registry
                .source_for(group)
                .ok_or_else(|| ResolveError::NoRepository {
                    group: group.to_string(),
                    coordinate: self.coordinate.to_string(),
                })?;
        let url = repository.url_for(&self.coordinate);
        let path = self
            .cache
            .fetch(&self.coordinate, &url, self.checksum.as_ref())?;
        Ok(self.resolved.get_or_init(|| path))
    }

    /// The resolved file set. Always a single file for a pattern source; the
    /// set form is what task-input plumbing consumes.
    pub fn resolve_all(&self) -> Result<Vec<PathBuf>, ResolveError> {
        Ok(vec![self.resolve()?.to_path_buf()])
    }

    /// Lazy archive-tree view over the resolved file, for downstream
    /// extraction steps. Resolves (and therefore downloads) first; the archive
    /// itself is not opened until the tree is read.
    pub fn archive_tree(&self) -> Result<ArchiveTree, DependencyTreeError> {
        let path = self.resolve()?;
        Ok(ArchiveTree::for_file(path)?)
    }
}

/// Failure of [`DetachedDependency::archive_tree`]: either the resolution
/// itself or recognizing the resolved file as an archive.
#[derive(Error, Debug)]
pub enum DependencyTreeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
