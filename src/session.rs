//! The build session: repository registry plus artifact cache.
//!
//! A [`Session`] is created once by the embedding build logic and plays the
//! role of the engine's process-wide configuration state. Repositories are
//! registered during the configuration phase, before parallel task execution
//! begins, and never removed; resolution may happen from any task thread
//! afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::cache::ArtifactCache;
use crate::checksum::Checksum;
use crate::coordinate::{ConfigError, Coordinate};
use crate::repository::{AdHocRepository, RepositoryRegistry};
use crate::resolve::DetachedDependency;

pub struct Session {
    registry: Arc<RepositoryRegistry>,
    cache: Arc<ArtifactCache>,
}

impl Session {
    /// Session backed by the per-user default cache directory.
    pub fn new() -> Self {
        Self::with_cache_dir(ArtifactCache::default_dir())
    }

    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: Arc::new(RepositoryRegistry::new()),
            cache: Arc::new(ArtifactCache::new(dir)),
        }
    }

    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    /// Declare a one-off download: an artifact at `<uri>/name[...].ext` with
    /// no registry behind it.
    ///
    /// Returns a builder for the optional coordinate fields; finish with
    /// [`AdHocDownload::register`] to synthesize the repository and obtain the
    /// resolvable dependency. Plain-http URIs are accepted; the acquisition
    /// targets are long-lived but not all TLS-correct endpoints.
    pub fn ad_hoc_download(
        &self,
        uri: impl Into<String>,
        name: impl Into<String>,
        ext: impl Into<String>,
    ) -> AdHocDownload<'_> {
        AdHocDownload {
            session: self,
            uri: uri.into(),
            name: name.into(),
            ext: ext.into(),
            version: None,
            classifier: None,
            checksum: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending ad-hoc download declaration.
pub struct AdHocDownload<'a> {
    session: &'a Session,
    uri: String,
    name: String,
    ext: String,
    version: Option<String>,
    classifier: Option<String>,
    checksum: Option<Checksum>,
}

impl AdHocDownload<'_> {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn sha256(mut self, hex: impl Into<String>) -> Self {
        self.checksum = Some(Checksum::Sha256(hex.into()));
        self
    }

    pub fn sha512(mut self, hex: impl Into<String>) -> Self {
        self.checksum = Some(Checksum::Sha512(hex.into()));
        self
    }

    pub fn blake3(mut self, hex: impl Into<String>) -> Self {
        self.checksum = Some(Checksum::Blake3(hex.into()));
        self
    }

    /// Synthesize the repository, wrap it in its exclusive group filter, and
    /// hand back the detached dependency.
    ///
    /// All configuration errors (bad URI, bad name, empty extension, already
    /// claimed authority) surface here, before anything touches the network;
    /// download failures surface at first resolution instead.
    pub fn register(self) -> Result<DetachedDependency, ConfigError> {
        let base_url = Url::parse(&self.uri).map_err(|e| ConfigError::InvalidUri {
            uri: self.uri.clone(),
            reason: e.to_string(),
        })?;
        let repository = AdHocRepository::new(base_url, true)?;
        let coordinate = Coordinate::new(
            repository.group(),
            self.name,
            self.version,
            self.classifier,
            self.ext,
        )?;
        self.session.registry.register_exclusive(repository)?;
        Ok(DetachedDependency::new(
            coordinate,
            Arc::clone(&self.session.registry),
            Arc::clone(&self.session.cache),
            self.checksum,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::with_cache_dir("/tmp/quarry-test-cache")
    }

    #[test]
    fn test_register_synthesizes_one_exclusive_source() {
        let session = session();
        let dependency = session
            .ad_hoc_download("https://example.org/pkg", "tool", "tar.gz")
            .version("1.2")
            .register()
            .unwrap();
        assert_eq!(dependency.coordinate().group(), "example.org");
        assert_eq!(dependency.coordinate().file_name(), "tool-1.2.tar.gz");
        assert_eq!(session.registry().len(), 1);
        assert!(session.registry().source_for("example.org").is_some());
    }

    #[test]
    fn test_invalid_uri_fails_at_registration() {
        let err = session()
            .ad_hoc_download("not a uri", "tool", "zip")
            .register()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUri { .. }));
    }

    #[test]
    fn test_bad_name_fails_before_registration() {
        let session = session();
        let err = session
            .ad_hoc_download("https://example.org/pkg", "bad name", "zip")
            .register()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReservedName(_)));
        // The source was not registered either.
        assert!(session.registry().is_empty());
    }

    #[test]
    fn test_second_download_same_authority_is_refused() {
        let session = session();
        session
            .ad_hoc_download("https://example.org/a", "one", "zip")
            .register()
            .unwrap();
        let err = session
            .ad_hoc_download("https://example.org/b", "two", "zip")
            .register()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateAuthority("example.org".into()));
    }

    #[test]
    fn test_different_authorities_coexist() {
        let session = session();
        session
            .ad_hoc_download("https://one.example.org/a", "tool", "zip")
            .register()
            .unwrap();
        session
            .ad_hoc_download("http://two.example.org/b", "tool", "zip")
            .register()
            .unwrap();
        assert_eq!(session.registry().len(), 2);
    }
}
