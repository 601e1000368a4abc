//! Ad-hoc repositories and the exclusive-content registry.
//!
//! Each call to the synthesizer produces one [`AdHocRepository`]: a pattern-based
//! source rooted at a caller-supplied base URL, serving exactly one URL per
//! coordinate. Sources are registered into a [`RepositoryRegistry`] behind a
//! [`GroupFilter`] so that a source is only ever consulted for coordinates in
//! its own group (the base URL's authority) and never for anything else.

use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use crate::coordinate::{ConfigError, Coordinate};

/// A pattern-based artifact source rooted at one base URL.
///
/// The layout maps a coordinate to `<base>/name[-version][-classifier].ext`;
/// the artifact file itself is the only metadata (no descriptor is fetched).
#[derive(Debug, Clone)]
pub struct AdHocRepository {
    base_url: Url,
    group: String,
    allow_insecure: bool,
}

impl AdHocRepository {
    /// Build a repository from a base URL, deriving the group from its
    /// authority.
    ///
    /// `allow_insecure` permits plain-http base URLs; the synthesizer enables
    /// it because its acquisition targets are long-lived but not all
    /// TLS-correct endpoints.
    pub fn new(base_url: Url, allow_insecure: bool) -> Result<Self, ConfigError> {
        match base_url.scheme() {
            "https" => {}
            "http" if allow_insecure => {}
            "http" => return Err(ConfigError::InsecureUrl(base_url.to_string())),
            scheme => {
                return Err(ConfigError::UnsupportedScheme {
                    url: base_url.to_string(),
                    scheme: scheme.to_string(),
                });
            }
        }
        let group = base_url.authority().to_string();
        if group.is_empty() {
            return Err(ConfigError::MissingAuthority(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            group,
            allow_insecure,
        })
    }

    /// The synthetic group this source serves: the base URL's authority.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn allows_insecure(&self) -> bool {
        self.allow_insecure
    }

    /// The single candidate URL for a coordinate under this source.
    pub fn url_for(&self, coordinate: &Coordinate) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            coordinate.file_name()
        )
    }
}

/// Exclusive-content rule: admits coordinates of exactly one group.
///
/// Filtering is deliberately by group only, not by name; one authority maps to
/// one exclusive source, which keeps the precondition checkable by inspection.
#[derive(Debug, Clone)]
pub struct GroupFilter {
    group: String,
}

impl GroupFilter {
    pub fn for_group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
        }
    }

    pub fn admits(&self, group: &str) -> bool {
        self.group == group
    }
}

#[derive(Debug)]
struct Registration {
    repository: Arc<AdHocRepository>,
    filter: GroupFilter,
}

/// Ordered list of registered sources, consulted at resolution time.
///
/// Plays the role of the build engine's configuration-time repository list:
/// sources are appended during the configuration phase and never removed.
/// Mutation after parallel resolution has begun is safe but unordered; callers
/// are expected to finish registering before tasks execute.
#[derive(Debug, Default)]
pub struct RepositoryRegistry {
    registrations: Mutex<Vec<Registration>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source wrapped in its exclusive group filter.
    ///
    /// A second source for an already-claimed authority is refused: coordinate
    /// collisions between unrelated downloads were the filter's reason to
    /// exist, so they surface loudly instead of shadowing.
    pub fn register_exclusive(
        &self,
        repository: AdHocRepository,
    ) -> Result<Arc<AdHocRepository>, ConfigError> {
        let mut registrations = self.lock();
        if registrations
            .iter()
            .any(|r| r.filter.admits(repository.group()))
        {
            return Err(ConfigError::DuplicateAuthority(repository.group().into()));
        }
        let repository = Arc::new(repository);
        registrations.push(Registration {
            repository: Arc::clone(&repository),
            filter: GroupFilter::for_group(repository.group()),
        });
        Ok(repository)
    }

    /// The source whose filter admits `group`, if any.
    pub fn source_for(&self, group: &str) -> Option<Arc<AdHocRepository>> {
        self.lock()
            .iter()
            .find(|r| r.filter.admits(group))
            .map(|r| Arc::clone(&r.repository))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .expect("repository registry lock poisoned")
    }
}
