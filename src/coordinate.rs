//! Artifact coordinates and pattern-based file naming.
//!
//! A coordinate identifies exactly one downloadable artifact:
//! `{group, name, version?, classifier?, ext}`. The group is derived from the
//! authority of the base URI that synthesized the repository serving it, which
//! is what keeps unrelated ad-hoc sources from answering for each other.

use std::fmt;

use thiserror::Error;

/// Characters that collide with the repository pattern syntax or URL paths.
const RESERVED: &[char] = &['[', ']', '(', ')', ':', '*', '?', '/', '\\'];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid base URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("base URI '{0}' has no authority to derive an artifact group from")]
    MissingAuthority(String),
    #[error("unsupported URL scheme '{scheme}' in '{url}': only http and https are supported")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("refusing insecure URL '{0}': this source does not allow plain http")]
    InsecureUrl(String),
    #[error("artifact name must not be empty")]
    EmptyName,
    #[error("artifact name '{0}' contains pattern-reserved characters or whitespace")]
    ReservedName(String),
    #[error("artifact '{0}' requires a non-empty extension")]
    EmptyExtension(String),
    #[error("group '{0}' already has an exclusive repository registered")]
    DuplicateAuthority(String),
}

/// Identity of one ad-hoc artifact.
///
/// Optional fields given as empty strings are treated as absent; both omit the
/// corresponding segment (and its separator) from [`Coordinate::file_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    group: String,
    name: String,
    version: Option<String>,
    classifier: Option<String>,
    ext: String,
}

impl Coordinate {
    /// Validate and build a coordinate.
    ///
    /// The group is taken verbatim from the synthesizing source's authority and
    /// is not re-validated here; everything caller-supplied is.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: Option<String>,
        classifier: Option<String>,
        ext: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if name.contains(RESERVED) || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::ReservedName(name));
        }
        let ext = ext.into();
        if ext.is_empty() {
            return Err(ConfigError::EmptyExtension(name));
        }
        Ok(Self {
            group: group.into(),
            name,
            version: version.filter(|v| !v.is_empty()),
            classifier: classifier.filter(|c| !c.is_empty()),
            ext,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Render the file-name segment of the URL pattern:
    /// `name[-version][-classifier].ext`.
    pub fn file_name(&self) -> String {
        let mut out = self.name.clone();
        if let Some(version) = &self.version {
            out.push('-');
            out.push_str(version);
        }
        if let Some(classifier) = &self.classifier {
            out.push('-');
            out.push_str(classifier);
        }
        out.push('.');
        out.push_str(&self.ext);
        out
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, "@{}", self.ext)
    }
}
