//! Lazy tree views over downloaded archives.
//!
//! Resolved artifacts are often tarballs or zips that downstream steps sync a
//! subset out of (a single jar, a `lib/` directory). [`ArchiveTree`] defers
//! all I/O: constructing one only sniffs the file name for a supported
//! format, and the archive is decoded fresh on each [`entries`] or
//! [`unpack_into`] call. Decoding is native (tar/flate2/xz2/bzip2/zstd/zip);
//! no external tools are invoked.
//!
//! [`entries`]: ArchiveTree::entries
//! [`unpack_into`]: ArchiveTree::unpack_into

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("unsupported archive format for '{}'", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("invalid include pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("failed to read archive '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to unpack '{}' into '{}': {source}", .path.display(), .dest.display())]
    Unpack {
        path: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
    Zip,
}

impl ArchiveFormat {
    /// Recognize a format from the file name, jars counting as zips.
    fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let suffixes: &[(&str, ArchiveFormat)] = &[
            (".tar.gz", ArchiveFormat::TarGz),
            (".tgz", ArchiveFormat::TarGz),
            (".tar.xz", ArchiveFormat::TarXz),
            (".txz", ArchiveFormat::TarXz),
            (".tar.bz2", ArchiveFormat::TarBz2),
            (".tbz2", ArchiveFormat::TarBz2),
            (".tar.zst", ArchiveFormat::TarZst),
            (".tar", ArchiveFormat::Tar),
            (".zip", ArchiveFormat::Zip),
            (".jar", ArchiveFormat::Zip),
        ];
        suffixes
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, format)| *format)
    }
}

/// One member of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub size: u64,
    pub is_dir: bool,
}

/// A lazy view over an archive file.
#[derive(Debug)]
pub struct ArchiveTree {
    path: PathBuf,
    format: ArchiveFormat,
}

impl ArchiveTree {
    /// Wrap `path` as an archive tree. Fails only if the file name matches no
    /// supported format; the file itself is not opened yet.
    pub fn for_file(path: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let path = path.into();
        let format = ArchiveFormat::detect(&path)
            .ok_or_else(|| ArchiveError::UnsupportedFormat(path.clone()))?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Enumerate members without extracting anything.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        match self.format {
            ArchiveFormat::Zip => self.zip_entries(),
            _ => self.tar_entries(),
        }
    }

    /// Unpack members into `dest`, keeping their archive-relative paths.
    ///
    /// `include` is a glob over member paths (e.g. `**/*.jar`); `None` unpacks
    /// everything. Returns the number of files written. Members that would
    /// escape `dest` are skipped.
    pub fn unpack_into(&self, dest: &Path, include: Option<&str>) -> Result<usize, ArchiveError> {
        let pattern = include
            .map(glob::Pattern::new)
            .transpose()
            .map_err(|e| ArchiveError::InvalidPattern {
                pattern: include.unwrap_or_default().to_string(),
                reason: e.to_string(),
            })?;
        fs::create_dir_all(dest).map_err(|e| self.unpack_error(dest, e))?;
        match self.format {
            ArchiveFormat::Zip => self.zip_unpack(dest, pattern.as_ref()),
            _ => self.tar_unpack(dest, pattern.as_ref()),
        }
    }

    fn tar_entries(&self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut archive = tar::Archive::new(self.tar_reader()?);
        let mut entries = Vec::new();
        for entry in archive.entries().map_err(|e| self.read_error(e))? {
            let entry = entry.map_err(|e| self.read_error(e))?;
            let path = entry.path().map_err(|e| self.read_error(e))?.into_owned();
            entries.push(ArchiveEntry {
                path,
                size: entry.size(),
                is_dir: entry.header().entry_type().is_dir(),
            });
        }
        Ok(entries)
    }

    fn tar_unpack(
        &self,
        dest: &Path,
        pattern: Option<&glob::Pattern>,
    ) -> Result<usize, ArchiveError> {
        let mut archive = tar::Archive::new(self.tar_reader()?);
        let mut unpacked = 0;
        for entry in archive.entries().map_err(|e| self.read_error(e))? {
            let mut entry = entry.map_err(|e| self.read_error(e))?;
            let path = entry.path().map_err(|e| self.read_error(e))?.into_owned();
            if !matches(pattern, &path) {
                continue;
            }
            let is_dir = entry.header().entry_type().is_dir();
            let written = entry
                .unpack_in(dest)
                .map_err(|e| self.unpack_error(dest, e))?;
            if written && !is_dir {
                unpacked += 1;
            }
        }
        Ok(unpacked)
    }

    fn zip_entries(&self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut archive = self.zip_archive()?;
        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let member = archive
                .by_index(index)
                .map_err(|e| self.read_error(io::Error::other(e)))?;
            let path = member
                .enclosed_name()
                .unwrap_or_else(|| member.mangled_name());
            entries.push(ArchiveEntry {
                path,
                size: member.size(),
                is_dir: member.is_dir(),
            });
        }
        Ok(entries)
    }

    fn zip_unpack(
        &self,
        dest: &Path,
        pattern: Option<&glob::Pattern>,
    ) -> Result<usize, ArchiveError> {
        let mut archive = self.zip_archive()?;
        let mut unpacked = 0;
        for index in 0..archive.len() {
            let mut member = archive
                .by_index(index)
                .map_err(|e| self.read_error(io::Error::other(e)))?;
            let Some(relative) = member.enclosed_name() else {
                continue;
            };
            if !matches(pattern, &relative) {
                continue;
            }
            let out = dest.join(&relative);
            if member.is_dir() {
                fs::create_dir_all(&out).map_err(|e| self.unpack_error(dest, e))?;
                continue;
            }
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent).map_err(|e| self.unpack_error(dest, e))?;
            }
            let mut file = File::create(&out).map_err(|e| self.unpack_error(dest, e))?;
            io::copy(&mut member, &mut file).map_err(|e| self.unpack_error(dest, e))?;
            unpacked += 1;
        }
        Ok(unpacked)
    }

    /// Open the file and stack the matching decompressor in front of it.
    fn tar_reader(&self) -> Result<Box<dyn Read>, ArchiveError> {
        let file = File::open(&self.path).map_err(|e| self.read_error(e))?;
        Ok(match self.format {
            ArchiveFormat::Tar => Box::new(file),
            ArchiveFormat::TarGz => Box::new(flate2::read::GzDecoder::new(file)),
            ArchiveFormat::TarXz => Box::new(xz2::read::XzDecoder::new(file)),
            ArchiveFormat::TarBz2 => Box::new(bzip2::read::BzDecoder::new(file)),
            ArchiveFormat::TarZst => Box::new(
                zstd::stream::read::Decoder::new(file).map_err(|e| self.read_error(e))?,
            ),
            ArchiveFormat::Zip => unreachable!("zip handled by zip_entries/zip_unpack"),
        })
    }

    fn zip_archive(&self) -> Result<zip::ZipArchive<File>, ArchiveError> {
        let file = File::open(&self.path).map_err(|e| self.read_error(e))?;
        zip::ZipArchive::new(file).map_err(|e| self.read_error(io::Error::other(e)))
    }

    fn read_error(&self, source: io::Error) -> ArchiveError {
        ArchiveError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn unpack_error(&self, dest: &Path, source: io::Error) -> ArchiveError {
        ArchiveError::Unpack {
            path: self.path.clone(),
            dest: dest.to_path_buf(),
            source,
        }
    }
}

fn matches(pattern: Option<&glob::Pattern>, path: &Path) -> bool {
    pattern.is_none_or(|p| p.matches_path(path))
}
