//! Locating the host JVM's native runtime library.
//!
//! JDK layouts have shifted over the years (`jre/lib/amd64/server`,
//! `lib/amd64/server`, `lib/server`), so each family carries an ordered
//! candidate list and the first path that exists wins. An empty result is a
//! fatal error, never a silently degraded binary: if the runtime library is
//! missing, the build stops and says where it looked.

use std::path::{Path, PathBuf};

use crate::task::configure;

use super::{jni_include_dirs, NativeBinary, OsFamily, ToolchainError};

const LINUX_CANDIDATES: &[&str] = &[
    "jre/lib/amd64/server/libjvm.so",
    "lib/amd64/server/libjvm.so",
    "lib/server/libjvm.so",
];

const MACOS_CANDIDATES: &[&str] = &["jre/lib/server/libjvm.dylib", "lib/server/libjvm.dylib"];

const WINDOWS_CANDIDATES: &[&str] = &["lib/jvm.lib"];

/// Where a JVM installation keeps its platform headers and runtime library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLibraryLocation {
    family: OsFamily,
    include_subdir: &'static str,
    library_path: PathBuf,
}

impl NativeLibraryLocation {
    pub fn family(&self) -> OsFamily {
        self.family
    }

    /// Platform subdirectory under `<java_home>/include` holding the
    /// OS-specific JNI headers.
    pub fn include_subdir(&self) -> &'static str {
        self.include_subdir
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }
}

/// Find the JVM runtime library for `family` under `java_home`.
///
/// Searches the family's candidate subdirectories in order; the first
/// existing file wins. No candidate on disk is a fatal
/// [`ToolchainError::JvmLibraryNotFound`] naming every searched path.
pub fn locate_jvm_library(
    family: OsFamily,
    java_home: &Path,
) -> Result<NativeLibraryLocation, ToolchainError> {
    let (include_subdir, candidates) = match family {
        OsFamily::Linux => ("linux", LINUX_CANDIDATES),
        OsFamily::Macos => ("darwin", MACOS_CANDIDATES),
        OsFamily::Windows => ("win32", WINDOWS_CANDIDATES),
    };
    let searched: Vec<PathBuf> = candidates.iter().map(|c| java_home.join(c)).collect();
    let library_path = searched
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| ToolchainError::JvmLibraryNotFound {
            java_home: java_home.to_path_buf(),
            searched,
        })?;
    Ok(NativeLibraryLocation {
        family,
        include_subdir,
        library_path,
    })
}

/// Wire the host JVM into a native binary: JNI include directories onto the
/// compile task, the runtime library onto the link task.
///
/// Runs during configuration, through the deferred-task bridge. Idempotent:
/// the include and library collections deduplicate, so re-invocation changes
/// nothing.
pub fn add_jvm_library(
    binary: &NativeBinary,
    java_home: &Path,
) -> Result<NativeLibraryLocation, ToolchainError> {
    let location = locate_jvm_library(binary.target_family(), java_home)?;

    let [include, platform] = jni_include_dirs(java_home, location.include_subdir());
    configure(binary.compile_task(), |compile| {
        compile.add_include(&include);
        compile.add_include(&platform);
    });

    let library = location.library_path().to_path_buf();
    configure(binary.link_task(), |link| link.add_library(library));

    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Fabricate a JVM home containing exactly the given library files.
    fn fake_java_home(libraries: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        for library in libraries {
            let path = dir.path().join(library);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }
        dir
    }

    #[test]
    fn test_linux_first_candidate_wins() {
        let home = fake_java_home(&["jre/lib/amd64/server/libjvm.so", "lib/server/libjvm.so"]);
        let location = locate_jvm_library(OsFamily::Linux, home.path()).unwrap();
        assert_eq!(
            location.library_path(),
            home.path().join("jre/lib/amd64/server/libjvm.so")
        );
        assert_eq!(location.include_subdir(), "linux");
    }

    #[test]
    fn test_fallback_reaches_last_candidate_per_family() {
        for (family, last) in [
            (OsFamily::Linux, "lib/server/libjvm.so"),
            (OsFamily::Macos, "lib/server/libjvm.dylib"),
            (OsFamily::Windows, "lib/jvm.lib"),
        ] {
            let home = fake_java_home(&[last]);
            let location = locate_jvm_library(family, home.path()).unwrap();
            assert_eq!(location.library_path(), home.path().join(last), "{family}");
        }
    }

    #[test]
    fn test_missing_library_is_fatal_and_names_searched_paths() {
        let home = fake_java_home(&[]);
        let err = locate_jvm_library(OsFamily::Linux, home.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&home.path().display().to_string()));
        assert!(message.contains("jre/lib/amd64/server/libjvm.so"));
        assert!(message.contains("lib/server/libjvm.so"));
    }

    #[test]
    fn test_macos_include_subdir_is_darwin() {
        let home = fake_java_home(&["jre/lib/server/libjvm.dylib"]);
        let location = locate_jvm_library(OsFamily::Macos, home.path()).unwrap();
        assert_eq!(location.include_subdir(), "darwin");
    }

    #[test]
    fn test_add_jvm_library_wires_includes_and_library() {
        let home = fake_java_home(&["lib/server/libjvm.so"]);
        let binary = NativeBinary::new("interpreter", OsFamily::Linux);
        let location = add_jvm_library(&binary, home.path()).unwrap();

        binary.compile_task().with(|compile| {
            assert_eq!(
                compile.include_dirs(),
                [
                    home.path().join("include"),
                    home.path().join("include/linux")
                ]
            );
        });
        binary.link_task().with(|link| {
            assert_eq!(link.libraries(), [location.library_path().to_path_buf()]);
        });
    }

    #[test]
    fn test_add_jvm_library_is_idempotent() {
        let home = fake_java_home(&["lib/server/libjvm.so"]);
        let binary = NativeBinary::new("interpreter", OsFamily::Linux);
        add_jvm_library(&binary, home.path()).unwrap();
        add_jvm_library(&binary, home.path()).unwrap();

        binary
            .compile_task()
            .with(|compile| assert_eq!(compile.include_dirs().len(), 2));
        binary
            .link_task()
            .with(|link| assert_eq!(link.libraries().len(), 1));
        assert_eq!(binary.compile_task().realize_count(), 1);
    }

    #[test]
    fn test_windows_missing_lib_is_fatal_too() {
        let home = fake_java_home(&["lib/server/libjvm.so"]);
        let err = locate_jvm_library(OsFamily::Windows, home.path()).unwrap_err();
        assert!(matches!(err, ToolchainError::JvmLibraryNotFound { .. }));
    }
}
