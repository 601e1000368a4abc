//! Native toolchain wiring for binaries that embed the host JVM.
//!
//! Models the slice of a native compile/link unit this crate configures: the
//! include search path of the compile task, the link-library set and linker
//! arguments of the link task, and the operating-system family the binary
//! targets. Locating the JVM runtime library lives in [`jvm`], runtime
//! search-path injection in [`rpath`].

pub mod jvm;
pub mod rpath;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::task::DeferredTask;

pub use jvm::{add_jvm_library, locate_jvm_library, NativeLibraryLocation};
pub use rpath::add_rpaths;

#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("unrecognized operating system family \"{0}\"")]
    UnknownFamily(String),
    #[error(
        "no JVM runtime library found under {}: searched {:?}",
        .java_home.display(),
        .searched
    )]
    JvmLibraryNotFound {
        java_home: PathBuf,
        searched: Vec<PathBuf>,
    },
}

/// The closed set of operating-system families native binaries target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Linux,
    Macos,
    Windows,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OsFamily::Linux => "linux",
            OsFamily::Macos => "macos",
            OsFamily::Windows => "windows",
        })
    }
}

impl FromStr for OsFamily {
    type Err = ToolchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(OsFamily::Linux),
            "macos" | "darwin" | "mac os x" => Ok(OsFamily::Macos),
            "windows" => Ok(OsFamily::Windows),
            _ => Err(ToolchainError::UnknownFamily(s.to_string())),
        }
    }
}

/// Compile-task slice: an ordered, deduplicating include search path.
#[derive(Debug, Default)]
pub struct CompileTask {
    include_dirs: Vec<PathBuf>,
}

impl CompileTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_include(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.include_dirs.contains(&dir) {
            self.include_dirs.push(dir);
        }
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }
}

type ArgProvider = Box<dyn Fn(&[PathBuf]) -> Vec<String> + Send>;

/// Link-task slice: linked libraries, eager linker arguments, and deferred
/// argument providers evaluated only when the final argument list is built.
pub struct LinkTask {
    target_family: OsFamily,
    libraries: Vec<PathBuf>,
    linker_args: Vec<String>,
    arg_providers: Vec<ArgProvider>,
}

impl LinkTask {
    pub fn new(target_family: OsFamily) -> Self {
        Self {
            target_family,
            libraries: Vec::new(),
            linker_args: Vec::new(),
            arg_providers: Vec::new(),
        }
    }

    pub fn target_family(&self) -> OsFamily {
        self.target_family
    }

    pub fn add_library(&mut self, library: impl Into<PathBuf>) {
        let library = library.into();
        if !self.libraries.contains(&library) {
            self.libraries.push(library);
        }
    }

    pub fn libraries(&self) -> &[PathBuf] {
        &self.libraries
    }

    pub fn add_linker_arg(&mut self, arg: impl Into<String>) {
        self.linker_args.push(arg.into());
    }

    /// Register arguments computed from the library set at finalization time,
    /// after every library has been added.
    pub fn add_arg_provider(
        &mut self,
        provider: impl Fn(&[PathBuf]) -> Vec<String> + Send + 'static,
    ) {
        self.arg_providers.push(Box::new(provider));
    }

    /// The argument list the linker would be invoked with: eager arguments
    /// first, then each provider's output in registration order.
    pub fn final_linker_args(&self) -> Vec<String> {
        let mut args = self.linker_args.clone();
        for provider in &self.arg_providers {
            args.extend(provider(&self.libraries));
        }
        args
    }
}

/// One native binary target: a compile task and a link task, both deferred
/// the way the engine hands them out.
pub struct NativeBinary {
    name: String,
    target_family: OsFamily,
    compile: DeferredTask<CompileTask>,
    link: DeferredTask<LinkTask>,
}

impl NativeBinary {
    pub fn new(name: impl Into<String>, target_family: OsFamily) -> Self {
        Self {
            name: name.into(),
            target_family,
            compile: DeferredTask::new(CompileTask::new),
            link: DeferredTask::new(move || LinkTask::new(target_family)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_family(&self) -> OsFamily {
        self.target_family
    }

    pub fn compile_task(&self) -> &DeferredTask<CompileTask> {
        &self.compile
    }

    pub fn link_task(&self) -> &DeferredTask<LinkTask> {
        &self.link
    }
}

/// `include` directory of a JVM installation, plus its per-family platform
/// subdirectory name.
pub(crate) fn jni_include_dirs(java_home: &Path, subdir: &str) -> [PathBuf; 2] {
    let include = java_home.join("include");
    let platform = include.join(subdir);
    [include, platform]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_round_trips_through_strings() {
        for family in [OsFamily::Linux, OsFamily::Macos, OsFamily::Windows] {
            assert_eq!(family.to_string().parse::<OsFamily>().unwrap(), family);
        }
        assert_eq!("darwin".parse::<OsFamily>().unwrap(), OsFamily::Macos);
    }

    #[test]
    fn test_unknown_family_names_the_value() {
        let err = "beos".parse::<OsFamily>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unrecognized operating system family \"beos\""
        );
    }

    #[test]
    fn test_include_dirs_deduplicate() {
        let mut task = CompileTask::new();
        task.add_include("/jvm/include");
        task.add_include("/jvm/include/linux");
        task.add_include("/jvm/include");
        assert_eq!(task.include_dirs().len(), 2);
    }

    #[test]
    fn test_link_libraries_deduplicate() {
        let mut task = LinkTask::new(OsFamily::Linux);
        task.add_library("/jvm/lib/server/libjvm.so");
        task.add_library("/jvm/lib/server/libjvm.so");
        assert_eq!(task.libraries().len(), 1);
    }

    #[test]
    fn test_final_args_run_providers_after_eager_args() {
        let mut task = LinkTask::new(OsFamily::Linux);
        task.add_linker_arg("-shared");
        task.add_arg_provider(|libs| vec![format!("count={}", libs.len())]);
        task.add_library("/lib/a.so");
        task.add_library("/lib/b.so");
        assert_eq!(task.final_linker_args(), vec!["-shared", "count=2"]);
    }

    #[test]
    fn test_binary_tasks_stay_deferred_until_configured() {
        let binary = NativeBinary::new("interpreter", OsFamily::Linux);
        assert!(!binary.compile_task().is_realized());
        assert!(!binary.link_task().is_realized());
        assert_eq!(binary.name(), "interpreter");
    }
}
