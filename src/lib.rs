//! Ad-hoc artifact acquisition and native JVM toolchain wiring for build
//! pipelines.
//!
//! Builds routinely depend on artifacts nobody publishes to a package
//! registry: research tool releases, compiler archives, language runtimes,
//! historical binaries served from plain HTTP directories. `quarry` turns such
//! a one-off URL into a first-class, cacheable dependency: each declaration
//! synthesizes an isolated pattern-based repository, fences it behind an
//! exclusive group filter so unrelated sources can never answer for each
//! other, and hands back a detached dependency that downloads lazily and
//! caches by coordinate and URL.
//!
//! ```no_run
//! use quarry::Session;
//!
//! let session = Session::new();
//! let kawa = session
//!     .ad_hoc_download("https://ftp.gnu.org/pub/gnu/kawa", "kawa", "zip")
//!     .version("3.0")
//!     .register()?;
//!
//! // First access downloads; later accesses reuse the cached file.
//! let archive = kawa.resolve()?;
//! for entry in kawa.archive_tree()?.entries()? {
//!     println!("{} ({} bytes)", entry.path.display(), entry.size);
//! }
//! # let _ = archive;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The second half of the crate configures native binaries that embed the
//! host JVM: locating `libjvm` across historical JDK layouts, wiring JNI
//! include paths into a compile task, and injecting runtime search paths into
//! a link task.
//!
//! ```no_run
//! use quarry::task;
//! use quarry::toolchain::{self, NativeBinary, OsFamily};
//! # fn main() -> Result<(), quarry::ToolchainError> {
//! # let java_home = std::path::PathBuf::from("/usr/lib/jvm/default");
//! let binary = NativeBinary::new("interpreter", OsFamily::Linux);
//! toolchain::add_jvm_library(&binary, &java_home)?;
//! toolchain::add_rpaths(binary.link_task());
//! task::configure(binary.link_task(), |link| link.add_linker_arg("-shared"));
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cache;
pub mod checksum;
pub mod coordinate;
pub mod output;
pub mod repository;
pub mod resolve;
pub mod session;
pub mod task;
pub mod toolchain;

pub use archive::{ArchiveEntry, ArchiveError, ArchiveFormat, ArchiveTree};
pub use cache::ArtifactCache;
pub use checksum::Checksum;
pub use coordinate::{ConfigError, Coordinate};
pub use repository::{AdHocRepository, GroupFilter, RepositoryRegistry};
pub use resolve::{DependencyTreeError, DetachedDependency, ResolveError};
pub use session::{AdHocDownload, Session};
pub use task::{configure, DeferredTask};
pub use toolchain::{OsFamily, ToolchainError};
