//! Runtime search-path injection for link tasks.
//!
//! A binary that links libraries outside the default loader search path needs
//! rpath entries for the loader to find them at run time. Injection is
//! registered as a deferred argument provider because the library set may not
//! be final until the task executes.

use std::path::Path;

use crate::task::{configure, DeferredTask};

use super::{LinkTask, OsFamily};

/// Embed one rpath per distinct parent directory of the task's linked
/// libraries, in first-seen order.
///
/// No-op on Windows: its loader has no rpath concept to honor here.
pub fn add_rpaths(link: &DeferredTask<LinkTask>) {
    configure(link, |task| {
        if task.target_family() == OsFamily::Windows {
            return;
        }
        task.add_arg_provider(|libraries| {
            let mut dirs: Vec<&Path> = Vec::new();
            for library in libraries {
                if let Some(parent) = library.parent()
                    && !dirs.contains(&parent)
                {
                    dirs.push(parent);
                }
            }
            dirs.into_iter()
                .map(|dir| format!("-Wl,-rpath,{}", dir.display()))
                .collect()
        });
    });
}
