//! Configuration scenarios for native binaries that embed the host JVM.

use std::fs;
use std::path::Path;

use anyhow::Result;
use quarry::task::configure;
use quarry::toolchain::{self, NativeBinary, OsFamily};
use tempfile::TempDir;

/// Fabricate a JVM installation containing the given files.
fn fake_java_home(files: &[&str]) -> Result<TempDir> {
    let dir = TempDir::new()?;
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(path, b"")?;
    }
    Ok(dir)
}

#[test]
fn test_linux_binary_gets_includes_library_and_rpaths() -> Result<()> {
    let java_home = fake_java_home(&["lib/server/libjvm.so", "include/jni.h"])?;
    let binary = NativeBinary::new("interpreter", "linux".parse::<OsFamily>()?);

    toolchain::add_jvm_library(&binary, java_home.path())?;
    toolchain::add_rpaths(binary.link_task());

    // A support library landing in another directory later in configuration.
    configure(binary.link_task(), |link| {
        link.add_library("/opt/support/libhelper.so");
        link.add_library("/opt/support/libextra.so");
    });

    binary.compile_task().with(|compile| {
        assert_eq!(
            compile.include_dirs(),
            [
                java_home.path().join("include"),
                java_home.path().join("include/linux")
            ]
        );
    });

    binary.link_task().with(|link| {
        assert_eq!(link.libraries().len(), 3);
        let jvm_dir = java_home.path().join("lib/server");
        assert_eq!(
            link.final_linker_args(),
            vec![
                format!("-Wl,-rpath,{}", jvm_dir.display()),
                "-Wl,-rpath,/opt/support".to_string()
            ]
        );
    });
    Ok(())
}

#[test]
fn test_windows_binary_links_jvm_lib_without_rpaths() -> Result<()> {
    let java_home = fake_java_home(&["lib/jvm.lib"])?;
    let binary = NativeBinary::new("interpreter", OsFamily::Windows);

    let location = toolchain::add_jvm_library(&binary, java_home.path())?;
    assert_eq!(location.include_subdir(), "win32");
    toolchain::add_rpaths(binary.link_task());

    binary.link_task().with(|link| {
        assert_eq!(link.libraries(), [java_home.path().join("lib/jvm.lib")]);
        assert!(link.final_linker_args().is_empty());
    });
    Ok(())
}

#[test]
fn test_missing_jvm_library_aborts_configuration() -> Result<()> {
    let java_home = fake_java_home(&["include/jni.h"])?;
    let binary = NativeBinary::new("interpreter", OsFamily::Macos);

    let err = toolchain::add_jvm_library(&binary, java_home.path()).unwrap_err();
    assert!(err.to_string().contains("libjvm.dylib"));

    // The failed lookup configured nothing.
    assert!(!binary.compile_task().is_realized());
    assert!(!binary.link_task().is_realized());
    Ok(())
}

#[test]
fn test_jvm_wiring_tolerates_legacy_jre_layout() -> Result<()> {
    let java_home = fake_java_home(&["jre/lib/amd64/server/libjvm.so"])?;
    let binary = NativeBinary::new("interpreter", OsFamily::Linux);

    let location = toolchain::add_jvm_library(&binary, java_home.path())?;
    assert!(location.library_path().ends_with(Path::new(
        "jre/lib/amd64/server/libjvm.so"
    )));
    Ok(())
}
