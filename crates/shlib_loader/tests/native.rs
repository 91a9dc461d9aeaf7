//! Loads real modules through the platform loader.

use shlib_loader::{
    open, shared_library_extension, LoadError, Loader, NativeBackend, SearchLocation,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn missing_module_in_application_directory() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();

    let err = Loader::new()
        .with_application_dir(dir.path())
        .open("missing", SearchLocation::ApplicationDirectory)
        .unwrap_err();
    match err {
        LoadError::NotFound {
            name,
            location,
            source,
        } => {
            assert_eq!(name, format!("missing.{}", shared_library_extension()));
            assert_eq!(location, Some(SearchLocation::ApplicationDirectory));
            assert!(!source.message.is_empty());
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn missing_module_in_system_directory() {
    init_logger();

    let err = open("shlib-loader-no-such-module", SearchLocation::SystemDirectory).unwrap_err();
    assert!(matches!(
        err,
        LoadError::NotFound {
            location: Some(SearchLocation::SystemDirectory),
            ..
        }
    ));
}

/// Base names that commonly resolve through the system search path.
const SYSTEM_LIBRARIES: &[&str] = &[
    "kernel32",
    "libSystem",
    "libz",
    "libGLdispatch",
    "libgcc_s",
    "libstdc++",
    "libdl",
    "libpthread",
    "libm",
];

#[test]
fn application_directory_does_not_search_the_system_path() {
    init_logger();

    // Only meaningful for a name the system path actually provides. On glibc
    // some `lib*.so` files are linker scripts, so every candidate is checked.
    let Some(name) = SYSTEM_LIBRARIES
        .iter()
        .copied()
        .find(|name| open(name, SearchLocation::SystemDirectory).is_ok())
    else {
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let err = Loader::<NativeBackend>::for_backend()
        .with_application_dir(dir.path())
        .open(name, SearchLocation::ApplicationDirectory)
        .unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }), "{name}: {err}");

    let err = Loader::new()
        .with_application_dir("")
        .open(name, SearchLocation::ApplicationDirectory)
        .unwrap_err();
    assert!(
        matches!(err, LoadError::ApplicationDirectory { .. }),
        "{name}: {err}"
    );
}

#[cfg(target_os = "linux")]
mod linux {
    use std::path::PathBuf;

    use super::init_logger;
    use shlib_loader::{open_with_extension, Loader, SearchLocation};

    /// Path of the C library mapped into this test process.
    fn mapped_libc() -> Option<PathBuf> {
        let maps = std::fs::read_to_string("/proc/self/maps").ok()?;
        maps.lines()
            .filter_map(|line| line.split_whitespace().nth(5))
            .find(|path| {
                let file = path.rsplit('/').next().unwrap_or_default();
                file.starts_with("libc.so") || file.starts_with("libc-")
            })
            .map(PathBuf::from)
    }

    #[test]
    fn open_from_application_directory() {
        init_logger();
        let Some(libc) = mapped_libc() else {
            // Statically linked test binary, nothing to load.
            return;
        };

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&libc, dir.path().join("renderer.so")).unwrap();

        let loader = Loader::new().with_application_dir(dir.path());
        let mut library = loader
            .open("renderer", SearchLocation::ApplicationDirectory)
            .unwrap();
        assert!(library.is_bound());
        assert!(!library.native().is_null());
        assert!(library.get_symbol("strlen").is_some());
        assert!(library.get_symbol("doesNotExist").is_none());

        // A second open yields an independent, separately released reference.
        let second = loader
            .open("renderer", SearchLocation::ApplicationDirectory)
            .unwrap();
        library.release();
        assert!(library.native().is_null());
        assert!(library.get_symbol("strlen").is_none());
        assert!(second.get_symbol("strlen").is_some());
    }

    #[test]
    fn resolved_symbol_is_callable() {
        init_logger();
        let Some(libc) = mapped_libc() else {
            return;
        };

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&libc, dir.path().join("clib.so")).unwrap();

        let library = Loader::new()
            .with_application_dir(dir.path())
            .open("clib", SearchLocation::ApplicationDirectory)
            .unwrap();
        let strlen = library.get_symbol("strlen").unwrap();
        // SAFETY: `strlen` has this signature in every C library.
        let strlen = unsafe {
            strlen.cast::<unsafe extern "C" fn(*const std::ffi::c_char) -> usize>()
        };
        // SAFETY: The argument is a NUL-terminated string.
        let len = unsafe { strlen(b"renderer\0".as_ptr().cast()) };
        assert_eq!(len, 8);
    }

    #[cfg(target_env = "gnu")]
    #[test]
    fn open_with_extension_uses_default_search_path() {
        init_logger();

        let library = open_with_extension("libc.so.6").unwrap();
        assert!(!library.native().is_null());
        assert!(library.get_symbol("malloc").is_some());
    }
}
