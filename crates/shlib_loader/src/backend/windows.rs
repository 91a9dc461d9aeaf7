use std::{
    ffi::{c_void, CStr, OsString},
    ptr::NonNull,
};

use libloading::os::windows::{Library, LOAD_LIBRARY_SEARCH_SYSTEM32};
use log::debug;

use super::{application_path, Backend, Capabilities, LoadScope};
use crate::{NativeError, NativeHandle};

/// `MAX_PATH` from `windef.h`.
const MAX_PATH: usize = 260;

/// `LoadLibraryExW` based loader for desktop Windows.
#[derive(Debug)]
pub struct WindowsBackend;

/// A module opened with `LoadLibraryExW`.
#[derive(Debug)]
pub struct WindowsModule {
    library: Library,
    raw: NativeHandle,
}

impl Backend for WindowsBackend {
    type Module = WindowsModule;

    const NAME: &'static str = "windows";
    const EXTENSION: &'static str = "dll";
    const MAX_NAME_LEN: usize = MAX_PATH;

    fn capabilities() -> Capabilities {
        Capabilities::all()
    }

    fn load(file_name: &str, scope: LoadScope<'_>) -> Result<WindowsModule, NativeError> {
        let (path, flags): (OsString, _) = match scope {
            LoadScope::ApplicationDirectory(dir) => {
                (application_path(dir, file_name).into_os_string(), 0)
            }
            LoadScope::SystemDirectory => (file_name.into(), LOAD_LIBRARY_SEARCH_SYSTEM32),
            LoadScope::Default => (file_name.into(), 0),
        };

        // SAFETY: Calls LoadLibraryExW. Running DllMain is the point of loading
        // the module; the caller chose which module to trust.
        let library = unsafe { Library::load_with_flags(&path, flags) }?;

        let raw = library.into_raw();
        // SAFETY: `raw` was just produced by `into_raw` and is not owned elsewhere.
        let library = unsafe { Library::from_raw(raw) };

        Ok(WindowsModule {
            library,
            raw: NativeHandle::from_ptr(raw as *mut c_void),
        })
    }

    fn symbol(module: &WindowsModule, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: Calls GetProcAddress. The result is only handed out as an
        // untyped address, the caller decides how to interpret it.
        let symbol = unsafe { module.library.get::<*mut c_void>(name.to_bytes_with_nul()) };
        symbol.ok().and_then(|symbol| NonNull::new(*symbol))
    }

    fn native(module: &WindowsModule) -> NativeHandle {
        module.raw
    }

    fn unload(module: WindowsModule) {
        if let Err(e) = module.library.close() {
            debug!("FreeLibrary reported an error: {e}");
        }
    }
}
