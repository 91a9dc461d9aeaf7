use std::{
    ffi::{c_void, CStr},
    ptr::NonNull,
};

use libloading::os::unix::{Library, RTLD_LOCAL, RTLD_NOW};
use log::debug;

use super::{application_path, Backend, Capabilities, LoadScope};
use crate::{NativeError, NativeHandle};

const OPEN_FLAGS: i32 = RTLD_NOW | RTLD_LOCAL;

/// `dlopen(3)` based loader for unix-like systems.
#[derive(Debug)]
pub struct UnixBackend;

/// A module opened with `dlopen(3)`.
#[derive(Debug)]
pub struct UnixModule {
    library: Library,
    raw: NativeHandle,
}

impl Backend for UnixBackend {
    type Module = UnixModule;

    const NAME: &'static str = "unix";

    #[cfg(target_vendor = "apple")]
    const EXTENSION: &'static str = "dylib";
    #[cfg(not(target_vendor = "apple"))]
    const EXTENSION: &'static str = "so";

    const MAX_NAME_LEN: usize = libc::PATH_MAX as usize;

    fn capabilities() -> Capabilities {
        Capabilities::all()
    }

    fn load(file_name: &str, scope: LoadScope<'_>) -> Result<UnixModule, NativeError> {
        // A name containing a slash is opened as a path, bypassing the search path.
        let path = match scope {
            LoadScope::ApplicationDirectory(dir) => {
                application_path(dir, file_name).into_os_string()
            }
            LoadScope::SystemDirectory | LoadScope::Default => file_name.into(),
        };

        // SAFETY: Calls dlopen(3). Running the module's initialisers is the
        // point of loading it; the caller chose which module to trust.
        let library = unsafe { Library::open(Some(&path), OPEN_FLAGS) }?;

        let raw = library.into_raw();
        // SAFETY: `raw` was just produced by `into_raw` and is not owned elsewhere.
        let library = unsafe { Library::from_raw(raw) };

        Ok(UnixModule {
            library,
            raw: NativeHandle::from_ptr(raw),
        })
    }

    fn symbol(module: &UnixModule, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: Calls dlsym(3). The result is only handed out as an untyped
        // address, the caller decides how to interpret it.
        let symbol = unsafe { module.library.get::<*mut c_void>(name.to_bytes_with_nul()) };
        symbol.ok().and_then(|symbol| NonNull::new(*symbol))
    }

    fn native(module: &UnixModule) -> NativeHandle {
        module.raw
    }

    fn unload(module: UnixModule) {
        if let Err(e) = module.library.close() {
            debug!("dlclose reported an error: {e}");
        }
    }
}
