use std::{
    ffi::{c_void, CStr},
    ptr::NonNull,
};

use log::debug;
use windows_sys::Win32::{
    Foundation::{FreeLibrary, GetLastError, HMODULE, MAX_PATH},
    System::LibraryLoader::{GetProcAddress, LoadPackagedLibrary},
};

use super::{Backend, Capabilities, LoadScope};
use crate::{NativeError, NativeHandle};

/// `LoadPackagedLibrary` based loader for sandboxed (UWP) Windows targets.
///
/// Only the application package can be searched, and the process environment
/// is not accessible.
#[derive(Debug)]
pub struct UwpBackend;

/// A module opened with `LoadPackagedLibrary`.
#[derive(Debug)]
pub struct UwpModule(HMODULE);

impl Backend for UwpBackend {
    type Module = UwpModule;

    const NAME: &'static str = "uwp";
    const EXTENSION: &'static str = "dll";
    const MAX_NAME_LEN: usize = MAX_PATH as usize;

    fn capabilities() -> Capabilities {
        Capabilities::APPLICATION_DIRECTORY
    }

    fn load(file_name: &str, scope: LoadScope<'_>) -> Result<UwpModule, NativeError> {
        if !matches!(scope, LoadScope::ApplicationDirectory(_)) {
            return Err(NativeError::new(None, "only the application package can be searched"));
        }

        let wide = shlib_wide::to_wide_str(file_name);
        // SAFETY: `wide` is NUL-terminated and outlives the call.
        let module = unsafe { LoadPackagedLibrary(wide.as_ptr(), 0) };
        if module == 0 {
            // SAFETY: No other API call happened since LoadPackagedLibrary failed.
            let code = unsafe { GetLastError() };
            return Err(NativeError::new(
                Some(code as i32),
                format!("LoadPackagedLibrary failed for `{file_name}`"),
            ));
        }

        Ok(UwpModule(module))
    }

    fn symbol(module: &UwpModule, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: `name` is NUL-terminated and `module` is a live module handle.
        let proc = unsafe { GetProcAddress(module.0, name.as_ptr().cast()) }?;
        NonNull::new(proc as *mut c_void)
    }

    fn native(module: &UwpModule) -> NativeHandle {
        NativeHandle::from_ptr(module.0 as *mut c_void)
    }

    fn unload(module: UwpModule) {
        // SAFETY: The handle came from LoadPackagedLibrary and is released once,
        // since `module` is consumed.
        if unsafe { FreeLibrary(module.0) } == 0 {
            // SAFETY: No other API call happened since FreeLibrary failed.
            let code = unsafe { GetLastError() };
            debug!("FreeLibrary reported an error (os error {code})");
        }
    }
}
