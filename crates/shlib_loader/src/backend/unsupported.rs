use std::{
    ffi::{c_void, CStr},
    ptr::NonNull,
};

use super::{Backend, Capabilities, LoadScope};
use crate::{NativeError, NativeHandle};

/// Backend for targets without a dynamic loader, such as `wasm32-unknown-unknown`.
///
/// It reports no capabilities, so every open request is refused before
/// [`Backend::load`] is reached.
#[derive(Debug)]
pub struct UnsupportedBackend;

/// Never constructed.
#[derive(Debug)]
pub enum UnsupportedModule {}

impl Backend for UnsupportedBackend {
    type Module = UnsupportedModule;

    const NAME: &'static str = "unsupported";
    const EXTENSION: &'static str = "so";
    const MAX_NAME_LEN: usize = 4096;

    fn capabilities() -> Capabilities {
        Capabilities::empty()
    }

    fn load(_file_name: &str, _scope: LoadScope<'_>) -> Result<UnsupportedModule, NativeError> {
        Err(NativeError::new(None, "dynamic loading is not available on this target"))
    }

    fn symbol(module: &UnsupportedModule, _name: &CStr) -> Option<NonNull<c_void>> {
        match *module {}
    }

    fn native(module: &UnsupportedModule) -> NativeHandle {
        match *module {}
    }

    fn unload(module: UnsupportedModule) {
        match module {}
    }
}
