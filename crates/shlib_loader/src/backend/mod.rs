//! Platform loader backends.
//!
//! Each backend wraps one family of OS loader primitives behind [`Backend`].
//! Exactly one of them is selected at build time as [`NativeBackend`]; the
//! others are not compiled.

use std::{
    ffi::CStr,
    path::{Path, PathBuf},
    ptr::NonNull,
};

use bitflags::bitflags;

use crate::{NativeError, NativeHandle};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::{UnixBackend, UnixModule};

#[cfg(all(windows, not(target_vendor = "uwp")))]
mod windows;
#[cfg(all(windows, not(target_vendor = "uwp")))]
pub use self::windows::{WindowsBackend, WindowsModule};

#[cfg(all(windows, target_vendor = "uwp"))]
mod uwp;
#[cfg(all(windows, target_vendor = "uwp"))]
pub use uwp::{UwpBackend, UwpModule};

#[cfg(not(any(unix, windows)))]
mod unsupported;
#[cfg(not(any(unix, windows)))]
pub use unsupported::{UnsupportedBackend, UnsupportedModule};

/// The backend for the platform this crate was built for.
#[cfg(unix)]
pub type NativeBackend = UnixBackend;
/// The backend for the platform this crate was built for.
#[cfg(all(windows, not(target_vendor = "uwp")))]
pub type NativeBackend = WindowsBackend;
/// The backend for the platform this crate was built for.
#[cfg(all(windows, target_vendor = "uwp"))]
pub type NativeBackend = UwpBackend;
/// The backend for the platform this crate was built for.
#[cfg(not(any(unix, windows)))]
pub type NativeBackend = UnsupportedBackend;

bitflags! {
    /// The operations a [`Backend`] is able to perform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Loading from the application directory.
        const APPLICATION_DIRECTORY = 1 << 0;
        /// Loading from the system library directories.
        const SYSTEM_DIRECTORY = 1 << 1;
        /// Loading a fully qualified file name through the default search order.
        const EXPLICIT_EXTENSION = 1 << 2;
        /// Reading and writing process environment variables.
        const ENVIRONMENT = 1 << 3;
    }
}

/// The search scope of a single load request, as handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadScope<'a> {
    /// Only look inside the given application directory.
    ApplicationDirectory(&'a Path),
    /// Only look in the system library directories.
    SystemDirectory,
    /// Use the platform's default search order.
    Default,
}

/// A family of platform loader primitives.
///
/// Backends are stateless; every method is an associated function. The loader
/// checks [`Backend::capabilities`] before calling [`Backend::load`], so a
/// backend is never asked to load with a scope it does not support.
pub trait Backend: Sized + 'static {
    /// An owned reference to one loaded module.
    type Module;

    /// Short name used in error messages.
    const NAME: &'static str;

    /// The canonical shared library extension, without the leading dot.
    const EXTENSION: &'static str;

    /// The largest file name the loader accepts, including the NUL terminator.
    const MAX_NAME_LEN: usize;

    /// The operations this backend supports.
    fn capabilities() -> Capabilities;

    /// Loads `file_name` using the given scope.
    ///
    /// Called exactly once per open request.
    fn load(file_name: &str, scope: LoadScope<'_>) -> Result<Self::Module, NativeError>;

    /// Looks up an exported symbol. Any failure is reported as [`None`].
    fn symbol(module: &Self::Module, name: &CStr) -> Option<NonNull<core::ffi::c_void>>;

    /// Returns the raw OS handle of `module`.
    fn native(module: &Self::Module) -> NativeHandle;

    /// Releases the module reference.
    fn unload(module: Self::Module);
}

/// Joins `file_name` onto an application directory.
///
/// The result always has a directory component, so platform loaders treat it
/// as a path and never consult their search order.
#[cfg_attr(not(any(unix, all(windows, not(target_vendor = "uwp")))), allow(dead_code))]
pub(crate) fn application_path(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => path,
        _ => Path::new(".").join(path),
    }
}
