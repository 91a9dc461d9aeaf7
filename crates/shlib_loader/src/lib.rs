//! Runtime loading of native shared libraries.
//!
//! This crate locates a shared library by base name, hands it to the platform
//! loader and wraps the result in an owned [`DynamicLibrary`] that resolves
//! exported symbols and unloads the module exactly once when it is dropped.
//!
//! ```no_run
//! use shlib_loader::{open, SearchLocation};
//!
//! // Loads `renderer.so`, `renderer.dylib` or `renderer.dll` from the
//! // directory of the running executable.
//! let renderer = open("renderer", SearchLocation::ApplicationDirectory)?;
//! assert!(renderer.get_symbol("initRenderer").is_some());
//! assert!(renderer.get_symbol("doesNotExist").is_none());
//! # Ok::<(), shlib_loader::LoadError>(())
//! ```
//!
//! Platforms differ in what their loader can do. Sandboxed Windows (UWP)
//! applications may only load libraries from their own package, so
//! [`SearchLocation::SystemDirectory`] and [`open_with_extension`] fail there
//! with [`LoadError::UnsupportedOperation`]. See [`backend`] for the
//! per-platform details.
//!
//! Note that loading a library runs foreign code. Only load libraries from
//! trusted locations.

pub mod backend;
pub mod env;
mod error;
mod library;
mod loader;
mod location;

pub use backend::{Backend, Capabilities, NativeBackend};
pub use error::*;
pub use library::*;
pub use loader::*;
pub use location::SearchLocation;

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{open, DynamicLibrary, LoadError, Loader, SearchLocation};
}
