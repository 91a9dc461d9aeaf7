//! Portable runtime loading of native shared libraries.
//!
//! This crate re-exports the workspace members so applications only need a
//! single dependency:
//!
//! * [`loader`]: opening libraries and resolving their symbols.
//! * [`wide`]: the UTF-8 to UTF-16 conversion used by wide-string loader APIs
//!   (enabled by the `wide` feature).
//!
//! ```no_run
//! use shlib::prelude::*;
//!
//! let library = open("renderer", SearchLocation::ApplicationDirectory)?;
//! let init = library.get_symbol("initRenderer");
//! # Ok::<(), LoadError>(())
//! ```

pub mod prelude {
    //! The most commonly used items.
    pub use shlib_loader::prelude::*;
}

pub mod loader {
    //! Opening shared libraries and resolving their exported symbols.
    pub use shlib_loader::*;
}

#[cfg(feature = "wide")]
pub mod wide {
    //! Narrow to wide string conversion.
    pub use shlib_wide::*;
}
