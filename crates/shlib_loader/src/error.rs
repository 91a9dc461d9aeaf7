use std::{fmt, io};

use thiserror::Error;

use crate::SearchLocation;

/// Errors that can occur while opening a shared library.
///
/// Every variant carries enough context to diagnose the failure: the name that
/// was attempted, where it was searched for and what the platform reported.
/// A symbol that cannot be resolved is not an error; see
/// [`DynamicLibrary::get_symbol`](crate::DynamicLibrary::get_symbol).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The requested name cannot be used to build a library file name.
    #[error("invalid shared library name `{name}`: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
    /// The formatted file name does not fit the platform's name buffer.
    #[error("shared library name `{name}` is {len} bytes long, the platform limit is {max}")]
    NameTooLong {
        /// The formatted file name, including the extension.
        name: String,
        /// Length of the formatted name, including its NUL terminator.
        len: usize,
        /// Largest length the platform accepts, including the NUL terminator.
        max: usize,
    },
    /// The active backend cannot perform the requested operation.
    #[error("{operation} is not supported by the {backend} loader")]
    UnsupportedOperation {
        /// The operation that was refused.
        operation: Operation,
        /// Name of the backend that refused it.
        backend: &'static str,
    },
    /// The platform loader could not load the module.
    #[error("failed to load shared library `{name}` from {}: {source}", scope_name(.location))]
    NotFound {
        /// The file name that was handed to the platform loader.
        name: String,
        /// Where the loader was asked to look. [`None`] means the platform's
        /// default search order.
        location: Option<SearchLocation>,
        /// What the platform reported.
        source: NativeError,
    },
    /// The application directory could not be determined.
    #[error("unable to locate the application directory")]
    ApplicationDirectory {
        /// Error returned while resolving the executable path.
        #[source]
        source: io::Error,
    },
}

fn scope_name(location: &Option<SearchLocation>) -> &'static str {
    match location {
        Some(location) => location.as_str(),
        None => "the default search path",
    }
}

/// An operation that a backend may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Opening a library relative to the application directory.
    ApplicationDirectorySearch,
    /// Opening a library from the system library directories.
    SystemDirectorySearch,
    /// Opening a library by its full platform file name.
    ExplicitExtension,
    /// Reading or writing process environment variables.
    EnvironmentAccess,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::ApplicationDirectorySearch => "searching the application directory",
            Operation::SystemDirectorySearch => "searching the system directories",
            Operation::ExplicitExtension => "loading by explicit file name",
            Operation::EnvironmentAccess => "environment variable access",
        })
    }
}

/// A failure reported by the platform loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", code_suffix(.code))]
pub struct NativeError {
    /// The platform error code, when the platform reports one.
    pub code: Option<i32>,
    /// The platform's description of the failure.
    pub message: String,
}

fn code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (os error {code})"),
        None => String::new(),
    }
}

impl NativeError {
    /// Creates a new error from a platform message and optional error code.
    pub fn new(code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(any(unix, all(windows, not(target_vendor = "uwp"))))]
impl From<libloading::Error> for NativeError {
    fn from(err: libloading::Error) -> Self {
        // The Windows variants wrap an `io::Error` holding the `GetLastError` code.
        let mut code = None;
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        while let Some(e) = current {
            if let Some(io) = e.downcast_ref::<io::Error>() {
                code = io.raw_os_error();
                break;
            }
            current = e.source();
        }

        Self {
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_error_display() {
        assert_eq!(
            NativeError::new(Some(126), "module not found").to_string(),
            "module not found (os error 126)"
        );
        assert_eq!(
            NativeError::new(None, "no such file").to_string(),
            "no such file"
        );
    }

    #[test]
    fn not_found_names_scope_and_cause() {
        let err = LoadError::NotFound {
            name: "renderer.so".into(),
            location: Some(SearchLocation::ApplicationDirectory),
            source: NativeError::new(None, "cannot open shared object file"),
        };
        assert_eq!(
            err.to_string(),
            "failed to load shared library `renderer.so` from the application directory: \
             cannot open shared object file"
        );

        let err = LoadError::NotFound {
            name: "renderer.so".into(),
            location: None,
            source: NativeError::new(Some(2), "missing"),
        };
        assert!(err.to_string().contains("the default search path"));
        assert!(err.to_string().ends_with("(os error 2)"));
    }

    #[test]
    fn unsupported_operation_display() {
        let err = LoadError::UnsupportedOperation {
            operation: Operation::SystemDirectorySearch,
            backend: "uwp",
        };
        assert_eq!(
            err.to_string(),
            "searching the system directories is not supported by the uwp loader"
        );
    }
}
