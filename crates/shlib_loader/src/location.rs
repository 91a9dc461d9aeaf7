use std::fmt;

/// Where the platform loader is allowed to look for a library.
///
/// Not every backend supports every location. Requesting an unsupported one
/// fails with [`LoadError::UnsupportedOperation`](crate::LoadError::UnsupportedOperation)
/// instead of silently searching somewhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchLocation {
    /// Only the application's own installation or package directory.
    ///
    /// This is the one location every backend supports.
    ApplicationDirectory,
    /// The standard system library directories.
    SystemDirectory,
}

impl SearchLocation {
    /// A short human readable description, used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchLocation::ApplicationDirectory => "the application directory",
            SearchLocation::SystemDirectory => "the system directories",
        }
    }
}

impl fmt::Display for SearchLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
