use std::{
    env::{current_dir, current_exe},
    fmt, io,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    backend::{Backend, Capabilities, LoadScope, NativeBackend},
    DynamicLibrary, LoadError, Operation, SearchLocation,
};

/// Opens shared libraries through a platform [`Backend`].
///
/// A `Loader` only holds configuration. Every call to [`open`](Self::open)
/// performs exactly one native load; nothing is cached, so opening the same
/// name twice yields two independent [`DynamicLibrary`] values. Callers that
/// want one shared instance per name need to keep their own registry.
///
/// ```no_run
/// use shlib_loader::{Loader, SearchLocation};
///
/// let loader = Loader::new();
/// let renderer = loader.open("renderer", SearchLocation::ApplicationDirectory)?;
/// if let Some(init) = renderer.get_symbol("initRenderer") {
///     // SAFETY: `initRenderer` is exported as `extern "C" fn()`.
///     let init = unsafe { init.cast::<extern "C" fn()>() };
///     init();
/// }
/// # Ok::<(), shlib_loader::LoadError>(())
/// ```
pub struct Loader<B: Backend = NativeBackend> {
    application_dir: Option<PathBuf>,
    _backend: PhantomData<fn() -> B>,
}

impl Loader<NativeBackend> {
    /// Creates a loader for the platform this crate was built for.
    pub fn new() -> Self {
        Self::for_backend()
    }
}

impl<B: Backend> Loader<B> {
    /// Creates a loader for an explicit backend.
    pub fn for_backend() -> Self {
        Self {
            application_dir: None,
            _backend: PhantomData,
        }
    }

    /// Uses `dir` as the application directory instead of the directory of the
    /// running executable.
    pub fn with_application_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.application_dir = Some(dir.into());
        self
    }

    /// The operations the backend supports.
    pub fn capabilities(&self) -> Capabilities {
        B::capabilities()
    }

    /// The directory searched for [`SearchLocation::ApplicationDirectory`].
    ///
    /// Relative directories are resolved against the current working
    /// directory. An empty directory is an error: handing a bare file name to
    /// the platform loader would make it search the system path instead.
    pub fn application_dir(&self) -> Result<PathBuf, LoadError> {
        let dir = match &self.application_dir {
            Some(dir) => dir.clone(),
            None => {
                let exe = current_exe().map_err(application_dir_error)?;
                exe.parent().map(Path::to_path_buf).unwrap_or_default()
            }
        };

        if dir.as_os_str().is_empty() {
            return Err(application_dir_error(io::Error::new(
                io::ErrorKind::NotFound,
                "the application directory is empty",
            )));
        }
        if dir.has_root() {
            return Ok(dir);
        }

        let cwd = current_dir().map_err(application_dir_error)?;
        Ok(cwd.join(dir))
    }

    /// Builds the platform file name for `base_name` by appending the
    /// backend's shared library extension.
    ///
    /// Fails if `base_name` is empty, contains a NUL byte, already carries the
    /// extension, or if the result does not fit the platform's name limit.
    pub fn library_file_name(&self, base_name: &str) -> Result<String, LoadError> {
        validate_name(base_name)?;
        if has_extension(base_name, B::EXTENSION) {
            return Err(LoadError::InvalidName {
                name: base_name.to_owned(),
                reason: "the platform extension is appended automatically",
            });
        }

        let file_name = format!("{base_name}.{}", B::EXTENSION);
        check_name_len::<B>(&file_name)?;
        Ok(file_name)
    }

    /// Opens `<base_name>.<extension>` from the given location.
    ///
    /// # Errors
    ///
    /// * [`LoadError::UnsupportedOperation`] if the backend cannot search
    ///   `location`. No load is attempted.
    /// * [`LoadError::InvalidName`] or [`LoadError::NameTooLong`] if no valid
    ///   file name can be formed. No load is attempted.
    /// * [`LoadError::NotFound`] if the platform loader fails.
    pub fn open(
        &self,
        base_name: &str,
        location: SearchLocation,
    ) -> Result<DynamicLibrary<B>, LoadError> {
        let (capability, operation) = match location {
            SearchLocation::ApplicationDirectory => (
                Capabilities::APPLICATION_DIRECTORY,
                Operation::ApplicationDirectorySearch,
            ),
            SearchLocation::SystemDirectory => (
                Capabilities::SYSTEM_DIRECTORY,
                Operation::SystemDirectorySearch,
            ),
        };
        require::<B>(capability, operation)?;

        let file_name = self.library_file_name(base_name)?;
        match location {
            SearchLocation::ApplicationDirectory => {
                let dir = self.application_dir()?;
                load::<B>(file_name, Some(location), LoadScope::ApplicationDirectory(&dir))
            }
            SearchLocation::SystemDirectory => {
                load::<B>(file_name, Some(location), LoadScope::SystemDirectory)
            }
        }
    }

    /// Opens a library by its complete platform file name, for example
    /// `libEGL.so.1`, using the platform's default search order.
    ///
    /// Backends that cannot search outside the application package refuse
    /// this with [`LoadError::UnsupportedOperation`]; there is no fallback to
    /// the application directory.
    pub fn open_with_extension(&self, raw_name: &str) -> Result<DynamicLibrary<B>, LoadError> {
        require::<B>(Capabilities::EXPLICIT_EXTENSION, Operation::ExplicitExtension)?;
        validate_name(raw_name)?;
        check_name_len::<B>(raw_name)?;

        load::<B>(raw_name.to_owned(), None, LoadScope::Default)
    }
}

impl<B: Backend> Default for Loader<B> {
    fn default() -> Self {
        Self::for_backend()
    }
}

impl<B: Backend> Clone for Loader<B> {
    fn clone(&self) -> Self {
        Self {
            application_dir: self.application_dir.clone(),
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> fmt::Debug for Loader<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("backend", &B::NAME)
            .field("application_dir", &self.application_dir)
            .finish()
    }
}

/// Opens `<base_name>.<extension>` with the native backend.
///
/// Shorthand for [`Loader::new().open(..)`](Loader::open).
pub fn open(base_name: &str, location: SearchLocation) -> Result<DynamicLibrary, LoadError> {
    Loader::new().open(base_name, location)
}

/// Opens a library by its complete platform file name with the native backend.
///
/// Shorthand for [`Loader::new().open_with_extension(..)`](Loader::open_with_extension).
pub fn open_with_extension(raw_name: &str) -> Result<DynamicLibrary, LoadError> {
    Loader::new().open_with_extension(raw_name)
}

/// The shared library extension of the native backend, without the leading
/// dot: `so`, `dylib` or `dll`.
pub fn shared_library_extension() -> &'static str {
    NativeBackend::EXTENSION
}

fn load<B: Backend>(
    file_name: String,
    location: Option<SearchLocation>,
    scope: LoadScope<'_>,
) -> Result<DynamicLibrary<B>, LoadError> {
    debug!("loading `{file_name}` with {scope:?} ({})", B::NAME);
    match B::load(&file_name, scope) {
        Ok(module) => {
            let library = DynamicLibrary::bound(module);
            debug!("loaded `{file_name}` as {:?}", library.native());
            Ok(library)
        }
        Err(source) => Err(LoadError::NotFound {
            name: file_name,
            location,
            source,
        }),
    }
}

fn application_dir_error(source: io::Error) -> LoadError {
    LoadError::ApplicationDirectory { source }
}

fn require<B: Backend>(capability: Capabilities, operation: Operation) -> Result<(), LoadError> {
    if B::capabilities().contains(capability) {
        Ok(())
    } else {
        Err(LoadError::UnsupportedOperation {
            operation,
            backend: B::NAME,
        })
    }
}

fn validate_name(name: &str) -> Result<(), LoadError> {
    let reason = if name.is_empty() {
        "the name is empty"
    } else if name.contains('\0') {
        "the name contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(LoadError::InvalidName {
        name: name.to_owned(),
        reason,
    })
}

fn has_extension(name: &str, extension: &str) -> bool {
    name.len() > extension.len() + 1
        && name
            .get(name.len() - extension.len() - 1..)
            .and_then(|suffix| suffix.strip_prefix('.'))
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case(extension))
}

fn check_name_len<B: Backend>(file_name: &str) -> Result<(), LoadError> {
    // The platform buffer must also hold the NUL terminator.
    let len = file_name.len() + 1;
    if len > B::MAX_NAME_LEN {
        return Err(LoadError::NameTooLong {
            name: file_name.to_owned(),
            len,
            max: B::MAX_NAME_LEN,
        });
    }
    Ok(())
}
