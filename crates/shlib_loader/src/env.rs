//! Process environment access, gated by the backend's
//! [`Capabilities::ENVIRONMENT`].
//!
//! Sandboxed targets have no process environment. Rather than having every
//! caller special-case them, the backend reports the capability as missing and
//! these functions answer accordingly.

use std::{env, marker::PhantomData};

use crate::{
    backend::{Backend, Capabilities, NativeBackend},
    LoadError, Operation,
};

/// Environment variable access through a [`Backend`].
#[derive(Debug)]
pub struct Environment<B: Backend = NativeBackend> {
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend> Environment<B> {
    /// Creates an accessor for the backend `B`.
    pub fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }

    /// Returns `true` if the backend can access the process environment.
    pub fn is_supported(&self) -> bool {
        B::capabilities().contains(Capabilities::ENVIRONMENT)
    }

    /// Reads `name`. Returns [`None`] if the variable is unset, not valid
    /// unicode, or the environment is not accessible.
    pub fn get(&self, name: &str) -> Option<String> {
        if !self.is_supported() || check_name(name).is_err() {
            return None;
        }
        env::var(name).ok()
    }

    /// Sets `name` to `value` for the current process.
    pub fn set(&self, name: &str, value: &str) -> Result<(), LoadError> {
        if !self.is_supported() {
            return Err(LoadError::UnsupportedOperation {
                operation: Operation::EnvironmentAccess,
                backend: B::NAME,
            });
        }
        check_name(name)?;
        if value.contains('\0') {
            return Err(LoadError::InvalidName {
                name: name.to_owned(),
                reason: "the value contains a NUL byte",
            });
        }

        env::set_var(name, value);
        Ok(())
    }
}

impl<B: Backend> Default for Environment<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads an environment variable through the native backend.
pub fn environment_var(name: &str) -> Option<String> {
    Environment::<NativeBackend>::new().get(name)
}

/// Sets an environment variable through the native backend.
pub fn set_environment_var(name: &str, value: &str) -> Result<(), LoadError> {
    Environment::<NativeBackend>::new().set(name, value)
}

fn check_name(name: &str) -> Result<(), LoadError> {
    let reason = if name.is_empty() {
        "the variable name is empty"
    } else if name.contains(['=', '\0']) {
        "the variable name contains `=` or a NUL byte"
    } else {
        return Ok(());
    };

    Err(LoadError::InvalidName {
        name: name.to_owned(),
        reason,
    })
}

#[cfg(all(test, any(unix, all(windows, not(target_vendor = "uwp")))))]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let name = "SHLIB_LOADER_ENV_SET_THEN_GET";
        set_environment_var(name, "on").unwrap();
        assert_eq!(environment_var(name).as_deref(), Some("on"));
    }

    #[test]
    fn unset_is_none() {
        assert_eq!(environment_var("SHLIB_LOADER_ENV_NEVER_SET"), None);
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "A=B", "A\0B"] {
            assert!(matches!(
                set_environment_var(name, "x"),
                Err(LoadError::InvalidName { .. })
            ));
            assert_eq!(environment_var(name), None);
        }
        assert!(set_environment_var("SHLIB_LOADER_ENV_BAD_VALUE", "a\0b").is_err());
    }
}
