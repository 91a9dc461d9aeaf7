//! Backends that record every native call instead of touching the OS loader.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    ffi::{c_void, CStr},
    path::PathBuf,
    ptr::NonNull,
};

use shlib_loader::{
    backend::LoadScope, Backend, Capabilities, NativeError, NativeHandle,
};

/// Calls observed by the mock backends on the current thread.
#[derive(Debug, Default)]
pub struct Calls {
    pub loads: Vec<(String, Scope)>,
    pub unloads: Vec<usize>,
}

/// An owned copy of [`LoadScope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    ApplicationDirectory(PathBuf),
    SystemDirectory,
    Default,
}

impl From<LoadScope<'_>> for Scope {
    fn from(scope: LoadScope<'_>) -> Self {
        match scope {
            LoadScope::ApplicationDirectory(dir) => Scope::ApplicationDirectory(dir.to_path_buf()),
            LoadScope::SystemDirectory => Scope::SystemDirectory,
            LoadScope::Default => Scope::Default,
        }
    }
}

#[derive(Default)]
struct State {
    calls: Calls,
    // file name -> exported symbols
    modules: HashMap<String, Vec<&'static str>>,
    next_id: usize,
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

/// Makes `file_name` loadable, exporting `symbols`.
pub fn install(file_name: &str, symbols: &[&'static str]) {
    STATE.with(|state| {
        state
            .borrow_mut()
            .modules
            .insert(file_name.to_owned(), symbols.to_vec());
    });
}

/// Number of native load calls so far.
pub fn load_count() -> usize {
    STATE.with(|state| state.borrow().calls.loads.len())
}

/// Number of native unload calls so far.
pub fn unload_count() -> usize {
    STATE.with(|state| state.borrow().calls.unloads.len())
}

/// Takes the recorded calls, leaving an empty record.
pub fn take_calls() -> Calls {
    STATE.with(|state| std::mem::take(&mut state.borrow_mut().calls))
}

#[derive(Debug)]
pub struct MockModule {
    id: usize,
    symbols: Vec<&'static str>,
}

fn mock_load(file_name: &str, scope: LoadScope<'_>) -> Result<MockModule, NativeError> {
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        state.calls.loads.push((file_name.to_owned(), scope.into()));
        let symbols = state
            .modules
            .get(file_name)
            .cloned()
            .ok_or_else(|| NativeError::new(Some(2), format!("{file_name}: no such file")))?;
        state.next_id += 1;
        Ok(MockModule {
            id: state.next_id,
            symbols,
        })
    })
}

fn mock_symbol(module: &MockModule, name: &CStr) -> Option<NonNull<c_void>> {
    let name = name.to_str().ok()?;
    let index = module.symbols.iter().position(|symbol| *symbol == name)?;
    // Fake, never dereferenced, addresses.
    NonNull::new(((module.id << 16) + (index + 1) * 8) as *mut c_void)
}

fn mock_native(module: &MockModule) -> NativeHandle {
    NativeHandle::from_ptr((module.id << 4) as *mut c_void)
}

fn mock_unload(module: MockModule) {
    STATE.with(|state| state.borrow_mut().calls.unloads.push(module.id));
}

/// A desktop-like backend supporting every operation.
#[derive(Debug)]
pub struct Desktop;

impl Backend for Desktop {
    type Module = MockModule;

    const NAME: &'static str = "desktop";
    const EXTENSION: &'static str = "dll";
    const MAX_NAME_LEN: usize = 260;

    fn capabilities() -> Capabilities {
        Capabilities::all()
    }

    fn load(file_name: &str, scope: LoadScope<'_>) -> Result<MockModule, NativeError> {
        mock_load(file_name, scope)
    }

    fn symbol(module: &MockModule, name: &CStr) -> Option<NonNull<c_void>> {
        mock_symbol(module, name)
    }

    fn native(module: &MockModule) -> NativeHandle {
        mock_native(module)
    }

    fn unload(module: MockModule) {
        mock_unload(module);
    }
}

/// A sandboxed backend that can only search the application package.
#[derive(Debug)]
pub struct Sandboxed;

impl Backend for Sandboxed {
    type Module = MockModule;

    const NAME: &'static str = "sandboxed";
    const EXTENSION: &'static str = "dll";
    const MAX_NAME_LEN: usize = 260;

    fn capabilities() -> Capabilities {
        Capabilities::APPLICATION_DIRECTORY
    }

    fn load(file_name: &str, scope: LoadScope<'_>) -> Result<MockModule, NativeError> {
        mock_load(file_name, scope)
    }

    fn symbol(module: &MockModule, name: &CStr) -> Option<NonNull<c_void>> {
        mock_symbol(module, name)
    }

    fn native(module: &MockModule) -> NativeHandle {
        mock_native(module)
    }

    fn unload(module: MockModule) {
        mock_unload(module);
    }
}
