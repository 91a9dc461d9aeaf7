use std::{
    ffi::{c_void, CString},
    fmt,
    marker::PhantomData,
    mem,
    ptr::{self, NonNull},
};

use log::trace;

use crate::backend::{Backend, NativeBackend};

/// The raw OS handle of a loaded module (`void*` from `dlopen`, `HMODULE` on
/// Windows).
///
/// Only meant to be passed to other OS APIs that need the module reference.
/// It does not own the module.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(*mut c_void);

// SAFETY: A `NativeHandle` is an opaque value. It is never dereferenced by this
// crate, and OS module handles are valid on every thread of the process.
unsafe impl Send for NativeHandle {}
// SAFETY: See above.
unsafe impl Sync for NativeHandle {}

impl NativeHandle {
    /// The value returned for an empty [`DynamicLibrary`].
    pub const NULL: NativeHandle = NativeHandle(ptr::null_mut());

    /// Wraps a raw OS handle.
    #[inline]
    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// The raw OS handle.
    #[inline]
    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    /// Returns `true` for [`NativeHandle::NULL`].
    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeHandle({:p})", self.0)
    }
}

/// The address of an exported symbol.
///
/// A `Symbol` borrows the [`DynamicLibrary`] it was resolved from, so the
/// module cannot be released while the symbol is in use.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Symbol<'lib> {
    ptr: NonNull<c_void>,
    _library: PhantomData<&'lib ()>,
}

impl<'lib> Symbol<'lib> {
    /// The untyped address of the symbol. Never null.
    #[inline]
    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// The address as an integer.
    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Reinterprets the address as a value of type `T`, typically an
    /// `extern "C" fn` pointer.
    ///
    /// # Safety
    ///
    /// `T` must match the actual type of the exported symbol, and the value
    /// must not be used after the owning library is released.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not pointer-sized.
    pub unsafe fn cast<T: Copy>(&self) -> T {
        assert_eq!(
            mem::size_of::<T>(),
            mem::size_of::<*mut c_void>(),
            "symbols can only be cast to pointer-sized types"
        );
        let ptr = self.ptr.as_ptr();
        // SAFETY: The sizes match, and the caller guarantees `T` is the real type.
        unsafe { mem::transmute_copy::<*mut c_void, T>(&ptr) }
    }
}

impl fmt::Debug for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:p})", self.ptr)
    }
}

/// An owned, loaded shared library.
///
/// A `DynamicLibrary` is either *bound*, owning exactly one reference to a
/// loaded module, or *empty*. Dropping or [releasing](Self::release) a bound
/// library unloads the module exactly once and leaves it empty. Operations on
/// an empty library do nothing: [`get_symbol`](Self::get_symbol) returns
/// [`None`] and [`native`](Self::native) returns [`NativeHandle::NULL`].
///
/// Libraries are created with [`Loader`](crate::Loader) or [`open`](crate::open).
/// Opening the same library twice yields two independent `DynamicLibrary`
/// values; whether they share an OS module is up to the platform's own
/// reference counting.
pub struct DynamicLibrary<B: Backend = NativeBackend> {
    module: Option<B::Module>,
}

impl<B: Backend> DynamicLibrary<B> {
    /// Creates an empty library that owns nothing.
    pub fn empty() -> Self {
        Self { module: None }
    }

    pub(crate) fn bound(module: B::Module) -> Self {
        Self {
            module: Some(module),
        }
    }

    /// Returns `true` if this library owns a loaded module.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.module.is_some()
    }

    /// Resolves an exported symbol by name.
    ///
    /// Returns [`None`] if the library is empty, if `name` contains a NUL byte,
    /// or if the platform cannot resolve it. Missing entry points are an
    /// expected outcome when probing for optional functionality, so this never
    /// fails loudly.
    pub fn get_symbol(&self, name: &str) -> Option<Symbol<'_>> {
        let module = self.module.as_ref()?;
        let name = CString::new(name).ok()?;
        B::symbol(module, &name).map(|ptr| Symbol {
            ptr,
            _library: PhantomData,
        })
    }

    /// The raw OS handle of the module, or [`NativeHandle::NULL`] if empty.
    pub fn native(&self) -> NativeHandle {
        self.module.as_ref().map_or(NativeHandle::NULL, B::native)
    }

    /// Unloads the module and leaves this library empty.
    ///
    /// Releasing an empty library is a no-op.
    pub fn release(&mut self) {
        if let Some(module) = self.module.take() {
            trace!("releasing {:?} ({})", B::native(&module), B::NAME);
            B::unload(module);
        }
    }
}

impl<B: Backend> Default for DynamicLibrary<B> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<B: Backend> Drop for DynamicLibrary<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: Backend> fmt::Debug for DynamicLibrary<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLibrary")
            .field("backend", &B::NAME)
            .field("native", &self.native())
            .finish()
    }
}
