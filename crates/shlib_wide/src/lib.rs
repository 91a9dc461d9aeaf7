//! Narrow (UTF-8) to wide (UTF-16) string conversion for platform loader APIs.
//!
//! Some loader entry points, such as `LoadPackagedLibrary` on sandboxed Windows
//! targets, only accept NUL-terminated UTF-16 names. This crate provides the
//! conversion as a pure, stateless function.
//!
//! There are two flavours:
//!
//! * [`try_to_wide`] reports an [`EncodingError`] and never produces a partial
//!   result.
//! * [`to_wide`] and [`to_wide_str`] treat any failure as fatal and abort the
//!   process. A malformed name at this point means a caller broke its own
//!   invariants, and continuing with a truncated or mangled name is worse than
//!   stopping.
//!
//! ```
//! let wide = shlib_wide::to_wide_str("renderer.dll");
//! assert_eq!(wide.len(), 12);
//! assert_eq!(wide.as_units_with_nul().last(), Some(&0));
//! assert_eq!(wide.to_string_lossy(), "renderer.dll");
//! ```

use std::fmt;

use log::error;
use thiserror::Error;

/// The largest input, in bytes, that can be converted.
///
/// Platform conversion routines count the input, including its NUL terminator,
/// in a signed 32-bit integer.
pub const MAX_INPUT_LEN: usize = i32::MAX as usize - 1;

/// Reasons a narrow string could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The input does not fit the conversion routine's length type.
    #[error("input of {len} bytes exceeds the conversion limit of {MAX_INPUT_LEN} bytes")]
    TooLong {
        /// Length of the rejected input in bytes.
        len: usize,
    },
    /// The input is not well-formed UTF-8.
    #[error("invalid utf-8 sequence after {valid_up_to} valid bytes")]
    InvalidUtf8 {
        /// Number of leading bytes that form valid UTF-8.
        valid_up_to: usize,
    },
    /// A non-empty input produced no UTF-16 code units.
    #[error("conversion of {input_len} bytes produced an empty result")]
    EmptyConversion {
        /// Length of the input in bytes.
        input_len: usize,
    },
}

/// An owned, NUL-terminated UTF-16 string.
///
/// Only meant to live for the duration of a single platform call.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct WideString {
    // Always ends with exactly one terminating 0.
    units: Vec<u16>,
}

impl WideString {
    /// Creates an empty wide string, consisting only of the terminator.
    pub fn new() -> Self {
        Self { units: vec![0] }
    }

    /// Returns a pointer to the NUL-terminated buffer, suitable for `PCWSTR`
    /// parameters.
    ///
    /// The pointer is valid for as long as `self` is alive and unmodified.
    #[inline]
    pub fn as_ptr(&self) -> *const u16 {
        self.units.as_ptr()
    }

    /// The code units, without the terminator.
    #[inline]
    pub fn as_units(&self) -> &[u16] {
        &self.units[..self.units.len() - 1]
    }

    /// The code units, including the terminator.
    #[inline]
    pub fn as_units_with_nul(&self) -> &[u16] {
        &self.units
    }

    /// Number of code units, not counting the terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len() - 1
    }

    /// Returns `true` if the string holds no code units besides the terminator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts back to a narrow string, replacing unpaired surrogates.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_units())
    }
}

impl Default for WideString {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WideString")
            .field(&self.to_string_lossy())
            .finish()
    }
}

impl fmt::Display for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// Converts UTF-8 bytes into a NUL-terminated UTF-16 string.
///
/// Empty input yields an empty [`WideString`] without running the conversion.
/// Interior NUL bytes are converted like any other character.
pub fn try_to_wide(input: &[u8]) -> Result<WideString, EncodingError> {
    if input.is_empty() {
        return Ok(WideString::new());
    }

    check_input_len(input.len())?;

    let text = std::str::from_utf8(input).map_err(|e| EncodingError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;

    // Every UTF-8 byte produces at most one UTF-16 code unit.
    let mut units = Vec::with_capacity(input.len() + 1);
    units.extend(text.encode_utf16());
    // Not reachable: non-empty UTF-8 always encodes to at least one unit.
    if units.is_empty() {
        return Err(EncodingError::EmptyConversion {
            input_len: input.len(),
        });
    }
    units.push(0);

    Ok(WideString { units })
}

/// Converts UTF-8 bytes into a NUL-terminated UTF-16 string, aborting the
/// process if the input cannot be converted.
///
/// See [`try_to_wide`] for the conditions that count as failure.
pub fn to_wide(input: &[u8]) -> WideString {
    match try_to_wide(input) {
        Ok(wide) => wide,
        Err(err) => {
            error!("fatal wide string conversion failure: {err}");
            std::process::abort();
        }
    }
}

/// Converts a `&str` into a NUL-terminated UTF-16 string, aborting the process
/// if the conversion fails.
#[inline]
pub fn to_wide_str(input: &str) -> WideString {
    to_wide(input.as_bytes())
}

/// Decodes UTF-16 code units back into a narrow string.
///
/// A trailing terminator, if present, is not part of the result.
pub fn from_wide(units: &[u16]) -> Result<String, std::string::FromUtf16Error> {
    let units = match units.split_last() {
        Some((&0, rest)) => rest,
        _ => units,
    };
    String::from_utf16(units)
}

fn check_input_len(len: usize) -> Result<(), EncodingError> {
    if len > MAX_INPUT_LEN {
        return Err(EncodingError::TooLong { len });
    }
    Ok(())
}
