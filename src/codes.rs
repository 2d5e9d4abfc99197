//! Device code and user code generation (RFC 8628 §6.1).
//!
//! The device code is a long opaque secret that only the device ever sees.
//! The user code is short and hand-typed, so it is drawn from a consonant-only
//! alphabet and stored in a normalized form that ignores case and separators.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::DeviceError;

/// Consonants only: no `0/O`, `1/I` confusion and no accidental real words.
pub const USER_CODE_ALPHABET: &[u8; 20] = b"BCDFGHJKLMNPQRSTVWXZ";

/// Format character replaced by one drawn alphabet symbol.
pub const PLACEHOLDER: char = 'X';

pub const DEFAULT_USER_CODE_FORMAT: &str = "XXXX-XXXX";

const DEVICE_CODE_BYTES: usize = 32;
const MIN_PLACEHOLDERS: usize = 6;
const MAX_PLACEHOLDERS: usize = 12;

/// 256 bits from the OS random source, URL-safe base64 without padding.
pub fn generate_device_code() -> Result<String, DeviceError> {
    let mut bytes = [0u8; DEVICE_CODE_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Generate a user code in display form, e.g. `BDFG-HJKL` for the default format.
///
/// Every placeholder in `format` is replaced left to right with a symbol from
/// [`USER_CODE_ALPHABET`]; hyphens and spaces are copied verbatim.
pub fn generate_user_code(format: &str) -> Result<String, DeviceError> {
    let mut random = vec![0u8; placeholder_count(format)];
    OsRng.try_fill_bytes(&mut random)?;

    let mut symbols = random
        .iter()
        .map(|b| USER_CODE_ALPHABET[*b as usize % USER_CODE_ALPHABET.len()] as char);

    Ok(format
        .chars()
        .map(|c| {
            if c == PLACEHOLDER {
                symbols.next().unwrap_or(PLACEHOLDER)
            } else {
                c
            }
        })
        .collect())
}

pub fn placeholder_count(format: &str) -> usize {
    format.chars().filter(|c| *c == PLACEHOLDER).count()
}

pub fn validate_user_code_format(format: &str) -> Result<(), DeviceError> {
    if format.is_empty() {
        return Err(DeviceError::Config(
            "user code format must not be empty".to_string(),
        ));
    }

    if let Some(bad) = format
        .chars()
        .find(|c| *c != PLACEHOLDER && *c != '-' && *c != ' ')
    {
        return Err(DeviceError::Config(format!(
            "user code format `{format}` contains `{bad}`; only `{PLACEHOLDER}`, `-` and ` ` are allowed"
        )));
    }

    let placeholders = placeholder_count(format);
    if !(MIN_PLACEHOLDERS..=MAX_PLACEHOLDERS).contains(&placeholders) {
        return Err(DeviceError::Config(format!(
            "user code format `{format}` has {placeholders} placeholders, expected {MIN_PLACEHOLDERS} to {MAX_PLACEHOLDERS}"
        )));
    }

    Ok(())
}

/// Canonical storage/lookup form: separators stripped, uppercased.
pub fn normalize_user_code(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Re-insert the separators of `format` into a normalized code.
///
/// Codes whose length does not match the format are returned normalized but
/// otherwise untouched, so a format change never garbles existing records.
pub fn display_user_code(normalized: &str, format: &str) -> String {
    let normalized = normalize_user_code(normalized);
    if normalized.chars().count() != placeholder_count(format) {
        return normalized;
    }

    let mut symbols = normalized.chars();
    format
        .chars()
        .map(|c| {
            if c == PLACEHOLDER {
                symbols.next().unwrap_or(PLACEHOLDER)
            } else {
                c
            }
        })
        .collect()
}
