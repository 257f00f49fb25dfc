//! Stanza parameter validation.

use crate::definition::Stanza;
use crate::error::HostError;

/// A non-negative integer parameter.
///
/// Missing or empty values fall back to `default`. Anything else must be
/// ASCII digits only, so signs, spaces and decimals are rejected.
///
/// # Errors
///
/// Returns [`HostError::InvalidParameter`] for a non-numeric or out-of-range
/// value.
pub fn numeric_param(stanza: &Stanza, name: &str, default: u32) -> Result<u32, HostError> {
    let Some(raw) = stanza.param(name) else {
        return Ok(default);
    };
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HostError::InvalidParameter {
            name: name.to_string(),
            reason: String::from("must be an integer"),
        });
    }
    raw.parse().map_err(|_| HostError::InvalidParameter {
        name: name.to_string(),
        reason: String::from("is out of range"),
    })
}

/// A parameter that must be present and non-empty.
///
/// # Errors
///
/// Returns [`HostError::InvalidParameter`] if it is missing or empty.
pub fn required_param<'a>(stanza: &'a Stanza, name: &str) -> Result<&'a str, HostError> {
    stanza.param(name).ok_or_else(|| HostError::InvalidParameter {
        name: name.to_string(),
        reason: String::from("is required"),
    })
}
