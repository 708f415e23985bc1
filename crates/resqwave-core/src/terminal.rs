//! Terminal input validation

use crate::error::CoreError;

/// Maximum accepted length of a terminal identifier
pub const MAX_TERMINAL_ID_LEN: usize = 64;

/// Validate a terminal identifier before it reaches the cache or upstream
///
/// Identifiers are 1 to 64 characters of ASCII letters, digits, `-`, `_`
/// or `.`.
pub fn validate_terminal_id(terminal_id: &str) -> Result<(), CoreError> {
    if terminal_id.trim().is_empty() {
        return Err(CoreError::InvalidTerminal(
            "terminal identifier must not be empty".to_string(),
        ));
    }

    if terminal_id.len() > MAX_TERMINAL_ID_LEN {
        return Err(CoreError::InvalidTerminal(format!(
            "terminal identifier exceeds {} characters",
            MAX_TERMINAL_ID_LEN
        )));
    }

    if let Some(c) = terminal_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(CoreError::InvalidTerminal(format!(
            "terminal identifier contains invalid character {:?}",
            c
        )));
    }

    Ok(())
}

/// Validate a latitude/longitude pair
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), CoreError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(CoreError::InvalidCoordinates(format!(
            "latitude {} is outside -90..=90",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(CoreError::InvalidCoordinates(format!(
            "longitude {} is outside -180..=180",
            longitude
        )));
    }
    Ok(())
}
