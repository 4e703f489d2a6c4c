//! Strict decoding of raw webhook bodies into [`AuditLog`] values.

use crate::error::DecodeError;
use crate::event::AuditLog;

/// Decode a raw payload into an audit log event.
///
/// Unknown fields are ignored. `action`, `occurred_at` and `actor` must be
/// present; unrecognised `action` values decode to [`crate::Action::Unknown`].
pub fn decode(bytes: &[u8]) -> Result<AuditLog, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }
    Ok(serde_json::from_slice(bytes)?)
}
