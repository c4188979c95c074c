//! Identity normalization.
//!
//! Telegram resolves public handles in their mention form (`@name`), so every
//! identity is canonicalized before it reaches the membership client.

/// Prefix Telegram uses for public handles.
pub const MENTION_MARKER: char = '@';

/// Canonicalize an identity to mention form.
///
/// Surrounding whitespace is dropped and the marker is prepended when
/// missing. Applying it twice yields the same result as applying it once.
pub fn normalize(identity: &str) -> String {
    let identity = identity.trim();
    if identity.starts_with(MENTION_MARKER) {
        identity.to_string()
    } else {
        format!("{MENTION_MARKER}{identity}")
    }
}
