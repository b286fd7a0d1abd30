//! Vault object naming helpers.
//!
//! Library-asset paths are normalized (lowercased, whitespace collapsed to
//! underscores) so the same asset name always maps to the same object
//! path; project slugs are validated before they become path segments.

use crate::error::CoreError;

/// Version tag written into every library-asset artifact document.
pub const ARTIFACT_VERSION: &str = "1.0.0";

/// Maximum length of a project slug.
const MAX_SLUG_LEN: usize = 64;

/// Normalize an asset or object name for use as a vault path segment:
/// trimmed, lowercased, every whitespace run replaced by one underscore.
pub fn normalize_object_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Validate a project slug.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed [`MAX_SLUG_LEN`] characters.
/// - Must contain only lowercase alphanumeric, hyphen, or underscore
///   characters (slugs become vault path segments verbatim).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation(
            "Project slug must not be empty".to_string(),
        ));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(CoreError::Validation(format!(
            "Project slug must not exceed {MAX_SLUG_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(
            "Project slug may only contain lowercase alphanumeric, hyphen, or underscore characters"
                .to_string(),
        ));
    }
    Ok(())
}
