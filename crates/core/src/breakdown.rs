//! Structured generation-ready breakdown documents.
//!
//! A [`ShotBreakdown`] is the prompt document a downstream generator
//! consumes.  The lifecycle machinery treats it as opaque beyond presence
//! and the `unit_type` marker; its inner fields are carried verbatim
//! through snapshots.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Unit types
// ---------------------------------------------------------------------------

/// An independent unit that generates its own keyframe and clip.
pub const UNIT_STANDARD: &str = "standard";

/// A unit that continues the preceding shot's clip.
pub const UNIT_EXTEND: &str = "extend";

/// All valid unit type markers.
pub const VALID_UNIT_TYPES: &[&str] = &[UNIT_STANDARD, UNIT_EXTEND];

/// Validate that a unit type marker is one of the known constants.
pub fn validate_unit_type(unit_type: &str) -> Result<(), CoreError> {
    if VALID_UNIT_TYPES.contains(&unit_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid unit type '{unit_type}'. Must be one of: {}",
            VALID_UNIT_TYPES.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Generator-reported flags carried alongside a breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownFlags {
    /// Whether the document pins asset appearance across shots.
    #[serde(default)]
    pub continuity_locked: bool,
    /// Prohibited-content markers raised during generation.
    #[serde(default)]
    pub prohibited: Vec<String>,
    /// Continuity conflicts detected against sibling shots.
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// Non-fatal warnings for the reviewer.
    #[serde(default)]
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Breakdown document
// ---------------------------------------------------------------------------

/// The structured, generation-ready description of one shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotBreakdown {
    /// `"standard"` or `"extend"`; kept in the serialized document so the
    /// downstream generator sees it without consulting shot metadata.
    pub unit_type: String,
    /// Scene parameters (setting, time of day, wardrobe, ...) -- opaque here.
    #[serde(default)]
    pub scene: serde_json::Value,
    /// Character / continuity description.
    #[serde(default)]
    pub continuity: String,
    /// Camera directive.
    #[serde(default)]
    pub camera: String,
    /// Audio directive.
    #[serde(default)]
    pub audio: String,
    #[serde(default)]
    pub flags: BreakdownFlags,
}

impl ShotBreakdown {
    /// Create an empty standard-unit document.
    pub fn standard() -> Self {
        Self {
            unit_type: UNIT_STANDARD.to_string(),
            scene: serde_json::Value::Object(Default::default()),
            continuity: String::new(),
            camera: String::new(),
            audio: String::new(),
            flags: BreakdownFlags::default(),
        }
    }

    /// True when the document marks a continuation unit.
    pub fn is_extension(&self) -> bool {
        self.unit_type == UNIT_EXTEND
    }

    /// Clone this document as the seed for an extension unit.
    ///
    /// Continuity, camera, audio, and flags carry over; the unit type is
    /// switched to [`UNIT_EXTEND`].
    pub fn as_extension_seed(&self) -> Self {
        let mut seed = self.clone();
        seed.unit_type = UNIT_EXTEND.to_string();
        seed
    }
}
