//! Reusable continuity reference assets (characters, locations, props,
//! styles) shared across the shots of a project.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::image::ImagePayload;
use crate::types::AssetId;

/// What kind of continuity reference an asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Character,
    Location,
    Prop,
    Style,
}

impl AssetKind {
    /// Parse from the serialized name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "character" => Ok(Self::Character),
            "location" => Ok(Self::Location),
            "prop" => Ok(Self::Prop),
            "style" => Ok(Self::Style),
            other => Err(CoreError::Validation(format!(
                "Unknown asset kind '{other}'. Must be one of: character, location, prop, style"
            ))),
        }
    }

    /// Serialized name, also used as the vault path segment.
    pub fn name(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Prop => "prop",
            Self::Style => "style",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Location => "Location",
            Self::Prop => "Prop",
            Self::Style => "Style",
        }
    }
}

/// A reusable continuity reference.
///
/// Assets without an image can still be selected on a shot, but cannot
/// anchor a visual continuity lock; review-stage gating treats them as
/// descriptive only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAsset {
    pub id: AssetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: AssetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

impl ProjectAsset {
    /// Create an imageless asset.
    pub fn new(
        id: impl Into<AssetId>,
        name: impl Into<String>,
        kind: AssetKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            image: None,
        }
    }

    /// Attach the reference image.
    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    /// True when the asset can anchor a visual continuity lock.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_name_round_trips() {
        for kind in [
            AssetKind::Character,
            AssetKind::Location,
            AssetKind::Prop,
            AssetKind::Style,
        ] {
            assert_eq!(AssetKind::from_name(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn kind_from_name_rejects_unknown() {
        assert!(AssetKind::from_name("vehicle").is_err());
        assert!(AssetKind::from_name("").is_err());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&AssetKind::Character).unwrap();
        assert_eq!(json, r#""character""#);
    }

    #[test]
    fn imageless_asset_cannot_anchor_continuity() {
        let asset = ProjectAsset::new("a1", "Mara", AssetKind::Character);
        assert!(!asset.has_image());

        let with_image = asset.with_image(ImagePayload::new("QUJD", "image/png"));
        assert!(with_image.has_image());
    }
}
