//! Shot entities: statuses, kinds, asset binding, and scene grouping.

use serde::{Deserialize, Serialize};

use crate::breakdown::ShotBreakdown;
use crate::error::CoreError;
use crate::image::ImagePayload;
use crate::types::{AssetId, ShotId};

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Scene-group bucket for shots whose id carries no `_` separator.
pub const UNGROUPED_SCENE: &str = "ungrouped";

/// Production status of a shot, from pitched to approved.
///
/// The `GENERATING_*` states mark an outstanding collaborator call;
/// `GENERATION_FAILED` is recoverable by re-issuing the failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShotStatus {
    PendingBreakdown,
    GeneratingBreakdown,
    PendingKeyframePrompt,
    GeneratingKeyframePrompt,
    NeedsKeyframe,
    GeneratingImage,
    NeedsReview,
    Approved,
    GenerationFailed,
}

impl ShotStatus {
    /// True while a generation collaborator call is outstanding.
    pub fn is_generating(self) -> bool {
        matches!(
            self,
            Self::GeneratingBreakdown | Self::GeneratingKeyframePrompt | Self::GeneratingImage
        )
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::PendingBreakdown => "pending breakdown",
            Self::GeneratingBreakdown => "generating breakdown",
            Self::PendingKeyframePrompt => "pending keyframe prompt",
            Self::GeneratingKeyframePrompt => "generating keyframe prompt",
            Self::NeedsKeyframe => "needs keyframe",
            Self::GeneratingImage => "generating image",
            Self::NeedsReview => "needs review",
            Self::Approved => "approved",
            Self::GenerationFailed => "generation failed",
        }
    }
}

/// Video generation sub-status, independent of [`ShotStatus`].
///
/// `FAILED` leaves the shot approved so the video command can simply be
/// re-issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    #[default]
    Idle,
    Queued,
    Generating,
    Completed,
    Failed,
}

// ---------------------------------------------------------------------------
// Shot kind
// ---------------------------------------------------------------------------

/// What kind of production unit a shot is.
///
/// Extensions continue the parent shot's clip and therefore inherit its
/// continuity; they are the only shots allowed to reach approval without
/// a keyframe of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShotKind {
    Standard,
    Extension {
        /// Id of the shot whose clip this unit continues.
        continues: ShotId,
        /// User-supplied directive for the continuation.
        directive: String,
    },
}

impl ShotKind {
    /// True for continuation units.
    pub fn is_extension(&self) -> bool {
        matches!(self, Self::Extension { .. })
    }
}

// ---------------------------------------------------------------------------
// Shot
// ---------------------------------------------------------------------------

/// One production unit of the output sequence.
///
/// Shots are created when a plan is derived from a script breakdown,
/// mutated only through the lifecycle functions, and removed only by
/// discarding the whole project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub id: ShotId,
    #[serde(flatten)]
    pub kind: ShotKind,
    pub status: ShotStatus,
    pub pitch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ShotBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframe_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframe_image: Option<ImagePayload>,
    /// Library assets attached for continuity guidance. Set semantics:
    /// order-insensitive, no duplicates.
    #[serde(default)]
    pub selected_asset_ids: Vec<AssetId>,
    /// Ad-hoc reference images scoped to this shot only; ordered,
    /// removed by positional index.
    #[serde(default)]
    pub extra_references: Vec<ImagePayload>,
    #[serde(default)]
    pub video_status: VideoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
    /// Whether the keyframe still should seed video generation as the
    /// reference image.
    #[serde(default)]
    pub keyframe_as_reference: bool,
}

impl Shot {
    /// Create a standard shot awaiting its breakdown.
    pub fn new(id: impl Into<ShotId>, pitch: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ShotKind::Standard,
            status: ShotStatus::PendingBreakdown,
            pitch: pitch.into(),
            scene_name: None,
            breakdown: None,
            keyframe_prompt: None,
            keyframe_image: None,
            selected_asset_ids: Vec::new(),
            extra_references: Vec::new(),
            video_status: VideoStatus::Idle,
            video_url: None,
            reference_url: None,
            is_approved: false,
            keyframe_as_reference: false,
        }
    }

    /// Scene-group key: the token before the first `_` in the id.
    ///
    /// Ids without a separator (or with an empty prefix) fall into the
    /// [`UNGROUPED_SCENE`] bucket.
    pub fn scene_group(&self) -> &str {
        match self.id.split_once('_') {
            Some((prefix, _)) if !prefix.is_empty() => prefix,
            _ => UNGROUPED_SCENE,
        }
    }

    /// Reject the operation when the shot is approved and locked.
    pub fn ensure_unlocked(&self) -> Result<(), CoreError> {
        if self.is_approved {
            Err(CoreError::Conflict(format!(
                "Shot '{}' is approved and locked; unapprove it first",
                self.id
            )))
        } else {
            Ok(())
        }
    }

    /// Toggle a library asset on or off this shot.
    ///
    /// Idempotent pair: toggling an already-selected id removes it,
    /// otherwise adds it; duplicates never accumulate.  Returns whether
    /// the asset is selected after the call.
    pub fn toggle_asset(&mut self, asset_id: &str) -> Result<bool, CoreError> {
        self.ensure_unlocked()?;
        if let Some(pos) = self.selected_asset_ids.iter().position(|id| id == asset_id) {
            self.selected_asset_ids.remove(pos);
            Ok(false)
        } else {
            self.selected_asset_ids.push(asset_id.to_string());
            Ok(true)
        }
    }

    /// Append an ad-hoc reference image.
    pub fn add_reference(&mut self, image: ImagePayload) -> Result<(), CoreError> {
        self.ensure_unlocked()?;
        self.extra_references.push(image);
        Ok(())
    }

    /// Remove an ad-hoc reference image by positional index.
    ///
    /// Indices of other shots' reference lists are unaffected; callers
    /// issuing multiple removals on one shot must recompute indices in
    /// between.
    pub fn remove_reference(&mut self, index: usize) -> Result<ImagePayload, CoreError> {
        self.ensure_unlocked()?;
        if index >= self.extra_references.len() {
            return Err(CoreError::Validation(format!(
                "Reference index {index} out of bounds for shot '{}' ({} references)",
                self.id,
                self.extra_references.len()
            )));
        }
        Ok(self.extra_references.remove(index))
    }

    /// True when the shot satisfies the approval gate: it has a keyframe
    /// still, or it is an extension unit inheriting the parent's.
    pub fn can_approve(&self) -> bool {
        self.keyframe_image.is_some() || self.kind.is_extension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn shot(id: &str) -> Shot {
        Shot::new(id, "a pitch")
    }

    // -- Scene grouping --

    #[test]
    fn scene_group_is_prefix_before_first_underscore() {
        assert_eq!(shot("intro_01").scene_group(), "intro");
        assert_eq!(shot("s1_01").scene_group(), "s1");
        assert_eq!(shot("s1_01_x1").scene_group(), "s1");
    }

    #[test]
    fn scene_group_defaults_when_no_separator() {
        assert_eq!(shot("opening").scene_group(), UNGROUPED_SCENE);
    }

    #[test]
    fn scene_group_defaults_on_empty_prefix() {
        assert_eq!(shot("_01").scene_group(), UNGROUPED_SCENE);
    }

    // -- Asset toggling --

    #[test]
    fn toggle_asset_adds_then_removes() {
        let mut s = shot("s1_01");
        assert!(s.toggle_asset("a1").unwrap());
        assert_eq!(s.selected_asset_ids, vec!["a1"]);

        assert!(!s.toggle_asset("a1").unwrap());
        assert!(s.selected_asset_ids.is_empty());
    }

    #[test]
    fn double_toggle_restores_original_set() {
        let mut s = shot("s1_01");
        s.toggle_asset("a1").unwrap();
        let before = s.selected_asset_ids.clone();

        s.toggle_asset("a2").unwrap();
        s.toggle_asset("a2").unwrap();
        assert_eq!(s.selected_asset_ids, before);
    }

    #[test]
    fn toggle_never_duplicates() {
        let mut s = shot("s1_01");
        s.toggle_asset("a1").unwrap();
        s.toggle_asset("a2").unwrap();
        s.toggle_asset("a1").unwrap(); // removes
        s.toggle_asset("a1").unwrap(); // adds back
        assert_eq!(
            s.selected_asset_ids.iter().filter(|id| *id == "a1").count(),
            1
        );
    }

    #[test]
    fn approved_shot_rejects_asset_toggle() {
        let mut s = shot("s1_01");
        s.is_approved = true;
        assert_matches!(s.toggle_asset("a1"), Err(CoreError::Conflict(_)));
        assert!(s.selected_asset_ids.is_empty());
    }

    // -- Ad-hoc references --

    #[test]
    fn remove_reference_by_index() {
        let mut s = shot("s1_01");
        s.add_reference(ImagePayload::new("QQ==", "image/png")).unwrap();
        s.add_reference(ImagePayload::new("Qg==", "image/png")).unwrap();

        let removed = s.remove_reference(0).unwrap();
        assert_eq!(removed.data, "QQ==");
        assert_eq!(s.extra_references.len(), 1);
        assert_eq!(s.extra_references[0].data, "Qg==");
    }

    #[test]
    fn remove_reference_rejects_out_of_bounds() {
        let mut s = shot("s1_01");
        assert_matches!(s.remove_reference(0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn approved_shot_rejects_reference_changes() {
        let mut s = shot("s1_01");
        s.add_reference(ImagePayload::new("QQ==", "image/png")).unwrap();
        s.is_approved = true;

        assert_matches!(
            s.add_reference(ImagePayload::new("Qg==", "image/png")),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(s.remove_reference(0), Err(CoreError::Conflict(_)));
        assert_eq!(s.extra_references.len(), 1);
    }

    // -- Approval gate --

    #[test]
    fn standard_shot_needs_keyframe_to_approve() {
        let mut s = shot("s1_01");
        assert!(!s.can_approve());

        s.keyframe_image = Some(ImagePayload::new("QQ==", "image/png"));
        assert!(s.can_approve());
    }

    #[test]
    fn extension_shot_approves_without_keyframe() {
        let mut s = shot("s1_01_x1");
        s.kind = ShotKind::Extension {
            continues: "s1_01".to_string(),
            directive: "hold on her face".to_string(),
        };
        assert!(s.can_approve());
    }

    // -- Serialization --

    #[test]
    fn status_uses_screaming_snake_wire_names() {
        let json = serde_json::to_string(&ShotStatus::PendingBreakdown).unwrap();
        assert_eq!(json, r#""PENDING_BREAKDOWN""#);
        let json = serde_json::to_string(&VideoStatus::Queued).unwrap();
        assert_eq!(json, r#""QUEUED""#);
    }

    #[test]
    fn kind_flattens_into_shot_object() {
        let s = shot("s1_01");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"], "standard");

        let mut ext = shot("s1_01_x1");
        ext.kind = ShotKind::Extension {
            continues: "s1_01".to_string(),
            directive: "keep rolling".to_string(),
        };
        let json = serde_json::to_value(&ext).unwrap();
        assert_eq!(json["kind"], "extension");
        assert_eq!(json["continues"], "s1_01");
    }

    #[test]
    fn shot_round_trips_through_json() {
        let mut s = shot("s1_01");
        s.status = ShotStatus::NeedsReview;
        s.selected_asset_ids = vec!["a1".to_string()];
        s.keyframe_prompt = Some("wide shot, dusk".to_string());
        s.video_status = VideoStatus::Completed;
        s.video_url = Some("https://vault.example/clip.mp4".to_string());

        let json = serde_json::to_string(&s).unwrap();
        let back: Shot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn generating_states_are_flagged() {
        assert!(ShotStatus::GeneratingBreakdown.is_generating());
        assert!(ShotStatus::GeneratingKeyframePrompt.is_generating());
        assert!(ShotStatus::GeneratingImage.is_generating());
        assert!(!ShotStatus::NeedsReview.is_generating());
        assert!(!ShotStatus::GenerationFailed.is_generating());
    }
}
