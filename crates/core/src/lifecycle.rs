//! Shot lifecycle transitions.
//!
//! Pure guard/apply pairs: each `begin_*` validates the command against the
//! shot's current state and marks the collaborator call as outstanding;
//! `complete_*` and `fail_*` apply the outcome.  Failure paths move the
//! shot to `GENERATION_FAILED` (or video `FAILED`) and never discard a
//! previously generated artifact, so a retry starts from the last good
//! data.

use crate::breakdown::ShotBreakdown;
use crate::error::CoreError;
use crate::image::ImagePayload;
use crate::shot::{Shot, ShotKind, ShotStatus, VideoStatus};
use crate::types::ShotId;

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Begin breakdown generation.
///
/// Valid from `PENDING_BREAKDOWN`, or from `GENERATION_FAILED` as a retry.
pub fn begin_breakdown(shot: &mut Shot) -> Result<(), CoreError> {
    shot.ensure_unlocked()?;
    match shot.status {
        ShotStatus::PendingBreakdown | ShotStatus::GenerationFailed => {
            shot.status = ShotStatus::GeneratingBreakdown;
            Ok(())
        }
        other => Err(CoreError::Conflict(format!(
            "Cannot request a breakdown for shot '{}' while it is {}",
            shot.id,
            other.label()
        ))),
    }
}

/// Store a freshly generated breakdown and advance to the keyframe-prompt
/// stage.
pub fn complete_breakdown(shot: &mut Shot, breakdown: ShotBreakdown) {
    shot.breakdown = Some(breakdown);
    shot.status = ShotStatus::PendingKeyframePrompt;
}

// ---------------------------------------------------------------------------
// Keyframe prompt
// ---------------------------------------------------------------------------

/// Begin keyframe-prompt generation.
///
/// Requires a stored breakdown; valid from `PENDING_KEYFRAME_PROMPT` or as
/// a retry from `GENERATION_FAILED`.
pub fn begin_keyframe_prompt(shot: &mut Shot) -> Result<(), CoreError> {
    shot.ensure_unlocked()?;
    if shot.breakdown.is_none() {
        return Err(CoreError::Conflict(format!(
            "Shot '{}' has no breakdown to derive a keyframe prompt from",
            shot.id
        )));
    }
    match shot.status {
        ShotStatus::PendingKeyframePrompt | ShotStatus::GenerationFailed => {
            shot.status = ShotStatus::GeneratingKeyframePrompt;
            Ok(())
        }
        other => Err(CoreError::Conflict(format!(
            "Cannot request a keyframe prompt for shot '{}' while it is {}",
            shot.id,
            other.label()
        ))),
    }
}

/// Store the generated keyframe prompt and advance to keyframe generation.
pub fn complete_keyframe_prompt(shot: &mut Shot, prompt: String) {
    shot.keyframe_prompt = Some(prompt);
    shot.status = ShotStatus::NeedsKeyframe;
}

// ---------------------------------------------------------------------------
// Keyframe still
// ---------------------------------------------------------------------------

/// Begin still generation.
///
/// Valid from any state except approved or an already-outstanding image
/// call, so a reviewer can regenerate a still from `NEEDS_REVIEW`.
/// Requires a stored breakdown.
pub fn begin_still(shot: &mut Shot) -> Result<(), CoreError> {
    shot.ensure_unlocked()?;
    if shot.status == ShotStatus::GeneratingImage {
        return Err(CoreError::Conflict(format!(
            "Shot '{}' already has a still generation outstanding",
            shot.id
        )));
    }
    if shot.breakdown.is_none() {
        return Err(CoreError::Conflict(format!(
            "Shot '{}' has no breakdown; generate one before a still",
            shot.id
        )));
    }
    shot.status = ShotStatus::GeneratingImage;
    Ok(())
}

/// Store the generated still and move the shot to review.
pub fn complete_still(shot: &mut Shot, image: ImagePayload) {
    shot.keyframe_image = Some(image);
    shot.status = ShotStatus::NeedsReview;
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// Record a collaborator failure.
///
/// Only the status moves; breakdown, keyframe prompt, still, and video URL
/// all stay as they were.
pub fn fail_generation(shot: &mut Shot) {
    shot.status = ShotStatus::GenerationFailed;
}

// ---------------------------------------------------------------------------
// Approval
// ---------------------------------------------------------------------------

/// Approve the shot, locking it against further edits.
///
/// Requires a keyframe still, except for extension units which inherit the
/// parent's continuity.  Approving an approved shot is a no-op.
pub fn approve(shot: &mut Shot) -> Result<(), CoreError> {
    if shot.is_approved {
        return Ok(());
    }
    if !shot.can_approve() {
        return Err(CoreError::Conflict(format!(
            "Shot '{}' needs a keyframe still before approval",
            shot.id
        )));
    }
    shot.is_approved = true;
    shot.status = ShotStatus::Approved;
    Ok(())
}

/// Unlock an approved shot.
///
/// Always permitted; generated content is untouched and the shot returns
/// to the review stage.
pub fn unapprove(shot: &mut Shot) {
    shot.is_approved = false;
    shot.status = ShotStatus::NeedsReview;
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// Queue video generation. Valid only for approved shots; on rejection the
/// video status is left untouched.
pub fn request_video(shot: &mut Shot) -> Result<(), CoreError> {
    if !shot.is_approved {
        return Err(CoreError::Conflict(format!(
            "Shot '{}' must be approved before video generation",
            shot.id
        )));
    }
    shot.video_status = VideoStatus::Queued;
    Ok(())
}

/// Mark the queued video call as running.
pub fn begin_video(shot: &mut Shot) -> Result<(), CoreError> {
    if shot.video_status != VideoStatus::Queued {
        return Err(CoreError::Conflict(format!(
            "Shot '{}' has no queued video request",
            shot.id
        )));
    }
    shot.video_status = VideoStatus::Generating;
    Ok(())
}

/// Store the produced video URL.
pub fn complete_video(shot: &mut Shot, video_url: String) {
    shot.video_url = Some(video_url);
    shot.video_status = VideoStatus::Completed;
}

/// Record a video failure. The shot stays approved so the command can be
/// re-issued without re-approval; an existing video URL is kept.
pub fn fail_video(shot: &mut Shot) {
    shot.video_status = VideoStatus::Failed;
}

// ---------------------------------------------------------------------------
// Extension
// ---------------------------------------------------------------------------

/// Derive an extension shot continuing `parent`'s clip.
///
/// The new shot seeds its breakdown from the parent's (switched to the
/// extend unit type), inherits scene name and asset selection, and starts
/// at `NEEDS_REVIEW` -- extensions skip still generation and may be
/// approved without a keyframe.
pub fn extend(parent: &Shot, new_id: ShotId, directive: String) -> Result<Shot, CoreError> {
    let parent_breakdown = parent.breakdown.as_ref().ok_or_else(|| {
        CoreError::Conflict(format!(
            "Cannot extend shot '{}' before its breakdown exists",
            parent.id
        ))
    })?;

    let mut child = Shot::new(new_id, parent.pitch.clone());
    child.kind = ShotKind::Extension {
        continues: parent.id.clone(),
        directive,
    };
    child.scene_name = parent.scene_name.clone();
    child.selected_asset_ids = parent.selected_asset_ids.clone();
    child.breakdown = Some(parent_breakdown.as_extension_seed());
    child.status = ShotStatus::NeedsReview;
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn shot(id: &str) -> Shot {
        Shot::new(id, "a pitch")
    }

    fn shot_with_breakdown(id: &str) -> Shot {
        let mut s = shot(id);
        complete_breakdown(&mut s, ShotBreakdown::standard());
        s
    }

    fn png() -> ImagePayload {
        ImagePayload::new("QQ==", "image/png")
    }

    // -- Breakdown --

    #[test]
    fn breakdown_happy_path() {
        let mut s = shot("s1_01");
        begin_breakdown(&mut s).unwrap();
        assert_eq!(s.status, ShotStatus::GeneratingBreakdown);

        complete_breakdown(&mut s, ShotBreakdown::standard());
        assert_eq!(s.status, ShotStatus::PendingKeyframePrompt);
        assert!(s.breakdown.is_some());
    }

    #[test]
    fn breakdown_rejected_while_generating() {
        let mut s = shot("s1_01");
        begin_breakdown(&mut s).unwrap();
        assert_matches!(begin_breakdown(&mut s), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn breakdown_retry_after_failure_keeps_old_document() {
        let mut s = shot_with_breakdown("s1_01");
        let good = s.breakdown.clone();

        begin_breakdown(&mut s).unwrap_err(); // wrong state: pending prompt
        s.status = ShotStatus::GenerationFailed;
        begin_breakdown(&mut s).unwrap();
        fail_generation(&mut s);

        assert_eq!(s.status, ShotStatus::GenerationFailed);
        assert_eq!(s.breakdown, good);
    }

    #[test]
    fn approved_shot_rejects_breakdown() {
        let mut s = shot("s1_01");
        s.is_approved = true;
        assert_matches!(begin_breakdown(&mut s), Err(CoreError::Conflict(_)));
    }

    // -- Keyframe prompt --

    #[test]
    fn keyframe_prompt_happy_path() {
        let mut s = shot_with_breakdown("s1_01");
        begin_keyframe_prompt(&mut s).unwrap();
        assert_eq!(s.status, ShotStatus::GeneratingKeyframePrompt);

        complete_keyframe_prompt(&mut s, "wide shot, dusk".to_string());
        assert_eq!(s.status, ShotStatus::NeedsKeyframe);
        assert_eq!(s.keyframe_prompt.as_deref(), Some("wide shot, dusk"));
    }

    #[test]
    fn keyframe_prompt_requires_breakdown() {
        let mut s = shot("s1_01");
        s.status = ShotStatus::PendingKeyframePrompt;
        assert_matches!(begin_keyframe_prompt(&mut s), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn keyframe_prompt_failure_preserves_previous_prompt() {
        let mut s = shot_with_breakdown("s1_01");
        begin_keyframe_prompt(&mut s).unwrap();
        complete_keyframe_prompt(&mut s, "first prompt".to_string());

        s.status = ShotStatus::GenerationFailed;
        begin_keyframe_prompt(&mut s).unwrap();
        fail_generation(&mut s);

        assert_eq!(s.keyframe_prompt.as_deref(), Some("first prompt"));
    }

    // -- Still --

    #[test]
    fn still_happy_path() {
        let mut s = shot_with_breakdown("s1_01");
        begin_still(&mut s).unwrap();
        assert_eq!(s.status, ShotStatus::GeneratingImage);

        complete_still(&mut s, png());
        assert_eq!(s.status, ShotStatus::NeedsReview);
        assert!(s.keyframe_image.is_some());
    }

    #[test]
    fn still_regeneration_allowed_from_review() {
        let mut s = shot_with_breakdown("s1_01");
        begin_still(&mut s).unwrap();
        complete_still(&mut s, png());

        // Reviewer asks for another take.
        begin_still(&mut s).unwrap();
        assert_eq!(s.status, ShotStatus::GeneratingImage);
    }

    #[test]
    fn still_rejected_when_approved_or_outstanding() {
        let mut s = shot_with_breakdown("s1_01");
        begin_still(&mut s).unwrap();
        assert_matches!(begin_still(&mut s), Err(CoreError::Conflict(_)));

        complete_still(&mut s, png());
        approve(&mut s).unwrap();
        assert_matches!(begin_still(&mut s), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn still_failure_keeps_existing_still() {
        let mut s = shot_with_breakdown("s1_01");
        begin_still(&mut s).unwrap();
        complete_still(&mut s, png());
        let good = s.keyframe_image.clone();

        begin_still(&mut s).unwrap();
        fail_generation(&mut s);

        assert_eq!(s.status, ShotStatus::GenerationFailed);
        assert_eq!(s.keyframe_image, good);
    }

    // -- Approval --

    #[test]
    fn approve_requires_keyframe_for_standard_shots() {
        let mut s = shot_with_breakdown("s1_01");
        assert_matches!(approve(&mut s), Err(CoreError::Conflict(_)));

        complete_still(&mut s, png());
        approve(&mut s).unwrap();
        assert!(s.is_approved);
        assert_eq!(s.status, ShotStatus::Approved);
    }

    #[test]
    fn approve_is_idempotent() {
        let mut s = shot_with_breakdown("s1_01");
        complete_still(&mut s, png());
        approve(&mut s).unwrap();
        approve(&mut s).unwrap();
        assert!(s.is_approved);
    }

    #[test]
    fn unapprove_resets_nothing_but_the_lock() {
        let mut s = shot_with_breakdown("s1_01");
        complete_still(&mut s, png());
        approve(&mut s).unwrap();

        unapprove(&mut s);
        assert!(!s.is_approved);
        assert_eq!(s.status, ShotStatus::NeedsReview);
        assert!(s.breakdown.is_some());
        assert!(s.keyframe_image.is_some());
    }

    // -- Video --

    #[test]
    fn video_request_rejected_on_unapproved_shot() {
        let mut s = shot_with_breakdown("s1_01");
        assert_matches!(request_video(&mut s), Err(CoreError::Conflict(_)));
        assert_eq!(s.video_status, VideoStatus::Idle);
    }

    #[test]
    fn video_happy_path() {
        let mut s = shot_with_breakdown("s1_01");
        complete_still(&mut s, png());
        approve(&mut s).unwrap();

        request_video(&mut s).unwrap();
        assert_eq!(s.video_status, VideoStatus::Queued);
        begin_video(&mut s).unwrap();
        assert_eq!(s.video_status, VideoStatus::Generating);
        complete_video(&mut s, "https://vault.example/clip.mp4".to_string());
        assert_eq!(s.video_status, VideoStatus::Completed);
        assert!(s.video_url.is_some());
    }

    #[test]
    fn video_failure_keeps_approval_and_old_url() {
        let mut s = shot_with_breakdown("s1_01");
        complete_still(&mut s, png());
        approve(&mut s).unwrap();
        request_video(&mut s).unwrap();
        begin_video(&mut s).unwrap();
        complete_video(&mut s, "https://vault.example/v1.mp4".to_string());

        // Retry produces a failure this time.
        request_video(&mut s).unwrap();
        begin_video(&mut s).unwrap();
        fail_video(&mut s);

        assert_eq!(s.video_status, VideoStatus::Failed);
        assert!(s.is_approved);
        assert_eq!(s.video_url.as_deref(), Some("https://vault.example/v1.mp4"));

        // And can be retried without re-approval.
        request_video(&mut s).unwrap();
    }

    #[test]
    fn begin_video_requires_queued_state() {
        let mut s = shot_with_breakdown("s1_01");
        assert_matches!(begin_video(&mut s), Err(CoreError::Conflict(_)));
    }

    // -- Extension --

    #[test]
    fn extend_seeds_continuity_from_parent() {
        let mut parent = shot_with_breakdown("s1_01");
        parent.scene_name = Some("Night Market".to_string());
        parent.selected_asset_ids = vec!["a1".to_string(), "a2".to_string()];

        let child = extend(&parent, "s1_01_x1".to_string(), "hold the frame".to_string())
            .unwrap();

        assert!(child.kind.is_extension());
        assert_eq!(child.scene_name.as_deref(), Some("Night Market"));
        assert_eq!(child.selected_asset_ids, parent.selected_asset_ids);
        assert!(child.breakdown.as_ref().unwrap().is_extension());
        assert_eq!(child.status, ShotStatus::NeedsReview);
        assert_eq!(child.scene_group(), "s1");
    }

    #[test]
    fn extend_requires_parent_breakdown() {
        let parent = shot("s1_01");
        assert_matches!(
            extend(&parent, "s1_01_x1".to_string(), "go on".to_string()),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn extension_approves_without_keyframe() {
        let parent = shot_with_breakdown("s1_01");
        let mut child =
            extend(&parent, "s1_01_x1".to_string(), "go on".to_string()).unwrap();
        approve(&mut child).unwrap();
        assert!(child.is_approved);
    }
}
