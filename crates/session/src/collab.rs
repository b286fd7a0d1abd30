//! The generation collaborator seam.
//!
//! [`Generator`] is the session's only view of the downstream AI
//! services: it consumes a shot's current pitch, continuity fields, and
//! directorial feedback, and produces a breakdown document, prompt text,
//! an image payload, or a video URL plus token usage.  Implementations
//! live outside this workspace; tests use scripted stand-ins.

use async_trait::async_trait;

use callsheet_core::asset::ProjectAsset;
use callsheet_core::breakdown::ShotBreakdown;
use callsheet_core::image::ImagePayload;
use callsheet_core::types::ShotId;

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// Token usage reported by a text-tier collaborator call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Inputs for breakdown generation.
#[derive(Debug, Clone)]
pub struct BreakdownRequest {
    pub shot_id: ShotId,
    pub pitch: String,
    pub scene_name: Option<String>,
    /// Directorial feedback steering a re-generation.
    pub feedback: Option<String>,
    /// The previous document, if re-generating.
    pub prior: Option<ShotBreakdown>,
    /// Selected continuity assets, resolved to full records.
    pub assets: Vec<ProjectAsset>,
    /// Ad-hoc reference images scoped to the shot.
    pub references: Vec<ImagePayload>,
}

/// Inputs for keyframe-prompt generation.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub shot_id: ShotId,
    pub breakdown: ShotBreakdown,
    pub assets: Vec<ProjectAsset>,
}

/// Inputs for still generation.
#[derive(Debug, Clone)]
pub struct StillRequest {
    pub shot_id: ShotId,
    pub prompt: String,
    pub breakdown: ShotBreakdown,
    pub assets: Vec<ProjectAsset>,
    pub references: Vec<ImagePayload>,
}

/// Inputs for video generation.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub shot_id: ShotId,
    pub breakdown: ShotBreakdown,
    /// The keyframe still, when the shot elects it as the video
    /// reference.
    pub reference_image: Option<ImagePayload>,
    /// External reference URL, used when no still is elected.
    pub reference_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A completed breakdown call.
#[derive(Debug, Clone)]
pub struct BreakdownOutcome {
    pub breakdown: ShotBreakdown,
    pub usage: TokenUsage,
}

/// A completed keyframe-prompt call.
#[derive(Debug, Clone)]
pub struct PromptOutcome {
    pub prompt: String,
    pub usage: TokenUsage,
}

/// A completed still call.
#[derive(Debug, Clone)]
pub struct StillOutcome {
    pub image: ImagePayload,
}

/// A completed video call. The URL points at the collaborator's hosting;
/// relaying it into the vault is a separate step.
#[derive(Debug, Clone)]
pub struct VideoOutcome {
    pub video_url: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A collaborator-reported failure, carrying its human-readable message.
///
/// Recoverable: the shot moves to its failed state and the same command
/// can be re-issued.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Generation failed: {message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The generation collaborator.
///
/// All methods are fire-and-forget from the session's perspective: no
/// client-side timeout, failure is solely what the collaborator reports.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a structured breakdown document for a shot.
    async fn breakdown(&self, request: BreakdownRequest)
        -> Result<BreakdownOutcome, GenerationError>;

    /// Derive keyframe prompt text from a breakdown.
    async fn keyframe_prompt(&self, request: PromptRequest)
        -> Result<PromptOutcome, GenerationError>;

    /// Render a keyframe still.
    async fn still(&self, request: StillRequest) -> Result<StillOutcome, GenerationError>;

    /// Generate a video clip, returning its hosted URL.
    async fn video(&self, request: VideoRequest) -> Result<VideoOutcome, GenerationError>;
}
