//! The production session command layer.
//!
//! [`ProductionSession`] owns one project's shot book, assets, plans,
//! logs, and usage counters.  All generation-class commands claim the
//! single-slot [`GenerationGate`](crate::gate::GenerationGate) before
//! touching the collaborator; read-only operations (approval toggling,
//! asset selection) never do.  Vault sync serializes a snapshot at call
//! time and is not transactional with later mutations.

use std::sync::Arc;

use chrono::Utc;

use callsheet_core::asset::ProjectAsset;
use callsheet_core::book::ShotBook;
use callsheet_core::cost::{TextTier, UsageSummary};
use callsheet_core::error::CoreError;
use callsheet_core::image::ImagePayload;
use callsheet_core::lifecycle;
use callsheet_core::naming::validate_slug;
use callsheet_core::shot::Shot;
use callsheet_core::snapshot::{ProjectSnapshot, ScenePlan, SessionLog};
use callsheet_core::types::ShotId;
use callsheet_vault::client::VaultError;
use callsheet_vault::project::{ProjectStore, ProjectStoreError};
use callsheet_vault::registry::{RegistrySynchronizer, WorldRegistry};

use crate::collab::{
    BreakdownRequest, GenerationError, Generator, PromptRequest, StillRequest, VideoRequest,
};
use crate::events::{SessionEvent, SessionEventBus};
use crate::gate::{GenerationGate, StopFlag};

/// Outcome of a batch still run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Shots the batch actually started work on.
    pub attempted: usize,
    /// Stills stored.
    pub completed: usize,
    /// Collaborator failures (the shots sit in their failed state).
    pub failed: usize,
    /// Whether a stop request halted scheduling before the end.
    pub stopped: bool,
}

/// Errors surfaced by session commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The single generation slot is already held.
    #[error("A generation is already in progress")]
    Busy,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] ProjectStoreError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// The single logical actor coordinating one project's production.
pub struct ProductionSession {
    slug: String,
    title: String,
    book: ShotBook,
    assets: Vec<ProjectAsset>,
    scene_plans: Vec<ScenePlan>,
    logs: Vec<SessionLog>,
    usage: UsageSummary,
    generator: Arc<dyn Generator>,
    gate: GenerationGate,
    stop: StopFlag,
    bus: SessionEventBus,
}

impl ProductionSession {
    /// Start an empty session for a new project.
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, CoreError> {
        let slug = slug.into();
        validate_slug(&slug)?;
        Ok(Self {
            slug,
            title: title.into(),
            book: ShotBook::new(),
            assets: Vec::new(),
            scene_plans: Vec::new(),
            logs: Vec::new(),
            usage: UsageSummary::default(),
            generator,
            gate: GenerationGate::new(),
            stop: StopFlag::new(),
            bus: SessionEventBus::default(),
        })
    }

    /// Resume a session from a loaded snapshot.
    pub fn from_snapshot(
        snapshot: ProjectSnapshot,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, CoreError> {
        validate_slug(&snapshot.slug)?;
        Ok(Self {
            slug: snapshot.slug,
            title: snapshot.title,
            book: snapshot.shots,
            assets: snapshot.assets,
            scene_plans: snapshot.scene_plans,
            logs: snapshot.logs,
            usage: snapshot.usage,
            generator,
            gate: GenerationGate::new(),
            stop: StopFlag::new(),
            bus: SessionEventBus::default(),
        })
    }

    // -- Accessors ----------------------------------------------------------

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn book(&self) -> &ShotBook {
        &self.book
    }

    pub fn assets(&self) -> &[ProjectAsset] {
        &self.assets
    }

    pub fn usage(&self) -> &UsageSummary {
        &self.usage
    }

    pub fn logs(&self) -> &[SessionLog] {
        &self.logs
    }

    /// The generation gate, exposed so an outer surface can reflect the
    /// busy state (and so its advisory check stays observable).
    pub fn gate(&self) -> &GenerationGate {
        &self.gate
    }

    /// The cooperative stop control.
    pub fn stop(&self) -> &StopFlag {
        &self.stop
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    // -- Book & asset management (not generation-class) ---------------------

    /// Add a planned shot to the end of the book.
    pub fn add_shot(&mut self, shot: Shot) -> Result<(), CoreError> {
        let shot_id = shot.id.clone();
        self.book.push(shot)?;
        self.bus.publish(SessionEvent::ShotAdded { shot_id });
        Ok(())
    }

    /// Register a library asset, rejecting duplicate ids.
    pub fn add_asset(&mut self, asset: ProjectAsset) -> Result<(), CoreError> {
        if self.assets.iter().any(|a| a.id == asset.id) {
            return Err(CoreError::Conflict(format!(
                "Asset id '{}' already exists",
                asset.id
            )));
        }
        self.assets.push(asset);
        Ok(())
    }

    /// Replace the scene plans (derived externally from the script).
    pub fn set_scene_plans(&mut self, plans: Vec<ScenePlan>) {
        self.scene_plans = plans;
    }

    /// Toggle a library asset on a shot. Returns whether it is selected
    /// after the call.
    pub fn toggle_asset(&mut self, shot_id: &str, asset_id: &str) -> Result<bool, CoreError> {
        self.book.require_mut(shot_id)?.toggle_asset(asset_id)
    }

    /// Append an ad-hoc reference image to a shot.
    pub fn add_reference(
        &mut self,
        shot_id: &str,
        image: ImagePayload,
    ) -> Result<(), CoreError> {
        self.book.require_mut(shot_id)?.add_reference(image)
    }

    /// Remove an ad-hoc reference image from a shot by position.
    pub fn remove_reference(
        &mut self,
        shot_id: &str,
        index: usize,
    ) -> Result<ImagePayload, CoreError> {
        self.book.require_mut(shot_id)?.remove_reference(index)
    }

    /// Elect (or clear) the keyframe still as the video reference.
    pub fn set_keyframe_as_reference(
        &mut self,
        shot_id: &str,
        use_keyframe: bool,
    ) -> Result<(), CoreError> {
        self.book.require_mut(shot_id)?.keyframe_as_reference = use_keyframe;
        Ok(())
    }

    /// Approve a shot, locking it.
    pub fn approve(&mut self, shot_id: &str) -> Result<(), CoreError> {
        lifecycle::approve(self.book.require_mut(shot_id)?)?;
        self.publish_shot_status(shot_id);
        Ok(())
    }

    /// Unlock an approved shot.
    pub fn unapprove(&mut self, shot_id: &str) -> Result<(), CoreError> {
        lifecycle::unapprove(self.book.require_mut(shot_id)?);
        self.publish_shot_status(shot_id);
        Ok(())
    }

    /// Derive an extension unit continuing `parent_id`'s clip and insert
    /// it directly after its parent.
    pub fn extend_shot(
        &mut self,
        parent_id: &str,
        directive: impl Into<String>,
    ) -> Result<ShotId, CoreError> {
        let new_id = self.book.extension_id(parent_id);
        let child = lifecycle::extend(self.book.require(parent_id)?, new_id.clone(), directive.into())?;
        self.book.insert_after(parent_id, child)?;
        self.bus.publish(SessionEvent::ShotAdded {
            shot_id: new_id.clone(),
        });
        self.log(format!("Extension unit {new_id} derived from {parent_id}"));
        Ok(new_id)
    }

    // -- Generation commands ------------------------------------------------

    /// Generate (or re-generate) a shot's breakdown document.
    pub async fn generate_breakdown(
        &mut self,
        shot_id: &str,
        feedback: Option<String>,
    ) -> Result<(), SessionError> {
        let _permit = self.gate.try_begin().ok_or(SessionError::Busy)?;

        lifecycle::begin_breakdown(self.book.require_mut(shot_id)?)?;
        self.publish_shot_status(shot_id);

        let request = {
            let shot = self.book.require(shot_id)?;
            BreakdownRequest {
                shot_id: shot.id.clone(),
                pitch: shot.pitch.clone(),
                scene_name: shot.scene_name.clone(),
                feedback,
                prior: shot.breakdown.clone(),
                assets: self.resolve_assets(&shot.selected_asset_ids),
                references: shot.extra_references.clone(),
            }
        };

        let generator = Arc::clone(&self.generator);
        match generator.breakdown(request).await {
            Ok(outcome) => {
                lifecycle::complete_breakdown(self.book.require_mut(shot_id)?, outcome.breakdown);
                self.usage.record_text(
                    TextTier::Pro,
                    outcome.usage.input_tokens,
                    outcome.usage.output_tokens,
                );
                self.log(format!("Breakdown generated for shot {shot_id}"));
                self.publish_shot_status(shot_id);
                Ok(())
            }
            Err(e) => {
                lifecycle::fail_generation(self.book.require_mut(shot_id)?);
                self.log(format!(
                    "Breakdown generation failed for shot {shot_id}: {}",
                    e.message
                ));
                self.publish_shot_status(shot_id);
                Err(e.into())
            }
        }
    }

    /// Derive a shot's keyframe prompt from its breakdown.
    pub async fn generate_keyframe_prompt(
        &mut self,
        shot_id: &str,
    ) -> Result<(), SessionError> {
        let _permit = self.gate.try_begin().ok_or(SessionError::Busy)?;

        lifecycle::begin_keyframe_prompt(self.book.require_mut(shot_id)?)?;
        self.publish_shot_status(shot_id);

        let request = {
            let shot = self.book.require(shot_id)?;
            PromptRequest {
                shot_id: shot.id.clone(),
                breakdown: self.require_breakdown(shot)?,
                assets: self.resolve_assets(&shot.selected_asset_ids),
            }
        };

        let generator = Arc::clone(&self.generator);
        match generator.keyframe_prompt(request).await {
            Ok(outcome) => {
                lifecycle::complete_keyframe_prompt(
                    self.book.require_mut(shot_id)?,
                    outcome.prompt,
                );
                self.usage.record_text(
                    TextTier::Flash,
                    outcome.usage.input_tokens,
                    outcome.usage.output_tokens,
                );
                self.log(format!("Keyframe prompt generated for shot {shot_id}"));
                self.publish_shot_status(shot_id);
                Ok(())
            }
            Err(e) => {
                lifecycle::fail_generation(self.book.require_mut(shot_id)?);
                self.log(format!(
                    "Keyframe prompt generation failed for shot {shot_id}: {}",
                    e.message
                ));
                self.publish_shot_status(shot_id);
                Err(e.into())
            }
        }
    }

    /// Generate (or re-generate) a shot's keyframe still.
    pub async fn generate_still(&mut self, shot_id: &str) -> Result<(), SessionError> {
        let _permit = self.gate.try_begin().ok_or(SessionError::Busy)?;
        self.run_still(shot_id).await
    }

    /// Generate stills for every shot still missing one.
    ///
    /// Holds the generation slot for the whole run. A stop request halts
    /// scheduling between shots; the in-flight call always completes and
    /// its result is applied.
    pub async fn generate_all_stills(&mut self) -> Result<BatchOutcome, SessionError> {
        let _permit = self.gate.try_begin().ok_or(SessionError::Busy)?;

        let targets: Vec<ShotId> = self
            .book
            .iter()
            .filter(|s| {
                !s.is_approved
                    && !s.kind.is_extension()
                    && s.breakdown.is_some()
                    && s.keyframe_image.is_none()
            })
            .map(|s| s.id.clone())
            .collect();

        let mut outcome = BatchOutcome::default();
        for shot_id in targets {
            if self.stop.is_requested() {
                outcome.stopped = true;
                self.bus.publish(SessionEvent::BatchHalted {
                    completed: outcome.completed,
                });
                self.log(format!(
                    "Batch still run halted after {} of {} shots",
                    outcome.completed, outcome.attempted
                ));
                break;
            }
            outcome.attempted += 1;
            match self.run_still(&shot_id).await {
                Ok(()) => outcome.completed += 1,
                // Failed shots stay recoverable; the batch moves on.
                Err(SessionError::Generation(_)) => outcome.failed += 1,
                Err(other) => return Err(other),
            }
        }
        Ok(outcome)
    }

    /// Generate the video clip for an approved shot.
    pub async fn generate_video(&mut self, shot_id: &str) -> Result<(), SessionError> {
        let _permit = self.gate.try_begin().ok_or(SessionError::Busy)?;

        let request = {
            let shot = self.book.require(shot_id)?;
            let reference_image = if shot.keyframe_as_reference {
                shot.keyframe_image.clone()
            } else {
                None
            };
            VideoRequest {
                shot_id: shot.id.clone(),
                breakdown: self.require_breakdown(shot)?,
                reference_image,
                reference_url: shot.reference_url.clone(),
            }
        };

        lifecycle::request_video(self.book.require_mut(shot_id)?)?;
        self.publish_video_status(shot_id);
        lifecycle::begin_video(self.book.require_mut(shot_id)?)?;
        self.publish_video_status(shot_id);

        let generator = Arc::clone(&self.generator);
        match generator.video(request).await {
            Ok(outcome) => {
                lifecycle::complete_video(self.book.require_mut(shot_id)?, outcome.video_url);
                self.log(format!("Video generated for shot {shot_id}"));
                self.publish_video_status(shot_id);
                Ok(())
            }
            Err(e) => {
                lifecycle::fail_video(self.book.require_mut(shot_id)?);
                self.log(format!(
                    "Video generation failed for shot {shot_id}: {}",
                    e.message
                ));
                self.publish_video_status(shot_id);
                Err(e.into())
            }
        }
    }

    // -- Vault sync ---------------------------------------------------------

    /// Serialize the whole project and push it to the vault, then record
    /// the project in the world registry. Returns the state object URL.
    pub async fn sync(
        &mut self,
        token: &str,
        store: &ProjectStore,
        registry: &RegistrySynchronizer,
    ) -> Result<String, SessionError> {
        let snapshot = self.snapshot();
        let state_url = store.save_state(token, &snapshot).await?;

        let update = WorldRegistry::announcing(self.slug.clone(), Utc::now());
        registry.publish(token, &update).await?;

        self.log(format!("Project synced to vault ({state_url})"));
        self.bus.publish(SessionEvent::SyncCompleted {
            slug: self.slug.clone(),
            state_url: state_url.clone(),
        });
        Ok(state_url)
    }

    /// The current project state as a serializable snapshot.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            slug: self.slug.clone(),
            title: self.title.clone(),
            shots: self.book.clone(),
            assets: self.assets.clone(),
            scene_plans: self.scene_plans.clone(),
            logs: self.logs.clone(),
            usage: self.usage,
            saved_at: Utc::now(),
        }
    }

    // -- Internals ----------------------------------------------------------

    /// Still generation without the gate; used by the single-shot command
    /// and the batch loop, which hold the permit themselves.
    async fn run_still(&mut self, shot_id: &str) -> Result<(), SessionError> {
        let request = {
            let shot = self.book.require(shot_id)?;
            StillRequest {
                shot_id: shot.id.clone(),
                prompt: shot
                    .keyframe_prompt
                    .clone()
                    .unwrap_or_else(|| shot.pitch.clone()),
                breakdown: self.require_breakdown(shot)?,
                assets: self.resolve_assets(&shot.selected_asset_ids),
                references: shot.extra_references.clone(),
            }
        };

        lifecycle::begin_still(self.book.require_mut(shot_id)?)?;
        self.publish_shot_status(shot_id);

        let generator = Arc::clone(&self.generator);
        match generator.still(request).await {
            Ok(outcome) => {
                lifecycle::complete_still(self.book.require_mut(shot_id)?, outcome.image);
                self.usage.record_image();
                self.log(format!("Keyframe still generated for shot {shot_id}"));
                self.publish_shot_status(shot_id);
                Ok(())
            }
            Err(e) => {
                lifecycle::fail_generation(self.book.require_mut(shot_id)?);
                self.log(format!(
                    "Still generation failed for shot {shot_id}: {}",
                    e.message
                ));
                self.publish_shot_status(shot_id);
                Err(e.into())
            }
        }
    }

    fn require_breakdown(
        &self,
        shot: &Shot,
    ) -> Result<callsheet_core::breakdown::ShotBreakdown, CoreError> {
        shot.breakdown.clone().ok_or_else(|| {
            CoreError::Conflict(format!("Shot '{}' has no breakdown document", shot.id))
        })
    }

    fn resolve_assets(&self, ids: &[String]) -> Vec<ProjectAsset> {
        self.assets
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect()
    }

    fn publish_shot_status(&self, shot_id: &str) {
        if let Some(shot) = self.book.get(shot_id) {
            self.bus.publish(SessionEvent::ShotStatusChanged {
                shot_id: shot.id.clone(),
                status: shot.status,
            });
        }
    }

    fn publish_video_status(&self, shot_id: &str) {
        if let Some(shot) = self.book.get(shot_id) {
            self.bus.publish(SessionEvent::VideoStatusChanged {
                shot_id: shot.id.clone(),
                status: shot.video_status,
            });
        }
    }

    fn log(&mut self, message: String) {
        tracing::info!(slug = %self.slug, "{message}");
        self.logs.push(SessionLog::new(Utc::now(), message));
    }
}
