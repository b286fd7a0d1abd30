//! Project-level vault operations.
//!
//! [`ProjectStore`] layers project semantics over the raw object client:
//! state snapshots under `projects/<slug>/`, library-asset artifacts under
//! `library/<kind>/<name>/`, and relayed video clips under each project's
//! unit directory.

use serde::Serialize;
use uuid::Uuid;

use callsheet_core::asset::AssetKind;
use callsheet_core::error::CoreError;
use callsheet_core::image::ImagePayload;
use callsheet_core::naming::{normalize_object_name, validate_slug, ARTIFACT_VERSION};
use callsheet_core::snapshot::ProjectSnapshot;

use crate::client::{VaultClient, VaultError};

/// Prefix under which project state lives.
pub const PROJECTS_PREFIX: &str = "projects/";

/// Object path of a project's state snapshot.
pub fn state_path(slug: &str) -> String {
    format!("{PROJECTS_PREFIX}{slug}/state.json")
}

/// Object path of a relayed video clip for one unit.
pub fn unit_clip_path(slug: &str, unit_id: &str) -> String {
    format!("{PROJECTS_PREFIX}{slug}/units/{unit_id}/clip.mp4")
}

/// Directory prefix of a library asset, normalized from its display name.
pub fn library_asset_prefix(kind: AssetKind, name: &str) -> String {
    format!("library/{}/{}", kind.name(), normalize_object_name(name))
}

/// File extension for a payload mime type; unknown types store as `bin`.
fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Strip the projects prefix and trailing delimiter from a listing entry,
/// yielding the bare slug. `None` for entries outside the prefix.
fn slug_from_listing(entry: &str) -> Option<String> {
    entry
        .strip_prefix(PROJECTS_PREFIX)
        .map(|rest| rest.trim_end_matches('/').to_string())
        .filter(|slug| !slug.is_empty())
}

/// The artifact document written next to each stored library-asset image.
#[derive(Debug, Serialize)]
struct AssetArtifact<'a> {
    id: String,
    version: &'static str,
    kind: &'a str,
    name: &'a str,
    image_object: &'a str,
    metadata: &'a serde_json::Value,
}

/// A stored library asset's vault coordinates.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    /// Vault-generated artifact id.
    pub vault_id: String,
    /// Public URL of the image object.
    pub image_url: String,
    /// Public URL of the artifact document.
    pub artifact_url: String,
}

/// Project-level operations over one vault bucket.
pub struct ProjectStore {
    client: VaultClient,
}

impl ProjectStore {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }

    /// The underlying object client.
    pub fn client(&self) -> &VaultClient {
        &self.client
    }

    /// Persist a project snapshot, returning the state object's URL.
    pub async fn save_state(
        &self,
        token: &str,
        snapshot: &ProjectSnapshot,
    ) -> Result<String, ProjectStoreError> {
        validate_slug(&snapshot.slug)?;
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let url = self
            .client
            .put(token, &state_path(&snapshot.slug), bytes, "application/json")
            .await?;
        tracing::info!(slug = %snapshot.slug, shots = snapshot.shots.len(), "Saved project state");
        Ok(url)
    }

    /// Load a project snapshot; absent objects fail with
    /// [`ProjectStoreError::ProjectNotFound`].
    pub async fn load_state(
        &self,
        token: &str,
        slug: &str,
    ) -> Result<ProjectSnapshot, ProjectStoreError> {
        validate_slug(slug)?;
        let bytes = self
            .client
            .get(token, &state_path(slug))
            .await?
            .ok_or_else(|| ProjectStoreError::ProjectNotFound {
                slug: slug.to_string(),
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// List the slugs of every project known to the vault.
    pub async fn list_projects(&self, token: &str) -> Result<Vec<String>, ProjectStoreError> {
        let entries = self.client.list(token, PROJECTS_PREFIX).await?;
        Ok(entries.iter().filter_map(|e| slug_from_listing(e)).collect())
    }

    /// Store a library asset: the image object plus a sibling
    /// `artifact.json` carrying metadata, a generated vault id, and the
    /// fixed artifact version tag.
    pub async fn store_library_asset(
        &self,
        token: &str,
        kind: AssetKind,
        name: &str,
        image: &ImagePayload,
        metadata: &serde_json::Value,
    ) -> Result<StoredAsset, ProjectStoreError> {
        let prefix = library_asset_prefix(kind, name);
        let image_object = format!(
            "{prefix}/image.{}",
            extension_for_mime(&image.mime_type)
        );

        let bytes = image.decode()?;
        let image_url = self
            .client
            .put(token, &image_object, bytes, &image.mime_type)
            .await?;

        let artifact = AssetArtifact {
            id: Uuid::new_v4().to_string(),
            version: ARTIFACT_VERSION,
            kind: kind.name(),
            name,
            image_object: &image_object,
            metadata,
        };
        let artifact_url = self
            .client
            .put(
                token,
                &format!("{prefix}/artifact.json"),
                serde_json::to_vec_pretty(&artifact)?,
                "application/json",
            )
            .await?;

        tracing::info!(kind = kind.name(), name, "Stored library asset");
        Ok(StoredAsset {
            vault_id: artifact.id,
            image_url,
            artifact_url,
        })
    }

    /// Re-host an externally generated video inside the vault.
    ///
    /// Fetches the bytes from `remote_url` (no bearer token -- the host is
    /// outside the vault) and uploads them under the project's unit
    /// directory, returning the vault URL.
    pub async fn relay_video(
        &self,
        token: &str,
        remote_url: &str,
        slug: &str,
        unit_id: &str,
    ) -> Result<String, ProjectStoreError> {
        validate_slug(slug)?;
        let bytes = self.client.fetch_external(remote_url).await?;
        let path = unit_clip_path(slug, unit_id);
        let url = self.client.put(token, &path, bytes, "video/mp4").await?;
        tracing::info!(slug, unit_id, "Relayed generated video into vault");
        Ok(url)
    }
}

/// Errors raised by project-level vault operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectStoreError {
    /// The requested project has no state object in the vault.
    #[error("Project '{slug}' not found in the vault")]
    ProjectNotFound { slug: String },

    /// The underlying object operation failed.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Slug/name validation or payload decoding failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Snapshot (de)serialization failed.
    #[error("Snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
