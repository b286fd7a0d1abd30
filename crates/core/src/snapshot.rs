//! The serialized project snapshot persisted to the vault.
//!
//! A snapshot is exactly what the domain entities serialize to; loading
//! one back must reproduce every field, so the vault can round-trip
//! project state losslessly.

use serde::{Deserialize, Serialize};

use crate::asset::ProjectAsset;
use crate::book::ShotBook;
use crate::cost::UsageSummary;
use crate::types::{ShotId, Timestamp};

/// A planned scene derived from the script breakdown: display name,
/// one-line summary, and the ordered shots it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlan {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub shot_ids: Vec<ShotId>,
}

/// One timestamped production log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub at: Timestamp,
    pub message: String,
}

impl SessionLog {
    pub fn new(at: Timestamp, message: impl Into<String>) -> Self {
        Self {
            at,
            message: message.into(),
        }
    }
}

/// Complete project state as persisted at `projects/<slug>/state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    pub shots: ShotBook,
    #[serde(default)]
    pub assets: Vec<ProjectAsset>,
    #[serde(default)]
    pub scene_plans: Vec<ScenePlan>,
    #[serde(default)]
    pub logs: Vec<SessionLog>,
    #[serde(default)]
    pub usage: UsageSummary,
    pub saved_at: Timestamp,
}
