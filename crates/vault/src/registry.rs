//! The cross-project world registry.
//!
//! A single shared document lists every known project slug.  Writers
//! must merge rather than overwrite: the slug list is unioned and every
//! other top-level field is taken last-writer-wins from the incoming
//! update.  The read-merge-write cycle is not conditional on the object's
//! generation, so two concurrent synchronizers can race and one update
//! can be lost; replays converge because the merge is idempotent.

use serde::{Deserialize, Serialize};

use callsheet_core::types::Timestamp;

use crate::client::{VaultClient, VaultError};

/// Fixed vault path of the shared registry document.
pub const REGISTRY_PATH: &str = "world/registry.json";

/// The shared registry document.
///
/// Top-level fields other than `projects` and `last_sync` are carried
/// opaquely so foreign writers' additions survive a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldRegistry {
    /// Known project slugs. Set semantics: duplicate-free, order not
    /// significant.
    #[serde(default)]
    pub projects: Vec<String>,
    /// When the registry was last synchronized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<Timestamp>,
    /// Any other top-level fields, merged last-writer-wins.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WorldRegistry {
    /// A registry announcing one project as of `now`.
    pub fn announcing(slug: impl Into<String>, now: Timestamp) -> Self {
        Self {
            projects: vec![slug.into()],
            last_sync: Some(now),
            extra: Default::default(),
        }
    }
}

/// Merge `incoming` over `existing` without destroying either side's
/// project list.
///
/// - `projects`: duplicate-free union, existing entries first.
/// - `last_sync`: incoming wins when present.
/// - all other fields: shallow merge, incoming wins per key.
pub fn merge(existing: &WorldRegistry, incoming: &WorldRegistry) -> WorldRegistry {
    let mut projects = existing.projects.clone();
    for slug in &incoming.projects {
        if !projects.contains(slug) {
            projects.push(slug.clone());
        }
    }

    let mut extra = existing.extra.clone();
    for (key, value) in &incoming.extra {
        extra.insert(key.clone(), value.clone());
    }

    WorldRegistry {
        projects,
        last_sync: incoming.last_sync.or(existing.last_sync),
        extra,
    }
}

/// Fetch-merge-write synchronizer for the shared registry.
pub struct RegistrySynchronizer {
    client: VaultClient,
}

impl RegistrySynchronizer {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }

    /// Read the current registry; an absent document reads as empty.
    pub async fn fetch(&self, token: &str) -> Result<WorldRegistry, VaultError> {
        match self.client.get(token, REGISTRY_PATH).await? {
            None => Ok(WorldRegistry::default()),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                VaultError::Decode(format!("Registry document is not valid JSON: {e}"))
            }),
        }
    }

    /// Apply `update` to the shared registry and write the merged
    /// document back whole.
    ///
    /// Not atomic: a concurrent synchronizer that read before this write
    /// can overwrite it. Accepted; see the module docs.
    pub async fn publish(
        &self,
        token: &str,
        update: &WorldRegistry,
    ) -> Result<WorldRegistry, VaultError> {
        let existing = self.fetch(token).await?;
        let merged = merge(&existing, update);

        let bytes = serde_json::to_vec(&merged)
            .map_err(|e| VaultError::Decode(format!("Registry document failed to serialize: {e}")))?;
        self.client
            .put(token, REGISTRY_PATH, bytes, "application/json")
            .await?;

        tracing::info!(
            projects = merged.projects.len(),
            "Published world registry update"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(projects: &[&str]) -> WorldRegistry {
        WorldRegistry {
            projects: projects.iter().map(|s| s.to_string()).collect(),
            last_sync: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn merge_unions_project_slugs() {
        let merged = merge(&registry(&["a", "b"]), &registry(&["b", "c"]));
        assert_eq!(merged.projects, vec!["a", "b", "c"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let existing = registry(&["a"]);
        let incoming = registry(&["b"]);

        let once = merge(&existing, &incoming);
        let twice = merge(&once, &incoming);
        assert_eq!(once.projects, twice.projects);
    }

    #[test]
    fn merge_into_empty_keeps_incoming() {
        let merged = merge(&WorldRegistry::default(), &registry(&["solo"]));
        assert_eq!(merged.projects, vec!["solo"]);
    }

    #[test]
    fn merge_last_sync_prefers_incoming() {
        let t1: Timestamp = "2026-08-01T10:00:00Z".parse().unwrap();
        let t2: Timestamp = "2026-08-01T11:00:00Z".parse().unwrap();

        let mut existing = registry(&["a"]);
        existing.last_sync = Some(t1);
        let mut incoming = registry(&["a"]);
        incoming.last_sync = Some(t2);

        assert_eq!(merge(&existing, &incoming).last_sync, Some(t2));
        // Incoming without a timestamp keeps the existing one.
        incoming.last_sync = None;
        assert_eq!(merge(&existing, &incoming).last_sync, Some(t1));
    }

    #[test]
    fn merge_foreign_fields_last_writer_wins() {
        let mut existing = registry(&["a"]);
        existing
            .extra
            .insert("curator".to_string(), serde_json::json!("alex"));
        existing
            .extra
            .insert("theme".to_string(), serde_json::json!("noir"));

        let mut incoming = registry(&[]);
        incoming
            .extra
            .insert("curator".to_string(), serde_json::json!("sam"));

        let merged = merge(&existing, &incoming);
        assert_eq!(merged.extra["curator"], "sam");
        assert_eq!(merged.extra["theme"], "noir");
    }

    #[test]
    fn registry_round_trips_with_foreign_fields() {
        let json = r#"{"projects": ["a"], "last_sync": "2026-08-01T10:00:00Z", "curator": "alex"}"#;
        let reg: WorldRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(reg.projects, vec!["a"]);
        assert_eq!(reg.extra["curator"], "alex");

        let back = serde_json::to_value(&reg).unwrap();
        assert_eq!(back["curator"], "alex");
        assert_eq!(back["projects"][0], "a");
    }

    #[test]
    fn announcing_carries_slug_and_timestamp() {
        let now: Timestamp = "2026-08-01T10:00:00Z".parse().unwrap();
        let reg = WorldRegistry::announcing("pilot", now);
        assert_eq!(reg.projects, vec!["pilot"]);
        assert_eq!(reg.last_sync, Some(now));
    }
}
