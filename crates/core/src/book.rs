//! The ordered shot collection and its scene grouping.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::shot::Shot;
use crate::types::ShotId;

/// Ordered sequence of shots. Insertion order is significant: it drives
/// display grouping and export order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShotBook {
    shots: Vec<Shot>,
}

impl ShotBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from an existing ordered shot list, rejecting
    /// duplicate ids.
    pub fn from_shots(shots: Vec<Shot>) -> Result<Self, CoreError> {
        let mut book = Self::new();
        for shot in shots {
            book.push(shot)?;
        }
        Ok(book)
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shot> {
        self.shots.iter()
    }

    pub fn ids(&self) -> Vec<ShotId> {
        self.shots.iter().map(|s| s.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Shot> {
        self.shots.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Shot> {
        self.shots.iter_mut().find(|s| s.id == id)
    }

    /// Fetch a shot or fail with `NotFound`.
    pub fn require(&self, id: &str) -> Result<&Shot, CoreError> {
        self.get(id).ok_or_else(|| CoreError::NotFound {
            entity: "Shot",
            id: id.to_string(),
        })
    }

    /// Fetch a shot mutably or fail with `NotFound`.
    pub fn require_mut(&mut self, id: &str) -> Result<&mut Shot, CoreError> {
        match self.shots.iter_mut().find(|s| s.id == id) {
            Some(shot) => Ok(shot),
            None => Err(CoreError::NotFound {
                entity: "Shot",
                id: id.to_string(),
            }),
        }
    }

    /// Append a shot, rejecting duplicate ids.
    pub fn push(&mut self, shot: Shot) -> Result<(), CoreError> {
        if self.get(&shot.id).is_some() {
            return Err(CoreError::Conflict(format!(
                "Shot id '{}' already exists in the book",
                shot.id
            )));
        }
        self.shots.push(shot);
        Ok(())
    }

    /// Insert a shot directly after `after_id`, rejecting duplicates.
    ///
    /// Used for extension units so they sit next to their parent in
    /// display and export order.
    pub fn insert_after(&mut self, after_id: &str, shot: Shot) -> Result<(), CoreError> {
        if self.get(&shot.id).is_some() {
            return Err(CoreError::Conflict(format!(
                "Shot id '{}' already exists in the book",
                shot.id
            )));
        }
        let pos = self
            .shots
            .iter()
            .position(|s| s.id == after_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Shot",
                id: after_id.to_string(),
            })?;
        self.shots.insert(pos + 1, shot);
        Ok(())
    }

    /// Group shot ids by scene, in first-seen order.
    ///
    /// The group key is the token before the first `_` of each id; ids
    /// without a separator land in the `ungrouped` bucket.
    pub fn scene_groups(&self) -> Vec<(String, Vec<ShotId>)> {
        let mut groups: Vec<(String, Vec<ShotId>)> = Vec::new();
        for shot in &self.shots {
            let key = shot.scene_group();
            match groups.iter_mut().find(|(g, _)| g == key) {
                Some((_, ids)) => ids.push(shot.id.clone()),
                None => groups.push((key.to_string(), vec![shot.id.clone()])),
            }
        }
        groups
    }

    /// Derive a fresh id for an extension of `parent_id`:
    /// `<parent>_x1`, `<parent>_x2`, ... choosing the first unused suffix.
    pub fn extension_id(&self, parent_id: &str) -> ShotId {
        let mut n = 1usize;
        loop {
            let candidate = format!("{parent_id}_x{n}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl IntoIterator for ShotBook {
    type Item = Shot;
    type IntoIter = std::vec::IntoIter<Shot>;

    fn into_iter(self) -> Self::IntoIter {
        self.shots.into_iter()
    }
}
