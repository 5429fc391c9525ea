//! Input structs for the differ's JSON output.
//!
//! The differ reports four lists that refer to existing scenes by ID. They are
//! resolved against the loaded schedule into a [`DiffResult`] whose entries
//! carry scene snapshots.

use anyhow::{bail, Result};
use serde::Deserialize;

use heyoschedule::{Change, ChangeSet, DiffResult, SceneDraft, ScheduleRoot};

/// Differ output as written to disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InputDiff {
    pub added: Vec<SceneDraft>,
    pub removed: Vec<String>,
    pub modified: Vec<InputModified>,
    pub moved: Vec<InputMoved>,
}

/// A modified scene; flags are derived by comparison when absent.
#[derive(Debug, Deserialize)]
pub struct InputModified {
    pub scene_id: String,
    pub incoming: SceneDraft,
    #[serde(default)]
    pub changes: Option<ChangeSet>,
}

#[derive(Debug, Deserialize)]
pub struct InputMoved {
    pub scene_id: String,
    pub old_index: u32,
    pub new_index: u32,
}

impl InputDiff {
    /// Resolves scene IDs against the schedule.
    ///
    /// Unknown IDs are an error here: the file was produced against a
    /// different version of the schedule.
    pub fn resolve(self, state: &ScheduleRoot) -> Result<DiffResult> {
        let lookup = |id: &str| match state.scenes.get(id) {
            Some(scene) => Ok(scene.clone()),
            None => bail!("Diff refers to unknown scene '{}'", id),
        };

        let mut diff = DiffResult::new();
        for draft in self.added {
            diff.push(Change::Added(draft));
        }
        for id in &self.removed {
            diff.push(Change::Removed(lookup(id)?));
        }
        for entry in self.modified {
            let existing = lookup(&entry.scene_id)?;
            let changes = entry
                .changes
                .unwrap_or_else(|| ChangeSet::between(&existing, &entry.incoming));
            diff.push(Change::Modified {
                existing,
                incoming: entry.incoming,
                changes,
            });
        }
        for entry in self.moved {
            diff.push(Change::Moved {
                scene: lookup(&entry.scene_id)?,
                old_index: entry.old_index,
                new_index: entry.new_index,
            });
        }
        Ok(diff)
    }
}
