//! Diff between two versions of a script's scene list.
//!
//! The differ itself lives outside this crate. Its output arrives as a
//! [`DiffResult`]: one list of tagged [`Change`]s so every consumer has to
//! handle all four categories.

use serde::{Deserialize, Serialize};

use crate::pagination::PageLengthEstimator;
use crate::schedule::model::{Scene, SceneHeading, TypedParagraph};

// =============================================================================
// SCENE DRAFT
// =============================================================================

/// An incoming scene from the latest script, not yet an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneDraft {
    /// Stable identity, when the differ already matched or minted one
    pub id: Option<String>,
    pub number: String,
    pub heading: SceneHeading,
    /// Length from the import; estimated from paragraphs when absent
    pub page_eighths: Option<u32>,
    pub script_order_index: u32,
    pub paragraphs: Vec<TypedParagraph>,
}

impl SceneDraft {
    /// Creates a draft with the given scene number.
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Default::default()
        }
    }

    /// Builder: Set stable ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder: Set heading.
    pub fn with_heading(mut self, heading: SceneHeading) -> Self {
        self.heading = heading;
        self
    }

    /// Builder: Set page length in eighths.
    pub fn with_page_eighths(mut self, page_eighths: u32) -> Self {
        self.page_eighths = Some(page_eighths);
        self
    }

    /// Builder: Set script position.
    pub fn with_script_order_index(mut self, index: u32) -> Self {
        self.script_order_index = index;
        self
    }

    /// Builder: Set paragraphs.
    pub fn with_paragraphs(mut self, paragraphs: Vec<TypedParagraph>) -> Self {
        self.paragraphs = paragraphs;
        self
    }
    /// Builds an unscheduled scene from this draft. A draft without a length
    /// is seeded with an estimate; a given length, even 0, is kept.
    pub fn to_scene(&self, id: impl Into<String>, estimator: &PageLengthEstimator) -> Scene {
        let page_eighths = self
            .page_eighths
            .unwrap_or_else(|| estimator.estimate(&self.paragraphs));
        Scene::new(id, self.number.clone())
            .with_heading(self.heading.clone())
            .with_page_eighths(page_eighths)
            .with_script_order_index(self.script_order_index)
            .with_paragraphs(self.paragraphs.clone())
    }
}

// =============================================================================
// CHANGE SET
// =============================================================================

/// Which fields of an existing scene differ in the incoming draft.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChangeSet {
    pub number_changed: bool,
    pub heading_changed: bool,
    pub location_type_changed: bool,
    pub script_location_changed: bool,
    pub page_eighths_changed: bool,
}

impl ChangeSet {
    /// Derives the flags by comparing a scene with its incoming draft.
    pub fn between(existing: &Scene, incoming: &SceneDraft) -> Self {
        Self {
            number_changed: existing.number != incoming.number,
            heading_changed: existing.heading != incoming.heading,
            location_type_changed: existing.heading.location_type
                != incoming.heading.location_type,
            script_location_changed: existing.heading.location_name
                != incoming.heading.location_name,
            page_eighths_changed: incoming
                .page_eighths
                .is_some_and(|eighths| eighths != existing.page_eighths),
        }
    }

    /// Returns true if any flag is set.
    pub fn any(&self) -> bool {
        self.number_changed
            || self.heading_changed
            || self.location_type_changed
            || self.script_location_changed
            || self.page_eighths_changed
    }

    /// Names of the heading-related flags that are set.
    pub fn heading_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.heading_changed {
            fields.push("heading");
        }
        if self.location_type_changed {
            fields.push("location_type");
        }
        if self.script_location_changed {
            fields.push("script_location");
        }
        fields
    }
}

// =============================================================================
// CHANGES
// =============================================================================

/// One entry of a script diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// A scene new to the script.
    Added(SceneDraft),
    /// An existing scene absent from the latest script (snapshot at diff time).
    Removed(Scene),
    /// An existing scene whose content changed.
    Modified {
        existing: Scene,
        incoming: SceneDraft,
        changes: ChangeSet,
    },
    /// An existing scene at a new script position.
    Moved {
        scene: Scene,
        old_index: u32,
        new_index: u32,
    },
}

impl Change {
    /// ID of the existing scene this change refers to; `None` for additions
    /// without a pre-assigned ID.
    pub fn scene_id(&self) -> Option<&str> {
        match self {
            Change::Added(draft) => draft.id.as_deref(),
            Change::Removed(scene) => Some(&scene.id),
            Change::Modified { existing, .. } => Some(&existing.id),
            Change::Moved { scene, .. } => Some(&scene.id),
        }
    }
}

/// The full diff produced by re-importing a script.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiffResult {
    pub changes: Vec<Change>,
}

impl DiffResult {
    /// Creates an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a diff from the differ's four category lists.
    pub fn from_parts(
        added: Vec<SceneDraft>,
        removed: Vec<Scene>,
        modified: Vec<(Scene, SceneDraft, ChangeSet)>,
        moved: Vec<(Scene, u32, u32)>,
    ) -> Self {
        let mut changes = Vec::with_capacity(added.len() + removed.len() + modified.len() + moved.len());
        changes.extend(added.into_iter().map(Change::Added));
        changes.extend(removed.into_iter().map(Change::Removed));
        changes.extend(
            modified
                .into_iter()
                .map(|(existing, incoming, changes)| Change::Modified {
                    existing,
                    incoming,
                    changes,
                }),
        );
        changes.extend(
            moved
                .into_iter()
                .map(|(scene, old_index, new_index)| Change::Moved {
                    scene,
                    old_index,
                    new_index,
                }),
        );
        Self { changes }
    }

    /// Builder: Append a change.
    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Incoming drafts for new scenes.
    pub fn added(&self) -> impl Iterator<Item = &SceneDraft> {
        self.changes.iter().filter_map(|change| match change {
            Change::Added(draft) => Some(draft),
            _ => None,
        })
    }

    /// Scenes dropped from the script.
    pub fn removed(&self) -> impl Iterator<Item = &Scene> {
        self.changes.iter().filter_map(|change| match change {
            Change::Removed(scene) => Some(scene),
            _ => None,
        })
    }

    /// Modified scenes as (existing, incoming, changes).
    pub fn modified(&self) -> impl Iterator<Item = (&Scene, &SceneDraft, &ChangeSet)> {
        self.changes.iter().filter_map(|change| match change {
            Change::Modified {
                existing,
                incoming,
                changes,
            } => Some((existing, incoming, changes)),
            _ => None,
        })
    }

    /// Moved scenes as (scene, old index, new index).
    pub fn moved(&self) -> impl Iterator<Item = (&Scene, u32, u32)> {
        self.changes.iter().filter_map(|change| match change {
            Change::Moved {
                scene,
                old_index,
                new_index,
            } => Some((scene, *old_index, *new_index)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::LocationType;

    fn office_scene() -> Scene {
        Scene::new("s1", "4")
            .with_heading(SceneHeading::new(LocationType::Interior, "OFFICE", "DAY"))
            .with_page_eighths(4)
    }

    #[test]
    fn test_change_set_between_identical() {
        let scene = office_scene();
        let draft = SceneDraft::new("4")
            .with_heading(scene.heading.clone())
            .with_page_eighths(4);

        let changes = ChangeSet::between(&scene, &draft);
        assert!(!changes.any());
    }

    #[test]
    fn test_change_set_between_detects_fields() {
        let scene = office_scene();
        let draft = SceneDraft::new("4A")
            .with_heading(SceneHeading::new(LocationType::Exterior, "OFFICE", "DAY"))
            .with_page_eighths(6);

        let changes = ChangeSet::between(&scene, &draft);
        assert!(changes.number_changed);
        assert!(changes.heading_changed);
        assert!(changes.location_type_changed);
        assert!(!changes.script_location_changed);
        assert!(changes.page_eighths_changed);
        assert_eq!(changes.heading_fields(), vec!["heading", "location_type"]);
    }

    #[test]
    fn test_change_set_missing_page_length_is_not_a_change() {
        let scene = office_scene();
        let draft = SceneDraft::new("4").with_heading(scene.heading.clone());
        assert!(!ChangeSet::between(&scene, &draft).page_eighths_changed);
    }

    #[test]
    fn test_from_parts_and_accessors() {
        let scene = office_scene();
        let diff = DiffResult::from_parts(
            vec![SceneDraft::new("5")],
            vec![scene.clone()],
            vec![(scene.clone(), SceneDraft::new("4"), ChangeSet::default())],
            vec![(scene, 0, 3)],
        );

        assert_eq!(diff.len(), 4);
        assert_eq!(diff.added().count(), 1);
        assert_eq!(diff.removed().count(), 1);
        assert_eq!(diff.modified().count(), 1);
        assert_eq!(diff.moved().next().map(|(_, old, new)| (old, new)), Some((0, 3)));
    }

    #[test]
    fn test_change_json_shape() {
        let change = Change::Moved {
            scene: office_scene(),
            old_index: 1,
            new_index: 2,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["kind"], "moved");
        assert_eq!(json["new_index"], 2);

        let parsed: Change = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.scene_id(), Some("s1"));
    }
}
