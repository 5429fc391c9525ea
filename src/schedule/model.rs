//! Data models for the collaborative shooting schedule.
//!
//! Scenes and shoot days live in one document. Using autosurgeon derives for
//! automatic CRDT serialization.

use autosurgeon::{Hydrate, Reconcile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Latest version of the typed scene record.
pub const CURRENT_RECORD_VERSION: u32 = 1;

// =============================================================================
// DOCUMENT ROOT
// =============================================================================

/// Root document structure for a project's scene/day graph.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleRoot {
    /// Unique identifier
    pub id: String,
    /// Project title
    pub title: String,
    /// Version of the scene record layout stored in this document
    pub record_version: u32,

    /// Script ordering (scene IDs)
    pub scene_order: Vec<String>,
    /// Scene data keyed by scene ID. Scenes dropped from the script stay here.
    pub scenes: HashMap<String, Scene>,

    /// Calendar ordering (day IDs)
    pub day_order: Vec<String>,
    /// Shoot days keyed by day ID
    pub shoot_days: HashMap<String, ShootDay>,
}

impl ScheduleRoot {
    /// Creates a new empty schedule root with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record_version: CURRENT_RECORD_VERSION,
            ..Default::default()
        }
    }

    /// Builder: Set title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Scenes currently in the script, in script order.
    pub fn scenes_in_script_order(&self) -> Vec<&Scene> {
        self.scene_order
            .iter()
            .filter_map(|id| self.scenes.get(id))
            .collect()
    }

    /// Shoot days in calendar order.
    pub fn days_in_order(&self) -> Vec<&ShootDay> {
        self.day_order
            .iter()
            .filter_map(|id| self.shoot_days.get(id))
            .collect()
    }

    /// Scenes assigned to a day, in shooting order.
    ///
    /// A scene counts as on the day only if the day lists it and the scene
    /// points back at the day.
    pub fn scenes_on_day(&self, day_id: &str) -> Vec<&Scene> {
        let Some(day) = self.shoot_days.get(day_id) else {
            return Vec::new();
        };
        day.scene_ids
            .iter()
            .filter_map(|id| self.scenes.get(id))
            .filter(|scene| scene.shoot_day.as_deref() == Some(day_id))
            .collect()
    }

    /// The unscheduled pool: scripted scenes without a shoot day, in script order.
    pub fn unscheduled_scenes(&self) -> Vec<&Scene> {
        self.scenes_in_script_order()
            .into_iter()
            .filter(|scene| !scene.is_scheduled())
            .collect()
    }

    /// Inserts a scene into the graph and the script order at its index.
    pub fn insert_scene(&mut self, scene: Scene) {
        let id = scene.id.clone();
        if !self.scene_order.contains(&id) {
            let position = (scene.script_order_index as usize).min(self.scene_order.len());
            self.scene_order.insert(position, id.clone());
        }
        self.scenes.insert(id, scene);
    }

    /// Assigns a scene to a day, moving it off any previous day.
    ///
    /// Returns the previous day, if any. Does not touch aggregates.
    pub fn assign(&mut self, scene_id: &str, day_id: &str) -> Option<String> {
        if !self.scenes.contains_key(scene_id) || !self.shoot_days.contains_key(day_id) {
            return None;
        }
        let previous = self.unassign(scene_id);
        if let Some(day) = self.shoot_days.get_mut(day_id) {
            if !day.scene_ids.iter().any(|id| id == scene_id) {
                day.scene_ids.push(scene_id.to_string());
            }
        }
        if let Some(scene) = self.scenes.get_mut(scene_id) {
            scene.shoot_day = Some(day_id.to_string());
        }
        previous
    }

    /// Clears a scene's shoot-day assignment on both sides.
    ///
    /// Returns the day the scene was on. Does not touch aggregates.
    pub fn unassign(&mut self, scene_id: &str) -> Option<String> {
        let former = self.scenes.get_mut(scene_id)?.shoot_day.take();
        if let Some(ref day_id) = former {
            if let Some(day) = self.shoot_days.get_mut(day_id) {
                day.scene_ids.retain(|id| id != scene_id);
            }
        }
        former
    }

    /// Rewrites `script_order_index` to match the position in `scene_order`.
    pub fn reindex_script_order(&mut self) {
        for (index, id) in self.scene_order.iter().enumerate() {
            if let Some(scene) = self.scenes.get_mut(id) {
                scene.script_order_index = index as u32;
            }
        }
    }
}

// =============================================================================
// SCENE
// =============================================================================

/// A single script unit with a stable identity across re-imports.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Scene {
    pub id: String,
    /// Scene number as printed in the script (e.g. "12A"). May transiently repeat.
    pub number: String,
    pub heading: SceneHeading,
    /// Length in eighths of a page (8 eighths = 1 page)
    pub page_eighths: u32,
    /// Position in the current script
    pub script_order_index: u32,
    /// Shoot day this scene is scheduled on
    pub shoot_day: Option<String>,
    /// Paragraphs from the last import, kept for bulk page re-estimation
    pub paragraphs: Vec<TypedParagraph>,
}

impl Scene {
    /// Creates a new Scene with the given ID and scene number.
    pub fn new(id: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            ..Default::default()
        }
    }

    /// Builder: Set heading.
    pub fn with_heading(mut self, heading: SceneHeading) -> Self {
        self.heading = heading;
        self
    }

    /// Builder: Set page length in eighths.
    pub fn with_page_eighths(mut self, page_eighths: u32) -> Self {
        self.page_eighths = page_eighths;
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

    /// Returns true if the scene has a shoot day.
    pub fn is_scheduled(&self) -> bool {
        self.shoot_day.is_some()
    }
}

/// Interior/exterior marker from a scene heading.
#[derive(
    Debug, Clone, Copy, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Interior,
    Exterior,
    InteriorExterior,
    #[default]
    Unspecified,
}

impl LocationType {
    /// Heading prefix as printed in a script.
    pub fn prefix(&self) -> &'static str {
        match self {
            LocationType::Interior => "INT.",
            LocationType::Exterior => "EXT.",
            LocationType::InteriorExterior => "INT./EXT.",
            LocationType::Unspecified => "",
        }
    }
}

/// Scene heading split into its parts, e.g. `INT. OFFICE - DAY`.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SceneHeading {
    pub location_type: LocationType,
    pub location_name: String,
    pub time_of_day: String,
}

impl SceneHeading {
    /// Creates a heading from its parts.
    pub fn new(
        location_type: LocationType,
        location_name: impl Into<String>,
        time_of_day: impl Into<String>,
    ) -> Self {
        Self {
            location_type,
            location_name: location_name.into(),
            time_of_day: time_of_day.into(),
        }
    }

    /// Parses a raw heading line such as `EXT. PARKING LOT - NIGHT`.
    ///
    /// Unrecognised prefixes leave the location type unspecified and keep the
    /// whole text as the location name.
    pub fn parse(raw: &str) -> Self {
        const PREFIXES: &[(&str, LocationType)] = &[
            ("INT./EXT.", LocationType::InteriorExterior),
            ("EXT./INT.", LocationType::InteriorExterior),
            ("INT/EXT", LocationType::InteriorExterior),
            ("I/E", LocationType::InteriorExterior),
            ("INT.", LocationType::Interior),
            ("EXT.", LocationType::Exterior),
            ("INT ", LocationType::Interior),
            ("EXT ", LocationType::Exterior),
        ];

        let trimmed = raw.trim();
        let (location_type, rest) = PREFIXES
            .iter()
            .find(|(prefix, _)| {
                trimmed
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            })
            .map(|(prefix, kind)| (*kind, &trimmed[prefix.len()..]))
            .unwrap_or((LocationType::Unspecified, trimmed));

        let (location_name, time_of_day) = match rest.rsplit_once(" - ") {
            Some((name, time)) => (name.trim(), time.trim()),
            None => (rest.trim(), ""),
        };

        Self::new(location_type, location_name, time_of_day)
    }
}

impl fmt::Display for SceneHeading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.location_type.prefix();
        if !prefix.is_empty() {
            write!(f, "{} ", prefix)?;
        }
        write!(f, "{}", self.location_name)?;
        if !self.time_of_day.is_empty() {
            write!(f, " - {}", self.time_of_day)?;
        }
        Ok(())
    }
}

// =============================================================================
// PARAGRAPHS
// =============================================================================

/// Screenplay paragraph type as produced by the import pipeline.
#[derive(
    Debug, Clone, Copy, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphKind {
    SceneHeading,
    #[default]
    Action,
    Character,
    Dialogue,
    Parenthetical,
    Transition,
    Shot,
    General,
}

/// A paragraph of screenplay text with its type.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TypedParagraph {
    pub kind: ParagraphKind,
    pub text: String,
}

impl TypedParagraph {
    /// Creates a new paragraph.
    pub fn new(kind: ParagraphKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

// =============================================================================
// SHOOT DAY
// =============================================================================

/// A calendar day of principal photography.
///
/// `total_page_eighths` and `scene_count` are derived from the assigned
/// scenes and only ever written by the aggregate recalculator.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShootDay {
    pub id: String,
    /// Calendar date (ISO 8601, e.g. "2026-03-14")
    pub date: String,
    /// Display label (e.g. "Day 3")
    pub label: Option<String>,
    /// Assigned scenes in shooting order
    pub scene_ids: Vec<String>,

    pub total_page_eighths: u32,
    pub scene_count: u32,
}

impl ShootDay {
    /// Creates a new ShootDay with the given ID and date.
    pub fn new(id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    /// Builder: Set label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_scene_root() -> ScheduleRoot {
        let mut root = ScheduleRoot::new("proj-1");
        root.insert_scene(Scene::new("s1", "1").with_script_order_index(0));
        root.insert_scene(Scene::new("s2", "2").with_script_order_index(1));
        root.shoot_days
            .insert("d1".to_string(), ShootDay::new("d1", "2026-03-14"));
        root.shoot_days
            .insert("d2".to_string(), ShootDay::new("d2", "2026-03-15"));
        root.day_order = vec!["d1".to_string(), "d2".to_string()];
        root
    }

    #[test]
    fn test_schedule_root_new() {
        let root = ScheduleRoot::new("proj-1").with_title("Legend");
        assert_eq!(root.id, "proj-1");
        assert_eq!(root.title, "Legend");
        assert_eq!(root.record_version, CURRENT_RECORD_VERSION);
        assert!(root.scenes.is_empty());
    }

    #[test]
    fn test_heading_parse() {
        let heading = SceneHeading::parse("INT. OFFICE - DAY");
        assert_eq!(heading.location_type, LocationType::Interior);
        assert_eq!(heading.location_name, "OFFICE");
        assert_eq!(heading.time_of_day, "DAY");

        let heading = SceneHeading::parse("int./ext. car - moving - night");
        assert_eq!(heading.location_type, LocationType::InteriorExterior);
        assert_eq!(heading.location_name, "car - moving");
        assert_eq!(heading.time_of_day, "night");

        let heading = SceneHeading::parse("MONTAGE");
        assert_eq!(heading.location_type, LocationType::Unspecified);
        assert_eq!(heading.location_name, "MONTAGE");
        assert!(heading.time_of_day.is_empty());
    }

    #[test]
    fn test_heading_display() {
        let heading = SceneHeading::new(LocationType::Exterior, "PARKING LOT", "NIGHT");
        assert_eq!(heading.to_string(), "EXT. PARKING LOT - NIGHT");
        assert_eq!(SceneHeading::parse(&heading.to_string()), heading);
    }

    #[test]
    fn test_assign_moves_between_days() {
        let mut root = two_scene_root();

        assert_eq!(root.assign("s1", "d1"), None);
        assert_eq!(root.scenes_on_day("d1").len(), 1);

        assert_eq!(root.assign("s1", "d2"), Some("d1".to_string()));
        assert!(root.scenes_on_day("d1").is_empty());
        assert_eq!(root.scenes_on_day("d2")[0].id, "s1");
        assert!(root.shoot_days["d1"].scene_ids.is_empty());
    }

    #[test]
    fn test_assign_unknown_day_is_noop() {
        let mut root = two_scene_root();
        assert_eq!(root.assign("s1", "missing"), None);
        assert!(!root.scenes["s1"].is_scheduled());
    }

    #[test]
    fn test_unassign_clears_both_sides() {
        let mut root = two_scene_root();
        root.assign("s2", "d1");

        assert_eq!(root.unassign("s2"), Some("d1".to_string()));
        assert!(root.scenes["s2"].shoot_day.is_none());
        assert!(root.shoot_days["d1"].scene_ids.is_empty());
        assert_eq!(root.unassign("s2"), None);
    }

    #[test]
    fn test_unscheduled_pool_in_script_order() {
        let mut root = two_scene_root();
        root.insert_scene(Scene::new("s0", "0").with_script_order_index(0));
        root.assign("s1", "d1");

        let pool: Vec<&str> = root
            .unscheduled_scenes()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(pool, vec!["s0", "s2"]);
    }

    #[test]
    fn test_scenes_on_day_requires_back_reference() {
        let mut root = two_scene_root();
        root.shoot_days
            .get_mut("d1")
            .unwrap()
            .scene_ids
            .push("s1".to_string());

        assert!(root.scenes_on_day("d1").is_empty());
    }
}
