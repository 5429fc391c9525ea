//! Load boundary for externally produced scene lists.
//!
//! The import pipeline hands over JSON with arrays instead of maps and, for
//! older exports, raw heading strings without page lengths. Everything is
//! resolved here, once, into a typed [`ScheduleRoot`].

use serde::Deserialize;

use crate::error::{ScheduleError, ScheduleResult};
use crate::pagination::{DayAggregateRecalculator, PageLengthEstimator};
use crate::schedule::model::*;

/// Scene list export as produced by the import pipeline.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleImport {
    pub id: String,
    pub title: String,
    /// 0 for legacy exports
    pub record_version: u32,
    pub scenes: Vec<ImportedScene>,
    pub shoot_days: Vec<ImportedShootDay>,
}

/// One scene of an export.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportedScene {
    pub id: String,
    pub number: String,
    /// Typed heading (version 1)
    pub heading: Option<SceneHeading>,
    /// Raw heading line (version 0)
    pub raw_heading: Option<String>,
    pub page_eighths: Option<u32>,
    pub paragraphs: Vec<TypedParagraph>,
}

/// One shoot day of an export.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportedShootDay {
    pub id: String,
    pub date: String,
    pub label: Option<String>,
    pub scene_ids: Vec<String>,
}

impl ScheduleImport {
    /// Parses an export from JSON.
    pub fn from_json(json: &str) -> ScheduleResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves the export into a typed graph with fresh aggregates.
    ///
    /// Scene order follows the export; day assignments come from each day's
    /// scene list. Stored lengths are kept whatever the record version; only
    /// missing ones are estimated.
    pub fn into_root(self, estimator: &PageLengthEstimator) -> ScheduleResult<ScheduleRoot> {
        if self.record_version > CURRENT_RECORD_VERSION {
            return Err(ScheduleError::unsupported_record_version(
                self.record_version,
                CURRENT_RECORD_VERSION,
            ));
        }

        let mut root = ScheduleRoot::new(self.id).with_title(self.title);

        for (index, imported) in self.scenes.into_iter().enumerate() {
            let heading = match (imported.heading, imported.raw_heading) {
                (Some(heading), _) => heading,
                (None, Some(raw)) => SceneHeading::parse(&raw),
                (None, None) => first_heading_paragraph(&imported.paragraphs),
            };
            let page_eighths = imported
                .page_eighths
                .unwrap_or_else(|| estimator.estimate(&imported.paragraphs));
            root.insert_scene(
                Scene::new(imported.id, imported.number)
                    .with_heading(heading)
                    .with_page_eighths(page_eighths)
                    .with_script_order_index(index as u32)
                    .with_paragraphs(imported.paragraphs),
            );
        }
        root.reindex_script_order();

        for imported in self.shoot_days {
            let mut day = ShootDay::new(imported.id.clone(), imported.date);
            day.label = imported.label;
            root.day_order.push(imported.id.clone());
            root.shoot_days.insert(imported.id.clone(), day);
            for scene_id in &imported.scene_ids {
                let previous = root.assign(scene_id, &imported.id);
                if previous.is_some_and(|prev| prev != imported.id) {
                    tracing::warn!(
                        scene_id = %scene_id,
                        day_id = %imported.id,
                        "Scene listed on more than one day; keeping the later day"
                    );
                }
            }
        }

        DayAggregateRecalculator::recompute_all(&mut root);
        Ok(root)
    }
}

/// Heading parsed from the first scene-heading paragraph, if any.
fn first_heading_paragraph(paragraphs: &[TypedParagraph]) -> SceneHeading {
    paragraphs
        .iter()
        .find(|p| p.kind == ParagraphKind::SceneHeading)
        .map(|p| SceneHeading::parse(&p.text))
        .unwrap_or_default()
}
