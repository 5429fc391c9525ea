//! Shoot-day aggregates derived from the scenes assigned to a day.

use serde::{Deserialize, Serialize};

use crate::schedule::model::{Scene, ScheduleRoot};

/// Totals for one shoot day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayAggregate {
    pub total_page_eighths: u32,
    pub scene_count: u32,
}

impl DayAggregate {
    /// Total length in display form, e.g. `"1 4/8"`.
    pub fn display_length(&self) -> String {
        format_eighths(self.total_page_eighths)
    }
}

/// Pure recomputation of shoot-day aggregates.
pub struct DayAggregateRecalculator;

impl DayAggregateRecalculator {
    /// Computes the aggregate for a set of scenes.
    pub fn recalculate<'a, I>(scenes: I) -> DayAggregate
    where
        I: IntoIterator<Item = &'a Scene>,
    {
        scenes
            .into_iter()
            .fold(DayAggregate::default(), |acc, scene| DayAggregate {
                total_page_eighths: acc.total_page_eighths.saturating_add(scene.page_eighths),
                scene_count: acc.scene_count + 1,
            })
    }

    /// Recomputes and overwrites the aggregates of every day in the graph.
    ///
    /// Idempotent. Returns the number of days visited.
    pub fn recompute_all(root: &mut ScheduleRoot) -> usize {
        let aggregates: Vec<(String, DayAggregate)> = root
            .shoot_days
            .keys()
            .map(|day_id| {
                let aggregate = Self::recalculate(root.scenes_on_day(day_id));
                (day_id.clone(), aggregate)
            })
            .collect();

        for (day_id, aggregate) in &aggregates {
            if let Some(day) = root.shoot_days.get_mut(day_id) {
                day.total_page_eighths = aggregate.total_page_eighths;
                day.scene_count = aggregate.scene_count;
            }
        }
        aggregates.len()
    }
}

/// Formats eighths for display: `"0"`, `"2"`, `"3/8"` or `"1 4/8"`.
pub fn format_eighths(eighths: u32) -> String {
    let pages = eighths / 8;
    let rest = eighths % 8;
    match (pages, rest) {
        (0, 0) => "0".to_string(),
        (pages, 0) => pages.to_string(),
        (0, rest) => format!("{}/8", rest),
        (pages, rest) => format!("{} {}/8", pages, rest),
    }
}
