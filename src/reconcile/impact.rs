//! Read-only preview of what a pending diff would do to the schedule.

use serde::{Deserialize, Serialize};

use super::diff::DiffResult;

/// Scheduler impact of a diff, for confirmation before reconciling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImpactSummary {
    pub removed_scheduled_scenes: usize,
    /// Counts modified scheduled scenes, not distinct days: two changed
    /// scenes on the same day count twice.
    pub days_affected_by_page_changes: usize,
    pub moved_scheduled_scenes: usize,
    pub has_impact: bool,
    pub summary: String,
}

impl ImpactSummary {
    /// Builds a summary from its counts, deriving `has_impact` and the text.
    pub fn new(
        removed_scheduled_scenes: usize,
        days_affected_by_page_changes: usize,
        moved_scheduled_scenes: usize,
    ) -> Self {
        let mut parts = Vec::new();
        if removed_scheduled_scenes > 0 {
            parts.push(format!(
                "{} scheduled scene(s) will be unscheduled",
                removed_scheduled_scenes
            ));
        }
        if days_affected_by_page_changes > 0 {
            parts.push(format!(
                "{} shoot day(s) will change page totals",
                days_affected_by_page_changes
            ));
        }
        if moved_scheduled_scenes > 0 {
            parts.push(format!(
                "{} scheduled scene(s) moved in the script keep their shoot day",
                moved_scheduled_scenes
            ));
        }

        let has_impact = !parts.is_empty();
        let summary = if has_impact {
            parts.join("; ")
        } else {
            "No scheduler impact".to_string()
        };

        Self {
            removed_scheduled_scenes,
            days_affected_by_page_changes,
            moved_scheduled_scenes,
            has_impact,
            summary,
        }
    }
}

/// Computes [`ImpactSummary`] values. Never mutates anything.
pub struct ImpactSummarizer;

impl ImpactSummarizer {
    pub fn summarize(diff: &DiffResult) -> ImpactSummary {
        let removed = diff.removed().filter(|scene| scene.is_scheduled()).count();
        let page_changes = diff
            .modified()
            .filter(|(existing, _, changes)| existing.is_scheduled() && changes.page_eighths_changed)
            .count();
        let moved = diff
            .moved()
            .filter(|(scene, _, _)| scene.is_scheduled())
            .count();

        ImpactSummary::new(removed, page_changes, moved)
    }
}
