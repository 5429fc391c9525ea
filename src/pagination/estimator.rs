//! Page-length estimation from structured screenplay paragraphs.
//!
//! Estimates are advisory. They seed `page_eighths` when a scene is first
//! imported and are only written over a stored value by the explicit bulk
//! recalculation in the schedule manager.

use serde::{Deserialize, Serialize};

use crate::schedule::model::{ParagraphKind, TypedParagraph};

/// Layout constants for the estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Characters that fit on one printed line
    pub chars_per_line: u32,
    /// Lines on a standard single page
    pub lines_per_page: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            chars_per_line: 60,
            lines_per_page: 55,
        }
    }
}

/// Derives a scene's length in eighths of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLengthEstimator {
    config: EstimatorConfig,
}

impl PageLengthEstimator {
    /// Creates an estimator with standard page layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an estimator with custom layout constants.
    pub fn with_config(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates the length of a scene in eighths. Never returns 0.
    pub fn estimate(&self, paragraphs: &[TypedParagraph]) -> u32 {
        if paragraphs.is_empty() {
            return 1;
        }

        let total_lines: u64 = paragraphs.iter().map(|p| self.lines_for(p)).sum();
        let lines_per_page = u64::from(self.config.lines_per_page.max(1));

        // round(total_lines * 8 / lines_per_page), half rounds up
        let eighths = (total_lines * 16 + lines_per_page) / (2 * lines_per_page);
        u32::try_from(eighths).unwrap_or(u32::MAX).max(1)
    }

    /// Printed lines for one paragraph, including spacing.
    fn lines_for(&self, paragraph: &TypedParagraph) -> u64 {
        let chars = paragraph.text.chars().count() as u64;
        let per_line = u64::from(self.config.chars_per_line.max(1));
        let text_lines = chars.div_ceil(per_line).max(1);
        text_lines + spacing_lines(paragraph.kind)
    }
}

/// Blank lines a paragraph type adds around its text.
fn spacing_lines(kind: ParagraphKind) -> u64 {
    match kind {
        ParagraphKind::SceneHeading => 2,
        ParagraphKind::Character => 1,
        ParagraphKind::Dialogue | ParagraphKind::Parenthetical => 0,
        ParagraphKind::Action
        | ParagraphKind::Transition
        | ParagraphKind::Shot
        | ParagraphKind::General => 1,
    }
}
