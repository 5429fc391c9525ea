//! Page-length module.
//!
//! - `estimator`: PageLengthEstimator, eighths from typed paragraphs
//! - `aggregate`: DayAggregateRecalculator and eighths display formatting

pub mod aggregate;
pub mod estimator;

pub use aggregate::{format_eighths, DayAggregate, DayAggregateRecalculator};
pub use estimator::{EstimatorConfig, PageLengthEstimator};
