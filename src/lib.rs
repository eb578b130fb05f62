//! Reconciles instructor names across medical curriculum schedule workbooks and
//! totals their lecture hours per term, committee and course.

pub mod aggregator;
pub mod analyzer;
pub mod branches;
pub mod error;
pub mod extractor;
pub mod models;
pub mod reconciler;
pub mod report;
pub mod sheets;
pub mod titles;
