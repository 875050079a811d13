//! Output generation.
//!
//! - [`json`]: writes the run's [`crate::models::OutputDocument`] to disk
//!
//! # Output Structure
//!
//! ```text
//! translated_news.json   # overwritten on every run
//! ```

pub mod json;
