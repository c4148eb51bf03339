//! File and report support for spring-solver.
//!
//! This crate provides:
//! - **Model files**: versioned JSON documents describing nodes, elements,
//!   supports and loads, with optional stiffness-from-section resolution
//! - **Reports**: plain-text result tables in engineering notation and a
//!   serialisable results document for machine consumers

pub mod error;
pub mod model;
pub mod report;

pub use error::{IoError, Result};
pub use model::{
    ElementRecord, ModelFile, SCHEMA_VERSION, load_model, parse_model, preset_file,
    save_model,
};
pub use report::{
    NodeValue, ResultsDocument, format_engineering, format_engineering_string, format_multiplier,
    save_results, write_construction_steps, write_report,
};
