//! # FYP Common Library
//!
//! Shared domain code for the FYP portal:
//! - Document status registry and transition table
//! - Transition evaluator (role, stage, staleness and deadline guards)
//! - Wire models for documents, reviews, grades, deadlines, notifications
//! - Grade aggregation (percentage, letter, GPA, DMC) and dashboard stats
//! - Event types (PortalEvent) and EventBus
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod grading;
pub mod models;
pub mod stats;
pub mod status;
pub mod time;
pub mod transition;

pub use error::{Error, Result};
pub use status::{Action, DocumentStatus, ReviewDecision, ReviewStage, Role};
pub use transition::TransitionError;
