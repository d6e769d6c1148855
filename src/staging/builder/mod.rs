//! Run orchestration and coordination.
//!
//! This module provides the [`Stager`] orchestrator that drives a build
//! through every stage.
//!
//! # Module Organization
//!
//! - [`checksum`] - artifact digests (MD5 or SHA-256)
//! - [`orchestrator`] - the [`Stager`] and its [`PipelineReport`]
//! - [`tool_detection`] - external tool availability checking

pub mod checksum;
mod orchestrator;
pub mod tool_detection;

pub use orchestrator::{PipelineReport, Stager};
