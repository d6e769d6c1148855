//! Release staging for Unity Android builds.
//!
//! This library drives one build from the Unity project to registered
//! release artifacts:
//! - patch the project settings and run the editor in batch mode
//! - rename, zipalign and sign the produced packages
//! - upload everything to object storage and register the build
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod staging;

// Re-export commonly used types
pub use error::{CliError, Result, StagerError};
