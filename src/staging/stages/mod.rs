//! The pipeline stages, in execution order.
//!
//! - [`version_patch`] - settings rewrite before the build
//! - [`build`] - headless build of the raw package
//! - [`rename`] - canonical renaming inside `origin`
//! - [`align`] - zipalign from `origin` into `app`
//! - [`sign`] - per-key signing into key directories
//! - [`archive`] - optional zip of the signed outputs
//! - [`upload`] - object storage, registry manifest, link list

pub mod align;
pub mod archive;
pub mod build;
pub mod rename;
pub mod sign;
pub mod upload;
pub mod version_patch;
