//! podpatch - patch and update container images
//!
//! Classifies container images by the package manager they ship, runs
//! the matching update command inside a container, and commits the
//! result as a new image. Classifications are memoized in a small cache
//! file shared across invocations.

pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestration;

pub use error::{PodpatchError, PodpatchResult};
