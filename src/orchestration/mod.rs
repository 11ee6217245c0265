//! Container runtime orchestration
//!
//! Everything that actually touches containers lives here, behind the
//! [`ContainerRuntime`] trait so the classification and update logic
//! can be tested without a container engine.

pub mod podman;
pub mod runtime;

pub use podman::PodmanRuntime;
pub use runtime::ContainerRuntime;

use crate::config::Config;
use crate::error::PodpatchResult;

/// Create the container runtime described by the configuration.
pub fn create_runtime(config: &Config) -> PodpatchResult<Box<dyn ContainerRuntime>> {
    Ok(Box::new(PodmanRuntime::new(
        config.runtime.binary.clone(),
        config.runtime.extra_hosts.clone(),
    )))
}
