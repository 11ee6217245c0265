//! Container runtime abstraction
//!
//! Provides a trait for the container operations podpatch needs. The
//! classifier and the update flow only ever talk to this trait.

use crate::error::PodpatchResult;
use async_trait::async_trait;

/// Abstract container runtime interface
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Check if the runtime is available on this system
    async fn is_available(&self) -> bool;

    /// Run `command` in a throwaway container built from `image` and
    /// report whether it exited successfully. Used for probing; a
    /// failing command is an answer, not an error.
    async fn check_command(&self, image: &str, command: &str) -> bool;

    /// Resolve an image reference (name, name:tag or ID) to the
    /// canonical image ID.
    async fn image_id(&self, reference: &str) -> PodpatchResult<String>;

    /// Check whether an image exists locally
    async fn image_exists(&self, reference: &str) -> PodpatchResult<bool>;

    /// Run `command` in a container built from `image`, streaming its
    /// output to the terminal, and return the exit code.
    async fn run_streaming(&self, image: &str, command: &str) -> PodpatchResult<i32>;

    /// Run `command` in a container built from `image` and commit the
    /// result as `repo:tag`. Returns the new image ID. The container is
    /// removed on every path.
    async fn run_and_commit(
        &self,
        image: &str,
        command: &str,
        repo: &str,
        tag: &str,
        comment: &str,
        author: &str,
    ) -> PodpatchResult<String>;

    /// Get the human-readable runtime name for display
    fn runtime_name(&self) -> &'static str;
}
