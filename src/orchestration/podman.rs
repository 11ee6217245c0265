//! Podman container runtime
//!
//! Implements the ContainerRuntime trait by shelling out to podman.
//! Works with rootless podman; no daemon or socket is required.

use crate::error::{PodpatchError, PodpatchResult};
use crate::orchestration::runtime::ContainerRuntime;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

/// Container runtime backed by the podman CLI
pub struct PodmanRuntime {
    binary: String,
    extra_hosts: Vec<String>,
}

impl PodmanRuntime {
    /// Create a runtime using the given podman binary and extra
    /// `--add-host` entries for spawned containers.
    pub fn new(binary: String, extra_hosts: Vec<String>) -> Self {
        Self {
            binary,
            extra_hosts,
        }
    }

    /// Execute a podman command and capture its output
    async fn exec(&self, args: &[&str]) -> PodpatchResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.binary, args);

        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PodpatchError::command_failed(format!("{} {:?}", self.binary, args), e))
    }

    /// Execute a podman command with stdout/stderr attached to ours
    async fn exec_streaming(&self, args: &[&str]) -> PodpatchResult<i32> {
        debug!("Executing interactively: {} {:?}", self.binary, args);

        let status = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| PodpatchError::command_failed(format!("{} {:?}", self.binary, args), e))?;

        Ok(status.code().unwrap_or(-1))
    }

    /// Assemble `podman run` arguments up to the image name.
    fn run_args<'a>(&'a self, name: &'a str, rm: bool) -> Vec<&'a str> {
        let mut args = vec!["run", "--name", name];
        if rm {
            args.push("--rm");
        }
        for host in &self.extra_hosts {
            args.push("--add-host");
            args.push(host);
        }
        args
    }

    /// Remove a container, logging instead of failing. Cleanup of
    /// throwaway containers must never mask the original error.
    async fn remove_container(&self, name: &str) {
        match self.exec(&["rm", "-f", name]).await {
            Ok(output) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("could not remove container {}: {}", name, stderr.trim());
            }
            Err(e) => warn!("could not remove container {}: {}", name, e),
            _ => {}
        }
    }

    fn container_name() -> String {
        format!("podpatch-{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl ContainerRuntime for PodmanRuntime {
    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn check_command(&self, image: &str, command: &str) -> bool {
        let name = Self::container_name();
        let mut args = self.run_args(&name, true);
        args.extend(["--entrypoint", "/bin/sh", image, "-c", command]);

        match self.exec(&args).await {
            Ok(output) => {
                debug!(
                    "probe `{}` in {} exited with {:?}",
                    command,
                    image,
                    output.status.code()
                );
                output.status.success()
            }
            Err(e) => {
                warn!("probe `{}` in {} could not run: {}", command, image, e);
                false
            }
        }
    }

    async fn image_id(&self, reference: &str) -> PodpatchResult<String> {
        let output = self
            .exec(&["image", "inspect", "--format", "{{.Id}}", reference])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PodpatchError::ImageLookup {
                image: reference.to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(PodpatchError::ImageLookup {
                image: reference.to_string(),
                reason: "empty inspect output".to_string(),
            });
        }
        Ok(id)
    }

    async fn image_exists(&self, reference: &str) -> PodpatchResult<bool> {
        let output = self.exec(&["image", "exists", reference]).await?;
        Ok(output.status.success())
    }

    async fn run_streaming(&self, image: &str, command: &str) -> PodpatchResult<i32> {
        let name = Self::container_name();
        let mut args = self.run_args(&name, true);
        args.extend(["--entrypoint", "/bin/sh", image, "-c", command]);
        self.exec_streaming(&args).await
    }

    async fn run_and_commit(
        &self,
        image: &str,
        command: &str,
        repo: &str,
        tag: &str,
        comment: &str,
        author: &str,
    ) -> PodpatchResult<String> {
        let name = Self::container_name();
        let mut args = self.run_args(&name, false);
        args.extend(["--entrypoint", "/bin/sh", image, "-c", command]);

        let code = self.exec_streaming(&args).await?;
        if code != 0 {
            self.remove_container(&name).await;
            return Err(PodpatchError::ContainerCommand {
                command: command.to_string(),
                code,
            });
        }

        let target = format!("{}:{}", repo, tag);
        let commit = self
            .exec(&[
                "commit", "--message", comment, "--author", author, &name, &target,
            ])
            .await;
        self.remove_container(&name).await;

        let output = commit?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PodpatchError::Commit {
                container: name,
                reason: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn runtime_name(&self) -> &'static str {
        "Podman"
    }
}
