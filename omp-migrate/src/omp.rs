//! Protocol transport through the `omp` command-line client.

use crate::config::ConnectionProfile;
use omp_snapshot::{ProtocolService, SnapshotError};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Runs one `omp -X <request>` per call, blocking until the client exits.
#[derive(Debug, Clone)]
pub struct OmpCommand {
    program: PathBuf,
    profile: Option<ConnectionProfile>,
}

impl OmpCommand {
    pub fn new(program: impl Into<PathBuf>, profile: Option<ConnectionProfile>) -> Self {
        Self {
            program: program.into(),
            profile,
        }
    }

    /// Client arguments for `request`.
    pub fn args(&self, request: &str) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(profile) = &self.profile {
            args.extend([
                "-h".to_string(),
                profile.host.clone(),
                "-p".to_string(),
                profile.port.to_string(),
                "-u".to_string(),
                profile.username.clone(),
                "-w".to_string(),
                profile.password.clone(),
            ]);
        }
        args.push("-X".to_string());
        args.push(request.to_string());
        args
    }
}

impl ProtocolService for OmpCommand {
    fn execute(&mut self, request: &str) -> omp_snapshot::Result<String> {
        debug!(request = %request, "omp request");

        let output = Command::new(&self.program)
            .args(self.args(request))
            .output()
            .map_err(|e| {
                SnapshotError::Service(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SnapshotError::Service(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let response = String::from_utf8(output.stdout)
            .map_err(|_| SnapshotError::Service("response is not valid UTF-8".to_string()))?;
        debug!(bytes = response.len(), "omp response");
        Ok(response)
    }
}
