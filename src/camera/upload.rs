//! Image upload over SFTP.
//!
//! Runs the system `sftp` client in batch mode with key authentication. The
//! remote image directory is cleared of old frames before the new ones are
//! put, so it only ever holds the latest set.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::common::constants::IMAGE_FILE_EXTENSION;
use crate::common::utils::{ProcessOutcome, run_with_timeout};
use crate::config::Config;

#[cfg_attr(test, mockall::automock)]
pub trait Uploader {
    fn upload(&self, files: &[PathBuf]) -> Result<()>;
}

pub struct SftpUploader {
    server: String,
    user: String,
    remote_dir: String,
    identity: Option<PathBuf>,
    timeout: Duration,
}

impl SftpUploader {
    /// Uploader for the configured server, or `None` when uploads are off.
    pub fn from_config(config: &Config) -> Option<Self> {
        let (Some(server), Some(user), Some(remote_dir)) = (
            config.sftp_server.as_ref(),
            config.sftp_user.as_ref(),
            config.sftp_remote_dir.as_ref(),
        ) else {
            return None;
        };

        Some(Self {
            server: server.clone(),
            user: user.clone(),
            remote_dir: remote_dir.clone(),
            identity: config.sftp_identity.as_deref().map(expand_home),
            timeout: config.api_timeout() * 3,
        })
    }

    fn batch_script(&self, files: &[PathBuf]) -> String {
        let mut script = format!("cd \"{}\"\n", self.remote_dir);
        // Leading '-' keeps going when there is nothing to remove
        script.push_str(&format!("-rm *.{IMAGE_FILE_EXTENSION}\n"));
        for file in files {
            script.push_str(&format!("put \"{}\"\n", file.display()));
        }
        script.push_str("bye\n");
        script
    }

    fn command(&self) -> Command {
        let mut command = Command::new("sftp");
        command.args(["-b", "-", "-o", "BatchMode=yes"]);
        if let Some(identity) = &self.identity {
            command.arg("-i").arg(identity);
        }
        command.arg(format!("{}@{}", self.user, self.server));
        command
    }
}

impl Uploader for SftpUploader {
    fn upload(&self, files: &[PathBuf]) -> Result<()> {
        log_indented!(
            "Uploading {} image(s) to {}:{}",
            files.len(),
            self.server,
            self.remote_dir
        );

        let script = self.batch_script(files);
        let outcome = run_with_timeout(self.command(), Some(&script), self.timeout)
            .context("Failed to run sftp")?;

        match outcome {
            ProcessOutcome::TimedOut => {
                anyhow::bail!("sftp timed out after {}s", self.timeout.as_secs())
            }
            ProcessOutcome::Finished(output) if !output.status.success() => {
                anyhow::bail!(
                    "sftp exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )
            }
            ProcessOutcome::Finished(_) => Ok(()),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(path).to_path_buf(),
    }
}
