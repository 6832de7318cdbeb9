use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::ClassifierConfig;
use crate::error::{RelayError, RelayResult};

/// Buffered stdout/stderr of one finished external process run. Lives only
/// for the duration of the request that spawned it.
#[derive(Debug)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Handle on the external classification executables. Built once at startup
/// from config and shared across workers.
#[derive(Debug, Clone)]
pub struct Classifier {
    predict_bin: String,
    heatmap_bin: String,
    timeout: Duration,
}

impl Classifier {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            predict_bin: config.predict_bin.clone(),
            heatmap_bin: config.heatmap_bin.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run the classifier over a stored image and normalize its stdout.
    pub async fn classify(&self, image: &Path) -> RelayResult<Value> {
        let output = self.invoke(&self.predict_bin, &[image.as_os_str()]).await?;
        Ok(normalize_output(&output.stdout))
    }

    /// Run the heatmap renderer. On `Ok` the overlay is guaranteed to exist
    /// at `output_path`.
    pub async fn render_heatmap(&self, image: &Path, output_path: &Path) -> RelayResult<()> {
        self.invoke(
            &self.heatmap_bin,
            &[image.as_os_str(), output_path.as_os_str()],
        )
        .await?;

        if !output_path.exists() {
            return Err(RelayError::MissingHeatmapOutput);
        }
        Ok(())
    }

    /// Spawn `program` with `args`, draining stdout and stderr concurrently
    /// while waiting for exit. The whole run is bounded by the configured
    /// deadline; on expiry the child is killed and reaped.
    async fn invoke(&self, program: &str, args: &[&OsStr]) -> RelayResult<CapturedOutput> {
        log::debug!("spawning {} {:?}", program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RelayError::ProcessStart(e.to_string()))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelayError::InternalError("child stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RelayError::InternalError("child stderr not captured".to_string()))?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let capture = async {
            tokio::join!(
                stdout.read_to_end(&mut stdout_buf),
                stderr.read_to_end(&mut stderr_buf),
                child.wait(),
            )
        };

        let status = match timeout(self.timeout, capture).await {
            Ok((out_res, err_res, status_res)) => {
                out_res.map_err(|e| {
                    RelayError::InternalError(format!("could not read process stdout: {}", e))
                })?;
                err_res.map_err(|e| {
                    RelayError::InternalError(format!("could not read process stderr: {}", e))
                })?;
                status_res.map_err(|e| {
                    RelayError::InternalError(format!("could not wait on process: {}", e))
                })?
            }
            Err(_) => {
                log::warn!(
                    "{} exceeded {}s deadline, killing",
                    program,
                    self.timeout.as_secs()
                );
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(RelayError::ProcessTimeout(self.timeout.as_secs()));
            }
        };

        if !status.success() {
            let details = String::from_utf8_lossy(&stderr_buf).trim().to_string();
            log::error!("{} exited with {}: {}", program, status, details);
            return Err(RelayError::ProcessFailed { details });
        }

        Ok(CapturedOutput {
            stdout: stdout_buf,
            stderr: stderr_buf,
        })
    }
}

/// JSON if the process printed JSON, otherwise the trimmed text under a
/// `raw` key. Output-format drift is never a hard failure.
pub fn normalize_output(stdout: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => json!({ "raw": trimmed }),
    }
}
