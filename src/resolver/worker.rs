//! Tier 1: the out-of-process browser-automation extraction agent.
//!
//! The agent is launched once per request as
//! `<program> <args...> <catalog_id> <movie|tv> [season] [episode]`.
//! It prints one JSON object on stdout and free-form diagnostics on stderr.

use super::tier::{is_usable_stream_url, ExtractionTier, TierError};
use crate::config::WorkerConfig;
use crate::relay::ManifestCache;
use hlsrelay_common::{ContentKind, ExtractionResult, StreamRequest, StreamType, SubtitleTrack};
use hlsrelay_media::hls::{manifest_base_url, origin_of};
use hlsrelay_media::RelayUrls;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Default hard limit for one extraction.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Output captured from one worker run.
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// A bounded-time invocation of the extraction agent.
///
/// The child is spawned with kill-on-drop and, on unix, as the leader of its
/// own process group. Once the agent exits or the timeout fires, the whole
/// group is killed, so a browser the agent launched cannot outlive it.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Run the agent to completion or until the timeout.
    ///
    /// Spawn failures and timeouts are [`TierError::Unavailable`]; a non-zero
    /// exit is [`TierError::Failed`].
    pub async fn execute(&self) -> Result<WorkerOutput, TierError> {
        let program_name = self.program.to_string_lossy().to_string();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| TierError::unavailable(format!("failed to spawn {program_name}: {e}")))?;

        #[cfg(unix)]
        let group = child.id().map(ProcessGroup);

        // Pipes are drained concurrently so a chatty agent cannot fill them
        // and stall before exiting.
        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(TierError::failed(format!(
                    "I/O error waiting for {program_name}: {e}"
                )))
            }
            Err(_elapsed) => {
                return Err(TierError::unavailable(format!(
                    "{program_name} timed out after {:?}",
                    self.timeout
                )))
            }
        };

        // Leftover descendants hold the pipes open; killing them ends the reads.
        #[cfg(unix)]
        drop(group);

        let output = WorkerOutput {
            status,
            stdout: stdout.await.unwrap_or_default(),
            stderr: stderr.await.unwrap_or_default(),
        };

        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "hlsrelay::worker", "{}", line);
        }

        if !output.status.success() {
            let detail = parse_response(&output.stdout)
                .ok()
                .and_then(|r| r.error)
                .or_else(|| output.stderr.lines().last().map(str::to_string))
                .unwrap_or_default();
            return Err(TierError::failed(format!(
                "{program_name} exited with {}: {}",
                output.status,
                detail.trim()
            )));
        }

        Ok(output)
    }
}

/// What the agent prints on stdout.
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!("Worker pipe read failed: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// The agent's process group, killed on drop.
#[cfg(unix)]
struct ProcessGroup(u32);

#[cfg(unix)]
impl Drop for ProcessGroup {
    fn drop(&mut self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(self.0 as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => tracing::warn!(pgid = self.0, "Failed to kill worker process group: {}", e),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub hls_url: Option<String>,
    #[serde(default)]
    pub hls_content: Option<String>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parse the agent's stdout.
///
/// The whole output is tried first; failing that, the last line holding a
/// JSON object wins.
pub fn parse_response(stdout: &str) -> Result<WorkerResponse, TierError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(TierError::failed("worker produced no output"));
    }

    if let Ok(response) = serde_json::from_str::<WorkerResponse>(trimmed) {
        return Ok(response);
    }

    trimmed
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str::<WorkerResponse>(line).ok())
        .ok_or_else(|| TierError::failed("worker output is not a JSON object"))
}

/// Fill in a missing subtitle format from the URL extension.
fn normalize_subtitle(mut track: SubtitleTrack) -> SubtitleTrack {
    if track.format.is_empty() {
        let path = track.url.split(['?', '#']).next().unwrap_or_default();
        let lower = path.to_ascii_lowercase();
        track.format = if lower.ends_with(".srt") {
            "srt".to_string()
        } else {
            "vtt".to_string()
        };
    }
    if track.language.is_empty() {
        track.language = "unknown".to_string();
    }
    track
}

/// Tier 1: runs the local extraction agent behind the single-flight gate.
pub struct WorkerTier {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
    manifests: ManifestCache,
    urls: RelayUrls,
}

impl WorkerTier {
    pub fn new(config: &WorkerConfig, manifests: ManifestCache, urls: RelayUrls) -> Self {
        Self {
            program: config.program.clone(),
            base_args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            manifests,
            urls,
        }
    }

    fn command_for(&self, request: &StreamRequest) -> WorkerCommand {
        let mut cmd = WorkerCommand::new(&self.program);
        cmd.args(self.base_args.iter().cloned())
            .arg(request.catalog_id.to_string())
            .arg(request.kind.provider_name())
            .timeout(self.timeout);

        if request.kind == ContentKind::Series {
            cmd.arg(request.season.unwrap_or(1).to_string())
                .arg(request.episode.unwrap_or(1).to_string());
        }
        cmd
    }

    /// Turn a parsed agent response into a relay-backed result.
    fn build_result(
        &self,
        request: &StreamRequest,
        response: WorkerResponse,
    ) -> Result<ExtractionResult, TierError> {
        if !response.success {
            return Err(TierError::failed(
                response
                    .error
                    .unwrap_or_else(|| "worker reported failure".to_string()),
            ));
        }

        let hls_url = response
            .hls_url
            .map(|u| u.trim().to_string())
            .filter(|u| is_usable_stream_url(u))
            .ok_or_else(|| TierError::no_stream("worker returned no manifest URL"))?;

        let referer = response
            .referer
            .filter(|r| !r.trim().is_empty())
            .or_else(|| origin_of(&hls_url))
            .unwrap_or_default();

        let proxy_url = match response.hls_content.filter(|c| !c.trim().is_empty()) {
            Some(body) => {
                let key = request.cache_key();
                self.manifests
                    .insert(key.clone(), body, referer.clone(), manifest_base_url(&hls_url));
                self.urls.manifest_url(&key)
            }
            None => self.urls.proxy_url(&hls_url, &referer),
        };

        Ok(ExtractionResult {
            stream_type: StreamType::Direct,
            proxy_url,
            source: "worker".to_string(),
            subtitles: response
                .subtitles
                .into_iter()
                .filter(|s| !s.url.trim().is_empty())
                .map(normalize_subtitle)
                .collect(),
            original_url: hls_url,
            referer,
        })
    }
}

#[async_trait::async_trait]
impl ExtractionTier for WorkerTier {
    fn name(&self) -> &str {
        "worker"
    }

    fn single_flight(&self) -> bool {
        true
    }

    async fn extract(&self, request: &StreamRequest) -> Result<ExtractionResult, TierError> {
        let start = Instant::now();
        let output = self.command_for(request).execute().await?;
        tracing::debug!(
            key = %request.cache_key(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Worker finished"
        );

        let response = parse_response(&output.stdout)?;
        self.build_result(request, response)
    }
}
