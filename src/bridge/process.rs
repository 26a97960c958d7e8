//! Renderer subprocess driver.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::error::{Result, SpriteError};
use crate::types::{CompositeResult, SpriteBatch};

use super::protocol::{decode_output, OutputBuffer, RenderRequest};
use super::Compositor;

/// Renderer looked up on PATH when nothing else is configured.
pub const DEFAULT_RENDERER: &str = "phantomjs";

/// Environment variable overriding the renderer binary.
pub const RENDERER_ENV: &str = "CSSPRITE_RENDERER";

/// Default bound on one renderer exchange (2 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Conventional shell exit code for "command not found".
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Lets the renderer load local data URLs without a server.
pub const WEB_SECURITY_FLAG: &str = "--web-security=no";

const READ_CHUNK: usize = 16 * 1024;

/// Idle period that ends the drain after the renderer has exited.
const DRAIN_IDLE: Duration = Duration::from_millis(100);

/// Configuration for [`ProcessCompositor`].
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Renderer binary or command name. Falls back to [`RENDERER_ENV`],
    /// then [`DEFAULT_RENDERER`] on PATH.
    pub renderer: Option<PathBuf>,
    /// Compositing script passed before the payload.
    pub script: Option<PathBuf>,
    /// Upper bound on spawn-to-exit.
    pub timeout: Duration,
    /// Leave same-origin checks on (omits [`WEB_SECURITY_FLAG`]).
    pub web_security: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            renderer: None,
            script: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            web_security: false,
        }
    }
}

impl ProcessConfig {
    /// Sets the renderer binary.
    pub fn renderer(mut self, path: impl Into<PathBuf>) -> Self {
        self.renderer = Some(path.into());
        self
    }
}

/// Composites through an external renderer process.
pub struct ProcessCompositor {
    config: ProcessConfig,
}

impl ProcessCompositor {
    pub fn new(config: ProcessConfig) -> Self {
        Self { config }
    }

    /// Locate the renderer binary.
    pub fn resolve_renderer(&self) -> Result<PathBuf> {
        if let Some(ref configured) = self.config.renderer {
            return which::which(configured).map_err(|e| {
                SpriteError::unavailable(format!(
                    "configured renderer {} cannot be used: {}",
                    configured.display(),
                    e
                ))
            });
        }

        if let Some(from_env) = std::env::var_os(RENDERER_ENV) {
            let from_env = PathBuf::from(from_env);
            return which::which(&from_env).map_err(|e| {
                SpriteError::unavailable(format!(
                    "{}={} cannot be used: {}",
                    RENDERER_ENV,
                    from_env.display(),
                    e
                ))
            });
        }

        which::which(DEFAULT_RENDERER).map_err(|_| {
            SpriteError::unavailable(format!("`{}` was not found on PATH", DEFAULT_RENDERER))
        })
    }

    fn command(&self, renderer: &Path, payload: &str) -> Command {
        let mut cmd = Command::new(renderer);
        if !self.config.web_security {
            cmd.arg(WEB_SECURITY_FLAG);
        }
        if let Some(ref script) = self.config.script {
            cmd.arg(script);
        }
        cmd.arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Compositor for ProcessCompositor {
    async fn compose(&self, batch: &SpriteBatch) -> Result<CompositeResult> {
        let renderer = self.resolve_renderer()?;
        let payload = RenderRequest::from_batch(batch).to_json()?;

        log::debug!(
            "spawning renderer {} ({} image(s), {} byte payload)",
            renderer.display(),
            batch.len(),
            payload.len()
        );
        let mut child = self
            .command(&renderer, &payload)
            .spawn()
            .map_err(|e| spawn_error(&renderer, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SpriteError::malformed("renderer stdout was not captured"))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr));
        }

        let timeout = self.config.timeout;
        let exchange = tokio::time::timeout(timeout, read_until_sentinel(&mut child, stdout)).await;
        let (status, output) = match exchange {
            Ok(result) => result?,
            Err(_) => {
                log::debug!("renderer timed out after {:?}, killing it", timeout);
                let _ = child.kill().await;
                return Err(SpriteError::RendererTimeout {
                    secs: timeout.as_secs(),
                });
            }
        };

        if status.code() == Some(EXIT_COMMAND_NOT_FOUND) {
            return Err(SpriteError::unavailable(format!(
                "{} exited with code {} (command not found)",
                renderer.display(),
                EXIT_COMMAND_NOT_FOUND
            )));
        }

        log::debug!("renderer exited ({}), {} byte(s) of output", status, output.len());
        decode_output(output.as_bytes(), batch.len())
    }
}

/// Read stdout until the sentinel or until the renderer exits, then reap it.
///
/// Seeing the sentinel kills the renderer. If the renderer exits first,
/// whatever is already buffered in the pipe is drained without waiting for
/// EOF, since a process it spawned may still hold stdout open. A missing
/// sentinel is reported by the decoder.
async fn read_until_sentinel(
    child: &mut Child,
    mut stdout: ChildStdout,
) -> Result<(ExitStatus, OutputBuffer)> {
    let mut output = OutputBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let step = tokio::select! {
            read = stdout.read(&mut chunk) => Step::Read(read),
            status = child.wait() => Step::Exited(status),
        };

        match step {
            Step::Read(read) => {
                let n = read.map_err(read_error)?;
                if n == 0 {
                    break;
                }
                if output.push(&chunk[..n]) {
                    log::debug!("sentinel received, terminating renderer");
                    // The renderer may already be exiting on its own.
                    if let Err(e) = child.start_kill() {
                        log::debug!("renderer kill failed: {}", e);
                    }
                    break;
                }
            }
            Step::Exited(status) => {
                let status = status.map_err(wait_error)?;
                log::debug!("renderer exited before stdout closed, draining");
                drain(&mut stdout, &mut chunk, &mut output).await?;
                return Ok((status, output));
            }
        }
    }
    drop(stdout);

    let status = child.wait().await.map_err(wait_error)?;
    Ok((status, output))
}

enum Step {
    Read(std::io::Result<usize>),
    Exited(std::io::Result<ExitStatus>),
}

/// Read what is already in the pipe, giving up once it stays idle for
/// [`DRAIN_IDLE`].
async fn drain(stdout: &mut ChildStdout, chunk: &mut [u8], output: &mut OutputBuffer) -> Result<()> {
    while !output.is_complete() {
        match tokio::time::timeout(DRAIN_IDLE, stdout.read(chunk)).await {
            Ok(read) => {
                let n = read.map_err(read_error)?;
                if n == 0 {
                    break;
                }
                output.push(&chunk[..n]);
            }
            Err(_) => break,
        }
    }
    Ok(())
}

fn read_error(e: std::io::Error) -> SpriteError {
    SpriteError::malformed(format!("failed to read renderer output: {}", e))
}

fn wait_error(e: std::io::Error) -> SpriteError {
    SpriteError::malformed(format!("failed to wait for renderer: {}", e))
}

async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            log::debug!("renderer stderr: {}", trimmed);
        }
    }
}

fn spawn_error(renderer: &Path, err: std::io::Error) -> SpriteError {
    match err.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            SpriteError::unavailable(format!("could not launch {}: {}", renderer.display(), err))
        }
        _ => SpriteError::Io {
            path: renderer.to_path_buf(),
            message: format!("Failed to spawn renderer: {}", err),
        },
    }
}
