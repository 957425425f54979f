use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use ensemble_core::ProcessRegistry;

use crate::config::{ConsoleConfig, SHUTDOWN_GRACE};
use crate::dispatch::Dispatcher;
use crate::error::{io_err, ConsoleError};

/// Why a console session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// SIGINT / SIGTERM.
    Signal,
    /// The input stream closed.
    EndOfInput,
}

/// Run the console on stdin/stdout and block the current thread until it exits.
pub fn start_blocking(
    registry: ProcessRegistry,
    config: &ConsoleConfig,
) -> Result<SessionEnd, ConsoleError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio runtime", e))?;
    let result = runtime.block_on(run(Arc::new(registry), config));
    // A stdin read may still be parked on the blocking pool.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Run the console on the process's stdin/stdout until a signal or EOF.
pub async fn run(
    registry: Arc<ProcessRegistry>,
    config: &ConsoleConfig,
) -> Result<SessionEnd, ConsoleError> {
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    run_session(registry, config, input, output, shutdown_signal()).await
}

/// Read commands from `input` one line at a time, dispatch them in order and
/// write replies to `output`, until `shutdown` resolves or input ends.
///
/// On the way out every running worker is terminated, including when the
/// session fails on an I/O error.
pub async fn run_session<R, W, S>(
    registry: Arc<ProcessRegistry>,
    config: &ConsoleConfig,
    input: R,
    mut output: W,
    shutdown: S,
) -> Result<SessionEnd, ConsoleError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    tracing::info!(workers = registry.len(), "console session started");

    let dispatcher = Dispatcher::new(registry.clone());
    let mut result = command_loop(&dispatcher, config, input, &mut output, shutdown).await;
    if result.is_ok() {
        // Leave the prompt line cleanly.
        if let Err(err) = write_text(&mut output, "\n").await {
            result = Err(err);
        }
    }

    let stopped = tokio::task::spawn_blocking(move || registry.shutdown())
        .await
        .map_err(|err| ConsoleError::Join {
            task: "shutdown",
            message: err.to_string(),
        })?;

    match &result {
        Ok(end) => tracing::info!(reason = ?end, stopped, "console session ended"),
        Err(err) => tracing::error!(error = %err, stopped, "console session failed"),
    }
    result
}

async fn command_loop<R, W, S>(
    dispatcher: &Dispatcher,
    config: &ConsoleConfig,
    mut input: R,
    output: &mut W,
    shutdown: S,
) -> Result<SessionEnd, ConsoleError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut buf = Vec::new();

    loop {
        write_text(output, &config.prompt).await?;

        buf.clear();
        let read = tokio::select! {
            _ = &mut shutdown => return Ok(SessionEnd::Signal),
            read = input.read_until(b'\n', &mut buf) => {
                read.map_err(|e| io_err("console input", e))?
            }
        };
        if read == 0 {
            return Ok(SessionEnd::EndOfInput);
        }

        let reply = match decode_line(&buf) {
            Ok(line) => {
                // Registry calls block for up to the settle window.
                let dispatcher = dispatcher.clone();
                tokio::task::spawn_blocking(move || dispatcher.handle_line(&line))
                    .await
                    .map_err(|err| ConsoleError::Join {
                        task: "dispatch",
                        message: err.to_string(),
                    })?
            }
            Err(reply) => Some(reply),
        };

        if let Some(reply) = reply {
            write_text(output, &reply).await?;
            write_text(output, "\n").await?;
        }
    }
}

/// Strip the line terminator and decode; non-UTF-8 input becomes an
/// operator-facing error naming the line.
fn decode_line(raw: &[u8]) -> Result<String, String> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8(raw.to_vec()).map_err(|err| {
        let lossy = String::from_utf8_lossy(err.as_bytes());
        tracing::debug!(line = %lossy, "rejected non-UTF-8 input line");
        format!("error: input is not valid UTF-8: '{}'", lossy.trim())
    })
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received ctrl-c, shutting down"),
            Err(err) => {
                tracing::warn!(error = %err, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("received SIGTERM, shutting down");
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Install the global tracing subscriber (stderr, `RUST_LOG`, default `info`).
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn write_text<W>(output: &mut W, text: &str) -> Result<(), ConsoleError>
where
    W: AsyncWrite + Unpin,
{
    output
        .write_all(text.as_bytes())
        .await
        .map_err(|e| io_err("console output", e))?;
    output
        .flush()
        .await
        .map_err(|e| io_err("console output", e))
}
