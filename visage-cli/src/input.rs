// Expression commands from a line stream (stdin in practice)

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use visage_anim::ExpressionCommand;
use visage_relay::Shutdown;

/// Parse one command line; blank and malformed lines are skipped
pub fn parse_command(line: &str) -> Option<ExpressionCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match ExpressionCommand::from_json(line) {
        Ok(command) => Some(command),
        Err(e) => {
            debug!("Ignoring command line: {}", e);
            None
        }
    }
}

/// Forward commands read from `reader` until EOF, shutdown, or the loop
/// dropping its receiver.
pub async fn read_commands<R>(
    reader: R,
    tx: UnboundedSender<ExpressionCommand>,
    shutdown: Shutdown,
    poll_interval: Duration,
) where
    R: AsyncRead + Unpin + Send,
{
    let mut lines = BufReader::new(reader).lines();

    while !shutdown.is_stopped() {
        match tokio::time::timeout(poll_interval, lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(command) = parse_command(&line) {
                    debug!("Command: {} @ {}", command.expression, command.intensity);
                    if tx.send(command).is_err() {
                        break;
                    }
                }
            }
            Ok(Ok(None)) => {
                info!("Command stream closed");
                break;
            }
            Ok(Err(e)) => {
                warn!("Command stream error: {}", e);
                break;
            }
            Err(_) => continue,
        }
    }
}

/// Read commands from stdin on the current runtime
pub fn spawn_stdin(
    tx: UnboundedSender<ExpressionCommand>,
    shutdown: Shutdown,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(read_commands(tokio::io::stdin(), tx, shutdown, poll_interval))
}
