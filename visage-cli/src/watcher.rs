// Tails a text file and forwards appended text to the local pipeline

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use visage_relay::Shutdown;

use crate::app::Clock;

pub const WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// Text appended to the watched file, stamped with the loop clock
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub timestamp: f64,
}

pub struct TextWatcher {
    path: PathBuf,
    pos: u64,
}

impl TextWatcher {
    /// Starts at the current end of the file; earlier content is ignored
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let pos = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self { path, pos }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read whatever was appended since the last poll.
    ///
    /// A file that shrank was truncated or replaced: rewind and report
    /// nothing this round. Missing files and read errors also yield nothing.
    pub fn poll(&mut self) -> Option<String> {
        let len = std::fs::metadata(&self.path).ok()?.len();
        if len < self.pos {
            debug!("{} shrank, rewinding", self.path.display());
            self.pos = 0;
            return None;
        }
        if len == self.pos {
            return None;
        }

        let mut file = File::open(&self.path).ok()?;
        file.seek(SeekFrom::Start(self.pos)).ok()?;
        let mut buf = Vec::with_capacity((len - self.pos) as usize);
        let read = file.take(len - self.pos).read_to_end(&mut buf).ok()?;
        self.pos += read as u64;

        let text = String::from_utf8_lossy(&buf);
        if text.trim().is_empty() {
            return None;
        }
        Some(text.into_owned())
    }

    /// Poll on a background thread until `shutdown` fires or the receiver
    /// goes away.
    pub fn spawn(
        mut self,
        tx: UnboundedSender<TextChunk>,
        clock: Clock,
        shutdown: Shutdown,
    ) -> std::io::Result<JoinHandle<()>> {
        info!("Watching {} for text", self.path.display());
        std::thread::Builder::new()
            .name("text-watcher".to_string())
            .spawn(move || {
                while !shutdown.is_stopped() {
                    if let Some(text) = self.poll() {
                        let chunk = TextChunk {
                            text,
                            timestamp: clock.now(),
                        };
                        if tx.send(chunk).is_err() {
                            break;
                        }
                    }
                    std::thread::sleep(WATCH_INTERVAL);
                }
                debug!("Text watcher exited");
            })
    }
}
