// Visage command line interface
// Procedural face animation: local generation, relay viewing and emote bridging

mod app;
mod backends;
#[cfg(feature = "relay")]
mod bridge;
mod input;
mod watcher;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use visage_anim::LocalPipeline;
use visage_core::{FaceStyle, VisageConfig};
use visage_relay::{FrameReceiver, Shutdown, ShutdownTrigger};

use app::{Clock, LocalDriver, PoseDriver, RelayDriver};
use watcher::TextWatcher;

#[derive(Parser, Debug)]
#[command(name = "visage")]
#[command(about = "Procedural 2D face animation driven by text, commands or mocap frames", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON or TOML)
    #[arg(long, short, global = true)]
    config: Option<String>,

    /// Rendering backend (headless, jsonl)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[arg(long, global = true)]
    width: Option<u32>,

    #[arg(long, global = true)]
    height: Option<u32>,

    /// Style file, or `another_world` for the built-in preset
    #[arg(long, global = true)]
    style: Option<String>,

    /// Stop after this many frames
    #[arg(long, global = true)]
    frames: Option<u64>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the face locally from text and expression commands
    Local {
        /// Tail this file and feed appended text to the sentiment estimator
        #[arg(long)]
        watch: Option<String>,

        /// Read JSON expression commands from stdin
        #[arg(long)]
        commands: bool,
    },

    /// Draw frames received from a relay server or stdin
    Relay {
        /// Relay WebSocket URL (ws:// or wss://)
        #[arg(long)]
        url: Option<String>,

        /// Also read line-delimited frames from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Map an emote-vector WebSocket to mocap frames on a relay
    Bridge {
        /// Emote source URL
        #[arg(long = "in")]
        in_url: String,

        /// Relay URL to publish to
        #[arg(long = "out", default_value = "ws://localhost:3000")]
        out_url: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<VisageConfig> {
    let mut config = match cli.config {
        Some(ref path) => VisageConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => VisageConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());

    if let Some(ref backend) = cli.backend {
        config.render.backend = backend.clone();
    }
    if let Some(width) = cli.width {
        config.render.width = width;
    }
    if let Some(height) = cli.height {
        config.render.height = height;
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

fn load_style(cli: &Cli, config: &VisageConfig) -> anyhow::Result<FaceStyle> {
    let path = cli.style.as_ref().or(config.render.style_path.as_ref());
    let style = match path.map(String::as_str) {
        None => FaceStyle::default(),
        Some("another_world") => FaceStyle::another_world(),
        Some(path) => FaceStyle::from_file(path).with_context(|| format!("Failed to load style {}", path))?,
    };
    style.validate()?;
    Ok(style)
}

/// Logs go to stderr so the jsonl backend owns stdout
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn watch_ctrl_c(trigger: Arc<ShutdownTrigger>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            trigger.stop();
        }
    });
}

/// Run the render loop on a blocking thread until it ends, then stop
/// everything else.
async fn render(
    config: &VisageConfig,
    style: FaceStyle,
    frame_limit: Option<u64>,
    driver: Box<dyn PoseDriver>,
    clock: Clock,
    trigger: &ShutdownTrigger,
) -> anyhow::Result<u64> {
    let mut renderer = backends::builtin_registry(frame_limit).create(&config.render.backend)?;
    let render_config = config.render.clone();
    let shutdown = trigger.subscribe();
    let mut driver = driver;

    let frames = tokio::task::spawn_blocking(move || {
        app::run_tick_loop(renderer.as_mut(), driver.as_mut(), &style, &render_config, clock, &shutdown)
    })
    .await
    .context("Render loop panicked")??;

    trigger.stop();
    Ok(frames)
}

async fn run_local(
    config: &VisageConfig,
    style: FaceStyle,
    frame_limit: Option<u64>,
    watch: Option<String>,
    commands: bool,
    trigger: &ShutdownTrigger,
) -> anyhow::Result<u64> {
    let clock = Clock::new();

    let command_rx = if commands {
        let (tx, rx) = mpsc::unbounded_channel();
        input::spawn_stdin(tx, trigger.subscribe(), config.relay.poll_interval());
        Some(rx)
    } else {
        None
    };

    let mut watcher_thread = None;
    let text_rx = match watch {
        Some(path) => {
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = TextWatcher::new(&path)
                .spawn(tx, clock, trigger.subscribe())
                .context("Failed to start text watcher")?;
            watcher_thread = Some(handle);
            Some(rx)
        }
        None => None,
    };

    let driver = LocalDriver::new(LocalPipeline::new(&config.anim), command_rx, text_rx);
    let frames = render(config, style, frame_limit, Box::new(driver), clock, trigger).await?;

    if let Some(handle) = watcher_thread {
        if handle.join().is_err() {
            warn!("Text watcher panicked");
        }
    }
    Ok(frames)
}

async fn run_relay(
    config: &VisageConfig,
    style: FaceStyle,
    frame_limit: Option<u64>,
    url: Option<String>,
    stdin: bool,
    trigger: &ShutdownTrigger,
) -> anyhow::Result<u64> {
    let receiver = Arc::new(FrameReceiver::new(config.relay.clone()));
    let url = url.or_else(|| config.relay.url.clone());

    if let Some(ref url) = url {
        receiver.start_relay(url)?;
    }
    if stdin || url.is_none() {
        receiver.start_stdin();
    }

    let driver = RelayDriver::new(receiver.clone());
    let result = render(config, style, frame_limit, Box::new(driver), Clock::new(), trigger).await;

    receiver.stop();
    receiver.join().await;
    result
}

#[cfg(feature = "relay")]
async fn run_bridge(config: &VisageConfig, in_url: &str, out_url: &str, shutdown: Shutdown) -> anyhow::Result<()> {
    bridge::run(in_url, out_url, config.relay.clone(), shutdown).await
}

#[cfg(not(feature = "relay"))]
async fn run_bridge(_config: &VisageConfig, _in_url: &str, _out_url: &str, _shutdown: Shutdown) -> anyhow::Result<()> {
    anyhow::bail!("Emote bridge not enabled. Enable 'relay' feature.")
}

async fn run(cli: Cli, config: VisageConfig) -> anyhow::Result<()> {
    let (trigger, _shutdown) = visage_relay::shutdown::channel();
    let trigger = Arc::new(trigger);
    watch_ctrl_c(trigger.clone());

    let frame_limit = cli.frames;
    let style = load_style(&cli, &config)?;

    match cli.command {
        Commands::Local { watch, commands } => {
            let frames = run_local(&config, style, frame_limit, watch, commands, &trigger).await?;
            info!("Rendered {} frames", frames);
        }
        Commands::Relay { url, stdin } => {
            let frames = run_relay(&config, style, frame_limit, url, stdin, &trigger).await?;
            info!("Rendered {} frames", frames);
        }
        Commands::Bridge { in_url, out_url } => {
            run_bridge(&config, &in_url, &out_url, trigger.subscribe()).await?;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    let result = runtime.block_on(run(cli, config));
    // Pending stdin reads park a blocking thread that never returns on its own
    runtime.shutdown_timeout(Duration::from_millis(250));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_local() {
        let cli = Cli::try_parse_from([
            "visage", "local", "--watch", "talk.txt", "--commands", "--backend", "jsonl", "--frames", "10",
        ])
        .unwrap();
        assert_eq!(cli.backend.as_deref(), Some("jsonl"));
        assert_eq!(cli.frames, Some(10));
        match cli.command {
            Commands::Local { watch, commands } => {
                assert_eq!(watch.as_deref(), Some("talk.txt"));
                assert!(commands);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_bridge_defaults_out() {
        let cli = Cli::try_parse_from(["visage", "bridge", "--in", "ws://localhost:7777"]).unwrap();
        match cli.command {
            Commands::Bridge { in_url, out_url } => {
                assert_eq!(in_url, "ws://localhost:7777");
                assert_eq!(out_url, "ws://localhost:3000");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bridge_requires_input() {
        assert!(Cli::try_parse_from(["visage", "bridge"]).is_err());
        assert!(Cli::try_parse_from(["visage"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nwidth = 1024\nbackend = \"jsonl\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["visage", "relay", "--config", &path, "--height", "300", "-v"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.render.width, 1024);
        assert_eq!(config.render.height, 300);
        assert_eq!(config.render.backend, "jsonl");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_flags_fail_validation() {
        let cli = Cli::try_parse_from(["visage", "local", "--width", "0"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_style_preset() {
        let cli = Cli::try_parse_from(["visage", "local", "--style", "another_world"]).unwrap();
        let style = load_style(&cli, &VisageConfig::default()).unwrap();
        assert_eq!(style, FaceStyle::another_world());
    }
}
