use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use replaycast::{Renderer, RenderSession, Replay, Settings, Target};

#[derive(Parser, Debug)]
#[command(name = "replaycast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play back a replay and capture segments as webm files (requires
    /// `ffmpeg` on PATH and a Chromium install).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input replay document (.ttrm JSON).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Segment to capture as `round:start:end` (frame numbers). Repeatable.
    #[arg(long = "target", required = true)]
    targets: Vec<Target>,

    /// Session token; falls back to the TETRIO_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,

    /// Output directory; overrides STORAGE_FOLDER.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("replaycast=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
    }
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let token = match args.token {
        Some(token) => token,
        None => std::env::var("TETRIO_TOKEN")
            .context("no --token given and TETRIO_TOKEN is not set")?,
    };

    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read replay '{}'", args.in_path.display()))?;
    let replay = Replay::from_slice(&bytes)?;

    let mut settings = Settings::from_env();
    if let Some(dir) = args.out_dir {
        settings.storage_dir = dir;
    }

    let renderer = Renderer::new(settings).await?;
    let session = RenderSession::new(token);
    let outcomes = renderer.render(&session, &replay, &args.targets).await?;
    renderer.terminate().await?;

    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(name) => println!("{name}"),
            Err(err) => {
                failed += 1;
                eprintln!(
                    "target {}:{}:{} failed: {err}",
                    outcome.target.round, outcome.target.start, outcome.target.end
                );
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} targets failed", outcomes.len());
    }
    Ok(())
}
