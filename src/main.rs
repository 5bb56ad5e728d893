use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use bannergen::config::{self as cfg, BannerConfig};
use bannergen::generator;
use bannergen::output::{self, ArtifactKind};
use bannergen::runtime::Scenario;
use bannergen::watch::ConfigWatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ArtifactArg {
    All,
    Html,
    Css,
    Js,
    Init,
}

impl ArtifactArg {
    fn kinds(self) -> Vec<ArtifactKind> {
        match self {
            Self::All => ArtifactKind::ALL.to_vec(),
            Self::Html => vec![ArtifactKind::Html],
            Self::Css => vec![ArtifactKind::Css],
            Self::Js => vec![ArtifactKind::Js],
            Self::Init => vec![ArtifactKind::ConsentInit],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SimulateArg {
    Accept,
    Reject,
    Preferences,
    Dismiss,
    Returning,
}

impl From<SimulateArg> for Scenario {
    fn from(arg: SimulateArg) -> Self {
        match arg {
            SimulateArg::Accept => Scenario::Accept,
            SimulateArg::Reject => Scenario::Reject,
            SimulateArg::Preferences => Scenario::Preferences,
            SimulateArg::Dismiss => Scenario::Dismiss,
            SimulateArg::Returning => Scenario::Returning,
        }
    }
}

/// bannergen CLI
#[derive(Debug, Parser)]
#[command(
    name = bannergen::PKG_NAME,
    version = bannergen::PKG_VERSION,
    about = "Generate an embeddable cookie-consent banner (HTML, CSS, JS) from a JSON configuration"
)]
struct Args {
    /// Path to the JSON banner configuration
    #[arg(short = 'c', long = "config", default_value = "banner.json")]
    config: PathBuf,

    /// Which artifact(s) to produce
    #[arg(short = 'a', long = "artifact", value_enum, default_value_t = ArtifactArg::All)]
    artifact: ArtifactArg,

    /// Write artifacts into this directory instead of printing them
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,

    /// Also write a standalone preview.html (requires --out-dir)
    #[arg(long = "preview", requires = "out_dir")]
    preview: bool,

    /// Log what would be written without touching the filesystem
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Keep running and regenerate whenever the config file changes (requires --out-dir)
    #[arg(long = "watch", requires = "out_dir")]
    watch: bool,

    /// Run the consent runtime model through a visitor journey and print its trace as JSON
    #[arg(long = "simulate", value_enum, conflicts_with = "watch")]
    simulate: Option<SimulateArg>,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the configuration and exit
    #[arg(long = "print-schema")]
    print_schema: bool,
}

/// Generate and emit the selected artifacts for one config revision.
async fn emit(config: &BannerConfig, args: &Args) -> anyhow::Result<()> {
    let artifacts = generator::generate_all(config);
    let kinds = args.artifact.kinds();

    match &args.out_dir {
        Some(dir) => {
            let preview = args
                .preview
                .then(|| generator::generate_preview_page(config, &artifacts));
            let files = output::plan_outputs(dir, &artifacts, &kinds, preview);
            output::write_outputs(&files, args.dry_run).await?;
        }
        None => {
            let text = output::render_for_stdout(&artifacts, &kinds);
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

async fn watch_loop(path: &Path, args: &Args) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<BannerConfig>(8);
    let handle = ConfigWatcher::new(path, None).start(tx);

    tokio::select! {
        _ = async {
            while let Some(config) = rx.recv().await {
                if let Err(err) = emit(&config, args).await {
                    error!(error = format!("{err:#}"), "Failed to regenerate banner");
                }
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    handle.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    bannergen::init_tracing(args.log_level.as_deref());
    info!(
        version = bannergen::PKG_VERSION,
        config = %args.config.display(),
        dry_run = args.dry_run,
        "Starting bannergen"
    );

    if args.print_schema {
        let schema = cfg::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    // Load configuration
    let config = cfg::load_from_path_async(&args.config).await?;
    debug!(target: "bannergen", "Configuration loaded successfully");

    if let Some(scenario) = args.simulate {
        let report = Scenario::from(scenario).run(&config);
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize simulation report")?;
        println!("{json}");
        return Ok(());
    }

    emit(&config, &args).await?;

    if args.watch {
        watch_loop(&args.config, &args).await?;
    }

    info!("bannergen exited");
    Ok(())
}
