//! # Skymap CLI (`skymap`)
//!
//! Mirrors a GitHub-hosted chain registry and serves it over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! skymap --config ./config/skymap.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `skymap serve` | Initial refresh, then HTTP server plus periodic refresh |
//! | `skymap sync` | Run one refresh pass and print a summary |
//! | `skymap completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! # Serve on a different address than the config says
//! skymap serve --bind 0.0.0.0:9000 --config ./config/skymap.toml
//!
//! # Check that the registry parses end to end
//! skymap sync --full --config ./config/skymap.toml
//!
//! # Install zsh completions
//! skymap completions zsh > ~/.zfunc/_skymap
//! ```
//!
//! Log verbosity is controlled with `RUST_LOG` (default `skymap=info`).

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skymap::config::{self, Config};
use skymap::coordinator::RefreshOutcome;
use skymap::engine::Engine;
use skymap::{scheduler, server};

/// Skymap: a chain registry mirror.
///
/// All commands except `completions` read a TOML configuration file given
/// by `--config`. See `config/skymap.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "skymap",
    about = "Mirror a GitHub-hosted chain registry and serve it over HTTP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/skymap.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the index, then serve it until SIGINT or SIGTERM.
    ///
    /// The initial refresh must succeed. Afterwards the index is refreshed
    /// every `refresh.interval_secs`; failed refreshes keep serving the
    /// previous snapshot.
    Serve {
        /// Override `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one refresh pass and print what was indexed.
    Sync {
        /// Rebuild even if the remote reports no changes.
        #[arg(long)]
        full: bool,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skymap=info")),
        )
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "skymap", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => run_serve(cfg, bind).await?,
        Commands::Sync { full } => run_sync(&cfg, full).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn run_serve(cfg: Config, bind: Option<String>) -> anyhow::Result<()> {
    let engine = Engine::from_config(&cfg.registry)?;
    let shutdown = CancellationToken::new();

    let outcome = engine
        .coordinator
        .refresh(&shutdown)
        .await
        .context("initial refresh failed")?;
    if let RefreshOutcome::Published(summary) = outcome {
        tracing::info!(
            chains = summary.chains,
            resolved = summary.resolved,
            assets = summary.assets,
            "initial index published"
        );
    }

    let bind = bind.unwrap_or(cfg.server.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;

    let scheduler = scheduler::spawn_scheduler(
        engine.coordinator.clone(),
        cfg.refresh.interval(),
        shutdown.clone(),
    );
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let served = server::serve(listener, engine.index.clone(), shutdown.clone()).await;
    shutdown.cancel();
    scheduler.await?;
    served
}

async fn run_sync(cfg: &Config, full: bool) -> anyhow::Result<()> {
    let engine = Engine::from_config(&cfg.registry)?;
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let outcome = if full {
        engine.coordinator.refresh_forced(&cancel).await?
    } else {
        engine.coordinator.refresh(&cancel).await?
    };

    match outcome {
        RefreshOutcome::Unchanged => {
            println!("{}@{}: no changes", cfg.registry.repo, cfg.registry.branch);
        }
        RefreshOutcome::Published(summary) => {
            println!("{}@{}", cfg.registry.repo, cfg.registry.branch);
            println!("  chains:   {}", summary.chains);
            println!("  resolved: {}", summary.resolved);
            println!("  assets:   {}", summary.assets);
            println!("  built at: {}", summary.built_at.to_rfc3339());
        }
    }
    Ok(())
}

async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown requested");
    token.cancel();
}
