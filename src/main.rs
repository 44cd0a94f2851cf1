//! Main entry point for feedwatch

use anyhow::Context;
use clap::Parser;
use feedwatch::cli::Cli;
use feedwatch::discord::{DiscordChannel, Notifier};
use feedwatch::feed::HttpFeed;
use feedwatch::output::ConsoleNotifier;
use feedwatch::{Config, WatchSettings, Watcher};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set up verbose logging if requested
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.env_file.as_deref()).context("loading configuration")?;
    let config = cli.apply(config).context("applying command-line options")?;

    let feed = HttpFeed::new(&config.api_url, config.http_timeout)?;
    let settings = WatchSettings::from_config(&config);

    if cli.dry_run {
        let notifier = ConsoleNotifier::new(cli.format);
        return watch(Watcher::new(feed, notifier, settings), &cli, &config).await;
    }

    let channel = DiscordChannel::new(&config.token, &config.channel_id, config.http_timeout)?;
    match channel.resolve_channel().await {
        Ok(()) => log::info!("Connected to channel {}", config.channel_id),
        Err(e) if config.profile.is_strict() => {
            return Err(e).context("resolving destination channel");
        }
        Err(e) => log::error!("{}; polling anyway", e),
    }

    watch(Watcher::new(feed, channel, settings), &cli, &config).await
}

async fn watch<N: Notifier>(
    mut watcher: Watcher<HttpFeed, N>,
    cli: &Cli,
    config: &Config,
) -> anyhow::Result<()> {
    if cli.once {
        let outcome = watcher.run_cycle().await;
        log::info!("Cycle outcome: {:?}", outcome);
        return Ok(());
    }

    log::info!(
        "Polling {} every {}s",
        config.api_url,
        config.poll_interval.as_secs()
    );
    watcher.run(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                log::warn!("Could not register signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
