//! Speedtest Exporter - Main Application
//!
//! Serves Prometheus gauges produced by a live network speed test on every
//! scrape of the probe endpoint.

use clap::Parser;
use speedtest_exporter::{
    log_debug,
    cli::Cli,
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, Result},
    logging::LoggerFactory,
    server::ExporterServer,
    collector::SpeedtestCollector,
    tester::HttpSpeedTester,
    BUILD_TIME, GIT_COMMIT, PKG_NAME, TARGET_TRIPLE, VERSION,
};
use std::{process, sync::Arc};

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    // Parse command line arguments
    let cli = Cli::parse();
    let use_color = cli.use_colors();

    if let Err(e) = run_application(cli).await {
        eprintln!("{}", e.format_for_console(use_color));

        print_error_suggestions(&e);

        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    let debug = cli.debug;
    let config = load_config(cli)?;

    let factory = LoggerFactory::new(config.clone());
    let logger = factory.create_logger("exporter").await;

    logger.info(&format!("{} v{} starting", PKG_NAME, VERSION))
        .field("session_id", factory.session_id())
        .field("build_time", BUILD_TIME)
        .field("git_commit", GIT_COMMIT.unwrap_or("unknown"))
        .field("target", TARGET_TRIPLE)
        .log()
        .await;

    if debug {
        for line in display_config_summary(&config).lines() {
            log_debug!(logger, "{}", line);
        }
    }

    let tester = HttpSpeedTester::new(config.tester_config()?)?
        .with_logger(logger.named("tester"));
    let collector = SpeedtestCollector::new(Arc::new(tester))
        .with_logger(logger.named("collector"));

    let server = ExporterServer::bind(config.server_config()?, collector, logger.named("server")).await?;

    server
        .serve_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available, run until killed
                std::future::pending::<()>().await;
            }
        })
        .await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Server URLs must start with http:// or https://");
            eprintln!("  - Listen and source addresses must be IP addresses");
            eprintln!();
            eprint!("{}", EnvManager::display_env_help());
        }
        AppError::Bind(_) => {
            eprintln!();
            eprintln!("Startup help:");
            eprintln!("  - Another process may already use this port (try --port)");
            eprintln!("  - Ports below 1024 need elevated privileges");
            eprintln!("  - The listen address must belong to this host (try --address 0.0.0.0)");
        }
        _ => {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}
