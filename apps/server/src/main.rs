//! Water terminal monitor
//!
//! Polls the operator dashboard for new sales and faulty terminals and
//! reports them to Telegram.

mod commands;
mod config;

use clap::Parser;
use commands::{handle_command, Command, CommandContext};
use config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use watermon_alerts::format::NO_NEW_SALES;
use watermon_alerts::{CursorStore, TelegramBot};
use watermon_dashboard::DashboardClient;
use watermon_engine::{run_scheduler, Monitor};

/// Water terminal monitor CLI
#[derive(Parser, Debug)]
#[command(name = "watermon")]
#[command(about = "Dashboard sales and terminal monitor with Telegram alerts", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,

    /// Seconds between poll cycles
    #[arg(short, long)]
    interval: Option<u64>,

    /// Cursor file path
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Run a single poll cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn load_config(args: &Args) -> Result<AppConfig, config::ConfigError> {
    let mut config = AppConfig::load(&args.config)?;
    config.apply_env()?;

    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(interval) = args.interval {
        config.monitor.interval_secs = interval;
    }
    if let Some(path) = &args.data_file {
        config.data_file = path.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let loaded = load_config(&args);

    let level = match &loaded {
        Ok(config) => config.log_level.clone(),
        Err(_) => args.log_level.clone().unwrap_or_else(|| "info".to_string()),
    };
    init_logging(&level);

    let config = match loaded.and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("🚀 Water monitor starting...");
    config.log_summary();

    let client = match DashboardClient::new(config.dashboard.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create dashboard client: {}", e);
            std::process::exit(1);
        }
    };

    let bot = TelegramBot::new(&config.telegram.token);
    let store = CursorStore::new(&config.data_file);
    let monitor = Arc::new(Monitor::new(
        config.monitor_config(),
        Arc::new(client),
        Arc::new(bot.clone()),
        store,
    ));

    if args.once {
        match monitor.run_cycle().await {
            Ok(report) => {
                if report.new_sales == 0 {
                    info!("{}", NO_NEW_SALES);
                }
                info!(
                    "✅ Cycle done: {} new sales, {} new alerts",
                    report.new_sales, report.new_alerts
                );
            }
            Err(e) => {
                error!("Cycle failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let scheduler_handle = tokio::spawn(run_scheduler(
        monitor.clone(),
        Duration::from_secs(config.monitor.interval_secs),
    ));

    let ctx = Arc::new(CommandContext {
        monitor: monitor.clone(),
        display_offset: config.display_offset(),
    });
    let handler = Update::filter_message().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let ctx = Arc::clone(&ctx);
            async move { handle_command(bot, msg, cmd, ctx).await }
        },
    );
    let mut dispatcher = Dispatcher::builder(bot.bot().clone(), handler)
        .default_handler(|_| async {})
        .build();
    let bot_handle = tokio::spawn(async move {
        dispatcher.dispatch().await;
    });
    info!("🤖 Telegram commands enabled");

    // Handle shutdown
    info!("Press Ctrl+C to stop...");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");

    warn!("Shutdown signal received");

    scheduler_handle.abort();
    bot_handle.abort();

    info!("👋 Water monitor stopped");
}
