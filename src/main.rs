//! Web Notifications server - Entry Point
//!
//! Serves the browser connector and the session WebSocket, optionally greeting every new
//! session with a notification.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use web_notifications::{Config, ServerState, WebNotifications};

#[derive(Parser)]
#[command(name = "web-notifications", about = "Desktop notifications for web sessions")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration
    #[arg(long)]
    listen: Option<String>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", Config::default_config_str());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }

    let greeting = config.notifications.greeting.clone();
    let mut state = ServerState::new(config);
    if !greeting.is_empty() {
        state = state.with_session_hook(move |session| {
            let session_id = session.id();
            match WebNotifications::create(greeting.as_str()) {
                Ok(builder) => builder
                    .on_click(move || info!("Greeting clicked in session {}", session_id))
                    .show(),
                Err(e) => warn!("Could not greet session {}: {}", session_id, e),
            }
        });
    }

    web_notifications::server::serve(Arc::new(state)).await
}
