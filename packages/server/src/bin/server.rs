//! Typing race server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin typerace-server
//! cargo run --bin typerace-server -- --host 0.0.0.0 --port 3000 --room-capacity 2
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use typerace_server::{
    bootstrap::build_app, config::RaceConfig, infrastructure::collaborator::RandomTextPool,
    ui::Server,
};
use typerace_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "typerace-server")]
#[command(about = "Real-time multiplayer typing race server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Players per room; a full room starts its countdown
    #[arg(long, default_value = "3")]
    room_capacity: usize,

    /// First number of the pre-race countdown
    #[arg(long, default_value = "3")]
    countdown_from: u32,

    /// Milliseconds between countdown ticks
    #[arg(long, default_value = "1000")]
    countdown_interval_ms: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = RaceConfig::default()
        .with_room_capacity(args.room_capacity)
        .with_countdown(
            args.countdown_from,
            Duration::from_millis(args.countdown_interval_ms),
        );
    tracing::info!("Starting with {:?}", config);

    let app = build_app(
        config,
        Arc::new(SystemClock),
        Arc::new(RandomTextPool::default()),
    );

    let server = Server::new(app.state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
