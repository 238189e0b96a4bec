use clap::Parser;
use log::{error, info};
use server::config::{SessionConfig, DEFAULT_CAPACITY, DEFAULT_QUEUE_CAPACITY};
use server::network::{Server, GAME_PATH};
use server::session::Session;

/// Main-method of the application.
/// Parses command-line arguments, then runs the session loop and the network listener.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[command(author, version, about)]
    struct Args {
        /// Address to listen on
        #[arg(short, long, default_value = "localhost:8080")]
        addr: String,
        /// Maximum number of seated players
        #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
        /// Players that must be seated before messages are relayed
        #[arg(short, long, default_value_t = 1)]
        start_players: usize,
        /// Per-connection queue bound, in messages
        #[arg(short, long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
        queue_capacity: usize,
    }

    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = SessionConfig {
        capacity: args.capacity,
        start_players: args.start_players,
        queue_capacity: args.queue_capacity,
    };
    config.validate()?;

    let (session, handle) = Session::new(config);
    let server = Server::bind(&args.addr, handle).await?;
    info!("Clients connect to ws://{}{}", server.local_addr()?, GAME_PATH);

    let session_handle = tokio::spawn(session.run());
    let server_handle = tokio::spawn(server.run());

    // Handle shutdown gracefully
    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                error!("Network task panicked: {}", e);
            }
        }
        result = session_handle => {
            if let Err(e) = result {
                error!("Session task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
