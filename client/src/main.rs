use clap::Parser;
use client::network::{Client, QUIT_COMMAND, WHO_COMMAND};
use log::info;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the relay server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080/game")]
    server: String,

    /// Name announced to the other players
    #[arg(short = 'n', long)]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    eprintln!(
        "Type to chat, {} to list players, {} to leave",
        WHO_COMMAND, QUIT_COMMAND
    );

    let mut client = Client::connect(&args.server).await?;
    let input = BufReader::new(tokio::io::stdin());
    client.run(&args.name, input, &mut std::io::stdout()).await?;

    Ok(())
}
