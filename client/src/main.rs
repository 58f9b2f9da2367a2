use clap::Parser;
use client::config::{default_session_id, random_name, ClientConfig, DEFAULT_NAME_LEN};
use client::connect::AddressFamily;
use client::gui::run_gui_feed;
use client::network::{ClientEvent, ReliableClient};
use log::{error, info, warn};
use shared::TurnDirection;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Screen-worms bot that keeps a session alive", long_about = None)]
struct Args {
    /// Server host name or address
    #[arg(short = 'a', long, default_value = "localhost")]
    addr: String,

    /// Server UDP port
    #[arg(short = 'p', long, default_value = "2021")]
    port: u16,

    /// Session id [default: current time in milliseconds]
    #[arg(short = 's', long)]
    session: Option<u64>,

    /// Player name, empty to observe [default: 5 random characters]
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Initial turn direction: straight, right or left
    #[arg(short = 't', long, default_value = "right")]
    turn: TurnDirection,

    /// Send period in milliseconds
    #[arg(short = 'i', long, default_value = "30")]
    interval_ms: u64,

    /// Address family of the server candidates to try
    #[arg(short = 'f', long, value_enum, default_value_t = AddressFamily::Ipv4)]
    family: AddressFamily,

    /// GUI endpoint (host:port) to read key events from
    #[arg(short = 'g', long)]
    gui: Option<String>,

    /// Print received events as JSON lines
    #[arg(long)]
    json: bool,
}

fn print_event(event: &ClientEvent, json: bool) {
    let ClientEvent::Delivered(delivery) = event else {
        return;
    };

    for ev in &delivery.events {
        if json {
            println!(
                "{}",
                serde_json::json!({ "game_id": delivery.game_id, "event": ev })
            );
        } else {
            println!("game {} {}", delivery.game_id, ev);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ClientConfig {
        host: args.addr,
        port: args.port,
        family: args.family,
        session_id: args.session.unwrap_or_else(default_session_id),
        player_name: args
            .name
            .unwrap_or_else(|| random_name(DEFAULT_NAME_LEN))
            .into_bytes(),
        turn_direction: args.turn,
        tick_interval: Duration::from_millis(args.interval_ms.max(1)),
    };

    info!(
        "Starting client: session {} name {:?}",
        config.session_id,
        String::from_utf8_lossy(&config.player_name)
    );

    let (mut client, handle) = ReliableClient::connect(&config).await?;

    if let Some(gui_addr) = args.gui {
        let gui_handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = run_gui_feed(&gui_addr, gui_handle).await {
                warn!("GUI feed from {} stopped: {}", gui_addr, e);
            }
        });
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let json = args.json;
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event, json);
        }
    });

    tokio::select! {
        result = client.run(tx) => {
            if let Err(e) = result {
                error!("Client loop failed: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, closing session {}", config.session_id);
            handle.shutdown();
        }
    }

    Ok(())
}
