use clap::Parser;
use hub::network::{bind_listener, unescape_payload, BroadcastHub, HubConfig, DEFAULT_PORT};
use log::info;
use std::time::Duration;

/// Broadcasts a fixed key-event line to every connected TCP peer.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Port to listen on
        #[clap(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Milliseconds between broadcasts
        #[clap(short, long, default_value = "1000")]
        interval_ms: u64,
        /// Bytes sent on every tick; \n, \r, \t, \0 and \\ are expanded
        #[clap(long, default_value = "LEFT_KEY_DOWN\\n")]
        payload: String,
    }

    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = HubConfig {
        port: args.port,
        interval: Duration::from_millis(args.interval_ms.max(1)),
        payload: unescape_payload(&args.payload),
    };

    let listener = bind_listener(config.port).await?;
    let mut hub = BroadcastHub::new(config);

    tokio::select! {
        result = hub.run(listener) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down with {} peers connected", hub.peer_count());
        }
    }

    Ok(())
}
