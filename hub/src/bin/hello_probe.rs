use clap::Parser;
use log::{info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};

const GREETING: &[u8] = b"Hello!\0";

#[derive(Parser, Debug)]
#[command(author, version, about = "Checks that a TCP endpoint accepts connections", long_about = None)]
struct Args {
    /// Host name or address
    address: String,
    /// TCP port
    port: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut tried = Vec::new();
    for candidate in lookup_host((args.address.as_str(), args.port)).await? {
        match TcpStream::connect(candidate).await {
            Ok(mut stream) => {
                stream.write_all(GREETING).await?;
                info!("greeted {}", candidate);
                println!("connected to {}", candidate);
                return Ok(());
            }
            Err(e) => {
                warn!("{}: {}", candidate, e);
                tried.push(format!("{}: {}", candidate, e));
            }
        }
    }

    Err(format!(
        "could not connect to {}:{} (tried: {})",
        args.address,
        args.port,
        tried.join("; ")
    )
    .into())
}
