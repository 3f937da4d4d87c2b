//! Publish/subscribe relay server
//!
//! Run with: cargo run --example relay_server -- [--bind ADDR] [--default-set NAME]
//!
//! ## Subscribing
//!
//! With curl (keeps the connection open, one line per message):
//!   curl -N "http://localhost:8080/sub?id=news"
//!
//! Several channels at once, in another channel set:
//!   curl -N "http://localhost:8080/sub?id=news&id=weather&set=team"
//!
//! Wait for a single message:
//!   curl "http://localhost:8080/sub?id=news&nochunked=1"
//!
//! ## Publishing
//!
//!   curl -X POST -H "Content-Type: text/plain" --data "hello" "http://localhost:8080/pub?id=news"
//!
//! ## Tearing down a channel
//!
//!   curl "http://localhost:8080/del?id=news"
//!
//! ## Generating a channel id
//!
//!   curl "http://localhost:8080/gen?len=24"

use std::net::SocketAddr;

use clap::Parser;
use pubsub_relay::{BrokerConfig, RelayServer, ServerConfig};

/// In-memory publish/subscribe relay over chunked HTTP
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "RELAY_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Channel set used when requests name none
    #[arg(long, env = "RELAY_DEFAULT_SET", default_value = "default")]
    default_set: String,

    /// Messages buffered per subscriber before new ones are dropped
    #[arg(long, env = "RELAY_QUEUE_CAPACITY", default_value_t = 5)]
    queue_capacity: usize,

    /// Query parameter carrying channel ids
    #[arg(long, default_value = "id")]
    channel_param: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pubsub_relay=debug".parse()?)
                .add_directive("relay_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig::default()
        .bind(args.bind)
        .channel_param(args.channel_param);
    let broker_config = BrokerConfig::default()
        .default_set(args.default_set)
        .queue_capacity(args.queue_capacity);

    println!("Starting relay on http://{}", config.bind_addr);
    println!();
    println!("=== Subscribe ===");
    println!("curl -N \"http://{}/sub?id=news\"", config.bind_addr);
    println!();
    println!("=== Publish ===");
    println!(
        "curl --data hello \"http://{}/pub?id=news\"",
        config.bind_addr
    );
    println!();

    let server = RelayServer::with_broker_config(config, broker_config);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
