use anyhow::Context;

use tlsfetch::config::Config;
use tlsfetch::server::listener;
use tlsfetch::server::shutdown::ShutdownSignal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: tlsfetch-server <port>");
        std::process::exit(1);
    }
    let port: u16 = args[1].parse().context("invalid port")?;

    let cfg = Config::load()?;
    let shutdown = ShutdownSignal::new();

    tokio::select! {
        res = listener::run(&cfg, port, shutdown.clone()) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    Ok(())
}
