use anyhow::Context;

use tlsfetch::client::downloader::Downloader;
use tlsfetch::client::observer::{CollectingObserver, StdinUriProvider};
use tlsfetch::config::Config;
use tlsfetch::tls;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: tlsfetch-client <host> <port>");
        std::process::exit(1);
    }
    let host = args[1].clone();
    let port: u16 = args[2].parse().context("invalid port")?;

    let cfg = Config::load()?;
    let tls_config = tls::client_config(&cfg.tls)?;

    let mut downloader = Downloader::new(
        host,
        port,
        cfg.output_dir,
        CollectingObserver::new(),
        StdinUriProvider,
    );
    downloader.run(tls_config).await?;

    Ok(())
}
