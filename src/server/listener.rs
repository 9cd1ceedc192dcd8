use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::server::handler::{FileHandler, RequestHandler};
use crate::server::session::Session;
use crate::server::shutdown::ShutdownSignal;
use crate::tls;

/// Accept loop: handshake and run one session per inbound connection,
/// re-accepting immediately. There is no admission control; every accepted
/// connection gets its own task and owns its session exclusively.
///
/// Returns when the shutdown signal fires. Bind and TLS-credential failures
/// are startup errors; a failed accept is logged and the loop continues.
pub async fn run(cfg: &Config, port: u16, shutdown: ShutdownSignal) -> anyhow::Result<()> {
    let handler: Arc<dyn RequestHandler> = Arc::new(FileHandler::new(cfg.doc_root.clone()));
    let acceptor = tls::acceptor(&cfg.tls)?;

    let addr = format!("{}:{}", cfg.bind_host, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                info!("No longer accepting connections");
                break;
            }

            res = listener.accept() => {
                let (socket, peer) = match res {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("Accept failed: {}", e);
                        continue;
                    }
                };
                info!("Accepted connection from {}", peer);

                let acceptor = acceptor.clone();
                let handler = handler.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    // Handshake failure destroys the pending session here;
                    // the accept loop is unaffected.
                    let stream = match acceptor.accept(socket).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            warn!("TLS handshake failed from {}: {}", peer, e);
                            return;
                        }
                    };

                    let mut session =
                        Session::new(stream, handler, shutdown, peer.to_string());
                    if let Err(e) = session.run().await {
                        error!("Session error from {}: {}", peer, e);
                    }
                });
            }
        }
    }

    Ok(())
}
