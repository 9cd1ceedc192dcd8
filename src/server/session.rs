use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, info};

use crate::http::RECV_BUFFER_SIZE;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::tokenizer::{Classification, RequestTokenizer};
use crate::http::writer::ResponseWriter;
use crate::server::handler::RequestHandler;
use crate::server::shutdown::ShutdownSignal;

/// One accepted connection's lifecycle, after the TLS handshake.
///
/// Generic over the stream so tests can drive it over an in-memory duplex
/// pipe; the listener instantiates it with a TLS stream.
pub struct Session<S> {
    stream: S,
    tokenizer: RequestTokenizer,
    handler: Arc<dyn RequestHandler>,
    shutdown: ShutdownSignal,
    state: SessionState,
    peer: String,
}

enum SessionState {
    ReadingRequest,
    Dispatching(Request),
    WritingReply(Response),
    Closed,
}

/// A definitive read outcome; `Indeterminate` never escapes the read loop.
enum ReadOutcome {
    Request(Request),
    Malformed,
    Shutdown,
    PeerClosed,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        handler: Arc<dyn RequestHandler>,
        shutdown: ShutdownSignal,
        peer: impl Into<String>,
    ) -> Self {
        Self {
            stream,
            tokenizer: RequestTokenizer::new(),
            handler,
            shutdown,
            state: SessionState::ReadingRequest,
            peer: peer.into(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, SessionState::ReadingRequest) {
                SessionState::ReadingRequest => match self.read_request().await? {
                    ReadOutcome::Request(req) => {
                        self.state = SessionState::Dispatching(req);
                    }
                    ReadOutcome::Malformed => {
                        debug!(peer = %self.peer, "Malformed request, sending canned reply");
                        self.state = SessionState::WritingReply(Response::bad_request());
                    }
                    ReadOutcome::Shutdown => {
                        // No reply on this read; the accept loop is watching.
                        self.shutdown.trigger();
                        self.state = SessionState::Closed;
                    }
                    ReadOutcome::PeerClosed => {
                        self.state = SessionState::Closed;
                    }
                },

                SessionState::Dispatching(req) => {
                    debug!(peer = %self.peer, path = %req.path, "Dispatching request");
                    let reply = self.handler.build_reply(&req);
                    self.state = SessionState::WritingReply(reply);
                }

                SessionState::WritingReply(reply) => {
                    let mut writer = ResponseWriter::new(&reply);
                    writer.write_to_stream(&mut self.stream).await?;

                    // One socket serves many sequential requests; stay open
                    // until the peer closes or an I/O error ends the session.
                    self.state = SessionState::ReadingRequest;
                }

                SessionState::Closed => {
                    info!(peer = %self.peer, "Session closed");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads until the tokenizer reaches a definitive classification.
    ///
    /// The receive buffer is one read quantum, fully drained into the
    /// tokenizer within each completion before the next read is issued.
    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        loop {
            // A previous read may have retained a whole pipelined request.
            match self.tokenizer.classify() {
                Classification::Complete(request) => return Ok(ReadOutcome::Request(request)),
                Classification::Invalid => return Ok(ReadOutcome::Malformed),
                Classification::Shutdown => return Ok(ReadOutcome::Shutdown),
                Classification::Indeterminate => {}
            }

            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Ok(ReadOutcome::PeerClosed);
            }

            self.tokenizer.feed(&buf[..n]);
        }
    }
}
