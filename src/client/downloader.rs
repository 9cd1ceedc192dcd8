use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::BytesMut;
use rustls::ClientConfig;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::client::observer::{TransferObserver, UriProvider};
use crate::error::TransferError;
use crate::http::request::encode_get;
use crate::http::{RECV_BUFFER_SIZE, SEPARATOR, find_separator};
use crate::tls;

/// Extension used when the target path does not carry one.
const DEFAULT_EXTENSION: &str = "dat";

/// Extensions whose content is assumed small enough to arrive in the same
/// reads as the headers; for these the run finishes without a streaming phase.
const TEXT_EXTENSIONS: &[&str] = &["txt", "dat", "html"];

/// Headers larger than this abort the run.
const MAX_HEADER_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Connecting,
    Handshaking,
    AwaitingUri,
    SendingRequest,
    ReceivingHeaders,
    ReceivingBody,
    Complete,
}

/// Client state machine for one GET-over-TLS exchange.
///
/// Owns all per-run state: the body accumulator, the running byte counter,
/// and the derived destination file name. Nothing is shared across runs or
/// connections.
pub struct Downloader<O, U> {
    host: String,
    port: u16,
    output_dir: PathBuf,
    observer: O,
    uris: U,
    state: DownloadState,
    /// Body bytes received so far; rewritten to disk in full on every chunk.
    body: Vec<u8>,
    /// Running count of body bytes, sizes each full-state write.
    body_len: usize,
}

impl<O, U> Downloader<O, U>
where
    O: TransferObserver,
    U: UriProvider,
{
    pub fn new(
        host: impl Into<String>,
        port: u16,
        output_dir: impl Into<PathBuf>,
        observer: O,
        uris: U,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            output_dir: output_dir.into(),
            observer,
            uris,
            state: DownloadState::Connecting,
            body: Vec::new(),
            body_len: 0,
        }
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Connects, handshakes, and runs the exchange. Any error aborts the run;
    /// nothing is written before the handshake has succeeded.
    pub async fn run(&mut self, config: Arc<ClientConfig>) -> Result<(), TransferError> {
        self.state = DownloadState::Connecting;
        let tcp = tls::open(&self.host, self.port).await?;

        self.state = DownloadState::Handshaking;
        let stream = tls::handshake(config, &self.host, tcp).await?;

        self.exchange(stream).await
    }

    /// The post-handshake part of the run, generic over the stream so tests
    /// can drive it over an in-memory pipe.
    pub async fn exchange<S>(&mut self, mut stream: S) -> Result<(), TransferError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.state = DownloadState::AwaitingUri;
        let path = self.uris.next_target()?;
        let extension = extension_of(&path);
        let text_like = TEXT_EXTENSIONS.contains(&extension.as_str());
        debug!(path = %path, extension = %extension, text_like, "Target selected");

        self.state = DownloadState::SendingRequest;
        let request = encode_get(&path, &self.host);
        stream.write_all(&request).await?;
        stream.flush().await?;

        self.state = DownloadState::ReceivingHeaders;
        let tail = self.read_headers(&mut stream).await?;

        let dest = self.output_dir.join(format!("received.{extension}"));

        if text_like {
            // Whatever arrived with the headers is the whole content; one
            // write, no further reads.
            tokio::fs::write(&dest, &tail).await?;
            info!(dest = %dest.display(), bytes = tail.len(), "Wrote text resource");
            self.state = DownloadState::Complete;
            return Ok(());
        }

        self.state = DownloadState::ReceivingBody;
        self.receive_body(&mut stream, tail, &dest).await?;

        self.state = DownloadState::Complete;
        Ok(())
    }

    /// Accumulates reads until the separator appears, then discards the
    /// header block and returns the unconsumed tail for the body phase.
    ///
    /// The read primitive over-reads freely; the separator position inside
    /// the accumulated buffer is the only boundary that matters.
    async fn read_headers<S>(&mut self, stream: &mut S) -> Result<Vec<u8>, TransferError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buffer = BytesMut::with_capacity(RECV_BUFFER_SIZE);

        loop {
            if let Some(pos) = find_separator(&buffer) {
                let header_block = buffer.split_to(pos + SEPARATOR.len());
                debug!(header_bytes = header_block.len(), tail = buffer.len(), "Headers complete");
                return Ok(buffer.to_vec());
            }

            if buffer.len() > MAX_HEADER_BYTES {
                return Err(TransferError::HeadersTooLarge(MAX_HEADER_BYTES));
            }

            let n = stream.read_buf(&mut buffer).await?;
            if n == 0 {
                return Err(TransferError::TruncatedHeaders);
            }
        }
    }

    /// Streams the body until peer EOF. The handed-off `tail` is the first
    /// chunk; after it, each read drains one buffer quantum per completion.
    async fn receive_body<S>(
        &mut self,
        stream: &mut S,
        tail: Vec<u8>,
        dest: &Path,
    ) -> Result<(), TransferError>
    where
        S: AsyncRead + Unpin,
    {
        if !tail.is_empty() {
            self.append_chunk(&tail, dest).await?;
        }

        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.append_chunk(&buf[..n], dest).await?;
        }

        // Peer EOF is stream completion, not an error. Persist the final
        // state even when no chunk arrived, then reset for the next run.
        tokio::fs::write(dest, &self.body).await?;
        info!(dest = %dest.display(), bytes = self.body_len, "Download complete");

        self.body.clear();
        self.body_len = 0;
        self.observer.on_complete();
        Ok(())
    }

    async fn append_chunk(&mut self, chunk: &[u8], dest: &Path) -> Result<(), TransferError> {
        self.body.extend_from_slice(chunk);
        self.body_len += chunk.len();
        self.observer.on_data(chunk);

        // Full-known-state persistence: overwrite with everything received so
        // far, so the file is complete up to the last chunk at any crash point.
        tokio::fs::write(dest, &self.body).await?;
        Ok(())
    }
}

/// Derives the extension of the requested file: the substring after the last
/// `.` when the path contains both a `/` and a `.` with the dot inside the
/// final segment; the sentinel otherwise.
pub fn extension_of(path: &str) -> String {
    match (path.rfind('/'), path.rfind('.')) {
        (Some(slash), Some(dot)) if dot > slash => path[dot + 1..].to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}
