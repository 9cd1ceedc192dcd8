use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use tlsfetch::client::downloader::{DownloadState, Downloader, extension_of};
use tlsfetch::client::observer::{TransferObserver, UriProvider};
use tlsfetch::error::TransferError;
use tlsfetch::http::request::encode_get;

struct FixedUri {
    target: String,
    calls: Arc<AtomicUsize>,
}

impl FixedUri {
    fn new(target: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                target: target.to_string(),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl UriProvider for FixedUri {
    fn next_target(&mut self) -> std::io::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.target.clone())
    }
}

#[derive(Default)]
struct RecordingObserver {
    chunks: Vec<usize>,
    data: Vec<u8>,
    completes: usize,
}

impl TransferObserver for RecordingObserver {
    fn on_data(&mut self, chunk: &[u8]) {
        self.chunks.push(chunk.len());
        self.data.extend_from_slice(chunk);
    }

    fn on_complete(&mut self) {
        self.completes += 1;
    }
}

fn downloader_for(
    target: &str,
    output_dir: &std::path::Path,
) -> (Downloader<RecordingObserver, FixedUri>, Arc<AtomicUsize>) {
    let (uris, calls) = FixedUri::new(target);
    (
        Downloader::new(
            "localhost",
            443,
            output_dir,
            RecordingObserver::default(),
            uris,
        ),
        calls,
    )
}

fn patterned_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_text_resource_written_once_without_callbacks() {
    let dir = tempfile::tempdir().unwrap();
    let (mut dl, calls) = downloader_for("/notes.txt", dir.path());

    let (client, mut server) = tokio::io::duplex(4096);
    let peer = tokio::spawn(async move {
        server
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n0123456789")
            .await
            .unwrap();
    });

    dl.exchange(client).await.unwrap();
    peer.await.unwrap();

    assert_eq!(dl.state(), DownloadState::Complete);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        std::fs::read(dir.path().join("received.txt")).unwrap(),
        b"0123456789"
    );
    // The one-shot branch bypasses the streaming observer entirely.
    assert_eq!(dl.observer().completes, 0);
    assert!(dl.observer().chunks.is_empty());
}

#[tokio::test]
async fn test_binary_resource_streamed_until_peer_close() {
    let dir = tempfile::tempdir().unwrap();
    let (mut dl, _) = downloader_for("/blob.bin", dir.path());

    let body = patterned_body(10);
    let reply = [b"HTTP/1.1 200 OK\r\n\r\n".to_vec(), body.clone()].concat();

    let (client, mut server) = tokio::io::duplex(4096);
    let peer = tokio::spawn(async move {
        server.write_all(&reply).await.unwrap();
        // Dropping the stream is the peer close that ends the body.
    });

    dl.exchange(client).await.unwrap();
    peer.await.unwrap();

    assert_eq!(
        std::fs::read(dir.path().join("received.bin")).unwrap(),
        body
    );
    assert_eq!(dl.observer().data, body);
    assert_eq!(dl.observer().completes, 1);
}

#[tokio::test]
async fn test_large_body_across_many_fragmented_reads() {
    let dir = tempfile::tempdir().unwrap();
    let (mut dl, _) = downloader_for("/big.bin", dir.path());

    let body = patterned_body(50_000);
    let body_for_peer = body.clone();

    // A tiny pipe capacity forces the body across many read completions;
    // chunk boundaries must not be semantically meaningful.
    let (client, mut server) = tokio::io::duplex(512);
    let peer = tokio::spawn(async move {
        server.write_all(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();
        server.write_all(&body_for_peer).await.unwrap();
    });

    dl.exchange(client).await.unwrap();
    peer.await.unwrap();

    assert_eq!(
        std::fs::read(dir.path().join("received.bin")).unwrap(),
        body
    );
    assert_eq!(dl.observer().data, body);
    assert!(dl.observer().chunks.len() > 1);
    assert_eq!(dl.observer().completes, 1);
}

#[tokio::test]
async fn test_body_arriving_with_headers_is_handed_off_clean() {
    let dir = tempfile::tempdir().unwrap();
    let (mut dl, _) = downloader_for("/small.bin", dir.path());

    let body = patterned_body(20);
    let reply = [b"HTTP/1.1 200 OK\r\nContent-Length: 20\r\n\r\n".to_vec(), body.clone()].concat();

    let (client, mut server) = tokio::io::duplex(65536);
    let peer = tokio::spawn(async move {
        // Headers and the whole body land in the very first read.
        server.write_all(&reply).await.unwrap();
    });

    dl.exchange(client).await.unwrap();
    peer.await.unwrap();

    assert_eq!(
        std::fs::read(dir.path().join("received.bin")).unwrap(),
        body
    );
    // The first observed chunk is pure body: no residual header bytes.
    assert_eq!(dl.observer().chunks, vec![20]);
    assert_eq!(dl.observer().data, body);
}

#[tokio::test]
async fn test_separator_split_across_tiny_reads() {
    let dir = tempfile::tempdir().unwrap();
    let (mut dl, _) = downloader_for("/x.bin", dir.path());

    let body = patterned_body(10);
    let reply = [b"HTTP/1.1 200 OK\r\n\r\n".to_vec(), body.clone()].concat();
    let request_len = encode_get("/x.bin", "localhost").len();

    // Capacity 3 guarantees no read aligns with the 4-byte separator.
    let (client, mut server) = tokio::io::duplex(3);
    let peer = tokio::spawn(async move {
        let mut request = vec![0u8; request_len];
        server.read_exact(&mut request).await.unwrap();
        server.write_all(&reply).await.unwrap();
    });

    dl.exchange(client).await.unwrap();
    peer.await.unwrap();

    assert_eq!(
        std::fs::read(dir.path().join("received.bin")).unwrap(),
        body
    );
    assert_eq!(dl.observer().data, body);
}

#[tokio::test]
async fn test_empty_body_still_persists_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let (mut dl, _) = downloader_for("/empty.bin", dir.path());

    let (client, mut server) = tokio::io::duplex(4096);
    let peer = tokio::spawn(async move {
        server.write_all(b"HTTP/1.1 204 No Content\r\n\r\n").await.unwrap();
    });

    dl.exchange(client).await.unwrap();
    peer.await.unwrap();

    let written = std::fs::read(dir.path().join("received.bin")).unwrap();
    assert!(written.is_empty());
    assert_eq!(dl.observer().completes, 1);
    assert!(dl.observer().chunks.is_empty());
}

#[tokio::test]
async fn test_truncated_headers_is_an_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (mut dl, _) = downloader_for("/gone.bin", dir.path());

    let (client, mut server) = tokio::io::duplex(4096);
    let peer = tokio::spawn(async move {
        server.write_all(b"HTTP/1.1 200 OK\r\nContent-").await.unwrap();
    });

    let err = dl.exchange(client).await.unwrap_err();
    peer.await.unwrap();

    assert!(matches!(err, TransferError::TruncatedHeaders));
    assert!(!dir.path().join("received.bin").exists());
}

#[test]
fn test_extension_derivation_rules() {
    // A dot after the last slash selects the trailing extension.
    assert_eq!(extension_of("/files/image.png"), "png");
    assert_eq!(extension_of("/a.b/c.d"), "d");
    // No dot in the final segment falls back to the sentinel.
    assert_eq!(extension_of("/files/archive"), "dat");
    assert_eq!(extension_of("/files.d/archive"), "dat");
    // Paths with no slash at all also fall back.
    assert_eq!(extension_of("bare.txt"), "dat");
    assert_eq!(extension_of(""), "dat");
}
