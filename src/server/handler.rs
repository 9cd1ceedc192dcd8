use std::path::{Path, PathBuf};

use tracing::debug;

use crate::http::mime;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Turns a parsed request into a reply.
///
/// Shared read-only across all sessions; the listener hands every session the
/// same handler instance.
pub trait RequestHandler: Send + Sync {
    fn build_reply(&self, request: &Request) -> Response;
}

/// Serves files from a document root.
pub struct FileHandler {
    doc_root: PathBuf,
}

impl FileHandler {
    pub fn new(doc_root: impl Into<PathBuf>) -> Self {
        Self {
            doc_root: doc_root.into(),
        }
    }

    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        // Absolute paths only, and nothing that can climb out of the root.
        if !request_path.starts_with('/') || request_path.contains("..") {
            return None;
        }

        let mut path = request_path.to_string();
        if path.ends_with('/') {
            path.push_str("index.html");
        }

        Some(self.doc_root.join(path.trim_start_matches('/')))
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

impl RequestHandler for FileHandler {
    fn build_reply(&self, request: &Request) -> Response {
        let Some(path) = self.resolve(&request.path) else {
            return Response::bad_request();
        };

        match std::fs::read(&path) {
            Ok(body) => {
                debug!(path = %path.display(), bytes = body.len(), "Serving file");
                ResponseBuilder::new(StatusCode::Ok)
                    .header("Content-Type", mime::content_type(extension(&path)))
                    .body(body)
                    .build()
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "File not served");
                Response::not_found()
            }
        }
    }
}
