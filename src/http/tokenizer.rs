//! Request tokenizer.
//!
//! Owns the bytes of a partially received request between reads and resolves
//! them to one of four classifications. The caller feeds whatever each read
//! produced; the tokenizer retains anything beyond a complete request so that
//! two requests arriving in one read are classified one at a time.

use std::collections::HashMap;

use crate::http::find_separator;
use crate::http::request::{Method, Request};

/// What the accumulated bytes amount to.
#[derive(Debug)]
pub enum Classification {
    /// A complete, well-formed GET request.
    Complete(Request),
    /// A complete but malformed request; answer with the canned 400.
    Invalid,
    /// Not enough bytes yet to decide either way.
    Indeterminate,
    /// The distinguished shutdown request; terminate the process cooperatively.
    Shutdown,
}

#[derive(Debug)]
enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidHeader,
    Incomplete,
    Shutdown,
}

#[derive(Debug, Default)]
pub struct RequestTokenizer {
    buffer: Vec<u8>,
}

impl RequestTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly read bytes to the retained partial request.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Classifies the retained bytes.
    ///
    /// A definitive classification resets retention: `Complete` drains exactly
    /// the consumed request and keeps any pipelined remainder, `Invalid` and
    /// `Shutdown` discard everything.
    pub fn classify(&mut self) -> Classification {
        match parse_request(&self.buffer) {
            Ok((request, consumed)) => {
                self.buffer.drain(..consumed);
                Classification::Complete(request)
            }
            Err(ParseError::Incomplete) => Classification::Indeterminate,
            Err(ParseError::Shutdown) => {
                self.buffer.clear();
                Classification::Shutdown
            }
            Err(_) => {
                self.buffer.clear();
                Classification::Invalid
            }
        }
    }

    /// Bytes currently retained (pipelined or partial).
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// The distinguished method token that classifies as a shutdown request.
const SHUTDOWN_METHOD: &str = "SHUTDOWN";

fn parse_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    // A request is decidable only once the blank line has arrived.
    let headers_end = find_separator(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];

    let headers_str = std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_token = parts.next().ok_or(ParseError::InvalidRequest)?;
    if method_token == SHUTDOWN_METHOD {
        return Err(ParseError::Shutdown);
    }
    let method = Method::from_token(method_token).ok_or(ParseError::InvalidMethod)?;

    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    // Headers
    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
    };

    // GET carries no body; the request ends at the separator.
    Ok((request, headers_end + 4))
}
