use std::collections::HashMap;

/// HTTP request methods.
///
/// The exchange implemented here is a single GET-style transfer, so GET is the
/// only method a request can carry; anything else fails classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    Get,
}

impl Method {
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::Get),
            _ => None,
        }
    }
}

/// A parsed request from a client.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// The request path (e.g., "/index.html")
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
}

impl Request {
    /// Retrieves a header value by name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }
}

/// Builder for constructing Request objects, mainly for tests and fixtures.
pub struct RequestBuilder {
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            version: None,
            headers: HashMap::new(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: Method::Get,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes the one request the client sends: a GET for `path` with the
/// fixed header set, terminated by the blank line.
pub fn encode_get(path: &str, host: &str) -> Vec<u8> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(format!("GET {path} HTTP/1.1\r\n").as_bytes());
    buffer.extend_from_slice(format!("Host: {host}\r\n").as_bytes());
    buffer.extend_from_slice(b"Accept: */*\r\n");
    buffer.extend_from_slice(b"Connection: close\r\n\r\n");
    buffer
}
