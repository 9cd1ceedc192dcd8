use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Process-wide settings shared by the client and server binaries.
///
/// Loaded from an optional YAML file; every field has a compiled-in default so
/// both binaries run with nothing but command-line arguments. Listen/connect
/// addresses come from argv, not from here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interface the server binds on; the port comes from argv.
    pub bind_host: String,
    /// Directory the server serves files from.
    pub doc_root: PathBuf,
    /// Directory the client writes `received.<ext>` into.
    pub output_dir: PathBuf,
    pub tls: TlsSettings,
}

/// Paths to the PEM material handed to the TLS layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Certificate chain presented by the server.
    pub cert_file: PathBuf,
    /// Server private key (PKCS#8, RSA or SEC1 PEM).
    pub key_file: PathBuf,
    /// Trust anchors the client verifies the server chain against.
    pub ca_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            doc_root: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            tls: TlsSettings::default(),
        }
    }
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            cert_file: PathBuf::from("server.crt"),
            key_file: PathBuf::from("server.key"),
            ca_file: PathBuf::from("server.crt"),
        }
    }
}

impl Config {
    /// Loads configuration from the file named by `TLSFETCH_CONFIG`
    /// (default `tlsfetch.yaml`). A missing file yields the defaults;
    /// an unreadable or malformed file is a startup error.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var("TLSFETCH_CONFIG").unwrap_or_else(|_| "tlsfetch.yaml".to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                serde_yaml::from_str(&text).with_context(|| format!("invalid config {path}"))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("cannot read config {path}")),
        }
    }
}
