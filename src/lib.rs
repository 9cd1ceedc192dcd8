//! Tlsfetch - HTTP/1.1 over TLS
//!
//! Core library for a streaming download client and a
//! single-connection-per-session server.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod tls;
