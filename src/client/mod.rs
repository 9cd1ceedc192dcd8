//! Client side: the single-request download state machine.
//!
//! # Downloader State Machine
//!
//! ```text
//! Connecting → Handshaking → AwaitingUri → SendingRequest
//!                                              │
//!                                              ▼
//!                                     ReceivingHeaders
//!                                       │          │
//!                            text-like  │          │ streaming
//!                            (one shot) ▼          ▼
//!                                   Complete ← ReceivingBody
//! ```
//!
//! Failure in any state ends the run; there are no retries. The header phase
//! hands any bytes it over-read past the separator to the body phase
//! explicitly, so the body phase never searches for the separator itself.

pub mod downloader;
pub mod observer;
