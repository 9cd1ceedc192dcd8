//! Server side: accept loop and per-connection sessions.
//!
//! # Session State Machine
//!
//! Each accepted connection, once its TLS handshake succeeds, is driven by a
//! session state machine on its own task:
//!
//! ```text
//!        ┌────────────────┐
//!        │ ReadingRequest │ ← accumulate bytes until the tokenizer decides
//!        └──────┬─────────┘
//!               │ Complete          Invalid → canned 400 → WritingReply
//!               ▼                   Shutdown → signal, Closed
//!        ┌──────────────┐
//!        │ Dispatching  │ ← handler builds the reply
//!        └──────┬───────┘
//!               ▼
//!        ┌──────────────┐
//!        │ WritingReply │ ← serialize and send
//!        └──────┬───────┘
//!               │ written
//!               └──────→ ReadingRequest (same connection, next request)
//! ```
//!
//! The connection stays open until the peer closes or an I/O error occurs;
//! there is no keep-alive negotiation. A handshake failure means the session
//! is never constructed. At most one read or write is in flight per
//! connection at any instant: each state awaits its single operation to
//! completion before the next is issued.

pub mod handler;
pub mod listener;
pub mod session;
pub mod shutdown;
