//! Error kinds.
//!
//! `ConfigError`, `AlreadyConnected`, and `ImmutableAttribute` are synchronous
//! failures returned directly from the call that triggered them. Every other
//! kind is instead surfaced as an [`crate::event::Event::Error`] (or a
//! dedicated event — `Reject`, `Disconnected`) followed by a full
//! disconnect; see [`crate::client::Client::dispatch`].

use thiserror::Error;

use crate::types::RejectPayload;

/// Synchronous construction/usage failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("username must be non-empty")]
    MissingUsername,
}

/// Errors returned directly from a `Client` method call.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("a data channel is already attached")]
    AlreadyConnected,

    #[error("attribute `{0}` is read-only; mutate it via the server-driven dispatcher instead")]
    ImmutableAttribute(&'static str),

    #[error("no codec adapter configured; pass one via `ClientConfig::with_codecs` before creating a voice stream")]
    NoCodecAdapter,
}

/// Errors surfaced asynchronously via the event stream, always followed by a
/// full disconnect.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("unrecognized PermissionDenied kind or otherwise malformed protocol message: {0}")]
    ProtocolViolation(String),

    #[error("ping liveness timeout: {0} pings in flight with no reply")]
    Timeout(u32),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server rejected the connection: {0:?}")]
    Rejected(RejectPayload),

    #[error("server closed the data channel")]
    ServerClosed,
}
