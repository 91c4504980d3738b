//! A transport-agnostic client-side implementation of the Mumble voice-chat
//! protocol's state machine.
//!
//! This crate owns none of the I/O: it has no socket, no TLS, no background
//! task, and no opinion about which audio codec library you link. You decode
//! bytes into [`messages::ServerControl`]/[`voice_packet::VoicePacket`] and
//! feed them to a [`client::Client`]; the client hands back typed
//! [`ClientControl`](messages::ClientControl) messages and
//! [`VoicePacket`](voice_packet::VoicePacket)s to send, and
//! [`event::Event`]s describing everything that changed. Driving the
//! suspension points — waiting on a socket, waiting on a timer — is entirely
//! up to the embedder.

pub mod bandwidth;
pub mod client;
pub mod codec_adapter;
pub mod config;
pub mod error;
pub mod event;
pub mod messages;
pub mod model;
pub mod ping;
pub mod reassembly;
pub mod sink;
pub mod types;
pub mod voice_packet;

pub use client::{Client, ConnectionState};
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError, UsageError};
pub use event::{DisconnectReason, Event, Observer};
