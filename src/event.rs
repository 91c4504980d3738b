//! The event surface: everything the dispatcher can report back to an
//! embedder. `Client` never calls into application code directly — it hands
//! `Event`s to an [`Observer`], mirroring the sink-based push model used for
//! voice frames.

use crate::error::ClientError;
use crate::messages::{ChannelStateFields, RttSummary, UserStateFields};
use crate::types::{ChannelId, PermissionDenied, RejectPayload, SessionId};

/// Why the connection ended.
#[derive(Debug, Clone)]
pub enum DisconnectReason {
    /// The embedder called [`crate::client::Client::disconnect`].
    Local,
    /// The server closed the data channel without a `Reject`.
    ServerClosed,
    /// A [`ClientError`] occurred and the client tore the connection down.
    Error(ClientError),
}

/// One reported occurrence. `Client` never blocks waiting for a response to
/// an event — delivery is fire-and-forget, matching the rest of the crate's
/// sans-IO design.
#[derive(Debug)]
pub enum Event {
    /// `ServerSync` arrived; the handshake is complete and the session is
    /// live.
    Connected { session_id: SessionId, welcome_text: Option<String> },
    /// The server sent `Reject` before completing the handshake.
    Rejected(RejectPayload),
    /// The connection ended, for any reason.
    Disconnected(DisconnectReason),
    /// A previously-unseen channel id appeared.
    NewChannel(ChannelId),
    /// An existing channel's state changed; `changes` carries every field the
    /// triggering `ChannelState` had present, even when a value is
    /// re-asserted unchanged.
    ChannelUpdated { channel_id: ChannelId, changes: ChannelStateFields },
    ChannelRemoved(ChannelId),
    /// A previously-unseen session id appeared.
    NewUser(SessionId),
    /// An existing user's state changed (including a channel move); `changes`
    /// carries every field the triggering `UserState` had present.
    UserUpdated { session: SessionId, actor: Option<SessionId>, changes: UserStateFields },
    UserRemoved { session: SessionId, actor: Option<SessionId>, reason: Option<String>, ban: bool },
    /// A `PermissionDenied` the dispatcher could parse into a known kind.
    Denied(PermissionDenied),
    /// An incoming text message, with every addressed target list the
    /// server sent: direct recipients, destination channels, and channel
    /// subtrees.
    Message {
        actor: Option<SessionId>,
        to_users: Vec<SessionId>,
        to_channels: Vec<ChannelId>,
        to_trees: Vec<ChannelId>,
        text: String,
    },
    /// A new voice transmission started from this user; decoded audio itself
    /// arrives through the [`crate::codec_adapter::DecodedFrameSink`] the
    /// embedder's `CodecAdapter` configured, this event is only the "one
    /// started" notice.
    Voice(SessionId),
    /// A periodic liveness ping round-tripped; carries the freshest RTT
    /// summaries.
    DataPing { data_rtt: Option<RttSummary>, voice_rtt: Option<RttSummary> },
    /// A voice packet arrived tagged with a codec this client has no adapter
    /// support for.
    UnknownCodec { session: SessionId, codec_tag: u8 },
    /// A recoverable-looking protocol anomaly that did not by itself merit a
    /// disconnect (e.g. an `Unknown` control message tag).
    Anomaly(String),
    /// A [`ClientError`] occurred; always immediately followed by a
    /// [`Event::Disconnected`].
    Error(ClientError),
}

/// Receives [`Event`]s as the dispatcher produces them.
///
/// Implementors typically forward to a channel, a GUI event loop, or (in
/// tests) an in-memory recorder.
pub trait Observer: Send {
    fn on_event(&mut self, event: Event);
}

/// An [`Observer`] that discards every event. Useful when an embedder only
/// cares about voice frames and drives polling itself.
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_event(&mut self, _event: Event) {}
}
