//! Typed control-message surface
//!
//! Serialization to/from the Mumble wire format is an external collaborator:
//! this crate only defines the shapes the dispatcher consumes and produces.
//! An embedder plugs in whatever decodes server bytes into [`ServerControl`]
//! and encodes [`ClientControl`] back into bytes.

use crate::types::{ChannelId, PermissionDenied, RejectPayload, SessionId};
use crate::voice_packet::VoicePacket;

/// One incoming, already-decoded control message. `Unknown` is the catch-all
/// an external codec produces for a tag it doesn't recognize — the
/// dispatcher logs and ignores it rather than failing.
#[derive(Debug, Clone)]
pub enum ServerControl {
    Version {
        version: u32,
        release: Option<String>,
        os: Option<String>,
        os_version: Option<String>,
    },
    UdpTunnel {
        packet: VoicePacket,
    },
    ChannelState(ChannelStateFields),
    ChannelRemove {
        channel_id: ChannelId,
    },
    UserState(UserStateFields),
    UserRemove {
        session: SessionId,
        actor: Option<SessionId>,
        reason: Option<String>,
        ban: bool,
    },
    ServerSync {
        session: SessionId,
        max_bandwidth: Option<u32>,
        welcome_text: Option<String>,
    },
    Ping {
        timestamp: u64,
    },
    Reject(RejectPayload),
    TextMessage {
        actor: Option<SessionId>,
        session: Vec<SessionId>,
        channel_id: Vec<ChannelId>,
        tree_id: Vec<ChannelId>,
        message: String,
    },
    PermissionDenied(PermissionDenied),
    Unknown {
        tag: String,
    },
}

/// Fields present on an incoming `ChannelState`. Every field is `Option`
/// because the server only sends what changed (except the first message for
/// a new id, where absence means "use the default"); the dispatcher reports
/// *presence*, not *difference from the prior value* — re-asserting the
/// same value is still a reportable update.
#[derive(Debug, Clone, Default)]
pub struct ChannelStateFields {
    pub channel_id: ChannelId,
    pub parent: Option<ChannelId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub description_hash: Option<Vec<u8>>,
    pub temporary: Option<bool>,
    pub position: Option<i32>,
    pub max_users: Option<u32>,
    /// `Some(..)` replaces the link set entirely.
    pub links: Option<Vec<ChannelId>>,
    pub links_add: Vec<ChannelId>,
    pub links_remove: Vec<ChannelId>,
}

/// Fields present on an incoming `UserState`.
#[derive(Debug, Clone, Default)]
pub struct UserStateFields {
    pub session: SessionId,
    pub actor: Option<SessionId>,
    pub name: Option<String>,
    pub unique_id: Option<String>,
    pub channel_id: Option<ChannelId>,
    pub mute: Option<bool>,
    pub deaf: Option<bool>,
    pub suppress: Option<bool>,
    pub self_mute: Option<bool>,
    pub self_deaf: Option<bool>,
    pub texture: Option<Vec<u8>>,
    pub texture_hash: Option<Vec<u8>>,
    pub comment: Option<String>,
    pub comment_hash: Option<Vec<u8>>,
    pub priority_speaker: Option<bool>,
    pub recording: Option<bool>,
    pub cert_hash: Option<String>,
}

/// One outgoing control message, built by a `Client` command and handed to
/// the caller-supplied control sink for encoding and transmission.
#[derive(Debug, Clone)]
pub enum ClientControl {
    Version {
        version: u32,
        release: String,
        os: String,
        os_version: String,
    },
    Authenticate {
        username: String,
        password: Option<String>,
        tokens: Vec<String>,
        celt_versions: Vec<u32>,
        opus: bool,
    },
    Ping {
        timestamp: u64,
        data_rtt: Option<RttSummary>,
        voice_rtt: Option<RttSummary>,
    },
    UserState(UserStateUpdate),
    ChannelState(ChannelStateUpdate),
    ChannelRemove {
        channel_id: ChannelId,
    },
    /// Kick/ban a user (server validates permission).
    UserRemove {
        session: SessionId,
        reason: Option<String>,
        ban: bool,
    },
    TextMessage {
        session: Vec<SessionId>,
        channel_id: Vec<ChannelId>,
        tree_id: Vec<ChannelId>,
        message: String,
    },
    RequestBlob {
        session_texture: Vec<SessionId>,
        session_comment: Vec<SessionId>,
        channel_description: Vec<ChannelId>,
    },
    UdpTunnel {
        packet: VoicePacket,
    },
}

/// `(count, mean, variance)` as fed by the incremental RTT estimator
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttSummary {
    pub count: u64,
    pub mean_ms: f64,
    pub variance_ms2: f64,
}

/// An outgoing `UserState`. All fields optional; only the ones set are sent.
/// `session` is `None` when setting our own state.
#[derive(Debug, Clone, Default)]
pub struct UserStateUpdate {
    pub session: Option<SessionId>,
    pub channel_id: Option<ChannelId>,
    pub self_mute: Option<bool>,
    pub self_deaf: Option<bool>,
    pub mute: Option<bool>,
    pub deaf: Option<bool>,
    pub suppress: Option<bool>,
    pub texture: Option<Vec<u8>>,
    pub comment: Option<String>,
    pub plugin_context: Option<Vec<u8>>,
    pub plugin_identity: Option<String>,
    pub priority_speaker: Option<bool>,
    pub recording: Option<bool>,
}

/// An outgoing `ChannelState`. `channel_id: None` requests creation of a new
/// channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelStateUpdate {
    pub channel_id: Option<ChannelId>,
    pub parent: Option<ChannelId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub max_users: Option<u32>,
    pub temporary: Option<bool>,
    pub links_add: Vec<ChannelId>,
    pub links_remove: Vec<ChannelId>,
}
