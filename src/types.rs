//! Primitive identifiers and small closed enums shared across the crate.

use serde::{Deserialize, Serialize};

/// Transient, server-assigned identifier for a connected user.
///
/// Distinct from [`crate::model::User::unique_id`], which identifies a
/// *registered* account and survives reconnects.
pub type SessionId = u32;

/// Stable identifier for a channel. `0` is always the root channel.
pub type ChannelId = u32;

/// Addressing mode for outgoing/incoming voice.
///
/// The wire representation is an integer 0..31: 0 is normal speech, 1..30
/// are server-defined whisper/shout target groups, 31 is loopback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceTarget {
    Normal,
    Shout(u8),
    Whisper(u8),
    Loopback,
}

impl VoiceTarget {
    /// Decode the incoming packet's `target` byte (0..31).
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => VoiceTarget::Normal,
            31 => VoiceTarget::Loopback,
            n if n % 2 == 0 => VoiceTarget::Shout(n),
            n => VoiceTarget::Whisper(n),
        }
    }

    /// Encode as the outgoing packet's `mode` byte (0..31).
    pub fn to_wire(self) -> u8 {
        match self {
            VoiceTarget::Normal => 0,
            VoiceTarget::Loopback => 31,
            VoiceTarget::Shout(n) | VoiceTarget::Whisper(n) => n,
        }
    }
}

/// Audio codec tag carried on each voice packet, numbered per Mumble's wire
/// protocol so adapters can dispatch on it without a translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CodecKind {
    CeltAlpha = 0,
    CeltBeta = 1,
    Speex = 2,
    Opus = 4,
}

impl CodecKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(CodecKind::CeltAlpha),
            1 => Some(CodecKind::CeltBeta),
            2 => Some(CodecKind::Speex),
            4 => Some(CodecKind::Opus),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Reason a server refused a connection, per the closed set the Mumble wire
/// protocol defines for `Reject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectType {
    None,
    WrongVersion,
    InvalidUsername,
    WrongUserPassword,
    WrongServerPassword,
    UsernameInUse,
    ServerFull,
    NoCertificate,
    AuthenticatorFail,
}

/// Payload of a `Reject` message: a reason code plus the server's free-text
/// explanation.
#[derive(Debug, Clone)]
pub struct RejectPayload {
    pub reason_type: RejectType,
    pub reason: Option<String>,
}

/// The closed set of `PermissionDenied` kinds, each with its own parameters
/// populated according to which kind it is.
#[derive(Debug, Clone)]
pub enum PermissionDenied {
    Text { reason: String },
    Permission { session: SessionId, channel_id: ChannelId, permission: u32 },
    SuperUser,
    ChannelName { name: String },
    TextTooLong,
    TemporaryChannel,
    MissingCertificate { session: SessionId },
    UserName { name: String },
    ChannelFull,
    NestingLimit,
}

/// Three-dimensional positional-audio coordinate, as carried on voice
/// packets and outgoing PCM chunks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
