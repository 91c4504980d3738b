use crate::messages::UserStateFields;
use crate::reassembly::VoiceReassembly;
use crate::types::{ChannelId, SessionId};

/// A connected user, as seen through the stream of `UserState` updates
/// Read-only from the outside; see the module doc comment.
pub struct User {
    session_id: SessionId,
    name: String,
    unique_id: Option<String>,
    channel_id: ChannelId,
    mute: bool,
    deaf: bool,
    suppress: bool,
    self_mute: bool,
    self_deaf: bool,
    priority_speaker: bool,
    recording: bool,
    texture: Option<Vec<u8>>,
    texture_hash: Option<Vec<u8>>,
    comment: Option<String>,
    comment_hash: Option<Vec<u8>>,
    cert_hash: Option<String>,
    /// Set once a `RequestBlob` for the texture is outstanding, so the
    /// dispatcher doesn't re-request on every `texture_hash`-only update.
    texture_requested: bool,
    comment_requested: bool,
    /// Transient per-user voice state; not part of the server-visible model,
    /// but owned here since it is keyed by the same session id.
    pub(crate) voice: VoiceReassembly,
}

impl User {
    /// Build a new user from the first `UserState` the server sends for a
    /// session id. An absent `channel_id` on this first message defaults to
    /// the root channel (`0`), unlike subsequent updates where absence means
    /// "unchanged".
    pub(crate) fn from_initial_state(fields: &UserStateFields) -> Self {
        let mut user = User {
            session_id: fields.session,
            name: fields.name.clone().unwrap_or_default(),
            unique_id: fields.unique_id.clone(),
            channel_id: fields.channel_id.unwrap_or(0),
            mute: fields.mute.unwrap_or(false),
            deaf: fields.deaf.unwrap_or(false),
            suppress: fields.suppress.unwrap_or(false),
            self_mute: fields.self_mute.unwrap_or(false),
            self_deaf: fields.self_deaf.unwrap_or(false),
            priority_speaker: fields.priority_speaker.unwrap_or(false),
            recording: fields.recording.unwrap_or(false),
            texture: fields.texture.clone(),
            texture_hash: fields.texture_hash.clone(),
            comment: fields.comment.clone(),
            comment_hash: fields.comment_hash.clone(),
            cert_hash: fields.cert_hash.clone(),
            texture_requested: false,
            comment_requested: false,
            voice: VoiceReassembly::new(),
        };
        user.apply_update(fields);
        user
    }

    /// Apply a subsequent `UserState`'s present fields; each present field
    /// overwrites the prior value, absent fields are left untouched.
    pub(crate) fn apply_update(&mut self, fields: &UserStateFields) {
        if let Some(name) = &fields.name {
            self.name = name.clone();
        }
        if let Some(unique_id) = &fields.unique_id {
            self.unique_id = Some(unique_id.clone());
        }
        if let Some(channel_id) = fields.channel_id {
            self.channel_id = channel_id;
        }
        if let Some(mute) = fields.mute {
            self.mute = mute;
        }
        if let Some(deaf) = fields.deaf {
            self.deaf = deaf;
        }
        if let Some(suppress) = fields.suppress {
            self.suppress = suppress;
        }
        if let Some(self_mute) = fields.self_mute {
            self.self_mute = self_mute;
        }
        if let Some(self_deaf) = fields.self_deaf {
            self.self_deaf = self_deaf;
        }
        if let Some(priority_speaker) = fields.priority_speaker {
            self.priority_speaker = priority_speaker;
        }
        if let Some(recording) = fields.recording {
            self.recording = recording;
        }
        if let Some(texture) = &fields.texture {
            self.texture = Some(texture.clone());
            self.texture_requested = false;
        }
        if let Some(texture_hash) = &fields.texture_hash {
            self.texture_hash = Some(texture_hash.clone());
            self.texture_requested = false;
        }
        if let Some(comment) = &fields.comment {
            self.comment = Some(comment.clone());
            self.comment_requested = false;
        }
        if let Some(comment_hash) = &fields.comment_hash {
            self.comment_hash = Some(comment_hash.clone());
            self.comment_requested = false;
        }
        if let Some(cert_hash) = &fields.cert_hash {
            self.cert_hash = Some(cert_hash.clone());
        }
    }

    pub(crate) fn mark_texture_requested(&mut self) {
        self.texture_requested = true;
    }

    pub(crate) fn mark_comment_requested(&mut self) {
        self.comment_requested = true;
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    pub fn is_deafened(&self) -> bool {
        self.deaf
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress
    }

    pub fn is_self_muted(&self) -> bool {
        self.self_mute
    }

    pub fn is_self_deafened(&self) -> bool {
        self.self_deaf
    }

    /// Whether this user is currently incapable of transmitting, for any
    /// reason the server or the user themselves imposed.
    pub fn is_silenced(&self) -> bool {
        self.mute || self.suppress || self.self_mute
    }

    pub fn is_priority_speaker(&self) -> bool {
        self.priority_speaker
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn texture(&self) -> Option<&[u8]> {
        self.texture.as_deref()
    }

    pub fn texture_hash(&self) -> Option<&[u8]> {
        self.texture_hash.as_deref()
    }

    /// Has a texture hash with no matching blob, so a `RequestBlob` would be
    /// useful (and hasn't already been sent).
    pub fn needs_texture_blob(&self) -> bool {
        self.texture_hash.is_some() && self.texture.is_none() && !self.texture_requested
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn comment_hash(&self) -> Option<&[u8]> {
        self.comment_hash.as_deref()
    }

    pub fn needs_comment_blob(&self) -> bool {
        self.comment_hash.is_some() && self.comment.is_none() && !self.comment_requested
    }

    pub fn cert_hash(&self) -> Option<&str> {
        self.cert_hash.as_deref()
    }

    /// Whether a voice transmission from this user is currently in progress
    ///
    pub fn is_transmitting(&self) -> bool {
        self.voice.is_active()
    }
}
