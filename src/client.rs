//! The dispatcher: the central state machine that owns the world model,
//! drives the handshake, and routes every incoming message and timer tick.
//!
//! `Client` does no I/O and spawns no tasks. It is a cheap-to-clone handle
//! (`Arc<Mutex<ClientInner>>`, the same shared-state shape used throughout
//! this codebase's connection handles) around the actual state; the caller
//! drives it by handing over decoded messages, voice packets, and the
//! current time.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::bandwidth;
use crate::codec_adapter::CodecAdapter;
use crate::config::ClientConfig;
use crate::error::{ClientError, UsageError};
use crate::event::{DisconnectReason, Event, Observer};
use crate::messages::{ClientControl, ServerControl, UserStateUpdate, ChannelStateUpdate};
use crate::model::{Channel, User};
use crate::ping::{PingScheduler, PingTick};
use crate::sink::{ControlSink, PcmSink, VoiceOutputStream, VoiceSink, VoiceTransmit};
use crate::types::{ChannelId, CodecKind, SessionId, VoiceTarget};
use crate::voice_packet::VoicePacket;

/// Wire version this client advertises in the handshake's `Version` message
/// (Mumble 1.3.0, packed as `(major << 16) | (minor << 8) | patch`).
const PROTOCOL_VERSION: u32 = 0x0001_0300;

/// Coarse connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, no data channel attached yet.
    New,
    /// Data channel attached; `Version`/`Authenticate` sent, awaiting
    /// `ServerSync` or `Reject`.
    Authenticating,
    /// `ServerSync` received; the session is live.
    Connected,
    /// Torn down, for any reason. Terminal — a `Client` is not reusable
    /// past this point.
    Disconnected,
}

struct ClientInner {
    config: ClientConfig,
    state: ConnectionState,
    own_session: Option<SessionId>,
    max_bandwidth: Option<u32>,
    channels: HashMap<ChannelId, Channel>,
    users: HashMap<SessionId, User>,
    control: Option<Box<dyn ControlSink>>,
    voice: Option<Box<dyn VoiceSink>>,
    ping: PingScheduler,
    pending_pings: VecDeque<(u64, Instant)>,
    next_ping_token: u64,
    observer: Box<dyn Observer>,
}

impl ClientInner {
    fn control_or_warn(&mut self, message: ClientControl) {
        match self.control.as_mut() {
            Some(sink) => sink.send(message),
            None => tracing::warn!("dropping outgoing control message: no data channel attached"),
        }
    }

    fn transmit_voice_packet(&mut self, packet: VoicePacket) {
        if let Some(voice) = self.voice.as_mut() {
            voice.send(packet);
        } else {
            self.control_or_warn(ClientControl::UdpTunnel { packet });
        }
    }

    fn emit(&mut self, event: Event) {
        self.observer.on_event(event);
    }

    fn disconnect_locked(&mut self, reason: DisconnectReason) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.state = ConnectionState::Disconnected;
        self.control = None;
        self.voice = None;
        self.ping.stop();
        self.emit(Event::Disconnected(reason));
    }

    fn upsert_channel(&mut self, fields: crate::messages::ChannelStateFields) {
        let id = fields.channel_id;
        for &other_id in &fields.links_remove {
            if let Some(other) = self.channels.get_mut(&other_id) {
                other.remove_link(id);
            }
        }
        if let Some(channel) = self.channels.get_mut(&id) {
            let old_parent = channel.parent();
            channel.apply_update(&fields);
            let new_parent = channel.parent();
            if old_parent != new_parent {
                if let Some(old) = old_parent.and_then(|p| self.channels.get_mut(&p)) {
                    old.remove_child(id);
                }
                if let Some(new) = new_parent.and_then(|p| self.channels.get_mut(&p)) {
                    new.add_child(id);
                }
            }
            self.emit(Event::ChannelUpdated { channel_id: id, changes: fields });
        } else {
            let channel = Channel::from_initial_state(&fields);
            let parent = channel.parent();
            self.channels.insert(id, channel);
            if let Some(parent) = parent.and_then(|p| self.channels.get_mut(&p)) {
                parent.add_child(id);
            }
            self.emit(Event::NewChannel(id));
        }
    }

    fn remove_channel(&mut self, channel_id: ChannelId) {
        if let Some(channel) = self.channels.remove(&channel_id) {
            if let Some(parent) = channel.parent().and_then(|p| self.channels.get_mut(&p)) {
                parent.remove_child(channel_id);
            }
            self.emit(Event::ChannelRemoved(channel_id));
        }
    }

    fn upsert_user(&mut self, fields: crate::messages::UserStateFields) {
        let session = fields.session;
        if let Some(user) = self.users.get_mut(&session) {
            let old_channel = user.channel_id();
            user.apply_update(&fields);
            let new_channel = user.channel_id();
            if old_channel != new_channel {
                if let Some(old) = self.channels.get_mut(&old_channel) {
                    old.remove_user(session);
                }
                if let Some(new) = self.channels.get_mut(&new_channel) {
                    new.add_user(session);
                }
            }
            let actor = fields.actor;
            self.emit(Event::UserUpdated { session, actor, changes: fields });
        } else {
            let user = User::from_initial_state(&fields);
            let channel_id = user.channel_id();
            self.users.insert(session, user);
            if let Some(channel) = self.channels.get_mut(&channel_id) {
                channel.add_user(session);
            }
            self.emit(Event::NewUser(session));
        }
    }

    fn remove_user(&mut self, session: SessionId, actor: Option<SessionId>, reason: Option<String>, ban: bool) {
        if let Some(user) = self.users.remove(&session) {
            if let Some(channel) = self.channels.get_mut(&user.channel_id()) {
                channel.remove_user(session);
            }
        }
        let is_self = self.own_session == Some(session);
        self.emit(Event::UserRemoved { session, actor, reason, ban });
        if is_self {
            self.disconnect_locked(DisconnectReason::ServerClosed);
        }
    }

    fn send_ping(&mut self, now: Instant) {
        let token = self.next_ping_token;
        self.next_ping_token += 1;
        self.pending_pings.push_back((token, now));
        let data_rtt = self.ping.data_rtt.summary();
        let voice_rtt = self.ping.voice_rtt.summary();
        self.control_or_warn(ClientControl::Ping { timestamp: token, data_rtt, voice_rtt });
    }

    fn on_ping_reply(&mut self, timestamp: u64, now: Instant) {
        if let Some(index) = self.pending_pings.iter().position(|(t, _)| *t == timestamp) {
            let (_, sent_at) = self.pending_pings.remove(index).unwrap();
            let rtt_ms = now.saturating_duration_since(sent_at).as_secs_f64() * 1000.0;
            if self.ping.on_reply(rtt_ms) {
                let data_rtt = self.ping.data_rtt.summary();
                let voice_rtt = self.ping.voice_rtt.summary();
                self.emit(Event::DataPing { data_rtt, voice_rtt });
            }
        } else {
            tracing::debug!(timestamp, "ping reply did not match any outstanding request");
        }
    }
}

/// A cheap-to-clone handle onto one Mumble connection's client-side state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Mutex<ClientInner>>,
}

impl Client {
    pub fn new(config: ClientConfig, observer: Box<dyn Observer>) -> Self {
        let ping = PingScheduler::new(config.data_ping_interval, config.max_in_flight_data_pings);
        let inner = ClientInner {
            config,
            state: ConnectionState::New,
            own_session: None,
            max_bandwidth: None,
            channels: HashMap::new(),
            users: HashMap::new(),
            control: None,
            voice: None,
            ping,
            pending_pings: VecDeque::new(),
            next_ping_token: 0,
            observer,
        };
        Self { inner: Arc::new(Mutex::new(inner)) }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().unwrap().state
    }

    pub fn own_session(&self) -> Option<SessionId> {
        self.inner.lock().unwrap().own_session
    }

    /// Attach the control (data) channel and kick off the handshake by
    /// sending `Version` followed by `Authenticate`
    pub fn attach_data_channel(&self, mut sink: Box<dyn ControlSink>) -> Result<(), UsageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.control.is_some() {
            return Err(UsageError::AlreadyConnected);
        }
        sink.send(ClientControl::Version {
            version: PROTOCOL_VERSION,
            release: inner.config.client_software.clone(),
            os: inner.config.os_name.clone(),
            os_version: inner.config.os_version.clone(),
        });
        let adapter = inner.config.codecs.clone();
        sink.send(ClientControl::Authenticate {
            username: inner.config.username.clone(),
            password: inner.config.password.clone(),
            tokens: inner.config.tokens.clone(),
            celt_versions: adapter.as_ref().map(|a| a.celt_versions()).unwrap_or_default(),
            opus: adapter.as_ref().map(|a| a.opus()).unwrap_or(false),
        });
        inner.control = Some(sink);
        inner.state = ConnectionState::Authenticating;
        Ok(())
    }

    /// Attach a dedicated voice-packet channel. Without one, outgoing voice
    /// is tunneled through the control channel and incoming voice must
    /// arrive via [`Client::handle_voice_packet`] from whatever channel the
    /// caller decoded it from.
    pub fn attach_voice_channel(&self, sink: Box<dyn VoiceSink>) -> Result<(), UsageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.voice.is_some() {
            return Err(UsageError::AlreadyConnected);
        }
        inner.voice = Some(sink);
        Ok(())
    }

    /// Feed one decoded control message into the dispatcher.
    pub fn dispatch(&self, message: ServerControl, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        match message {
            ServerControl::Version { .. } => {
                tracing::trace!("received server Version");
            }
            ServerControl::UdpTunnel { packet } => {
                drop(inner);
                self.handle_voice_packet(packet, now);
            }
            ServerControl::ChannelState(fields) => inner.upsert_channel(fields),
            ServerControl::ChannelRemove { channel_id } => inner.remove_channel(channel_id),
            ServerControl::UserState(fields) => inner.upsert_user(fields),
            ServerControl::UserRemove { session, actor, reason, ban } => {
                inner.remove_user(session, actor, reason, ban)
            }
            ServerControl::ServerSync { session, max_bandwidth, welcome_text } => {
                inner.own_session = Some(session);
                inner.max_bandwidth = max_bandwidth;
                inner.state = ConnectionState::Connected;
                inner.ping.start(now);
                inner.emit(Event::Connected { session_id: session, welcome_text });
            }
            ServerControl::Ping { timestamp } => inner.on_ping_reply(timestamp, now),
            ServerControl::Reject(payload) => {
                inner.emit(Event::Rejected(payload.clone()));
                inner.disconnect_locked(DisconnectReason::Error(ClientError::Rejected(payload)));
            }
            ServerControl::TextMessage { actor, session, channel_id, tree_id, message } => {
                inner.emit(Event::Message {
                    actor,
                    to_users: session,
                    to_channels: channel_id,
                    to_trees: tree_id,
                    text: message,
                });
            }
            ServerControl::PermissionDenied(denied) => inner.emit(Event::Denied(denied)),
            ServerControl::Unknown { tag } => {
                tracing::debug!(tag = %tag, "ignoring unrecognized control message");
                inner.emit(Event::Anomaly(format!("unknown control message tag: {tag}")));
            }
        }
    }

    /// Feed one voice packet (from either the tunneled or dedicated voice
    /// path) into the reassembly engine for its source user.
    pub fn handle_voice_packet(&self, packet: VoicePacket, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        let session = packet.source;
        let adapter = inner.config.codecs.clone();

        if let Some(adapter) = &adapter {
            let supported = match packet.codec {
                CodecKind::Opus => adapter.opus(),
                CodecKind::CeltAlpha | CodecKind::CeltBeta => !adapter.celt_versions().is_empty(),
                CodecKind::Speex => false,
            };
            if !supported {
                inner.emit(Event::UnknownCodec { session, codec_tag: packet.codec.tag() });
                return;
            }
        }

        let timeout = inner.config.user_voice_timeout;
        let Some(user) = inner.users.get_mut(&session) else {
            tracing::debug!(session, "voice packet from unknown session, dropping");
            return;
        };
        let started = user.voice.handle_packet(session, &packet, adapter.as_ref(), timeout, now);
        if started {
            inner.emit(Event::Voice(session));
        }
    }

    /// Advance every timer: per-user voice idle timeouts and the liveness
    /// ping scheduler. The caller is responsible for calling this often
    /// enough relative to [`crate::config::ClientConfig::user_voice_timeout`]
    /// and `data_ping_interval` for both to behave usefully.
    pub fn poll_timers(&self, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != ConnectionState::Connected {
            return;
        }

        let sessions: Vec<SessionId> = inner.users.keys().copied().collect();
        for session in sessions {
            if let Some(user) = inner.users.get_mut(&session) {
                user.voice.poll_idle(session, now);
            }
        }

        match inner.ping.poll(now) {
            PingTick::Idle => {}
            PingTick::Send => inner.send_ping(now),
            PingTick::Timeout => {
                let in_flight = inner.ping.in_flight();
                inner.emit(Event::Error(ClientError::Timeout(in_flight)));
                inner.disconnect_locked(DisconnectReason::Error(ClientError::Timeout(in_flight)));
            }
        }
    }

    /// Set our own mute state. Does not imply deafen
    pub fn set_self_mute(&self, muted: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::UserState(UserStateUpdate {
            self_mute: Some(muted),
            ..Default::default()
        }));
    }

    /// Set our own deafen state. Deafening implies muting, mirroring the
    /// coupling every Mumble client UI enforces client-side (you cannot
    /// transmit while deaf).
    pub fn set_self_deaf(&self, deafened: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::UserState(UserStateUpdate {
            self_deaf: Some(deafened),
            self_mute: if deafened { Some(true) } else { None },
            ..Default::default()
        }));
    }

    pub fn set_comment(&self, comment: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::UserState(UserStateUpdate {
            comment: Some(comment.into()),
            ..Default::default()
        }));
    }

    pub fn join_channel(&self, channel_id: ChannelId) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::UserState(UserStateUpdate {
            channel_id: Some(channel_id),
            ..Default::default()
        }));
    }

    /// Ask a different user's attributes to be changed (requires server
    /// permission; a disallowed request comes back as
    /// [`crate::event::Event::Denied`]).
    pub fn set_user_mute(&self, session: SessionId, muted: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::UserState(UserStateUpdate {
            session: Some(session),
            mute: Some(muted),
            ..Default::default()
        }));
    }

    pub fn create_channel(&self, parent: ChannelId, name: impl Into<String>, temporary: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::ChannelState(ChannelStateUpdate {
            channel_id: None,
            parent: Some(parent),
            name: Some(name.into()),
            temporary: Some(temporary),
            ..Default::default()
        }));
    }

    pub fn rename_channel(&self, channel_id: ChannelId, name: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::ChannelState(ChannelStateUpdate {
            channel_id: Some(channel_id),
            name: Some(name.into()),
            ..Default::default()
        }));
    }

    pub fn remove_channel(&self, channel_id: ChannelId) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::ChannelRemove { channel_id });
    }

    pub fn kick_user(&self, session: SessionId, reason: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::UserRemove {
            session,
            reason: Some(reason.into()),
            ban: false,
        });
    }

    pub fn ban_user(&self, session: SessionId, reason: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::UserRemove {
            session,
            reason: Some(reason.into()),
            ban: true,
        });
    }

    pub fn send_text_message(&self, channel_id: Vec<ChannelId>, text: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.control_or_warn(ClientControl::TextMessage {
            session: Vec::new(),
            channel_id,
            tree_id: Vec::new(),
            message: text.into(),
        });
    }

    pub fn request_user_texture(&self, session: SessionId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&session) {
            user.mark_texture_requested();
        }
        inner.control_or_warn(ClientControl::RequestBlob {
            session_texture: vec![session],
            session_comment: Vec::new(),
            channel_description: Vec::new(),
        });
    }

    pub fn request_user_comment(&self, session: SessionId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&session) {
            user.mark_comment_requested();
        }
        inner.control_or_warn(ClientControl::RequestBlob {
            session_texture: Vec::new(),
            session_comment: vec![session],
            channel_description: Vec::new(),
        });
    }

    pub fn request_channel_description(&self, channel_id: ChannelId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(channel) = inner.channels.get_mut(&channel_id) {
            channel.mark_description_requested();
        }
        inner.control_or_warn(ClientControl::RequestBlob {
            session_texture: Vec::new(),
            session_comment: Vec::new(),
            channel_description: vec![channel_id],
        });
    }

    /// Create an outgoing voice stream. Returns [`UsageError::NoCodecAdapter`]
    /// if the client was configured without one
    pub fn create_voice_stream(
        &self,
        target: VoiceTarget,
        codec: CodecKind,
    ) -> Result<Box<dyn PcmSink>, UsageError> {
        let mut inner = self.inner.lock().unwrap();
        let adapter = inner.config.codecs.clone().ok_or(UsageError::NoCodecAdapter)?;

        let max_bandwidth = inner.max_bandwidth.unwrap_or(u32::MAX);
        let bitrate = bandwidth::actual_bitrate(inner.config.preferred_bitrate, max_bandwidth, 480, false);
        tracing::debug!(bitrate, "opened outgoing voice stream");

        let encoder = adapter.create_encoder_sink(codec, bitrate);
        let transmit: Box<dyn VoiceTransmit> = Box::new(HandleVoiceTransmit(self.inner.clone()));
        Ok(Box::new(VoiceOutputStream::new(transmit, encoder, codec, target)))
    }

    /// Idempotent: tears down both channels and the ping scheduler, and
    /// reports [`crate::event::DisconnectReason::Local`] exactly once.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.disconnect_locked(DisconnectReason::Local);
    }
}

struct HandleVoiceTransmit(Arc<Mutex<ClientInner>>);

impl VoiceTransmit for HandleVoiceTransmit {
    fn transmit(&mut self, packet: VoicePacket) {
        self.0.lock().unwrap().transmit_voice_packet(packet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ChannelStateFields, UserStateFields};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingControl(Arc<StdMutex<Vec<ClientControl>>>);
    impl ControlSink for RecordingControl {
        fn send(&mut self, message: ClientControl) {
            self.0.lock().unwrap().push(message);
        }
    }

    #[derive(Default)]
    struct RecordingObserver(Arc<StdMutex<Vec<String>>>);
    impl Observer for RecordingObserver {
        fn on_event(&mut self, event: Event) {
            self.0.lock().unwrap().push(format!("{event:?}"));
        }
    }

    fn client_with_recorders() -> (Client, Arc<StdMutex<Vec<ClientControl>>>, Arc<StdMutex<Vec<String>>>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let events = Arc::new(StdMutex::new(Vec::new()));
        let config = ClientConfig::new("tester").unwrap();
        let client = Client::new(config, Box::new(RecordingObserver(events.clone())));
        client.attach_data_channel(Box::new(RecordingControl(sent.clone()))).unwrap();
        (client, sent, events)
    }

    #[test]
    fn attaching_sends_version_then_authenticate() {
        let (_client, sent, _events) = client_with_recorders();
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], ClientControl::Version { .. }));
        assert!(matches!(sent[1], ClientControl::Authenticate { .. }));
    }

    #[test]
    fn double_attach_is_rejected() {
        let (client, sent, _events) = client_with_recorders();
        let err = client.attach_data_channel(Box::new(RecordingControl(sent))).unwrap_err();
        assert!(matches!(err, UsageError::AlreadyConnected));
    }

    #[test]
    fn server_sync_transitions_to_connected() {
        let (client, _sent, _events) = client_with_recorders();
        assert_eq!(client.state(), ConnectionState::Authenticating);
        client.dispatch(
            ServerControl::ServerSync { session: 7, max_bandwidth: Some(72_000), welcome_text: None },
            Instant::now(),
        );
        assert_eq!(client.state(), ConnectionState::Connected);
        assert_eq!(client.own_session(), Some(7));
    }

    #[test]
    fn new_channel_then_rename_emits_new_then_update() {
        let (client, _sent, events) = client_with_recorders();
        client.dispatch(
            ServerControl::ChannelState(ChannelStateFields { channel_id: 1, name: Some("a".into()), ..Default::default() }),
            Instant::now(),
        );
        client.dispatch(
            ServerControl::ChannelState(ChannelStateFields { channel_id: 1, name: Some("b".into()), ..Default::default() }),
            Instant::now(),
        );
        let events = events.lock().unwrap();
        assert!(events[0].contains("NewChannel"));
        assert!(events[1].contains("ChannelUpdated"));
    }

    #[test]
    fn user_removal_does_not_affect_other_users() {
        let (client, _sent, _events) = client_with_recorders();
        client.dispatch(
            ServerControl::UserState(UserStateFields { session: 1, name: Some("a".into()), ..Default::default() }),
            Instant::now(),
        );
        client.dispatch(
            ServerControl::UserState(UserStateFields { session: 2, name: Some("b".into()), ..Default::default() }),
            Instant::now(),
        );
        client.dispatch(
            ServerControl::UserRemove { session: 1, actor: None, reason: None, ban: false },
            Instant::now(),
        );
        let inner = client.inner.lock().unwrap();
        assert!(!inner.users.contains_key(&1));
        assert!(inner.users.contains_key(&2));
    }

    #[test]
    fn permission_denied_is_surfaced_as_an_event() {
        let (client, _sent, events) = client_with_recorders();
        client.dispatch(
            ServerControl::PermissionDenied(crate::types::PermissionDenied::SuperUser),
            Instant::now(),
        );
        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| e.contains("Denied")));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (client, _sent, events) = client_with_recorders();
        client.disconnect();
        client.disconnect();
        let events = events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| e.contains("Disconnected")).count(), 1);
    }

    #[test]
    fn links_remove_mirrors_onto_the_other_channel() {
        let (client, _sent, _events) = client_with_recorders();
        client.dispatch(
            ServerControl::ChannelState(ChannelStateFields { channel_id: 1, links_add: vec![2], ..Default::default() }),
            Instant::now(),
        );
        client.dispatch(
            ServerControl::ChannelState(ChannelStateFields { channel_id: 2, links_add: vec![1], ..Default::default() }),
            Instant::now(),
        );
        client.dispatch(
            ServerControl::ChannelState(ChannelStateFields { channel_id: 2, links_remove: vec![1], ..Default::default() }),
            Instant::now(),
        );
        let inner = client.inner.lock().unwrap();
        assert!(!inner.channels.get(&1).unwrap().is_linked_to(2));
        assert!(!inner.channels.get(&2).unwrap().is_linked_to(1));
    }

    #[test]
    fn ping_reply_feeds_stats_and_emits_data_ping() {
        let (client, _sent, events) = client_with_recorders();
        let t0 = Instant::now();
        client.dispatch(ServerControl::ServerSync { session: 1, max_bandwidth: None, welcome_text: None }, t0);

        let t1 = t0 + crate::config::DEFAULT_DATA_PING_INTERVAL;
        client.poll_timers(t1);
        let token = client.inner.lock().unwrap().pending_pings.front().unwrap().0;

        client.dispatch(ServerControl::Ping { timestamp: token }, t1);

        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| e.contains("DataPing")));
        assert_eq!(client.inner.lock().unwrap().ping.data_rtt.count(), 1);
    }

    #[test]
    fn stale_hash_reopens_texture_request_need() {
        let (client, _sent, _events) = client_with_recorders();
        client.dispatch(
            ServerControl::UserState(UserStateFields { session: 1, texture_hash: Some(vec![1]), ..Default::default() }),
            Instant::now(),
        );
        client.request_user_texture(1);
        client.dispatch(
            ServerControl::UserState(UserStateFields { session: 1, texture_hash: Some(vec![2]), ..Default::default() }),
            Instant::now(),
        );
        let inner = client.inner.lock().unwrap();
        assert!(inner.users.get(&1).unwrap().needs_texture_blob());
    }
}
