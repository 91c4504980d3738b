//! The external audio-codec adapter contract.
//!
//! This crate never encodes or decodes Opus/CELT/Speex itself — that is the
//! embedding application's job. A [`CodecAdapter`] is the seam: it reports
//! codec capabilities, hands out per-transmission decoder/encoder sinks, and
//! computes encoded-frame duration so the reassembly engine can reason about
//! loss without decoding.

use crate::types::{CodecKind, Position, SessionId, VoiceTarget};

/// One decoded frame, or `None` for a loss marker the reassembly engine
/// injected in place of a frame that never arrived.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub target: VoiceTarget,
    pub codec: CodecKind,
    /// `None` marks a lost frame — the sink should apply packet-loss
    /// concealment (e.g. `Decoder::decode_lost`) rather than silence.
    pub frame: Option<Vec<u8>>,
    pub position: Option<Position>,
}

/// Sink for decoded voice belonging to a single transmission from a single
/// user. Handed to the embedder via [`crate::event::Event::Voice`].
///
/// Matches the "sink supports write(item) and end()" push-stream contract
/// used throughout this crate's outgoing and incoming data paths.
pub trait DecodedFrameSink: Send {
    fn write(&mut self, frame: DecodedFrame);
    fn end(&mut self);
}

/// One encoded frame ready for on-wire transmission, produced by an
/// [`CodecAdapter`]'s encoder sink from a PCM chunk.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub codec: CodecKind,
    pub data: Vec<u8>,
}

/// A chunk of PCM samples the embedder pushes into an outgoing voice stream
/// (see `Client::create_voice_stream`).
#[derive(Debug, Clone)]
pub struct PcmChunk {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u8,
    pub position: Option<Position>,
}

/// Sink for PCM samples being encoded for transmission.
pub trait EncodedFrameSink: Send {
    /// Encode one PCM chunk, returning zero or more encoded frames (an
    /// encoder may buffer partial frames internally and emit none yet).
    fn push(&mut self, chunk: PcmChunk) -> Vec<EncodedFrame>;
    /// Flush any buffered partial frame on end-of-input.
    fn finish(&mut self) -> Vec<EncodedFrame>;
}

/// The codec adapter contract
pub trait CodecAdapter: Send + Sync {
    /// CELT capability bitmask versions this client advertises in
    /// `Authenticate`.
    fn celt_versions(&self) -> Vec<u32>;
    /// Whether this client supports Opus.
    fn opus(&self) -> bool;
    /// Create a fresh decoder sink for one user's incoming voice.
    fn create_decoder_sink(&self, user: SessionId) -> Box<dyn DecodedFrameSink>;
    /// Create a fresh encoder sink for an outgoing voice stream, targeting
    /// `bitrate` bits per second (the enforceable bitrate the bandwidth
    /// negotiation computed from the server's cap).
    fn create_encoder_sink(&self, codec: CodecKind, bitrate: u32) -> Box<dyn EncodedFrameSink>;
    /// Duration, in milliseconds, an encoded frame represents. Must be a
    /// multiple of 10 (Mumble's seq_num counts 10ms frames regardless of
    /// codec).
    fn frame_duration_ms(&self, codec: CodecKind, encoded_frame: &[u8]) -> u32;
}

/// A sink that discards everything written to it, but still honors `end()`
/// being observable. Used when no [`CodecAdapter`] is configured, so the
/// reassembly engine's bookkeeping (loss detection, idle timers) runs
/// unchanged even though nothing is actually decoded.
pub struct BlackHoleDecodedSink;

impl DecodedFrameSink for BlackHoleDecodedSink {
    fn write(&mut self, _frame: DecodedFrame) {}
    fn end(&mut self) {}
}

/// The encoder-side counterpart of [`BlackHoleDecodedSink`].
pub struct BlackHoleEncodedSink;

impl EncodedFrameSink for BlackHoleEncodedSink {
    fn push(&mut self, _chunk: PcmChunk) -> Vec<EncodedFrame> {
        Vec::new()
    }
    fn finish(&mut self) -> Vec<EncodedFrame> {
        Vec::new()
    }
}
