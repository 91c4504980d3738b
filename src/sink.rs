//! Outgoing sinks: the write side of the transport boundary
//!
//! The dispatcher never opens a socket itself; it hands encoded messages and
//! packets to caller-supplied sinks, the same "write(item)" push contract
//! used on the decode side (`crate::codec_adapter::DecodedFrameSink`).

use crate::codec_adapter::{EncodedFrame, PcmChunk};
use crate::messages::ClientControl;
use crate::types::{CodecKind, VoiceTarget};
use crate::voice_packet::VoicePacket;

/// Receives outgoing control messages for encoding and transmission.
pub trait ControlSink: Send {
    fn send(&mut self, message: ClientControl);
}

/// Receives outgoing voice packets on a dedicated (e.g. UDP) channel.
///
/// When an embedder doesn't attach one, outgoing voice is tunneled through
/// the [`ControlSink`] instead, as `ClientControl::UdpTunnel` — the same
/// fallback the server-side protocol itself offers
pub trait VoiceSink: Send {
    fn send(&mut self, packet: VoicePacket);
}

/// Hides whether a [`VoicePacket`] travels over a dedicated voice sink, is
/// tunneled through the control sink, or is routed back through a shared
/// `Client` handle, so [`VoiceOutputStream`] doesn't need to care which.
/// `crate::client` supplies the concrete implementation.
pub(crate) trait VoiceTransmit: Send {
    fn transmit(&mut self, packet: VoicePacket);
}

/// Public sink an embedder pushes captured PCM audio into. Returned by
/// [`crate::client::Client::create_voice_stream`].
pub trait PcmSink: Send {
    fn push(&mut self, chunk: PcmChunk);
    /// Flush any buffered partial frame and send the end-of-transmission
    /// marker.
    fn finish(&mut self);
}

/// Encodes pushed PCM into [`VoicePacket`]s and hands them to whichever
/// [`VoiceTransmit`] the client wired up at construction time.
///
/// Mumble's `seq_num` counts 10ms units regardless of codec;
/// this stream assumes one encoded frame is one such unit, which holds for
/// every codec currently in production use (Opus at 10/20/40/60ms still
/// reports frame count in 10ms multiples via `CodecAdapter::frame_duration_ms`
/// on the decode side — the encode side mirrors it here).
pub(crate) struct VoiceOutputStream {
    transmit: Box<dyn VoiceTransmit>,
    encoder: Box<dyn crate::codec_adapter::EncodedFrameSink>,
    codec: CodecKind,
    target: VoiceTarget,
    seq_num: u32,
}

impl VoiceOutputStream {
    pub(crate) fn new(
        transmit: Box<dyn VoiceTransmit>,
        encoder: Box<dyn crate::codec_adapter::EncodedFrameSink>,
        codec: CodecKind,
        target: VoiceTarget,
    ) -> Self {
        Self { transmit, encoder, codec, target, seq_num: 0 }
    }

    fn emit(&mut self, frame: EncodedFrame) {
        let mut packet = VoicePacket::new(self.seq_num, frame.codec, self.target, 0);
        packet.frames.push(frame.data);
        self.transmit.transmit(packet);
        self.seq_num += 1;
    }
}

impl PcmSink for VoiceOutputStream {
    fn push(&mut self, chunk: PcmChunk) {
        for frame in self.encoder.push(chunk) {
            self.emit(frame);
        }
    }

    fn finish(&mut self) {
        for frame in self.encoder.finish() {
            self.emit(frame);
        }
        let packet = VoicePacket::end_of_transmission(self.seq_num, self.codec, self.target, 0);
        self.transmit.transmit(packet);
    }
}
