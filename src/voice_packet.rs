//! The voice-packet surface, independent of whichever transport
//! carried it (a real UDP voice channel, or tunneled through the data
//! channel as `UDPTunnel`).

use crate::types::{CodecKind, Position, SessionId, VoiceTarget};

/// One voice packet, already parsed by the external voice codec — this
/// crate never touches its wire bytes directly (see `voipc_protocol::voice`
/// for what that parsing looks like for a similar header-plus-frames
/// layout).
#[derive(Debug, Clone)]
pub struct VoicePacket {
    /// 10-ms-frame counter; Mumble's seq_num always counts 10ms frames
    /// regardless of codec, which lets the reassembly engine detect loss
    /// without decoding
    pub seq_num: u32,
    pub codec: CodecKind,
    pub target: VoiceTarget,
    pub source: SessionId,
    /// Ordered encoded frames; possibly empty (an `end`-only packet).
    pub frames: Vec<Vec<u8>>,
    pub position: Option<Position>,
    pub end: bool,
}

impl VoicePacket {
    pub fn new(seq_num: u32, codec: CodecKind, target: VoiceTarget, source: SessionId) -> Self {
        Self {
            seq_num,
            codec,
            target,
            source,
            frames: Vec::new(),
            position: None,
            end: false,
        }
    }

    pub fn end_of_transmission(seq_num: u32, codec: CodecKind, target: VoiceTarget, source: SessionId) -> Self {
        Self {
            seq_num,
            codec,
            target,
            source,
            frames: Vec::new(),
            position: None,
            end: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_transmission_has_no_frames() {
        let p = VoicePacket::end_of_transmission(10, CodecKind::Opus, VoiceTarget::Normal, 1);
        assert!(p.frames.is_empty());
        assert!(p.end);
    }

    #[test]
    fn voice_target_wire_roundtrip() {
        assert_eq!(VoiceTarget::from_wire(0), VoiceTarget::Normal);
        assert_eq!(VoiceTarget::from_wire(31), VoiceTarget::Loopback);
        assert_eq!(VoiceTarget::Normal.to_wire(), 0);
        assert_eq!(VoiceTarget::Loopback.to_wire(), 31);
    }
}
