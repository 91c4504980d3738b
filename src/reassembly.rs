//! Per-user voice reassembly engine.
//!
//! Converts a possibly-out-of-order, possibly-lossy stream of
//! [`VoicePacket`]s from one user into an ordered stream of decoded frames
//! (with silence/loss markers), delivered to a [`DecodedFrameSink`] the
//! engine lazily creates per transmission. Uses a sequence-number-keyed
//! reordering scheme where `seq_num` counts 10ms frames, so a gap in the
//! sequence directly tells us how many frames were lost.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::codec_adapter::{BlackHoleDecodedSink, CodecAdapter, DecodedFrame, DecodedFrameSink};
use crate::types::SessionId;
use crate::voice_packet::VoicePacket;

/// Caps the number of lost-frame markers injected for a single gap. A gap of
/// 100ms or more is treated as the start of a fresh burst rather than
/// backfilled further.
const MAX_INJECTED_LOSS: u32 = 10;

/// Per-user transmission state. One of these lives inside each
/// [`crate::model::User`].
#[derive(Default)]
pub struct VoiceReassembly {
    sink: Option<Box<dyn DecodedFrameSink>>,
    last_seq: Option<u32>,
    idle_deadline: Option<Instant>,
}

impl VoiceReassembly {
    pub fn new() -> Self {
        Self { sink: None, last_seq: None, idle_deadline: None }
    }

    /// Whether a transmission is currently active (a sink exists).
    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    /// The deadline at which this transmission's idle timer fires, if any.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle_deadline
    }

    /// Handle one incoming packet for this user. Returns `true` if a new
    /// transmission sink was created (the caller should emit
    /// [`crate::event::Event::Voice`]).
    pub fn handle_packet(
        &mut self,
        session_id: SessionId,
        packet: &VoicePacket,
        codec_adapter: Option<&Arc<dyn CodecAdapter>>,
        timeout: Duration,
        now: Instant,
    ) -> bool {
        let mut new_transmission = false;

        if !packet.frames.is_empty() {
            let duration_10ms = duration_in_10ms_units(packet, codec_adapter);

            if self.sink.is_some() {
                if let Some(last) = self.last_seq {
                    if last > packet.seq_num {
                        tracing::debug!(
                            session_id,
                            seq_num = packet.seq_num,
                            last_seq = last,
                            "dropping late voice packet"
                        );
                        return false;
                    }

                    let gap_start = i64::from(packet.seq_num) - i64::from(duration_10ms);
                    if i64::from(last) < gap_start {
                        let gap = i64::from(packet.seq_num) - i64::from(last);
                        let lost = (gap - 1).clamp(0, i64::from(MAX_INJECTED_LOSS)) as u32;
                        for _ in 0..lost {
                            if let Some(sink) = self.sink.as_mut() {
                                sink.write(DecodedFrame {
                                    target: packet.target,
                                    codec: packet.codec,
                                    frame: None,
                                    position: packet.position,
                                });
                            }
                        }
                    }
                }
            }

            for frame in &packet.frames {
                if self.sink.is_none() {
                    let sink = match codec_adapter {
                        Some(adapter) => adapter.create_decoder_sink(session_id),
                        None => Box::new(BlackHoleDecodedSink),
                    };
                    self.sink = Some(sink);
                    new_transmission = true;
                    tracing::trace!(session_id, "new voice transmission");
                }
                if let Some(sink) = self.sink.as_mut() {
                    sink.write(DecodedFrame {
                        target: packet.target,
                        codec: packet.codec,
                        frame: Some(frame.clone()),
                        position: packet.position,
                    });
                }
            }

            self.idle_deadline = Some(now + timeout);
            self.last_seq = Some(packet.seq_num + duration_10ms - 1);
        }

        if packet.end && self.sink.is_some() {
            self.end_transmission(session_id);
        }

        new_transmission
    }

    /// Check the idle timer against `now`, ending the transmission if it has
    /// expired. Returns `true` if a transmission was ended this way.
    pub fn poll_idle(&mut self, session_id: SessionId, now: Instant) -> bool {
        if let Some(deadline) = self.idle_deadline {
            if now >= deadline {
                tracing::debug!(session_id, "voice transmission idle timeout");
                self.end_transmission(session_id);
                return true;
            }
        }
        false
    }

    fn end_transmission(&mut self, _session_id: SessionId) {
        self.idle_deadline = None;
        self.last_seq = None;
        if let Some(mut sink) = self.sink.take() {
            sink.end();
        }
    }
}

fn duration_in_10ms_units(packet: &VoicePacket, codec_adapter: Option<&Arc<dyn CodecAdapter>>) -> u32 {
    match codec_adapter {
        Some(adapter) => packet
            .frames
            .iter()
            .map(|frame| adapter.frame_duration_ms(packet.codec, frame) / 10)
            .sum(),
        None => packet.frames.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CodecKind, VoiceTarget};
    use std::sync::Mutex;

    /// Records every write/end call so tests can assert on the exact
    /// sequence of decoded frames a transmission produced.
    #[derive(Default)]
    struct RecordingSink(Arc<Mutex<Vec<Option<Vec<u8>>>>>, Arc<Mutex<bool>>);

    impl DecodedFrameSink for RecordingSink {
        fn write(&mut self, frame: DecodedFrame) {
            self.0.lock().unwrap().push(frame.frame);
        }
        fn end(&mut self) {
            *self.1.lock().unwrap() = true;
        }
    }

    struct RecordingAdapter {
        frames: Arc<Mutex<Vec<Option<Vec<u8>>>>>,
        ended: Arc<Mutex<bool>>,
    }

    impl CodecAdapter for RecordingAdapter {
        fn celt_versions(&self) -> Vec<u32> {
            Vec::new()
        }
        fn opus(&self) -> bool {
            true
        }
        fn create_decoder_sink(&self, _user: SessionId) -> Box<dyn DecodedFrameSink> {
            Box::new(RecordingSink(self.frames.clone(), self.ended.clone()))
        }
        fn create_encoder_sink(&self, _codec: CodecKind, _bitrate: u32) -> Box<dyn crate::codec_adapter::EncodedFrameSink> {
            Box::new(crate::codec_adapter::BlackHoleEncodedSink)
        }
        fn frame_duration_ms(&self, _codec: CodecKind, _frame: &[u8]) -> u32 {
            10
        }
    }

    fn packet(seq: u32, frames: Vec<Vec<u8>>, end: bool) -> VoicePacket {
        VoicePacket {
            seq_num: seq,
            codec: CodecKind::Opus,
            target: VoiceTarget::Normal,
            source: 1,
            frames,
            position: None,
            end,
        }
    }

    #[test]
    fn loss_compensation_matches_spec_scenario() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let ended = Arc::new(Mutex::new(false));
        let adapter: Arc<dyn CodecAdapter> =
            Arc::new(RecordingAdapter { frames: frames.clone(), ended: ended.clone() });

        let mut engine = VoiceReassembly::new();
        let now = Instant::now();
        let timeout = Duration::from_millis(200);

        engine.handle_packet(1, &packet(0, vec![b"F1".to_vec()], false), Some(&adapter), timeout, now);
        engine.handle_packet(
            1,
            &packet(5, vec![b"F2".to_vec(), b"F2".to_vec()], false),
            Some(&adapter),
            timeout,
            now,
        );
        engine.handle_packet(1, &packet(8, vec![b"F3".to_vec()], false), Some(&adapter), timeout, now);

        let got = frames.lock().unwrap();
        let expected: Vec<Option<Vec<u8>>> = vec![
            Some(b"F1".to_vec()),
            None,
            None,
            None,
            None,
            Some(b"F2".to_vec()),
            Some(b"F2".to_vec()),
            None,
            Some(b"F3".to_vec()),
        ];
        assert_eq!(*got, expected);
    }

    #[test]
    fn late_packet_is_dropped_entirely() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let ended = Arc::new(Mutex::new(false));
        let adapter: Arc<dyn CodecAdapter> =
            Arc::new(RecordingAdapter { frames: frames.clone(), ended: ended.clone() });

        let mut engine = VoiceReassembly::new();
        let now = Instant::now();
        let timeout = Duration::from_millis(200);

        engine.handle_packet(1, &packet(1, vec![b"F1".to_vec()], false), Some(&adapter), timeout, now);
        engine.handle_packet(1, &packet(0, vec![b"F2".to_vec()], false), Some(&adapter), timeout, now);

        let got = frames.lock().unwrap();
        assert_eq!(*got, vec![Some(b"F1".to_vec())]);
    }

    #[test]
    fn idle_timeout_ends_transmission() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let ended = Arc::new(Mutex::new(false));
        let adapter: Arc<dyn CodecAdapter> =
            Arc::new(RecordingAdapter { frames: frames.clone(), ended: ended.clone() });

        let mut engine = VoiceReassembly::new();
        let timeout = Duration::from_millis(20);
        let t0 = Instant::now();

        engine.handle_packet(1, &packet(0, vec![b"F1".to_vec()], false), Some(&adapter), timeout, t0);
        engine.handle_packet(
            1,
            &packet(1, vec![b"F2".to_vec()], false),
            Some(&adapter),
            timeout,
            t0 + Duration::from_millis(15),
        );
        engine.handle_packet(
            1,
            &packet(2, vec![b"F3".to_vec()], false),
            Some(&adapter),
            timeout,
            t0 + Duration::from_millis(30),
        );

        assert_eq!(frames.lock().unwrap().len(), 3);
        assert!(!*ended.lock().unwrap());

        // Not yet expired at t0+35 (deadline is t0+30+20=t0+50).
        assert!(!engine.poll_idle(1, t0 + Duration::from_millis(35)));
        assert!(!*ended.lock().unwrap());

        assert!(engine.poll_idle(1, t0 + Duration::from_millis(51)));
        assert!(*ended.lock().unwrap());
        assert!(!engine.is_active());
    }

    #[test]
    fn no_codec_adapter_uses_black_hole_sink() {
        let mut engine = VoiceReassembly::new();
        let now = Instant::now();
        let created = engine.handle_packet(1, &packet(0, vec![vec![1, 2, 3]], false), None, Duration::from_millis(200), now);
        assert!(created);
        assert!(engine.is_active());
    }

    #[test]
    fn end_flag_closes_active_transmission() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let ended = Arc::new(Mutex::new(false));
        let adapter: Arc<dyn CodecAdapter> =
            Arc::new(RecordingAdapter { frames: frames.clone(), ended: ended.clone() });
        let mut engine = VoiceReassembly::new();
        let now = Instant::now();
        engine.handle_packet(1, &packet(0, vec![b"F1".to_vec()], false), Some(&adapter), Duration::from_millis(200), now);
        engine.handle_packet(1, &packet(1, Vec::new(), true), Some(&adapter), Duration::from_millis(200), now);
        assert!(*ended.lock().unwrap());
        assert!(!engine.is_active());
    }
}
