//! Bandwidth / bitrate negotiation.
//!
//! Deterministic, total functions mapping a candidate bitrate, the outgoing
//! packet shape, and the server's bandwidth cap to an enforceable bitrate.
//! Must match the server's own admission-control formula byte-for-byte, so
//! these functions carry no tunable behavior beyond their documented inputs.

/// `enforceable_bandwidth(bitrate, samples_per_packet, has_position)`.
///
/// `packet_bytes` models what the stream would cost as IP/UDP: a 20-byte IP
/// header, 8-byte UDP header, 4-byte Mumble voice header prefix, 1-byte
/// type/target byte, 4-byte sequence number, the codec header (Opus: 4
/// bytes; CELT/Speex: 1 byte per 10ms frame), and 12 bytes of positional
/// data when present.
pub fn enforceable_bandwidth(bitrate: u32, samples_per_packet: u32, has_position: bool) -> u32 {
    let codec_header = (samples_per_packet / 480).max(4);
    let packet_bytes = 20 + 8 + 4 + 1 + 4 + codec_header + if has_position { 12 } else { 0 };
    let packets_per_second = 48_000 / samples_per_packet;
    packet_bytes * 8 * packets_per_second + bitrate
}

/// The largest bitrate that stays within `max_bandwidth` after accounting
/// for packet overhead.
pub fn max_bitrate(max_bandwidth: u32, samples_per_packet: u32, has_position: bool) -> u32 {
    max_bandwidth.saturating_sub(enforceable_bandwidth(0, samples_per_packet, has_position))
}

/// The bitrate to actually use: the configured preference if it fits under
/// the server's cap, otherwise the cap itself.
pub fn actual_bitrate(
    preferred_bitrate: u32,
    max_bandwidth: u32,
    samples_per_packet: u32,
    has_position: bool,
) -> u32 {
    if enforceable_bandwidth(preferred_bitrate, samples_per_packet, has_position) <= max_bandwidth {
        preferred_bitrate
    } else {
        max_bitrate(max_bandwidth, samples_per_packet, has_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opus_10ms_no_position_matches_hand_computation() {
        // codec_header = max(4, 480/480) = 4
        // packet_bytes = 20+8+4+1+4+4+0 = 41
        // packets_per_second = 48000/480 = 100
        // enforceable = 41*8*100 + bitrate = 32800 + bitrate
        assert_eq!(enforceable_bandwidth(0, 480, false), 32_800);
        assert_eq!(enforceable_bandwidth(40_000, 480, false), 72_800);
    }

    #[test]
    fn opus_10ms_with_position_adds_overhead() {
        // packet_bytes = 41 + 12 = 53; enforceable = 53*8*100 = 42400
        assert_eq!(enforceable_bandwidth(0, 480, true), 42_400);
    }

    #[test]
    fn celt_20ms_codec_header_is_two() {
        // samples_per_packet = 960 (20ms @ 48kHz) -> codec_header = max(4, 2) = 4 still (floor division 960/480=2, max(4,2)=4)
        assert_eq!(enforceable_bandwidth(0, 960, false), {
            let codec_header = (960u32 / 480).max(4);
            let packet_bytes = 20 + 8 + 4 + 1 + 4 + codec_header;
            let pps = 48_000 / 960;
            packet_bytes * 8 * pps
        });
    }

    #[test]
    fn max_bitrate_subtracts_overhead_from_cap() {
        let cap = 72_000;
        let overhead = enforceable_bandwidth(0, 480, false);
        assert_eq!(max_bitrate(cap, 480, false), cap - overhead);
    }

    #[test]
    fn actual_bitrate_falls_back_to_cap_when_preferred_too_high() {
        let cap = 40_000;
        let overhead = enforceable_bandwidth(0, 480, false);
        let preferred = 30_000; // preferred + overhead > cap
        assert!(overhead + preferred > cap);
        assert_eq!(actual_bitrate(preferred, cap, 480, false), cap - overhead);
    }

    #[test]
    fn actual_bitrate_uses_preferred_when_it_fits() {
        let cap = 200_000;
        let preferred = 40_000;
        assert_eq!(actual_bitrate(preferred, cap, 480, false), preferred);
    }

    #[test]
    fn max_bitrate_saturates_at_zero_when_cap_too_small() {
        assert_eq!(max_bitrate(100, 480, false), 0);
    }
}
