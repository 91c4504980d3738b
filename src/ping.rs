//! Liveness / ping scheduler.

use std::time::{Duration, Instant};

use crate::messages::RttSummary;

/// Incremental (Welford) running mean/variance so a long-running connection
/// doesn't grow unbounded RTT history
#[derive(Debug, Clone, Copy, Default)]
pub struct RttStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RttStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, rtt_ms: f64) {
        self.count += 1;
        let delta = rtt_ms - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = rtt_ms - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// `None` until at least one sample has been observed.
    pub fn summary(&self) -> Option<RttSummary> {
        if self.count == 0 {
            None
        } else {
            Some(RttSummary { count: self.count, mean_ms: self.mean, variance_ms2: self.variance() })
        }
    }
}

/// Result of polling the ping scheduler at a given instant.
pub enum PingTick {
    /// Not yet time to send another ping.
    Idle,
    /// Time to send a ping; the in-flight counter has already been
    /// incremented.
    Send,
    /// Too many pings are outstanding; the caller must disconnect with a
    /// timeout error
    Timeout,
}

/// Drives the periodic data-channel ping and tracks in-flight state.
pub struct PingScheduler {
    interval: Duration,
    max_in_flight: u32,
    in_flight: u32,
    next_deadline: Option<Instant>,
    pub data_rtt: RttStats,
    pub voice_rtt: RttStats,
}

impl PingScheduler {
    pub fn new(interval: Duration, max_in_flight: u32) -> Self {
        Self {
            interval,
            max_in_flight,
            in_flight: 0,
            next_deadline: None,
            data_rtt: RttStats::new(),
            voice_rtt: RttStats::new(),
        }
    }

    /// Arm the scheduler; called once on entering the `connected` state
    ///
    pub fn start(&mut self, now: Instant) {
        self.next_deadline = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_deadline = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_deadline
    }

    /// Check whether it's time to send a ping.
    pub fn poll(&mut self, now: Instant) -> PingTick {
        match self.next_deadline {
            Some(deadline) if now >= deadline => {
                if self.in_flight >= self.max_in_flight {
                    PingTick::Timeout
                } else {
                    self.in_flight += 1;
                    self.next_deadline = Some(now + self.interval);
                    PingTick::Send
                }
            }
            _ => PingTick::Idle,
        }
    }

    /// An incoming `Ping` reply arrived: decrement the in-flight counter and
    /// record the round-trip time. Returns `false` (and logs) if no ping was
    /// outstanding rather than underflowing the counter.
    pub fn on_reply(&mut self, rtt_ms: f64) -> bool {
        if self.in_flight == 0 {
            tracing::warn!("received Ping reply with no ping in flight");
            return false;
        }
        self.in_flight -= 1;
        self.data_rtt.observe(rtt_ms);
        true
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }
}
