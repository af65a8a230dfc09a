//! Playback buffer with fill/drain dynamics and stall hysteresis.
//!
//! The buffer level is measured in seconds of pre-buffered content.
//! Inflow (network delivery converted to content-seconds per second at
//! the encoder's bitrate) competes with a constant playback drain. An
//! empty buffer stalls playback; playback resumes only once the level
//! climbs back past the rebuffer threshold, so a single crossing of zero
//! can never flap between stalled and playing.

use serde::Serialize;
use streamgauge_core::BufferConfig;
use tracing::debug;

/// Transition flags emitted by one buffer step.
///
/// At most one of the flags is set per step; both false means the buffer
/// stayed in whichever regime it was already in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferEvent {
    /// Playback entered a stall this step
    pub stalled: bool,
    /// Playback resumed from a stall this step
    pub resumed: bool,
}

/// Hysteretic playback buffer.
#[derive(Debug, Clone)]
pub struct PlaybackBuffer {
    config: BufferConfig,
    level_s: f64,
    stalled: bool,
    stall_count: u32,
    total_stall_s: f64,
}

impl PlaybackBuffer {
    /// Creates a buffer at its configured initial fill, playing.
    pub fn new(config: BufferConfig) -> Self {
        let level_s = config.initial_level_s;
        Self {
            config,
            level_s,
            stalled: false,
            stall_count: 0,
            total_stall_s: 0.0,
        }
    }

    /// Advances the buffer by `dt` seconds.
    ///
    /// `bandwidth_mbps` is the network delivery rate (negative values are
    /// treated as zero), `bitrate_mbps` the encoder bitrate the stream is
    /// currently delivered at. Their ratio is the inflow in seconds of
    /// content per second of wall time, capped so a bandwidth spike
    /// cannot fill the buffer instantaneously.
    ///
    /// # Panics
    ///
    /// Panics if `bitrate_mbps` is not positive, or if the level ever
    /// leaves `[0, max_level_s]` - both indicate logic bugs, not runtime
    /// conditions.
    pub fn advance(&mut self, dt: f64, bandwidth_mbps: f64, bitrate_mbps: f64) -> BufferEvent {
        assert!(bitrate_mbps > 0.0, "encoder bitrate must be positive");

        let cap = if self.stalled {
            self.config.stalled_inflow_cap
        } else {
            self.config.inflow_cap
        };
        let inflow = (bandwidth_mbps.max(0.0) / bitrate_mbps).min(cap);

        let mut event = BufferEvent::default();

        if self.stalled {
            // Drain is paused; only rebuffering happens.
            self.level_s = (self.level_s + inflow * dt).min(self.config.max_level_s);
            self.total_stall_s += dt;

            if self.level_s >= self.config.rebuffer_threshold_s {
                self.stalled = false;
                event.resumed = true;
                debug!(level_s = self.level_s, "playback resumed");
            }
        } else {
            let net_rate = inflow - self.config.playback_rate;
            let new_level = self.level_s + net_rate * dt;

            if new_level <= 0.0 {
                self.level_s = 0.0;
                self.stalled = true;
                self.stall_count += 1;
                self.total_stall_s += dt;
                event.stalled = true;
                debug!(stall_count = self.stall_count, "playback stalled");
            } else {
                self.level_s = new_level.min(self.config.max_level_s);
            }
        }

        assert!(
            (0.0..=self.config.max_level_s).contains(&self.level_s),
            "buffer level left [0, {}]: {}",
            self.config.max_level_s,
            self.level_s
        );

        event
    }

    /// Current buffer level in seconds of content.
    pub fn level_s(&self) -> f64 {
        self.level_s
    }

    /// Whether playback is currently stalled.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Number of stalls entered since the start of the run.
    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    /// Cumulative seconds spent stalled.
    pub fn total_stall_s(&self) -> f64 {
        self.total_stall_s
    }
}
