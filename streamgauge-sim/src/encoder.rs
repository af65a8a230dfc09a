//! Adaptive-bitrate encoder with A/V sync drift tracking.
//!
//! Tier policy over the seven-rung quality ladder: downgrades are
//! immediate (a starving tier is abandoned the step the bandwidth fails
//! it), upgrades are hysteretic (a run of consecutive spare-bandwidth
//! steps is required, and the tier climbs one rung at a time). The
//! asymmetry prevents flapping around a threshold.
//!
//! Audio/video sync drift is a decaying stochastic process perturbed by
//! Gaussian noise every step and by impulse penalties on stalls and
//! quality switches.

use serde::Serialize;
use streamgauge_core::{EncoderConfig, QualityLevel};
use tracing::debug;

use crate::rng::DeterministicRng;

/// Outcome of one encoder step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncoderStepResult {
    /// Tier selected for this step
    pub level: QualityLevel,
    /// Whether the tier changed this step, in either direction
    pub switched: bool,
    /// Accumulated A/V sync drift after this step, in ms
    pub drift_ms: f64,
}

/// Adaptive-bitrate tier selection and drift accumulation.
#[derive(Debug, Clone)]
pub struct AdaptiveEncoder {
    config: EncoderConfig,
    level: QualityLevel,
    spare_streak: u32,
    drift_ms: f64,
}

impl AdaptiveEncoder {
    /// Creates an encoder starting at the lowest tier with zero drift.
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            level: QualityLevel::lowest(),
            spare_streak: 0,
            drift_ms: 0.0,
        }
    }

    /// Selects the tier for this step and updates the sync drift.
    ///
    /// `bandwidth_mbps` is the raw network bandwidth; the encoder only
    /// commits to its configured safety fraction of it. Non-positive
    /// bandwidth fails every tier and forces 160p. `buffer_stalled` is
    /// the playback state for this step and feeds the stall penalty of
    /// the drift process.
    pub fn advance(
        &mut self,
        bandwidth_mbps: f64,
        buffer_stalled: bool,
        rng: &mut DeterministicRng,
    ) -> EncoderStepResult {
        let effective_mbps = bandwidth_mbps.max(0.0) * self.config.safety_factor;

        let mut switched = false;
        if effective_mbps < self.level.min_bandwidth_mbps() {
            // Immediate downgrade to the highest tier that still fits.
            // Holding 160p through a collapse is not a switch.
            let target = QualityLevel::fitting(effective_mbps);
            if target != self.level {
                debug!(from = %self.level, to = %target, effective_mbps, "downgrade");
                self.level = target;
                switched = true;
            }
            self.spare_streak = 0;
        } else {
            match self.level.higher() {
                Some(next) if effective_mbps >= next.min_bandwidth_mbps() => {
                    self.spare_streak += 1;
                    if self.spare_streak >= self.config.upgrade_hysteresis {
                        debug!(from = %self.level, to = %next, effective_mbps, "upgrade");
                        self.level = next;
                        self.spare_streak = 0;
                        switched = true;
                    }
                }
                _ => self.spare_streak = 0,
            }
        }

        let noise = rng.normal(0.0, self.config.drift_noise_ms);
        let stall_penalty = if buffer_stalled {
            self.config.stall_penalty_ms
        } else {
            0.0
        };
        let switch_penalty = if switched {
            self.config.switch_penalty_ms
        } else {
            0.0
        };
        self.drift_ms =
            self.drift_ms * self.config.drift_decay + noise + stall_penalty + switch_penalty;

        EncoderStepResult {
            level: self.level,
            switched,
            drift_ms: self.drift_ms,
        }
    }

    /// Tier the encoder is currently delivering at.
    pub fn current_level(&self) -> QualityLevel {
        self.level
    }

    /// Bitrate of the current tier in Mbit/s.
    ///
    /// The buffer converts bandwidth into content-seconds at this rate.
    pub fn bitrate_mbps(&self) -> f64 {
        self.level.bitrate_mbps()
    }

    /// Accumulated A/V sync drift in ms.
    pub fn drift_ms(&self) -> f64 {
        self.drift_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> AdaptiveEncoder {
        // Noise off so tier policy can be asserted exactly.
        AdaptiveEncoder::new(EncoderConfig {
            drift_noise_ms: 0.0,
            ..EncoderConfig::default()
        })
    }

    fn rng() -> DeterministicRng {
        DeterministicRng::from_seed(0)
    }

    /// Raw bandwidth whose safety-adjusted value equals `effective`.
    fn raw(effective: f64) -> f64 {
        effective / EncoderConfig::default().safety_factor
    }

    #[test]
    fn test_starts_at_lowest_tier() {
        assert_eq!(encoder().current_level(), QualityLevel::Q160p);
    }

    #[test]
    fn test_upgrade_requires_hysteresis_run() {
        let mut enc = encoder();
        let mut rng = rng();

        // Two qualifying steps are not enough with hysteresis 3.
        for _ in 0..2 {
            let result = enc.advance(raw(2.0), false, &mut rng);
            assert!(!result.switched);
            assert_eq!(result.level, QualityLevel::Q160p);
        }
        let result = enc.advance(raw(2.0), false, &mut rng);
        assert!(result.switched);
        assert_eq!(result.level, QualityLevel::Q360p);
    }

    #[test]
    fn test_single_bad_step_resets_upgrade_streak() {
        let mut enc = encoder();
        let mut rng = rng();

        // Hysteresis minus one qualifying steps...
        for _ in 0..2 {
            enc.advance(raw(2.0), false, &mut rng);
        }
        // ...then one step with no spare bandwidth (holds 160p, fails 360p).
        let result = enc.advance(raw(1.0), false, &mut rng);
        assert!(!result.switched);

        // The streak restarted: two more qualifying steps still don't upgrade.
        for _ in 0..2 {
            let result = enc.advance(raw(2.0), false, &mut rng);
            assert_eq!(result.level, QualityLevel::Q160p);
        }
        let result = enc.advance(raw(2.0), false, &mut rng);
        assert_eq!(result.level, QualityLevel::Q360p);
    }

    #[test]
    fn test_upgrades_climb_one_tier_at_a_time() {
        let mut enc = encoder();
        let mut rng = rng();

        // Abundant bandwidth fits every tier, yet each upgrade still
        // takes a full hysteresis run and moves a single rung.
        for expected in [
            QualityLevel::Q360p,
            QualityLevel::Q480p,
            QualityLevel::Q720p,
        ] {
            for _ in 0..2 {
                assert!(!enc.advance(raw(50.0), false, &mut rng).switched);
            }
            let result = enc.advance(raw(50.0), false, &mut rng);
            assert!(result.switched);
            assert_eq!(result.level, expected);
        }
    }

    #[test]
    fn test_downgrade_is_immediate_and_multi_tier() {
        let mut enc = encoder();
        let mut rng = rng();

        // Climb to 480p.
        for _ in 0..6 {
            enc.advance(raw(50.0), false, &mut rng);
        }
        assert_eq!(enc.current_level(), QualityLevel::Q480p);

        // Bandwidth collapses below even 360p: one step to the floor.
        let result = enc.advance(raw(0.4), false, &mut rng);
        assert!(result.switched);
        assert_eq!(result.level, QualityLevel::Q160p);
    }

    #[test]
    fn test_zero_bandwidth_forces_lowest_tier() {
        let mut enc = encoder();
        let mut rng = rng();
        for _ in 0..6 {
            enc.advance(raw(50.0), false, &mut rng);
        }

        let result = enc.advance(0.0, false, &mut rng);
        assert_eq!(result.level, QualityLevel::Q160p);

        // Already at the floor: a further bad step is not a switch.
        let result = enc.advance(-3.0, false, &mut rng);
        assert!(!result.switched);
        assert_eq!(result.level, QualityLevel::Q160p);
    }

    #[test]
    fn test_downgrade_resets_upgrade_streak() {
        let mut enc = encoder();
        let mut rng = rng();

        for _ in 0..2 {
            enc.advance(raw(2.0), false, &mut rng);
        }
        // Collapse below the current tier's threshold; already at the
        // floor, so the tier holds but the streak must reset.
        enc.advance(raw(0.1), false, &mut rng);

        for _ in 0..2 {
            let result = enc.advance(raw(2.0), false, &mut rng);
            assert_eq!(result.level, QualityLevel::Q160p);
            assert!(!result.switched);
        }
    }

    #[test]
    fn test_drift_decays_without_events() {
        let mut enc = encoder();
        let mut rng = rng();
        enc.drift_ms = 100.0;

        for _ in 0..3 {
            enc.advance(raw(0.5), false, &mut rng);
        }
        let expected = 100.0 * 0.95f64.powi(3);
        assert!((enc.drift_ms() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stall_penalty_feeds_drift() {
        let mut enc = encoder();
        let mut rng = rng();

        let quiet = enc.advance(raw(0.5), false, &mut rng).drift_ms;
        let stalled = enc.advance(raw(0.5), true, &mut rng).drift_ms;
        assert!((stalled - (quiet * 0.95 + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_switch_penalty_feeds_drift() {
        let mut enc = encoder();
        let mut rng = rng();
        for _ in 0..6 {
            enc.advance(raw(50.0), false, &mut rng);
        }
        let before = enc.drift_ms();

        // Forced downgrade: decay plus the switch impulse.
        let result = enc.advance(raw(0.1), false, &mut rng);
        assert!(result.switched);
        assert!((result.drift_ms - (before * 0.95 + 2.0)).abs() < 1e-9);
    }
}
