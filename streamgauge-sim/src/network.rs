//! Nonlinear network condition model.
//!
//! Bandwidth follows a sinusoidal baseline with multiplicative log-normal
//! noise, scaled down by a slowly-varying congestion level. Congestion
//! onset is a sudden jump into a configured high range; recovery is
//! exponential decay toward zero. Latency and packet loss grow
//! nonlinearly (quadratic and cubic) with congestion.

use std::f64::consts::TAU;

use serde::Serialize;
use streamgauge_core::NetworkConfig;

use crate::rng::DeterministicRng;

/// Network conditions observed during one simulation step.
///
/// Produced fresh each step and consumed by the buffer and the encoder;
/// never retained across steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkSample {
    /// Available bandwidth in Mbit/s, always positive
    pub bandwidth_mbps: f64,
    /// One-way latency in milliseconds, never below the configured base
    pub latency_ms: f64,
    /// Packet-loss probability in [0, 1]
    pub packet_loss: f64,
}

/// Generates per-step network conditions from a latent congestion state.
///
/// The model owns its congestion level and elapsed simulated time; all
/// randomness comes from the run RNG passed into [`advance`].
///
/// [`advance`]: NetworkConditionModel::advance
#[derive(Debug, Clone)]
pub struct NetworkConditionModel {
    config: NetworkConfig,
    phase: f64,
    congestion: f64,
    elapsed_s: f64,
}

impl NetworkConditionModel {
    /// Creates a network model from validated configuration.
    ///
    /// When no fixed oscillation phase is configured, one is drawn from
    /// the run RNG so that different seeds explore different alignments
    /// of the bandwidth sinusoid.
    pub fn new(config: NetworkConfig, rng: &mut DeterministicRng) -> Self {
        let phase = config
            .oscillation_phase
            .unwrap_or_else(|| rng.random_range_f64(0.0, TAU));
        let congestion = config.initial_congestion;

        Self {
            config,
            phase,
            congestion,
            elapsed_s: 0.0,
        }
    }

    /// Advances the model by `dt` seconds and returns the new conditions.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is negative; step sizes are validated at
    /// configuration time.
    pub fn advance(&mut self, dt: f64, rng: &mut DeterministicRng) -> NetworkSample {
        assert!(dt >= 0.0, "network model cannot step backwards");

        let t = self.elapsed_s;
        self.elapsed_s += dt;

        // Onset is sudden, recovery is gradual. The onset draw happens
        // every step so that runs differing only in onset parameters
        // still consume an identical RNG sequence.
        let onset = rng.random_bool(self.config.onset_probability);
        let onset_target = rng.random_range_f64(self.config.onset_min, self.config.onset_max);
        if onset {
            self.congestion = onset_target.min(MAX_CONGESTION);
        } else {
            self.congestion *= (-self.config.recovery_rate * dt).exp();
        }
        assert!(
            (0.0..1.0).contains(&self.congestion),
            "congestion left [0, 1): {}",
            self.congestion
        );

        let sinusoid = 1.0
            + self.config.oscillation_amplitude
                * (TAU * self.config.oscillation_freq_hz * t + self.phase).sin();
        let noise = rng.lognormal(0.0, self.config.noise_sigma);
        let availability = 1.0 - self.congestion;

        let bandwidth_mbps = (self.config.base_bandwidth_mbps * sinusoid * noise * availability)
            .max(self.config.min_bandwidth_mbps);

        // Quadratic queuing penalty: congestion only ever adds latency.
        let latency_ms = self.config.base_latency_ms * (1.0 + 3.0 * self.congestion.powi(2));

        let packet_loss =
            (self.config.base_packet_loss + 0.1 * self.congestion.powi(3)).clamp(0.0, 1.0);

        NetworkSample {
            bandwidth_mbps,
            latency_ms,
            packet_loss,
        }
    }

    /// Current congestion level in [0, 1).
    pub fn congestion(&self) -> f64 {
        self.congestion
    }
}

/// Congestion is an open interval at 1: full congestion would zero the
/// bandwidth term and break the multiplicative model.
const MAX_CONGESTION: f64 = 0.999;
