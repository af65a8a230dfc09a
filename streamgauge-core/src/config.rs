//! Centralized configuration for Streamgauge.
//!
//! All tunable parameters are defined here to avoid hard-coded values
//! scattered throughout the simulation. Every field has a documented
//! default; loaders may deserialize partial configurations and missing
//! fields fall back to those defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a configuration fails validation.
///
/// Validation happens once, before a simulation is constructed, so the
/// step loop itself never has to defend against nonsensical parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its permitted range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// QoE component weights must combine into a convex blend
    #[error("QoE weights must sum to 1.0, got {sum}")]
    WeightSum {
        /// Actual sum of the three weights
        sum: f64,
    },
}

/// Central configuration for a simulation run.
///
/// Groups the tunables of each component into logical sections, the way
/// the components themselves are split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamgaugeConfig {
    /// Simulation step size in seconds, shared by every component
    pub dt_s: f64,
    pub network: NetworkConfig,
    pub buffer: BufferConfig,
    pub encoder: EncoderConfig,
    pub qoe: QoeConfig,
}

impl Default for StreamgaugeConfig {
    fn default() -> Self {
        Self {
            dt_s: 1.0,
            network: NetworkConfig::default(),
            buffer: BufferConfig::default(),
            encoder: EncoderConfig::default(),
            qoe: QoeConfig::default(),
        }
    }
}

impl StreamgaugeConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - A field is outside its permitted range
    /// - `ConfigError::WeightSum` - QoE weights do not sum to 1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("dt_s", self.dt_s)?;
        self.network.validate()?;
        self.buffer.validate()?;
        self.encoder.validate()?;
        self.qoe.validate()
    }
}

/// Network condition model parameters.
///
/// Bandwidth follows a sinusoidal baseline with multiplicative log-normal
/// noise, scaled down by a congestion level in [0, 1). Congestion onsets
/// are sudden random jumps; recovery is exponential decay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Mean available bandwidth in Mbit/s
    pub base_bandwidth_mbps: f64,
    /// Relative amplitude of the sinusoidal bandwidth variation (0-1)
    pub oscillation_amplitude: f64,
    /// Frequency of the sinusoidal component in Hz
    pub oscillation_freq_hz: f64,
    /// Fixed sinusoid phase in radians; drawn from the run RNG when unset
    pub oscillation_phase: Option<f64>,
    /// Sigma of the log-normal multiplicative bandwidth noise
    pub noise_sigma: f64,
    /// Per-step probability of a congestion onset
    pub onset_probability: f64,
    /// Congestion level an onset jumps into, lower bound
    pub onset_min: f64,
    /// Congestion level an onset jumps into, upper bound
    pub onset_max: f64,
    /// Exponential congestion recovery rate per second
    pub recovery_rate: f64,
    /// Congestion level at step 0, for forced-congestion scenarios
    pub initial_congestion: f64,
    /// Baseline one-way latency in milliseconds
    pub base_latency_ms: f64,
    /// Baseline packet-loss probability
    pub base_packet_loss: f64,
    /// Bandwidth floor in Mbit/s, keeps the model away from zero
    pub min_bandwidth_mbps: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_bandwidth_mbps: 10.0,
            oscillation_amplitude: 0.3,
            oscillation_freq_hz: 0.05,
            oscillation_phase: None,
            noise_sigma: 0.1,
            onset_probability: 0.02,
            onset_min: 0.5,
            onset_max: 0.9,
            recovery_rate: 0.15,
            initial_congestion: 0.0,
            base_latency_ms: 20.0,
            base_packet_loss: 0.001,
            min_bandwidth_mbps: 0.1,
        }
    }
}

impl NetworkConfig {
    /// Validates the network section.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - A field is outside its permitted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("network.base_bandwidth_mbps", self.base_bandwidth_mbps)?;
        require_unit_range("network.oscillation_amplitude", self.oscillation_amplitude)?;
        require_non_negative("network.oscillation_freq_hz", self.oscillation_freq_hz)?;
        require_non_negative("network.noise_sigma", self.noise_sigma)?;
        require_unit_range("network.onset_probability", self.onset_probability)?;
        require_unit_range("network.onset_min", self.onset_min)?;
        require_unit_range("network.onset_max", self.onset_max)?;
        if self.onset_min > self.onset_max {
            return Err(ConfigError::InvalidValue {
                field: "network.onset_min",
                reason: format!("must not exceed onset_max ({})", self.onset_max),
            });
        }
        require_non_negative("network.recovery_rate", self.recovery_rate)?;
        if !(0.0..1.0).contains(&self.initial_congestion) {
            return Err(ConfigError::InvalidValue {
                field: "network.initial_congestion",
                reason: format!("must be in [0, 1), got {}", self.initial_congestion),
            });
        }
        require_positive("network.base_latency_ms", self.base_latency_ms)?;
        require_unit_range("network.base_packet_loss", self.base_packet_loss)?;
        require_positive("network.min_bandwidth_mbps", self.min_bandwidth_mbps)?;
        Ok(())
    }
}

/// Playback buffer parameters.
///
/// The buffer level is measured in seconds of pre-buffered content. The
/// stall/resume hysteresis band runs from 0 (enter stall) up to
/// `rebuffer_threshold_s` (exit stall).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum buffer capacity in seconds of content
    pub max_level_s: f64,
    /// Buffer fill at step 0 in seconds
    pub initial_level_s: f64,
    /// Minimum level required to exit a stall, in seconds
    pub rebuffer_threshold_s: f64,
    /// Playback drain in seconds of content per second of wall time
    pub playback_rate: f64,
    /// Inflow cap while playing, in seconds of content per second
    pub inflow_cap: f64,
    /// Inflow cap while stalled; rebuffering is allowed to run hotter
    pub stalled_inflow_cap: f64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_level_s: 30.0,
            initial_level_s: 5.0,
            rebuffer_threshold_s: 3.0,
            playback_rate: 1.0,
            inflow_cap: 2.0,
            stalled_inflow_cap: 3.0,
        }
    }
}

impl BufferConfig {
    /// Validates the buffer section.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - A field is outside its permitted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("buffer.max_level_s", self.max_level_s)?;
        require_non_negative("buffer.initial_level_s", self.initial_level_s)?;
        if self.initial_level_s > self.max_level_s {
            return Err(ConfigError::InvalidValue {
                field: "buffer.initial_level_s",
                reason: format!("must not exceed max_level_s ({})", self.max_level_s),
            });
        }
        require_positive("buffer.rebuffer_threshold_s", self.rebuffer_threshold_s)?;
        if self.rebuffer_threshold_s >= self.max_level_s {
            return Err(ConfigError::InvalidValue {
                field: "buffer.rebuffer_threshold_s",
                reason: format!("must be below max_level_s ({})", self.max_level_s),
            });
        }
        require_positive("buffer.playback_rate", self.playback_rate)?;
        require_positive("buffer.inflow_cap", self.inflow_cap)?;
        require_positive("buffer.stalled_inflow_cap", self.stalled_inflow_cap)?;
        Ok(())
    }
}

/// Adaptive-bitrate encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Fraction of measured bandwidth the encoder may actually commit to
    pub safety_factor: f64,
    /// Consecutive spare-bandwidth steps required before an upgrade
    pub upgrade_hysteresis: u32,
    /// Per-step exponential decay of A/V sync drift (0-1)
    pub drift_decay: f64,
    /// Sigma of the per-step Gaussian drift perturbation, in ms
    pub drift_noise_ms: f64,
    /// Drift impulse added on a stalled step, in ms
    pub stall_penalty_ms: f64,
    /// Drift impulse added on a quality switch, in ms
    pub switch_penalty_ms: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            safety_factor: 0.85,
            upgrade_hysteresis: 3,
            drift_decay: 0.95,
            drift_noise_ms: 0.5,
            stall_penalty_ms: 5.0,
            switch_penalty_ms: 2.0,
        }
    }
}

impl EncoderConfig {
    /// Validates the encoder section.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - A field is outside its permitted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.safety_factor > 0.0 && self.safety_factor <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "encoder.safety_factor",
                reason: format!("must be in (0, 1], got {}", self.safety_factor),
            });
        }
        if self.upgrade_hysteresis == 0 {
            return Err(ConfigError::InvalidValue {
                field: "encoder.upgrade_hysteresis",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.drift_decay > 0.0 && self.drift_decay < 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "encoder.drift_decay",
                reason: format!("must be in (0, 1), got {}", self.drift_decay),
            });
        }
        require_non_negative("encoder.drift_noise_ms", self.drift_noise_ms)?;
        require_non_negative("encoder.stall_penalty_ms", self.stall_penalty_ms)?;
        require_non_negative("encoder.switch_penalty_ms", self.switch_penalty_ms)?;
        Ok(())
    }
}

/// QoE aggregation parameters.
///
/// The three component weights form a convex blend and must sum to 1.0
/// exactly (within floating-point tolerance).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QoeConfig {
    /// Absolute drift above this is perceived as out-of-sync, in ms
    pub oos_threshold_ms: f64,
    /// Packet loss above this counts the step as a dropped frame
    pub drop_loss_threshold: f64,
    /// Stall-ratio weight inside the jerkiness score
    pub stall_weight: f64,
    /// Dropped-frame-ratio weight inside the jerkiness score
    pub drop_weight: f64,
    /// Jerkiness share of the overall QoE
    pub jerkiness_weight: f64,
    /// A/V sync share of the overall QoE
    pub sync_weight: f64,
    /// Quality stability share of the overall QoE
    pub stability_weight: f64,
}

impl Default for QoeConfig {
    fn default() -> Self {
        Self {
            oos_threshold_ms: 40.0,
            drop_loss_threshold: 0.02,
            stall_weight: 3.0,
            drop_weight: 1.0,
            jerkiness_weight: 0.40,
            sync_weight: 0.35,
            stability_weight: 0.25,
        }
    }
}

impl QoeConfig {
    /// Validates the QoE section.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` - A field is outside its permitted range
    /// - `ConfigError::WeightSum` - The three component weights do not sum to 1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("qoe.oos_threshold_ms", self.oos_threshold_ms)?;
        require_unit_range("qoe.drop_loss_threshold", self.drop_loss_threshold)?;
        require_non_negative("qoe.stall_weight", self.stall_weight)?;
        require_non_negative("qoe.drop_weight", self.drop_weight)?;
        require_non_negative("qoe.jerkiness_weight", self.jerkiness_weight)?;
        require_non_negative("qoe.sync_weight", self.sync_weight)?;
        require_non_negative("qoe.stability_weight", self.stability_weight)?;

        let sum = self.jerkiness_weight + self.sync_weight + self.stability_weight;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be non-negative, got {value}"),
        })
    }
}

fn require_unit_range(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be in [0, 1], got {value}"),
        })
    }
}
