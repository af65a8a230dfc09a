//! Simulation orchestrator.
//!
//! Owns the four component states, the single seeded RNG, and the
//! append-only run history. Each step advances the components in a fixed
//! order: network first, then the buffer (fed the previous step's
//! encoder bitrate), then the encoder (fed the buffer's post-update
//! stall flag). The ordering is part of the model and applied uniformly;
//! reordering it would produce different, equally plausible trajectories.

use streamgauge_core::{ConfigError, StreamgaugeConfig};
use tracing::info;

use crate::buffer::PlaybackBuffer;
use crate::encoder::AdaptiveEncoder;
use crate::metrics::{QoeReport, QualityAggregator, StepRecord};
use crate::network::NetworkConditionModel;
use crate::rng::DeterministicRng;

/// Output of a completed run: the aggregate report plus the per-step
/// timeline it was computed from.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// Aggregated QoE report
    pub report: QoeReport,
    /// Ordered per-step history
    pub timeline: Vec<StepRecord>,
    /// Seed the run was driven by
    pub seed: u64,
}

/// Discrete-time simulation of live-stream delivery.
///
/// Construction validates the configuration and seeds the run RNG; the
/// simulation is then consumed by [`run`]. Every run owns its entire
/// state bundle, so concurrent runs of different scenarios need no
/// coordination and cannot perturb each other's draw sequences.
///
/// [`run`]: StreamSimulation::run
#[derive(Debug)]
pub struct StreamSimulation {
    config: StreamgaugeConfig,
    rng: DeterministicRng,
    network: NetworkConditionModel,
    buffer: PlaybackBuffer,
    encoder: AdaptiveEncoder,
    aggregator: QualityAggregator,
}

impl StreamSimulation {
    /// Creates a simulation from a configuration and a seed.
    ///
    /// # Errors
    ///
    /// - `ConfigError` - The configuration failed validation
    pub fn new(config: StreamgaugeConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = DeterministicRng::from_seed(seed);
        let network = NetworkConditionModel::new(config.network.clone(), &mut rng);
        let buffer = PlaybackBuffer::new(config.buffer.clone());
        let encoder = AdaptiveEncoder::new(config.encoder.clone());
        let aggregator = QualityAggregator::new(config.qoe.clone());

        Ok(Self {
            config,
            rng,
            network,
            buffer,
            encoder,
            aggregator,
        })
    }

    /// Runs the simulation for `steps` steps and aggregates the history.
    ///
    /// A strict sequential fold: no step is skipped or reordered, and
    /// the history is append-only.
    pub fn run(mut self, steps: usize) -> SimulationRun {
        let dt = self.config.dt_s;
        let mut timeline = Vec::with_capacity(steps);

        for step in 0..steps {
            let sample = self.network.advance(dt, &mut self.rng);

            // The buffer fills at the bitrate chosen in the previous
            // step; this step's tier decision comes after.
            let bitrate_mbps = self.encoder.bitrate_mbps();
            self.buffer.advance(dt, sample.bandwidth_mbps, bitrate_mbps);

            let encoded =
                self.encoder
                    .advance(sample.bandwidth_mbps, self.buffer.is_stalled(), &mut self.rng);

            timeline.push(StepRecord {
                t_s: step as f64 * dt,
                bandwidth_mbps: sample.bandwidth_mbps,
                latency_ms: sample.latency_ms,
                packet_loss: sample.packet_loss,
                congestion: self.network.congestion(),
                buffer_level_s: self.buffer.level_s(),
                stalled: self.buffer.is_stalled(),
                dropped_frame: sample.packet_loss > self.config.qoe.drop_loss_threshold,
                out_of_sync: encoded.drift_ms.abs() > self.config.qoe.oos_threshold_ms,
                quality: encoded.level,
                quality_switched: encoded.switched,
                drift_ms: encoded.drift_ms,
            });
        }

        let report = self.aggregator.aggregate(&timeline);
        info!(
            steps,
            stalls = report.stall_count,
            qoe = format!("{:.2}", report.overall_qoe),
            "simulation complete"
        );

        SimulationRun {
            report,
            timeline,
            seed: self.rng.seed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use streamgauge_core::QualityLevel;

    use super::*;

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = StreamgaugeConfig::default();
        config.buffer.max_level_s = -1.0;
        assert!(StreamSimulation::new(config, 42).is_err());
    }

    #[test]
    fn test_timeline_length_matches_steps() {
        let sim = StreamSimulation::new(StreamgaugeConfig::default(), 42).unwrap();
        let run = sim.run(120);
        assert_eq!(run.timeline.len(), 120);
        assert_eq!(run.report.total_steps, 120);
    }

    #[test]
    fn test_zero_steps_yields_neutral_report() {
        let sim = StreamSimulation::new(StreamgaugeConfig::default(), 42).unwrap();
        let run = sim.run(0);
        assert!(run.timeline.is_empty());
        assert_eq!(run.report.overall_qoe, 10.0);
    }

    #[test]
    fn test_identical_seeds_produce_identical_runs() {
        let run1 = StreamSimulation::new(StreamgaugeConfig::default(), 7)
            .unwrap()
            .run(200);
        let run2 = StreamSimulation::new(StreamgaugeConfig::default(), 7)
            .unwrap()
            .run(200);

        assert_eq!(run1.timeline.len(), run2.timeline.len());
        for (a, b) in run1.timeline.iter().zip(&run2.timeline) {
            assert_eq!(a.bandwidth_mbps, b.bandwidth_mbps);
            assert_eq!(a.drift_ms, b.drift_ms);
            assert_eq!(a.quality, b.quality);
            assert_eq!(a.stalled, b.stalled);
        }
        assert_eq!(run1.report.overall_qoe, run2.report.overall_qoe);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let run1 = StreamSimulation::new(StreamgaugeConfig::default(), 1)
            .unwrap()
            .run(100);
        let run2 = StreamSimulation::new(StreamgaugeConfig::default(), 2)
            .unwrap()
            .run(100);

        let same = run1
            .timeline
            .iter()
            .zip(&run2.timeline)
            .all(|(a, b)| a.bandwidth_mbps == b.bandwidth_mbps);
        assert!(!same);
    }

    #[test]
    fn test_timestamps_follow_dt() {
        let config = StreamgaugeConfig {
            dt_s: 0.5,
            ..StreamgaugeConfig::default()
        };
        let run = StreamSimulation::new(config, 42).unwrap().run(4);
        let times: Vec<f64> = run.timeline.iter().map(|record| record.t_s).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_encoder_climbs_under_generous_bandwidth() {
        let mut config = StreamgaugeConfig::default();
        config.network.base_bandwidth_mbps = 30.0;
        config.network.onset_probability = 0.0;
        config.network.noise_sigma = 0.0;
        config.network.oscillation_amplitude = 0.0;

        let run = StreamSimulation::new(config, 42).unwrap().run(50);
        assert_eq!(
            run.timeline.last().unwrap().quality,
            QualityLevel::Q1080p60
        );
    }
}
