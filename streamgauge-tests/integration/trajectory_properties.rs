//! Property-based invariants over arbitrary trajectories.

use proptest::prelude::*;
use streamgauge_core::{BufferConfig, EncoderConfig, NetworkConfig, QualityLevel, StreamgaugeConfig};
use streamgauge_sim::{AdaptiveEncoder, DeterministicRng, NetworkConditionModel, PlaybackBuffer, StreamSimulation};

proptest! {
    /// Once stalled, the buffer stays stalled until the level reaches
    /// the rebuffer threshold; it never resumes below it, and the level
    /// never leaves [0, max].
    #[test]
    fn buffer_hysteresis_and_bounds(bandwidths in prop::collection::vec(0.0f64..8.0, 1..400)) {
        let config = BufferConfig::default();
        let mut buffer = PlaybackBuffer::new(config.clone());
        let mut was_stalled = false;

        for bandwidth in bandwidths {
            let event = buffer.advance(1.0, bandwidth, 1.0);

            prop_assert!((0.0..=config.max_level_s).contains(&buffer.level_s()));
            if event.resumed {
                prop_assert!(buffer.level_s() >= config.rebuffer_threshold_s);
            }
            if was_stalled && buffer.level_s() < config.rebuffer_threshold_s {
                prop_assert!(buffer.is_stalled());
            }
            if event.stalled {
                prop_assert_eq!(buffer.level_s(), 0.0);
            }
            was_stalled = buffer.is_stalled();
        }
    }

    /// Negative bandwidth behaves exactly like zero bandwidth.
    #[test]
    fn buffer_clamps_negative_bandwidth(magnitude in 0.0f64..100.0) {
        let mut negative = PlaybackBuffer::new(BufferConfig::default());
        let mut zero = PlaybackBuffer::new(BufferConfig::default());

        negative.advance(1.0, -magnitude, 1.0);
        zero.advance(1.0, 0.0, 1.0);
        prop_assert_eq!(negative.level_s(), zero.level_s());
    }

    /// A failing tier is abandoned the very next step, and upgrades move
    /// one rung at a time.
    #[test]
    fn encoder_downgrade_immediacy(bandwidths in prop::collection::vec(0.0f64..20.0, 1..300)) {
        let config = EncoderConfig { drift_noise_ms: 0.0, ..EncoderConfig::default() };
        let safety = config.safety_factor;
        let mut encoder = AdaptiveEncoder::new(config);
        let mut rng = DeterministicRng::from_seed(0);

        for bandwidth in bandwidths {
            let before = encoder.current_level();
            let result = encoder.advance(bandwidth, false, &mut rng);

            if bandwidth.max(0.0) * safety < before.min_bandwidth_mbps() {
                prop_assert!(
                    result.level < before || before == QualityLevel::lowest(),
                    "tier {} survived bandwidth {}", before, bandwidth
                );
            }
            if result.level > before {
                prop_assert_eq!(Some(result.level), before.higher());
            }
        }
    }

    /// N-1 qualifying steps followed by a disqualifying one never
    /// upgrade, regardless of how generous the qualifying bandwidth is.
    #[test]
    fn encoder_upgrade_needs_full_streak(spare in 3.0f64..100.0, runs in 1usize..6) {
        let config = EncoderConfig { drift_noise_ms: 0.0, ..EncoderConfig::default() };
        let hysteresis = config.upgrade_hysteresis as usize;
        let mut encoder = AdaptiveEncoder::new(config);
        let mut rng = DeterministicRng::from_seed(0);

        for _ in 0..runs {
            for _ in 0..hysteresis - 1 {
                encoder.advance(spare, false, &mut rng);
            }
            // Holds 160p but offers no headroom for 360p.
            encoder.advance(1.0, false, &mut rng);
        }
        prop_assert_eq!(encoder.current_level(), QualityLevel::lowest());
    }

    /// Latency and packet loss never decrease with congestion, for any
    /// fixed draw sequence.
    #[test]
    fn network_nonlinearities_monotone(low in 0.0f64..0.5, delta in 0.0f64..0.49, seed in 0u64..1000) {
        let high = low + delta;
        let sample_at = |congestion: f64| {
            let config = NetworkConfig {
                onset_probability: 0.0,
                recovery_rate: 0.0,
                initial_congestion: congestion,
                ..NetworkConfig::default()
            };
            let mut rng = DeterministicRng::from_seed(seed);
            let mut model = NetworkConditionModel::new(config, &mut rng);
            model.advance(1.0, &mut rng)
        };

        let at_low = sample_at(low);
        let at_high = sample_at(high);
        prop_assert!(at_high.latency_ms >= at_low.latency_ms);
        prop_assert!(at_high.packet_loss >= at_low.packet_loss);
        prop_assert!(at_low.latency_ms >= NetworkConfig::default().base_latency_ms);
    }

    /// Whole-run QoE and component scores stay within [0, 10] across
    /// arbitrary seeds and hostile network parameters.
    #[test]
    fn qoe_bounded_for_any_seed(
        seed in 0u64..5000,
        base_bandwidth in 0.2f64..30.0,
        onset_probability in 0.0f64..1.0,
    ) {
        let mut config = StreamgaugeConfig::default();
        config.network.base_bandwidth_mbps = base_bandwidth;
        config.network.onset_probability = onset_probability;

        let run = StreamSimulation::new(config, seed).unwrap().run(100);
        for score in [
            run.report.jerkiness_score,
            run.report.sync_score,
            run.report.stability_score,
            run.report.overall_qoe,
        ] {
            prop_assert!((0.0..=10.0).contains(&score));
        }
        for record in &run.timeline {
            prop_assert!(record.bandwidth_mbps > 0.0);
            prop_assert!((0.0..=1.0).contains(&record.packet_loss));
        }
    }
}
