//! Reproducibility guarantees across runs.

use streamgauge_core::StreamgaugeConfig;
use streamgauge_sim::{StreamSimulation, scenarios};

#[test]
fn test_same_seed_bit_identical_history() {
    let run1 = StreamSimulation::new(StreamgaugeConfig::default(), 1234)
        .unwrap()
        .run(300);
    let run2 = StreamSimulation::new(StreamgaugeConfig::default(), 1234)
        .unwrap()
        .run(300);

    for (a, b) in run1.timeline.iter().zip(&run2.timeline) {
        assert_eq!(a.bandwidth_mbps.to_bits(), b.bandwidth_mbps.to_bits());
        assert_eq!(a.latency_ms.to_bits(), b.latency_ms.to_bits());
        assert_eq!(a.packet_loss.to_bits(), b.packet_loss.to_bits());
        assert_eq!(a.drift_ms.to_bits(), b.drift_ms.to_bits());
        assert_eq!(a.buffer_level_s.to_bits(), b.buffer_level_s.to_bits());
        assert_eq!(a.quality, b.quality);
        assert_eq!(a.stalled, b.stalled);
    }
    assert_eq!(
        run1.report.overall_qoe.to_bits(),
        run2.report.overall_qoe.to_bits()
    );
}

#[test]
fn test_stable_and_congested_share_draw_sequences() {
    // The two configs differ only in the congestion trigger, and the
    // model burns one onset draw and one onset-target draw per step
    // whether or not an onset fires, so the underlying noise sequences
    // must line up exactly under the same seed.
    let stable = scenarios::stable().run(77, 100).unwrap();
    let congested = scenarios::congested().run(77, 100).unwrap();

    for (a, b) in stable.timeline.iter().zip(&congested.timeline) {
        // Bandwidth differs by the congestion factor; the multiplicative
        // noise behind it is identical, so the ratio must equal the
        // availability ratio exactly whenever neither hit the floor.
        let availability_a = 1.0 - a.congestion;
        let availability_b = 1.0 - b.congestion;
        if a.bandwidth_mbps > 0.11 && b.bandwidth_mbps > 0.11 {
            let ratio = (a.bandwidth_mbps / availability_a) / (b.bandwidth_mbps / availability_b);
            assert!(
                (ratio - 1.0).abs() < 1e-9,
                "noise sequences diverged: ratio {ratio}"
            );
        }
    }
}

#[test]
fn test_runs_are_independent() {
    // Two simulations constructed up-front, then run back to back: each
    // owns its state bundle, so interleaved construction cannot leak
    // state between them.
    let sim1 = StreamSimulation::new(StreamgaugeConfig::default(), 5).unwrap();
    let sim2 = StreamSimulation::new(StreamgaugeConfig::default(), 5).unwrap();

    let run1 = sim1.run(150);
    let run2 = sim2.run(150);

    assert_eq!(run1.report.overall_qoe.to_bits(), run2.report.overall_qoe.to_bits());
    assert_eq!(run1.seed, run2.seed);
}
