//! End-to-end scenario outcome assertions.

use streamgauge_sim::scenarios;

const STEPS: usize = 300;
const SEED: u64 = 42;

#[test]
fn test_stable_network_never_stalls() {
    let run = scenarios::stable().run(SEED, STEPS).unwrap();

    assert_eq!(run.report.stall_count, 0);
    assert!(run.timeline.iter().all(|record| !record.stalled));
    assert!(
        run.report.overall_qoe >= 9.0,
        "stable QoE too low: {:.2}",
        run.report.overall_qoe
    );
}

#[test]
fn test_forced_congestion_stalls_and_scores_below_stable() {
    let stable = scenarios::stable().run(SEED, STEPS).unwrap();
    let congested = scenarios::congested().run(SEED, STEPS).unwrap();

    assert!(
        congested.report.stall_count >= 1,
        "forced congestion produced no stall"
    );
    assert!(
        congested.report.overall_qoe < stable.report.overall_qoe,
        "congested QoE {:.2} not below stable {:.2}",
        congested.report.overall_qoe,
        stable.report.overall_qoe
    );
}

#[test]
fn test_congestion_stays_high_through_early_run() {
    let run = scenarios::congested().run(SEED, STEPS).unwrap();

    for record in run.timeline.iter().take(50) {
        assert!(
            record.congestion > 0.9,
            "congestion recovered too quickly at t={}: {}",
            record.t_s,
            record.congestion
        );
    }
}

#[test]
fn test_all_scenarios_produce_bounded_scores() {
    for scenario in scenarios::all() {
        let run = scenario.run(SEED, STEPS).unwrap();
        let report = &run.report;

        for score in [
            report.jerkiness_score,
            report.sync_score,
            report.stability_score,
            report.overall_qoe,
        ] {
            assert!(
                (0.0..=10.0).contains(&score),
                "{}: score out of bounds: {score}",
                scenario.name
            );
        }
        assert_eq!(report.total_steps, STEPS);
    }
}

#[test]
fn test_poor_network_scores_below_moderate() {
    let moderate = scenarios::moderate().run(SEED, STEPS).unwrap();
    let poor = scenarios::poor().run(SEED, STEPS).unwrap();

    assert!(poor.report.overall_qoe < moderate.report.overall_qoe);
}

#[test]
fn test_stable_network_reaches_top_tier() {
    let run = scenarios::stable().run(SEED, STEPS).unwrap();
    let last = run.timeline.last().unwrap();

    assert_eq!(last.quality, streamgauge_core::QualityLevel::Q1080p60);
}

#[test]
fn test_report_serializes_to_json() {
    let run = scenarios::moderate().run(SEED, 50).unwrap();

    let json = serde_json::to_string(&run.report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_steps"], 50);
    assert!(value["overall_qoe"].is_number());
}
