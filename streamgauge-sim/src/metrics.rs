//! QoE aggregation over a recorded run history.
//!
//! The aggregator is a pure function of the ordered step history: it
//! never mutates its input and owns no state of its own beyond the
//! scoring weights. All three component scores and the overall QoE live
//! on a 0-10 scale, higher is better.

use serde::Serialize;
use streamgauge_core::{QoeConfig, QualityLevel};

/// Immutable snapshot of one simulation step.
///
/// Appended to the run history by the orchestrator and never mutated
/// afterwards. Carries both the flags the aggregator scores on and the
/// raw signals a timeline consumer may want to plot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepRecord {
    /// Simulated time at the start of this step, in seconds
    pub t_s: f64,
    /// Bandwidth observed this step, in Mbit/s
    pub bandwidth_mbps: f64,
    /// One-way latency this step, in ms
    pub latency_ms: f64,
    /// Packet-loss probability this step
    pub packet_loss: f64,
    /// Latent congestion level this step
    pub congestion: f64,
    /// Buffer level after the step, in seconds of content
    pub buffer_level_s: f64,
    /// Whether playback was stalled during this step
    pub stalled: bool,
    /// Whether packet loss crossed the dropped-frame threshold
    pub dropped_frame: bool,
    /// Whether |drift| crossed the out-of-sync threshold
    pub out_of_sync: bool,
    /// Tier delivered this step
    pub quality: QualityLevel,
    /// Whether the tier changed this step
    pub quality_switched: bool,
    /// A/V sync drift after this step, in ms
    pub drift_ms: f64,
}

/// Final aggregate of one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct QoeReport {
    /// Number of steps aggregated
    pub total_steps: usize,
    /// Number of stall events (entries into the stalled state)
    pub stall_count: u32,
    /// Fraction of steps spent stalled
    pub stall_ratio: f64,
    /// Fraction of steps with dropped frames
    pub dropped_frame_ratio: f64,
    /// Mean absolute A/V drift in ms
    pub mean_drift_ms: f64,
    /// Maximum absolute A/V drift in ms
    pub max_drift_ms: f64,
    /// Fraction of steps perceived as out-of-sync
    pub out_of_sync_ratio: f64,
    /// Number of quality switches
    pub switch_count: u32,
    /// Switches per step
    pub switch_rate: f64,
    /// Mean buffer level in seconds of content
    pub mean_buffer_level_s: f64,
    /// Stall/dropped-frame component score, 0-10
    pub jerkiness_score: f64,
    /// A/V sync component score, 0-10
    pub sync_score: f64,
    /// Quality stability component score, 0-10
    pub stability_score: f64,
    /// Weighted overall QoE, 0-10
    pub overall_qoe: f64,
}

impl QoeReport {
    /// Report for an empty history: nothing happened, nothing to
    /// penalize, so every score sits at the neutral maximum.
    pub fn neutral() -> Self {
        Self {
            total_steps: 0,
            stall_count: 0,
            stall_ratio: 0.0,
            dropped_frame_ratio: 0.0,
            mean_drift_ms: 0.0,
            max_drift_ms: 0.0,
            out_of_sync_ratio: 0.0,
            switch_count: 0,
            switch_rate: 0.0,
            mean_buffer_level_s: 0.0,
            jerkiness_score: 10.0,
            sync_score: 10.0,
            stability_score: 10.0,
            overall_qoe: 10.0,
        }
    }
}

/// Reduces a run history to a [`QoeReport`].
#[derive(Debug, Clone)]
pub struct QualityAggregator {
    config: QoeConfig,
}

impl QualityAggregator {
    /// Creates an aggregator with the given scoring parameters.
    pub fn new(config: QoeConfig) -> Self {
        Self { config }
    }

    /// Computes the QoE report over the full history.
    ///
    /// Pure with respect to `history`; an empty history yields the
    /// neutral report rather than dividing by zero.
    pub fn aggregate(&self, history: &[StepRecord]) -> QoeReport {
        if history.is_empty() {
            return QoeReport::neutral();
        }
        let steps = history.len() as f64;

        let stalled_steps = history.iter().filter(|record| record.stalled).count();
        let stall_ratio = stalled_steps as f64 / steps;

        // A stall event is a rising edge of the stalled flag.
        let mut stall_count = 0u32;
        let mut previously_stalled = false;
        for record in history {
            if record.stalled && !previously_stalled {
                stall_count += 1;
            }
            previously_stalled = record.stalled;
        }

        let dropped_steps = history.iter().filter(|record| record.dropped_frame).count();
        let dropped_frame_ratio = dropped_steps as f64 / steps;

        let mean_drift_ms =
            history.iter().map(|record| record.drift_ms.abs()).sum::<f64>() / steps;
        let max_drift_ms = history
            .iter()
            .map(|record| record.drift_ms.abs())
            .fold(0.0, f64::max);
        let out_of_sync_steps = history.iter().filter(|record| record.out_of_sync).count();
        let out_of_sync_ratio = out_of_sync_steps as f64 / steps;

        let switch_count = history
            .iter()
            .filter(|record| record.quality_switched)
            .count() as u32;
        let switch_rate = f64::from(switch_count) / steps;

        let mean_buffer_level_s =
            history.iter().map(|record| record.buffer_level_s).sum::<f64>() / steps;

        let jerkiness_penalty =
            self.config.stall_weight * stall_ratio + self.config.drop_weight * dropped_frame_ratio;
        let jerkiness_score = 10.0 * (1.0 - jerkiness_penalty.clamp(0.0, 1.0));

        let drift_penalty = (mean_drift_ms / (10.0 * self.config.oos_threshold_ms)).min(1.0);
        let sync_score = 10.0 * (1.0 - (out_of_sync_ratio + drift_penalty).clamp(0.0, 1.0));

        let stability_score = 10.0 * (1.0 - switch_rate.clamp(0.0, 1.0));

        let overall_qoe = (self.config.jerkiness_weight * jerkiness_score
            + self.config.sync_weight * sync_score
            + self.config.stability_weight * stability_score)
            .clamp(0.0, 10.0);

        QoeReport {
            total_steps: history.len(),
            stall_count,
            stall_ratio,
            dropped_frame_ratio,
            mean_drift_ms,
            max_drift_ms,
            out_of_sync_ratio,
            switch_count,
            switch_rate,
            mean_buffer_level_s,
            jerkiness_score,
            sync_score,
            stability_score,
            overall_qoe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stalled: bool, dropped: bool, switched: bool, drift_ms: f64) -> StepRecord {
        StepRecord {
            t_s: 0.0,
            bandwidth_mbps: 10.0,
            latency_ms: 20.0,
            packet_loss: 0.001,
            congestion: 0.0,
            buffer_level_s: 5.0,
            stalled,
            dropped_frame: dropped,
            out_of_sync: drift_ms.abs() > 40.0,
            quality: QualityLevel::Q480p,
            quality_switched: switched,
            drift_ms,
        }
    }

    fn aggregator() -> QualityAggregator {
        QualityAggregator::new(QoeConfig::default())
    }

    #[test]
    fn test_empty_history_is_neutral() {
        let report = aggregator().aggregate(&[]);
        assert_eq!(report.total_steps, 0);
        assert_eq!(report.stall_count, 0);
        assert_eq!(report.switch_count, 0);
        assert_eq!(report.jerkiness_score, 10.0);
        assert_eq!(report.sync_score, 10.0);
        assert_eq!(report.stability_score, 10.0);
        assert_eq!(report.overall_qoe, 10.0);
    }

    #[test]
    fn test_clean_run_scores_ten() {
        let history: Vec<StepRecord> =
            (0..100).map(|_| record(false, false, false, 0.0)).collect();
        let report = aggregator().aggregate(&history);

        assert_eq!(report.stall_count, 0);
        assert_eq!(report.jerkiness_score, 10.0);
        assert_eq!(report.sync_score, 10.0);
        assert_eq!(report.stability_score, 10.0);
        assert_eq!(report.overall_qoe, 10.0);
    }

    #[test]
    fn test_stall_events_count_rising_edges() {
        let mut history = Vec::new();
        // Two separate stall periods, three stalled steps each.
        for _ in 0..2 {
            for _ in 0..5 {
                history.push(record(false, false, false, 0.0));
            }
            for _ in 0..3 {
                history.push(record(true, false, false, 0.0));
            }
        }
        let report = aggregator().aggregate(&history);

        assert_eq!(report.stall_count, 2);
        assert!((report.stall_ratio - 6.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_fully_stalled_run_floors_jerkiness() {
        let history: Vec<StepRecord> = (0..50).map(|_| record(true, true, false, 0.0)).collect();
        let report = aggregator().aggregate(&history);

        // Penalty 3.0 * 1.0 + 1.0 * 1.0 clamps to 1.
        assert_eq!(report.jerkiness_score, 0.0);
        assert!(report.overall_qoe < 10.0);
    }

    #[test]
    fn test_constant_switching_floors_stability() {
        let history: Vec<StepRecord> = (0..50).map(|_| record(false, false, true, 0.0)).collect();
        let report = aggregator().aggregate(&history);

        assert_eq!(report.switch_count, 50);
        assert_eq!(report.stability_score, 0.0);
    }

    #[test]
    fn test_drift_statistics() {
        let history = vec![
            record(false, false, false, -30.0),
            record(false, false, false, 50.0),
        ];
        let report = aggregator().aggregate(&history);

        assert!((report.mean_drift_ms - 40.0).abs() < 1e-12);
        assert!((report.max_drift_ms - 50.0).abs() < 1e-12);
        assert!((report.out_of_sync_ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_scores_stay_in_bounds_under_extremes() {
        let history: Vec<StepRecord> =
            (0..20).map(|_| record(true, true, true, 100_000.0)).collect();
        let report = aggregator().aggregate(&history);

        for score in [
            report.jerkiness_score,
            report.sync_score,
            report.stability_score,
            report.overall_qoe,
        ] {
            assert!((0.0..=10.0).contains(&score), "score out of bounds: {score}");
        }
    }

    #[test]
    fn test_weights_shift_overall() {
        let history: Vec<StepRecord> = (0..10).map(|_| record(true, false, false, 0.0)).collect();

        let jerk_heavy = QualityAggregator::new(QoeConfig {
            jerkiness_weight: 0.8,
            sync_weight: 0.1,
            stability_weight: 0.1,
            ..QoeConfig::default()
        });
        let sync_heavy = QualityAggregator::new(QoeConfig {
            jerkiness_weight: 0.1,
            sync_weight: 0.8,
            stability_weight: 0.1,
            ..QoeConfig::default()
        });

        // All-stalled history hurts the jerkiness component only, so the
        // jerkiness-heavy blend must come out lower.
        assert!(jerk_heavy.aggregate(&history).overall_qoe < sync_heavy.aggregate(&history).overall_qoe);
    }
}
