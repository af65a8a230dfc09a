//! Streamgauge Simulation Engine - Deterministic live-stream QoE modelling.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! This crate advances four coupled components through discrete time
//! steps: a nonlinear network-condition model, a playback buffer with
//! stall hysteresis, an adaptive-bitrate encoder with upgrade hysteresis
//! and A/V sync drift, and a QoE aggregator that reduces the recorded
//! history to a weighted 0-10 report.
//!
//! # Features
//!
//! - **Deterministic Execution**: Same seed always produces identical runs
//! - **Nonlinear Network Model**: Congestion-driven bandwidth, latency, loss
//! - **Hysteretic Dynamics**: Stall/resume and upgrade policies that do not flap
//! - **Scenario Library**: Named network profiles for systematic comparison
//!
//! # Example
//!
//! ```rust
//! use streamgauge_core::StreamgaugeConfig;
//! use streamgauge_sim::StreamSimulation;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sim = StreamSimulation::new(StreamgaugeConfig::default(), 42)?;
//! let run = sim.run(300);
//!
//! assert_eq!(run.timeline.len(), 300);
//! println!("overall QoE: {:.2}", run.report.overall_qoe);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod encoder;
pub mod metrics;
pub mod network;
pub mod rng;
pub mod scenarios;
pub mod simulation;

pub use buffer::{BufferEvent, PlaybackBuffer};
pub use encoder::{AdaptiveEncoder, EncoderStepResult};
pub use metrics::{QoeReport, QualityAggregator, StepRecord};
pub use network::{NetworkConditionModel, NetworkSample};
pub use rng::DeterministicRng;
pub use scenarios::{Scenario, ScenarioOutcome, ScenarioRunner};
pub use simulation::{SimulationRun, StreamSimulation};
