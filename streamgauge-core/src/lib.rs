//! Streamgauge Core - Domain types and configuration
//!
//! This crate provides the shared building blocks for the Streamgauge
//! simulation: the encoder quality ladder, the central configuration
//! tree with validation, and the configuration error type.

pub mod config;
pub mod quality;

// Re-export main types for convenient access
pub use config::{
    BufferConfig, ConfigError, EncoderConfig, NetworkConfig, QoeConfig, StreamgaugeConfig,
};
pub use quality::QualityLevel;
