#![allow(
    clippy::cast_precision_loss,        // Byte counts to f64 for Mbps
    clippy::cast_sign_loss,            // Ratio of positive durations
    clippy::must_use_candidate
)]

//! Per-task throughput accounting
//!
//! - [`ByteCounter`]: atomic byte total with a read-and-reset delta
//! - [`SpeedWindow`]: trailing-window estimator producing smoothed Mbps
//!
//! ## Usage Example
//!
//! ```rust
//! use ratewatch_events::{ByteCounter, SpeedConfig, SpeedWindow};
//! use std::time::{Duration, Instant};
//!
//! let counter = ByteCounter::new();
//! let mut window = SpeedWindow::new(SpeedConfig::default());
//!
//! counter.add(1_000_000);
//! let mbps = window.record(Instant::now(), counter.take_delta());
//! assert!((mbps - 8.0).abs() < 1e-9);
//! ```
//!
//! ## Algorithm Details
//!
//! On each tick the byte delta becomes an instantaneous speed
//! (`bytes * 8 / 1e6`, divided by the tick length when it is not one
//! second). Samples older than the window are pruned; the rest are averaged
//! with weight `age / window`. When every weight is zero the instantaneous
//! value is reported as-is.

pub mod config;
pub mod counter;
pub mod speed;

pub use config::SpeedConfig;
pub use counter::ByteCounter;
pub use speed::{bytes_to_mbps, SpeedSample, SpeedWindow};
