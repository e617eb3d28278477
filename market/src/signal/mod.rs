//! Windowed change computation and threshold classification.
//!
//! Both stages are pure: they read a registry view and return values, and
//! never hold a registry lock while computing.

pub mod threshold;
pub mod window;

pub use threshold::{Classification, Signal, ThresholdClassifier};
pub use window::{WindowCalculator, WindowChange};
