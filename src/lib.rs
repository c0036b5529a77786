//! Jump detection and rectification for noisy motion-capture trajectories.
//!
//! Raw (time, value) samples are low-pass filtered, scanned for abrupt
//! discontinuities, and each discontinuity is bridged with either a straight line
//! or a half-period sine between the plateaus on both sides.

pub mod config;
pub mod error;
pub mod generator;
pub mod jump_detector;
pub mod noise_filter;
pub mod rectifier;
pub mod sample_file;
pub mod series;
pub mod signal_rectifier;
pub mod validation;

pub use config::{GeneratorConfig, PipelineConfig};
pub use error::{RectifierError, Result};
pub use generator::TestSignal;
pub use jump_detector::{JumpDetection, JumpDetector};
pub use noise_filter::{ButterworthLowPass, NoiseFilter};
pub use rectifier::{RectifiedWindow, RectifyOutcome, RectifyStrategy};
pub use series::SampleSeries;
pub use signal_rectifier::SignalRectifier;
