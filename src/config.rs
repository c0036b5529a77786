/// Pipeline and generator parameters, with the defaults every entry point starts from.

use serde::{Deserialize, Serialize};

use crate::error::{RectifierError, Result};
use crate::jump_detector::{
    JumpDetector, DEFAULT_BUCKET, DEFAULT_PLATEAU_WINDOW, DEFAULT_SWEEP, DEFAULT_THRESHOLD,
};
use crate::noise_filter::{NoiseFilter, DEFAULT_CUTOFF, DEFAULT_FILTER_ORDER};
use crate::rectifier::{RectifyStrategy, DEFAULT_RECT_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter_order: usize,
    /// Fraction of Nyquist.
    pub cutoff: f64,
    pub sweep: usize,
    pub threshold: f64,
    pub plateau_window: usize,
    pub bucket: f64,
    pub rect_width: usize,
    pub strategy: RectifyStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            filter_order: DEFAULT_FILTER_ORDER,
            cutoff: DEFAULT_CUTOFF,
            sweep: DEFAULT_SWEEP,
            threshold: DEFAULT_THRESHOLD,
            plateau_window: DEFAULT_PLATEAU_WINDOW,
            bucket: DEFAULT_BUCKET,
            rect_width: DEFAULT_RECT_WIDTH,
            strategy: RectifyStrategy::Linear,
        }
    }
}

impl PipelineConfig {
    /// Parameters the batch validation runs with against generated fixtures.
    pub fn acceptance() -> Self {
        PipelineConfig {
            filter_order: 4,
            cutoff: 0.08,
            sweep: 10,
            threshold: 0.3,
            ..Default::default()
        }
    }

    pub fn noise_filter(&self) -> NoiseFilter {
        NoiseFilter::Butterworth {
            order: self.filter_order,
            cutoff: self.cutoff,
        }
    }

    pub fn jump_detector(&self) -> JumpDetector {
        JumpDetector {
            sweep: self.sweep,
            threshold: self.threshold,
            bucket: self.bucket,
            plateau_window: self.plateau_window,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.filter_order == 0 {
            return Err(RectifierError::invalid("filter order must be at least 1"));
        }
        if !(self.cutoff > 0.0 && self.cutoff < 1.0) {
            return Err(RectifierError::invalid(format!(
                "cutoff must be in (0, 1), got {}",
                self.cutoff
            )));
        }
        if self.rect_width == 0 {
            return Err(RectifierError::invalid("rectification width must be at least 1"));
        }
        self.jump_detector().validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub start: f64,
    pub end: f64,
    pub pulses: usize,
    pub points_per_pulse: usize,
    /// Pulse centre relative to the start of its block.
    pub pulse_offset: f64,
    pub pulse_sigma: f64,
    /// Each pulse is divided by a draw from N(scale_mean, scale_std).
    pub scale_mean: f64,
    pub scale_std: f64,
    /// Block i sits `i * N(jump_mean, jump_std)` above the baseline.
    pub jump_mean: f64,
    pub jump_std: f64,
    pub noise_std: f64,
    /// None draws the seed from system entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            start: 0.0,
            end: 3.0,
            pulses: 4,
            points_per_pulse: 1000,
            pulse_offset: 0.5,
            pulse_sigma: 0.05,
            scale_mean: 5.0,
            scale_std: 0.2,
            jump_mean: 1.5,
            jump_std: 0.2,
            noise_std: 0.1,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(seed: u64) -> Self {
        GeneratorConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn total_points(&self) -> usize {
        self.pulses * self.points_per_pulse
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.end > self.start) {
            return Err(RectifierError::invalid(format!(
                "end ({}) must be greater than start ({})",
                self.end, self.start
            )));
        }
        if self.pulses == 0 || self.points_per_pulse == 0 {
            return Err(RectifierError::invalid("need at least one pulse with one point"));
        }
        if self.total_points() < 2 {
            return Err(RectifierError::invalid("need at least two samples"));
        }
        if !(self.pulse_sigma > 0.0) {
            return Err(RectifierError::invalid("pulse sigma must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::acceptance().validate().is_ok());
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_acceptance_parameters() {
        let config = PipelineConfig::acceptance();
        assert_eq!(config.filter_order, 4);
        assert_eq!(config.cutoff, 0.08);
        assert_eq!(config.jump_detector(), JumpDetector::new(10, 0.3));
    }

    #[test]
    fn test_invalid_pipeline_config() {
        let config = PipelineConfig {
            cutoff: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            sweep: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_generator_config() {
        let config = GeneratorConfig {
            start: 3.0,
            end: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GeneratorConfig {
            pulses: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
