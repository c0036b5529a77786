/// Per-signal session: owns the raw samples and every artifact derived from them,
/// and sequences filter -> detect -> rectify.

use std::path::Path;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{RectifierError, Result};
use crate::jump_detector::{JumpDetection, JumpDetector};
use crate::noise_filter::NoiseFilter;
use crate::rectifier::{RectifyOutcome, RectifyStrategy};
use crate::sample_file::read_samples;
use crate::series::SampleSeries;

#[derive(Debug, Clone)]
pub struct SignalRectifier {
    raw: SampleSeries,
    denoised: Option<SampleSeries>,
    rectified: Option<SampleSeries>,
    detection: Option<JumpDetection>,
}

impl SignalRectifier {
    pub fn new(raw: SampleSeries) -> Self {
        SignalRectifier {
            raw,
            denoised: None,
            rectified: None,
            detection: None,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = read_samples(path)?;
        info!(path = %path.display(), samples = raw.len(), "loaded samples");
        Ok(Self::new(raw))
    }

    /// Zero-phase Butterworth low-pass of the raw samples.
    pub fn filter_noise(&mut self, order: usize, cutoff: f64) -> Result<&SampleSeries> {
        self.apply_filter(NoiseFilter::Butterworth { order, cutoff })
    }

    /// Causal moving average of the raw samples.
    pub fn filter_noise_moving_average(&mut self, window: usize) -> Result<&SampleSeries> {
        self.apply_filter(NoiseFilter::MovingAverage { window })
    }

    /// Replace the denoised series. Earlier detections and rectifications refer to
    /// the old series and are discarded.
    pub fn apply_filter(&mut self, filter: NoiseFilter) -> Result<&SampleSeries> {
        let denoised = filter.apply(&self.raw)?;
        self.rectified = Some(denoised.clone());
        self.detection = None;
        Ok(&*self.denoised.insert(denoised))
    }

    pub fn detect_jumps(&mut self, sweep: usize, threshold: f64) -> Result<&[f64]> {
        self.detect_jumps_with(JumpDetector::new(sweep, threshold))
    }

    pub fn detect_jumps_with(&mut self, detector: JumpDetector) -> Result<&[f64]> {
        let denoised = self.denoised.as_ref().ok_or(RectifierError::NotFiltered)?;
        let detection = detector.detect(denoised)?;
        Ok(self.detection.insert(detection).jump_points.as_slice())
    }

    pub fn rectify(&mut self, strategy: RectifyStrategy, width: usize) -> Result<RectifyOutcome> {
        let rectified = self.rectified.as_mut().ok_or(RectifierError::NotFiltered)?;
        let detection = self.detection.as_ref().ok_or(RectifierError::NotDetected)?;

        let outcome = strategy.apply(rectified, detection, width)?;
        if outcome.is_nothing() {
            info!(%strategy, "no jumps detected, nothing to rectify");
        } else {
            info!(%strategy, windows = outcome.windows().len(), width, "rectified jump windows");
        }
        Ok(outcome)
    }

    pub fn rectify_linear(&mut self, width: usize) -> Result<RectifyOutcome> {
        self.rectify(RectifyStrategy::Linear, width)
    }

    pub fn rectify_sinusoidal(&mut self, width: usize) -> Result<RectifyOutcome> {
        self.rectify(RectifyStrategy::Sinusoidal, width)
    }

    /// Discard rectifications, restoring the rectified series to the denoised one.
    pub fn reset_rectification(&mut self) -> Result<()> {
        let denoised = self.denoised.as_ref().ok_or(RectifierError::NotFiltered)?;
        self.rectified = Some(denoised.clone());
        Ok(())
    }

    /// Filter, detect and rectify with one set of parameters.
    pub fn run(&mut self, config: &PipelineConfig) -> Result<RectifyOutcome> {
        config.validate()?;
        self.apply_filter(config.noise_filter())?;
        self.detect_jumps_with(config.jump_detector())?;
        self.rectify(config.strategy, config.rect_width)
    }

    pub fn raw(&self) -> &SampleSeries {
        &self.raw
    }

    pub fn denoised(&self) -> Result<&SampleSeries> {
        self.denoised.as_ref().ok_or(RectifierError::NotFiltered)
    }

    pub fn rectified(&self) -> Result<&SampleSeries> {
        self.rectified.as_ref().ok_or(RectifierError::NotFiltered)
    }

    pub fn detection(&self) -> Option<&JumpDetection> {
        self.detection.as_ref()
    }

    pub fn jump_points(&self) -> &[f64] {
        self.detection
            .as_ref()
            .map(|d| d.jump_points.as_slice())
            .unwrap_or(&[])
    }

    pub fn height_levels(&self) -> &[f64] {
        self.detection
            .as_ref()
            .map(|d| d.height_levels.as_slice())
            .unwrap_or(&[])
    }
}
