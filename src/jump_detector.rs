/// Jump detection on a denoised series.
///
/// A jump onset is any index where the value `sweep` samples ahead differs by more
/// than `threshold`. Consecutive qualifying indices belong to the same physical
/// jump and collapse onto one coarse time bucket; the first index to reach a
/// bucket decides the recorded time.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RectifierError, Result};
use crate::series::{round_decimals, round_nearest, SampleSeries};

pub const DEFAULT_SWEEP: usize = 10;
pub const DEFAULT_THRESHOLD: f64 = 0.2;
pub const DEFAULT_BUCKET: f64 = 0.05;
pub const DEFAULT_PLATEAU_WINDOW: usize = 400;

/// Jump points plus the plateau level on each side of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JumpDetection {
    /// Onset times, bucket-rounded, strictly increasing.
    pub jump_points: Vec<f64>,
    /// `height_levels[0]` is the implicit level 0 before the first jump;
    /// `height_levels[i + 1]` is the plateau after `jump_points[i]`.
    pub height_levels: Vec<f64>,
}

impl JumpDetection {
    pub fn is_empty(&self) -> bool {
        self.jump_points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jump_points.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpDetector {
    pub sweep: usize,
    pub threshold: f64,
    pub bucket: f64,
    pub plateau_window: usize,
}

impl Default for JumpDetector {
    fn default() -> Self {
        JumpDetector {
            sweep: DEFAULT_SWEEP,
            threshold: DEFAULT_THRESHOLD,
            bucket: DEFAULT_BUCKET,
            plateau_window: DEFAULT_PLATEAU_WINDOW,
        }
    }
}

impl JumpDetector {
    pub fn new(sweep: usize, threshold: f64) -> Self {
        JumpDetector {
            sweep,
            threshold,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep == 0 {
            return Err(RectifierError::invalid("sweep must be at least 1"));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(RectifierError::invalid(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if !(self.bucket.is_finite() && self.bucket > 0.0) {
            return Err(RectifierError::invalid(format!(
                "bucket must be positive, got {}",
                self.bucket
            )));
        }
        if self.plateau_window == 0 {
            return Err(RectifierError::invalid("plateau window must be at least 1"));
        }
        Ok(())
    }

    pub fn detect(&self, denoised: &SampleSeries) -> Result<JumpDetection> {
        self.validate()?;

        let jump_points = self.find_jump_points(denoised);
        let height_levels = self.estimate_height_levels(denoised, &jump_points);

        info!(
            jumps = jump_points.len(),
            sweep = self.sweep,
            threshold = self.threshold,
            "jump detection complete"
        );

        Ok(JumpDetection {
            jump_points,
            height_levels,
        })
    }

    /// Scan for onsets and deduplicate them by bucket, first index wins.
    pub fn find_jump_points(&self, denoised: &SampleSeries) -> Vec<f64> {
        let times = denoised.times();
        let values = denoised.values();
        let mut jumps: Vec<f64> = Vec::new();

        if values.len() <= self.sweep {
            return jumps;
        }

        for i in 0..values.len() - self.sweep {
            let diff = round_decimals((values[i + self.sweep] - values[i]).abs(), 2);
            if diff > self.threshold {
                let candidate = round_nearest(times[i + self.sweep], self.bucket);
                if !jumps.contains(&candidate) {
                    debug!(
                        index = i,
                        ahead = values[i + self.sweep],
                        behind = values[i],
                        diff,
                        threshold = self.threshold,
                        time = candidate,
                        "jump onset"
                    );
                    jumps.push(candidate);
                }
            }
        }

        jumps
    }

    /// Mean of the `plateau_window` samples starting at each jump, with the
    /// implicit level 0 in front.
    pub fn estimate_height_levels(&self, denoised: &SampleSeries, jump_points: &[f64]) -> Vec<f64> {
        let values = denoised.values();
        let mut levels = Vec::with_capacity(jump_points.len() + 1);
        levels.push(0.0);

        for &jump in jump_points {
            let start = denoised.search_left(jump);
            let end = (start + self.plateau_window).min(values.len());
            let window = &values[start.min(end)..end];

            let level = if window.is_empty() {
                warn!(jump, "plateau window after jump is empty, level is NaN");
                f64::NAN
            } else {
                window.iter().sum::<f64>() / window.len() as f64
            };
            levels.push(level);
        }

        levels
    }
}
