/// Jump rectification: replace a fixed window around every detected jump with a
/// smooth bridge.
///
/// Both strategies share the window `[idx - width, idx + width)` where `idx` is the
/// left-biased insertion point of the jump time, clamped to the series. Windows of
/// neighbouring jumps must not overlap; that is the caller's responsibility.

use std::f64::consts::{FRAC_PI_2, PI};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RectifierError, Result};
use crate::jump_detector::JumpDetection;
use crate::series::{linspace, SampleSeries};

pub const DEFAULT_RECT_WIDTH: usize = 70;
/// Half-width used by the first line-bridge configuration.
pub const LEGACY_RECT_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RectifyStrategy {
    /// Straight line between the window's current first and last values.
    #[default]
    Linear,
    /// Half-period sine between the plateau levels on each side of the jump.
    Sinusoidal,
}

impl std::fmt::Display for RectifyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RectifyStrategy::Linear => write!(f, "linear"),
            RectifyStrategy::Sinusoidal => write!(f, "sinusoidal"),
        }
    }
}

/// One replaced window: `values` now occupy `start..end` of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectifiedWindow {
    pub jump: f64,
    pub start: usize,
    pub end: usize,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RectifyOutcome {
    /// Detection found no jumps; the series was left untouched.
    NothingToRectify,
    Rectified(Vec<RectifiedWindow>),
}

impl RectifyOutcome {
    pub fn windows(&self) -> &[RectifiedWindow] {
        match self {
            RectifyOutcome::NothingToRectify => &[],
            RectifyOutcome::Rectified(windows) => windows,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, RectifyOutcome::NothingToRectify)
    }
}

impl RectifyStrategy {
    /// Rewrite every jump window of `series` in place, in jump order.
    pub fn apply(
        self,
        series: &mut SampleSeries,
        detection: &JumpDetection,
        width: usize,
    ) -> Result<RectifyOutcome> {
        if width == 0 {
            return Err(RectifierError::invalid("rectification width must be at least 1"));
        }
        if detection.is_empty() {
            debug!(strategy = %self, "no jumps, nothing to rectify");
            return Ok(RectifyOutcome::NothingToRectify);
        }

        let mut replaced = Vec::with_capacity(detection.len());

        for (i, &jump) in detection.jump_points.iter().enumerate() {
            let idx = series.search_left(jump);
            let len = series.len();
            let start = idx.saturating_sub(width);
            let end = (idx + width).min(len);
            if start >= end {
                continue;
            }

            let bridge = match self {
                RectifyStrategy::Linear => {
                    let window = &series.values()[start..end];
                    linspace(window[0], window[window.len() - 1], window.len())
                }
                RectifyStrategy::Sinusoidal => {
                    let levels = &detection.height_levels;
                    let (before, after) = match (levels.get(i), levels.get(i + 1)) {
                        (Some(&before), Some(&after)) if before.is_finite() && after.is_finite() => {
                            (before, after)
                        }
                        (before, after) => {
                            warn!(jump, ?before, ?after, "plateau level unknown, window skipped");
                            continue;
                        }
                    };
                    // The curve spans the full nominal window even when it is clipped
                    // at the series edge, so its shape stays centred on the jump.
                    let curve = half_sine(before, after, 2 * width);
                    let offset = start + width - idx;
                    curve[offset..offset + (end - start)].to_vec()
                }
            };

            series.values_mut()[start..end].copy_from_slice(&bridge);
            replaced.push(RectifiedWindow {
                jump,
                start,
                end,
                values: bridge,
            });
        }

        debug!(strategy = %self, windows = replaced.len(), width, "rectification complete");
        Ok(RectifyOutcome::Rectified(replaced))
    }
}

/// `count` samples of a sine from -pi/2 to pi/2 rising from `before` to `after`.
fn half_sine(before: f64, after: f64, count: usize) -> Vec<f64> {
    let amplitude = (after - before) / 2.0;
    let offset = after - amplitude;
    linspace(0.0, PI, count)
        .into_iter()
        .map(|phase| amplitude * (phase - FRAC_PI_2).sin() + offset)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_series(n: usize) -> SampleSeries {
        let times: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin() + i as f64 * 0.02).collect();
        SampleSeries::new(times, values).unwrap()
    }

    fn detection(jumps: &[f64], levels: &[f64]) -> JumpDetection {
        JumpDetection {
            jump_points: jumps.to_vec(),
            height_levels: levels.to_vec(),
        }
    }

    #[test]
    fn test_no_jumps_leaves_series_untouched() {
        let mut series = ramp_series(200);
        let before = series.clone();
        let empty = detection(&[], &[0.0]);

        for strategy in [RectifyStrategy::Linear, RectifyStrategy::Sinusoidal] {
            let outcome = strategy.apply(&mut series, &empty, 10).unwrap();
            assert!(outcome.is_nothing());
            assert!(outcome.windows().is_empty());
        }
        assert_eq!(series, before);
    }

    #[test]
    fn test_linear_window_containment() {
        let mut series = ramp_series(300);
        let before = series.clone();
        let outcome = RectifyStrategy::Linear
            .apply(&mut series, &detection(&[1.0], &[0.0, 1.0]), 20)
            .unwrap();

        let window = &outcome.windows()[0];
        let idx = before.search_left(1.0);
        assert_eq!((window.start, window.end), (idx - 20, idx + 20));

        for i in 0..series.len() {
            if i < window.start || i >= window.end {
                assert_eq!(series.values()[i], before.values()[i], "index {} changed", i);
            }
        }
        // Endpoints keep their values, interior is a straight line.
        let vals = &series.values()[window.start..window.end];
        assert_eq!(vals[0], before.values()[window.start]);
        assert!((vals[vals.len() - 1] - before.values()[window.end - 1]).abs() < 1e-12);
        let step = vals[1] - vals[0];
        for w in vals.windows(2) {
            assert!((w[1] - w[0] - step).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sinusoidal_matches_plateaus() {
        let mut series = ramp_series(300);
        let before = series.clone();
        let outcome = RectifyStrategy::Sinusoidal
            .apply(&mut series, &detection(&[1.5], &[0.5, 2.5]), 30)
            .unwrap();

        let window = &outcome.windows()[0];
        assert_eq!(window.end - window.start, 60);
        let vals = &series.values()[window.start..window.end];
        assert!((vals[0] - 0.5).abs() < 1e-9);
        assert!((vals[vals.len() - 1] - 2.5).abs() < 1e-9);
        for w in vals.windows(2) {
            assert!(w[1] >= w[0] - 1e-12, "sine bridge must be monotonic");
        }
        assert_eq!(series.values()[..window.start], before.values()[..window.start]);
        assert_eq!(series.values()[window.end..], before.values()[window.end..]);
    }

    #[test]
    fn test_sinusoidal_descending_jump() {
        let mut series = ramp_series(300);
        let outcome = RectifyStrategy::Sinusoidal
            .apply(&mut series, &detection(&[1.0, 2.0], &[0.0, 3.0, 1.0]), 10)
            .unwrap();

        let second = &outcome.windows()[1];
        assert!((second.values[0] - 3.0).abs() < 1e-9);
        assert!((second.values[second.values.len() - 1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_clamped_at_series_start() {
        let mut series = ramp_series(100);
        let before = series.clone();
        let outcome = RectifyStrategy::Sinusoidal
            .apply(&mut series, &detection(&[0.05], &[0.0, 1.0]), 20)
            .unwrap();

        let window = &outcome.windows()[0];
        let idx = before.search_left(0.05);
        assert_eq!(window.start, 0);
        assert_eq!(window.end, idx + 20);
        // Still ends on the upper plateau.
        assert!((window.values[window.values.len() - 1] - 1.0).abs() < 1e-9);
        assert_eq!(series.values()[window.end..], before.values()[window.end..]);
    }

    #[test]
    fn test_window_clamped_at_series_end() {
        let mut series = ramp_series(100);
        let outcome = RectifyStrategy::Linear
            .apply(&mut series, &detection(&[0.95], &[0.0, 1.0]), 20)
            .unwrap();
        assert_eq!(outcome.windows()[0].end, 100);
    }

    #[test]
    fn test_nan_level_skips_sine_window() {
        let mut series = ramp_series(200);
        let before = series.clone();
        let outcome = RectifyStrategy::Sinusoidal
            .apply(&mut series, &detection(&[1.0], &[0.0, f64::NAN]), 10)
            .unwrap();
        assert!(outcome.windows().is_empty());
        assert_eq!(series, before);
    }

    #[test]
    fn test_strategies_do_not_commute() {
        let jumps = detection(&[1.0], &[0.2, 2.0]);

        let mut linear_only = ramp_series(300);
        RectifyStrategy::Linear.apply(&mut linear_only, &jumps, 25).unwrap();

        let mut sine_then_linear = ramp_series(300);
        RectifyStrategy::Sinusoidal.apply(&mut sine_then_linear, &jumps, 25).unwrap();
        RectifyStrategy::Linear.apply(&mut sine_then_linear, &jumps, 25).unwrap();

        assert_ne!(linear_only.values(), sine_then_linear.values());

        // The sine bridge ignores the values it overwrites, so a prior linear
        // pass leaves no trace.
        let mut sine_only = ramp_series(300);
        RectifyStrategy::Sinusoidal.apply(&mut sine_only, &jumps, 25).unwrap();

        let mut linear_then_sine = ramp_series(300);
        RectifyStrategy::Linear.apply(&mut linear_then_sine, &jumps, 25).unwrap();
        RectifyStrategy::Sinusoidal.apply(&mut linear_then_sine, &jumps, 25).unwrap();

        assert_eq!(sine_only.values(), linear_then_sine.values());
    }

    #[test]
    fn test_missing_level_skips_window() {
        let mut series = ramp_series(300);
        let before = series.clone();
        // Two jumps but only the level after the first one.
        let short = detection(&[1.0, 2.0], &[0.0, 1.0]);

        let outcome = RectifyStrategy::Sinusoidal.apply(&mut series, &short, 20).unwrap();
        assert_eq!(outcome.windows().len(), 1);
        assert_eq!(outcome.windows()[0].jump, 1.0);

        let idx = before.search_left(2.0);
        assert_eq!(&series.values()[idx - 20..idx + 20], &before.values()[idx - 20..idx + 20]);
    }

    #[test]
    fn test_zero_width_rejected() {
        let mut series = ramp_series(50);
        assert!(RectifyStrategy::Linear
            .apply(&mut series, &detection(&[0.2], &[0.0, 1.0]), 0)
            .is_err());
    }
}
