/// Noise removal for raw trajectory samples.
///
/// The main filter is a zero-phase Butterworth low-pass: the signal is run
/// forward and then backward through a cascade of second-order sections, so the
/// magnitude response is squared and the phase cancels. A causal moving average
/// is kept as a cheap alternative.

use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RectifierError, Result};
use crate::series::SampleSeries;

pub const DEFAULT_FILTER_ORDER: usize = 2;
pub const DEFAULT_CUTOFF: f64 = 0.05;

/// Noise filter variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoiseFilter {
    /// Zero-phase Butterworth low-pass; `cutoff` is a fraction of Nyquist.
    Butterworth { order: usize, cutoff: f64 },
    /// Causal boxcar average over `window` samples, zero initial state.
    MovingAverage { window: usize },
}

impl Default for NoiseFilter {
    fn default() -> Self {
        NoiseFilter::Butterworth {
            order: DEFAULT_FILTER_ORDER,
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl NoiseFilter {
    /// Filter `series`, returning a new series on the same time axis.
    pub fn apply(&self, series: &SampleSeries) -> Result<SampleSeries> {
        let values = match *self {
            NoiseFilter::Butterworth { order, cutoff } => {
                ButterworthLowPass::new(order, cutoff)?.filtfilt(series.values())?
            }
            NoiseFilter::MovingAverage { window } => moving_average(series.values(), window)?,
        };
        Ok(series.with_values(values))
    }
}

/// Digital Butterworth low-pass as a cascade of biquad sections.
#[derive(Debug, Clone)]
pub struct ButterworthLowPass {
    order: usize,
    cutoff: f64,
    sections: Vec<Coefficients<f64>>,
}

impl ButterworthLowPass {
    pub fn new(order: usize, cutoff: f64) -> Result<Self> {
        if order == 0 {
            return Err(RectifierError::invalid("filter order must be at least 1"));
        }
        if !(cutoff > 0.0 && cutoff < 1.0) {
            return Err(RectifierError::invalid(format!(
                "normalized cutoff must be in (0, 1), got {}",
                cutoff
            )));
        }

        // Normalized design: Nyquist = 1 Hz, so fs = 2 Hz and f0 = cutoff Hz.
        let fs = 2.0_f64;
        let n = order as f64;
        let mut sections = Vec::with_capacity((order + 1) / 2);

        for m in 0..order / 2 {
            let angle = std::f64::consts::PI * (n - 1.0 - 2.0 * m as f64) / (2.0 * n);
            let q = 1.0 / (2.0 * angle.cos());
            let coeffs = Coefficients::<f64>::from_params(Type::LowPass, fs.hz(), cutoff.hz(), q)
                .map_err(|e| {
                    RectifierError::invalid(format!("filter design failed: {:?}", e))
                })?;
            sections.push(coeffs);
        }

        // Odd orders carry one real pole.
        if order % 2 == 1 {
            let k = (std::f64::consts::FRAC_PI_2 * cutoff).tan();
            let b0 = k / (1.0 + k);
            sections.push(Coefficients {
                a1: (k - 1.0) / (k + 1.0),
                a2: 0.0,
                b0,
                b1: b0,
                b2: 0.0,
            });
        }

        Ok(ButterworthLowPass {
            order,
            cutoff,
            sections,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Samples of odd extension added at each end before filtering.
    pub fn pad_len(&self) -> usize {
        // A first-order section has zero b2 and a2, which shortens the effective tap count.
        let taps = 2 * self.sections.len() + 1 - self.order % 2;
        3 * taps
    }

    /// Shortest input the forward-backward pass accepts.
    pub fn min_len(&self) -> usize {
        self.pad_len() + 1
    }

    /// Forward-backward filtering with odd-extension padding.
    pub fn filtfilt(&self, values: &[f64]) -> Result<Vec<f64>> {
        let n = values.len();
        let pad = self.pad_len();
        if n <= pad {
            return Err(RectifierError::InsufficientData {
                required: self.min_len(),
                available: n,
            });
        }

        let first = values[0];
        let last = values[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - values[i]));
        extended.extend_from_slice(values);
        extended.extend((1..=pad).map(|i| 2.0 * last - values[n - 1 - i]));

        let mut forward = self.run_settled(&extended);
        forward.reverse();
        let mut smooth = self.run_settled(&forward);
        smooth.reverse();

        debug!(
            order = self.order,
            cutoff = self.cutoff,
            samples = n,
            pad,
            "butterworth forward-backward pass complete"
        );

        Ok(smooth[pad..pad + n].to_vec())
    }

    /// One causal pass through the cascade, with every section first settled on
    /// the leading sample so the output starts without a step transient.
    fn run_settled(&self, input: &[f64]) -> Vec<f64> {
        let mut chain: Vec<DirectForm1<f64>> =
            self.sections.iter().map(|&c| DirectForm1::<f64>::new(c)).collect();

        if let Some(&lead) = input.first() {
            for _ in 0..self.settle_len() {
                let _ = chain.iter_mut().fold(lead, |x, section| section.run(x));
            }
        }

        input
            .iter()
            .map(|&x| chain.iter_mut().fold(x, |acc, section| section.run(acc)))
            .collect()
    }

    fn settle_len(&self) -> usize {
        ((8.0 * self.order as f64) / self.cutoff).ceil() as usize
    }
}

/// Causal moving average: y[i] = mean of x[i-window+1..=i], missing history counts as zero.
pub fn moving_average(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(RectifierError::invalid("moving average window must be at least 1"));
    }
    if values.is_empty() {
        return Err(RectifierError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let scale = 1.0 / window as f64;
    let mut sum = 0.0;
    let mut result = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        result.push(sum * scale);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_ramp(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| i as f64 * 0.01 + if i % 2 == 0 { 0.2 } else { -0.2 })
            .collect()
    }

    #[test]
    fn test_section_counts() {
        assert_eq!(ButterworthLowPass::new(2, 0.05).unwrap().sections.len(), 1);
        assert_eq!(ButterworthLowPass::new(3, 0.05).unwrap().sections.len(), 2);
        assert_eq!(ButterworthLowPass::new(4, 0.08).unwrap().sections.len(), 2);
    }

    #[test]
    fn test_pad_len_matches_order() {
        assert_eq!(ButterworthLowPass::new(1, 0.1).unwrap().pad_len(), 6);
        assert_eq!(ButterworthLowPass::new(2, 0.1).unwrap().pad_len(), 9);
        assert_eq!(ButterworthLowPass::new(3, 0.1).unwrap().pad_len(), 12);
        assert_eq!(ButterworthLowPass::new(4, 0.1).unwrap().pad_len(), 15);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            ButterworthLowPass::new(0, 0.05),
            Err(RectifierError::InvalidParameter { .. })
        ));
        assert!(ButterworthLowPass::new(2, 0.0).is_err());
        assert!(ButterworthLowPass::new(2, 1.0).is_err());
        assert!(ButterworthLowPass::new(2, f64::NAN).is_err());
    }

    #[test]
    fn test_too_short_input() {
        let filter = ButterworthLowPass::new(4, 0.08).unwrap();
        let err = filter.filtfilt(&[1.0; 15]).unwrap_err();
        assert!(matches!(
            err,
            RectifierError::InsufficientData { required: 16, available: 15 }
        ));
        assert!(filter.filtfilt(&[1.0; 16]).is_ok());
    }

    #[test]
    fn test_constant_signal_passes_through() {
        let filter = ButterworthLowPass::new(4, 0.08).unwrap();
        let out = filter.filtfilt(&[3.5; 200]).unwrap();
        assert_eq!(out.len(), 200);
        for v in out {
            assert!((v - 3.5).abs() < 1e-6, "value {} drifted from 3.5", v);
        }
    }

    #[test]
    fn test_odd_order_constant_signal() {
        let filter = ButterworthLowPass::new(3, 0.1).unwrap();
        let out = filter.filtfilt(&[-2.0; 100]).unwrap();
        for v in out {
            assert!((v + 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_removes_alternating_noise_without_shift() {
        let raw = noisy_ramp(400);
        let filter = ButterworthLowPass::new(2, 0.05).unwrap();
        let out = filter.filtfilt(&raw).unwrap();

        assert_eq!(out.len(), raw.len());
        // Interior samples should sit on the clean ramp: no lag, noise gone.
        for i in 50..350 {
            let clean = i as f64 * 0.01;
            assert!((out[i] - clean).abs() < 0.02, "sample {}: {} vs {}", i, out[i], clean);
        }
    }

    #[test]
    fn test_filtering_is_deterministic() {
        let raw = noisy_ramp(300);
        let filter = ButterworthLowPass::new(4, 0.08).unwrap();
        assert_eq!(filter.filtfilt(&raw).unwrap(), filter.filtfilt(&raw).unwrap());
    }

    #[test]
    fn test_refiltering_keeps_shape() {
        let raw: Vec<f64> = (0..600)
            .map(|i| (i as f64 * 0.02).sin() + if i % 2 == 0 { 0.2 } else { -0.2 })
            .collect();
        let filter = ButterworthLowPass::new(2, 0.05).unwrap();
        let once = filter.filtfilt(&raw).unwrap();
        let twice = filter.filtfilt(&once).unwrap();
        assert_eq!(twice.len(), raw.len());

        let roughness = |v: &[f64]| v.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum::<f64>();
        let interior = 100..500;
        assert!(
            roughness(&twice[interior.clone()]) <= roughness(&once[interior.clone()]) + 1e-9,
            "second pass made the signal rougher"
        );
        for i in interior {
            assert!((twice[i] - once[i]).abs() < 0.01, "sample {}: {} vs {}", i, twice[i], once[i]);
        }
    }

    #[test]
    fn test_moving_average() {
        let out = moving_average(&[3.0, 3.0, 3.0, 6.0], 3).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(moving_average(&[1.0], 0).is_err());
        assert!(matches!(
            moving_average(&[], 3),
            Err(RectifierError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_apply_keeps_time_axis() {
        let times: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let series = SampleSeries::new(times.clone(), noisy_ramp(100)).unwrap();
        let out = NoiseFilter::default().apply(&series).unwrap();
        assert_eq!(out.times(), times.as_slice());
        assert_eq!(series.values(), noisy_ramp(100).as_slice());
    }
}
