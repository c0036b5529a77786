use crate::error::{RectifierError, Result};

/// Ordered (time, value) samples with a strictly increasing time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl SampleSeries {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(RectifierError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }

        if let Some(pos) = times.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(RectifierError::NonIncreasingTime { index: pos + 1 });
        }

        Ok(SampleSeries { times, values })
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        let (times, values) = pairs.iter().copied().unzip();
        Self::new(times, values)
    }

    /// Same time axis, new values. Used by stages that preserve sample alignment.
    pub(crate) fn with_values(&self, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), self.times.len());
        SampleSeries {
            times: self.times.clone(),
            values,
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Index of the first sample whose time is >= `t` (left-biased insertion point).
    pub fn search_left(&self, t: f64) -> usize {
        self.times.partition_point(|&x| x < t)
    }
}

/// Round `num` to the nearest multiple of `precision`, ties to even.
pub fn round_nearest(num: f64, precision: f64) -> f64 {
    (num / precision).round_ties_even() * precision
}

/// Round to `decimals` places, ties to even.
pub fn round_decimals(num: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (num * scale).round_ties_even() / scale
}

/// `count` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            let mut out: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            out[count - 1] = stop;
            out
        }
    }
}
