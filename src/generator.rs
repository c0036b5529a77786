/// Synthetic test signals: a row of Gaussian pulses, each block lifted by a random
/// jump offset, plus white noise. The block boundaries are the ground-truth jump
/// points used to validate detection.

use std::f64::consts::PI;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::{RectifierError, Result};
use crate::jump_detector::DEFAULT_BUCKET;
use crate::sample_file::write_samples;
use crate::series::{linspace, round_nearest, SampleSeries};

#[derive(Debug, Clone)]
pub struct TestSignal {
    series: SampleSeries,
    /// Constant offset of every block; block 0 is always at 0.
    pub jump_offsets: Vec<f64>,
    /// Divisor applied to each block's pulse.
    pub pulse_scales: Vec<f64>,
    /// Sample index where each block after the first begins.
    pub boundaries: Vec<usize>,
}

impl TestSignal {
    pub fn generate(config: &GeneratorConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let scale_dist = normal(config.scale_mean, config.scale_std)?;
        let jump_dist = normal(config.jump_mean, config.jump_std)?;
        let noise_dist = normal(0.0, config.noise_std)?;

        let n = config.total_points();
        let block = config.points_per_pulse;
        let times = linspace(config.start, config.end, n);
        let spacing = (config.end - config.start) / config.pulses as f64;

        let mut values = Vec::with_capacity(n);
        let mut jump_offsets = Vec::with_capacity(config.pulses);
        let mut pulse_scales = Vec::with_capacity(config.pulses);

        for i in 0..config.pulses {
            let centre = config.start + i as f64 * spacing + config.pulse_offset;
            let scale = scale_dist.sample(&mut rng);
            let offset = i as f64 * jump_dist.sample(&mut rng);

            values.extend(
                times[i * block..(i + 1) * block]
                    .iter()
                    .map(|&t| gaussian_pdf(t, centre, config.pulse_sigma) / scale + offset),
            );

            debug!(pulse = i, centre, scale, offset, "generated pulse block");
            jump_offsets.push(offset);
            pulse_scales.push(scale);
        }

        apply_noise(&mut values, &noise_dist, &mut rng);

        Ok(TestSignal {
            series: SampleSeries::new(times, values)?,
            jump_offsets,
            pulse_scales,
            boundaries: (1..config.pulses).map(|i| i * block).collect(),
        })
    }

    pub fn series(&self) -> &SampleSeries {
        &self.series
    }

    pub fn into_series(self) -> SampleSeries {
        self.series
    }

    /// Block boundary times rounded to the detector's default bucket.
    pub fn expected_jumps(&self) -> Vec<f64> {
        self.boundaries
            .iter()
            .map(|&idx| round_nearest(self.series.times()[idx], DEFAULT_BUCKET))
            .collect()
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        write_samples(path, &self.series)
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    // rand_distr only rejects a non-finite spread; a negative one would mirror draws.
    if std_dev < 0.0 {
        return Err(RectifierError::Distribution {
            message: format!("N({}, {}): standard deviation is negative", mean, std_dev),
        });
    }
    Normal::new(mean, std_dev).map_err(|e| RectifierError::Distribution {
        message: format!("N({}, {}): {}", mean, std_dev, e),
    })
}

fn gaussian_pdf(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
}

fn apply_noise<R: Rng>(values: &mut [f64], noise: &Normal<f64>, rng: &mut R) {
    for v in values.iter_mut() {
        *v += noise.sample(rng);
    }
}
