/// Flat-file sample format used by the motion-capture exports and the generator:
/// one header line, then "<time> <value>" per line, whitespace separated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::error::{RectifierError, Result};
use crate::series::SampleSeries;

pub const SAMPLE_FILE_HEADER: &str = "x   y";

pub fn read_samples(path: &Path) -> Result<SampleSeries> {
    let file = File::open(path)?;
    parse_samples(BufReader::new(file))
}

pub fn parse_samples<R: BufRead>(reader: R) -> Result<SampleSeries> {
    let mut times = Vec::new();
    let mut values = Vec::new();

    // first line is a header
    for (line_no, line) in reader.lines().enumerate().skip(1) {
        let line = line?;
        let mut tokens = line.split_whitespace();

        let (t, v) = match (tokens.next(), tokens.next()) {
            (None, _) => continue,
            (Some(t), Some(v)) => (t, v),
            (Some(_), None) => {
                return Err(RectifierError::Parse {
                    line: line_no + 1,
                    message: "expected two columns".to_string(),
                })
            }
        };

        times.push(parse_float(t, line_no + 1)?);
        values.push(parse_float(v, line_no + 1)?);
    }

    SampleSeries::new(times, values)
}

fn parse_float(token: &str, line: usize) -> Result<f64> {
    token.parse::<f64>().map_err(|e| RectifierError::Parse {
        line,
        message: format!("'{}': {}", token, e),
    })
}

pub fn write_samples(path: &Path, series: &SampleSeries) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    format_samples(&mut out, series)?;
    out.flush()?;
    Ok(())
}

pub fn format_samples<W: Write>(out: &mut W, series: &SampleSeries) -> Result<()> {
    writeln!(out, "{}", SAMPLE_FILE_HEADER)?;
    for (t, v) in series.iter() {
        writeln!(out, "{} {}", t, v)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct StageRecord {
    time: f64,
    raw: f64,
    denoised: f64,
    rectified: f64,
}

/// Side-by-side CSV of every pipeline stage, for plotting outside the tool.
pub fn write_stage_csv(
    path: &Path,
    raw: &SampleSeries,
    denoised: &SampleSeries,
    rectified: &SampleSeries,
) -> Result<()> {
    if raw.len() != denoised.len() || raw.len() != rectified.len() {
        return Err(RectifierError::LengthMismatch {
            times: raw.len(),
            values: denoised.len().min(rectified.len()),
        });
    }

    let mut wtr = Writer::from_path(path)?;
    for i in 0..raw.len() {
        wtr.serialize(StageRecord {
            time: raw.times()[i],
            raw: raw.values()[i],
            denoised: denoised.values()[i],
            rectified: rectified.values()[i],
        })?;
    }
    wtr.flush()?;
    Ok(())
}
