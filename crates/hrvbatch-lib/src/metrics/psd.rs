use crate::error::HrvError;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One-sided power spectral density.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Psd {
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
}

impl Psd {
    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Trapezoidal area over the bins falling in `[lo, hi)`.
    /// NaN when fewer than two bins land in the band.
    pub fn band_power(&self, band: (f64, f64)) -> f64 {
        let (freqs, power): (Vec<f64>, Vec<f64>) = self
            .freqs
            .iter()
            .zip(&self.power)
            .filter(|(f, _)| **f >= band.0 && **f < band.1)
            .map(|(f, p)| (*f, *p))
            .unzip();
        if freqs.len() < 2 {
            return f64::NAN;
        }
        freqs
            .windows(2)
            .zip(power.windows(2))
            .map(|(f, p)| (f[1] - f[0]) * (p[0] + p[1]) / 2.0)
            .sum()
    }
}

/// Linearly resample irregular `(times, values)` onto a uniform grid starting
/// at the first timestamp.
pub fn resample_linear(times: &[f64], values: &[f64], rate: f64) -> Vec<f64> {
    let (Some(&start), Some(&end)) = (times.first(), times.last()) else {
        return Vec::new();
    };
    let n = ((end - start) * rate).floor() as usize + 1;
    let mut out = Vec::with_capacity(n);
    let mut idx = 0;
    for i in 0..n {
        let t = start + i as f64 / rate;
        while idx + 2 < times.len() && times[idx + 1] < t {
            idx += 1;
        }
        if idx + 1 >= times.len() {
            out.push(values[idx]);
            continue;
        }
        let (t0, t1) = (times[idx], times[idx + 1]);
        let (v0, v1) = (values[idx], values[idx + 1]);
        let span = t1 - t0;
        if span <= 0.0 {
            out.push(v1);
        } else {
            let frac = ((t - t0) / span).clamp(0.0, 1.0);
            out.push(v0 + (v1 - v0) * frac);
        }
    }
    out
}

/// Welch averaged periodogram: Hann window, 50% overlap, per-segment mean
/// removal, density scaling.
pub fn welch(signal: &[f64], fs: f64, nperseg: usize) -> Result<Psd, HrvError> {
    let n = signal.len();
    if nperseg < 2 || nperseg > n {
        return Err(HrvError::SignalTooShort {
            needed: nperseg.max(2),
            got: n,
        });
    }
    let step = (nperseg / 2).max(1);
    let window = hann(nperseg);
    let window_energy: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (fs * window_energy);

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(nperseg);
    let mut spectrum = r2c.make_output_vec();
    let bins = spectrum.len();
    let mut power = vec![0.0; bins];
    let mut segments = 0usize;
    let mut pos = 0;
    while pos + nperseg <= n {
        let slice = &signal[pos..pos + nperseg];
        let mean = slice.iter().sum::<f64>() / nperseg as f64;
        let mut frame: Vec<f64> = slice
            .iter()
            .zip(&window)
            .map(|(x, w)| (x - mean) * w)
            .collect();
        r2c.process(&mut frame, &mut spectrum)
            .map_err(|e| HrvError::Spectrum(e.to_string()))?;
        for (k, val) in spectrum.iter().enumerate() {
            let one_sided = if k == 0 || (nperseg % 2 == 0 && k == bins - 1) {
                1.0
            } else {
                2.0
            };
            power[k] += one_sided * val.norm_sqr() * scale;
        }
        segments += 1;
        pos += step;
    }
    for p in power.iter_mut() {
        *p /= segments as f64;
    }
    let freqs = (0..bins).map(|k| k as f64 * fs / nperseg as f64).collect();
    Ok(Psd { freqs, power })
}

fn hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size as f64)).cos()))
        .collect()
}
