use crate::error::HrvError;
use crate::metrics::psd::{resample_linear, welch, Psd};
use crate::signal::Peaks;
use serde::{Deserialize, Serialize};

/// Time-domain HRV over the reconstructed NN intervals (milliseconds,
/// percentages for the pNNx family).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvTime {
    pub n: usize,
    pub mean_nn: f64,
    pub sdnn: f64,
    pub rmssd: f64,
    pub sdsd: f64,
    pub cvnn: f64,
    pub cvsd: f64,
    pub median_nn: f64,
    pub mad_nn: f64,
    pub mcvnn: f64,
    pub iqr_nn: f64,
    pub min_nn: f64,
    pub max_nn: f64,
    pub pnn50: f64,
    pub pnn20: f64,
}

/// Band powers in ms² plus the usual ratios. Bands the spectrum cannot
/// resolve come back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvFrequency {
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
    pub vhf: f64,
    pub total_power: f64,
    pub lf_hf: f64,
    pub lfn: f64,
    pub hfn: f64,
    pub ln_hf: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyBands {
    pub vlf: (f64, f64),
    pub lf: (f64, f64),
    pub hf: (f64, f64),
    pub vhf: (f64, f64),
}

impl Default for FrequencyBands {
    fn default() -> Self {
        Self {
            vlf: (0.0033, 0.04),
            lf: (0.04, 0.15),
            hf: (0.15, 0.4),
            vhf: (0.4, 0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    /// Uniform resampling rate for the RR tachogram (Hz).
    pub interpolation_rate: f64,
    /// Lowest frequency the Welch window must resolve (Hz).
    pub min_frequency: f64,
    pub bands: FrequencyBands,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            interpolation_rate: 4.0,
            min_frequency: 0.04,
            bands: FrequencyBands::default(),
        }
    }
}

/// Upper bound on the resampled tachogram length.
pub const MAX_TACHOGRAM_POINTS: usize = 1 << 24;

impl FrequencyConfig {
    /// Welch window length (seconds) that resolves `min_frequency`. Shorter
    /// recordings get a window of half their resampled length instead.
    pub fn window_duration_s(&self) -> f64 {
        2.0 / self.min_frequency
    }

    /// Smallest Welch window (points) whose bin spacing still puts two bins
    /// inside the HF band. Below that every ratio would be NaN.
    pub fn min_window_points(&self) -> usize {
        let (lo, hi) = self.bands.hf;
        let spacing = (hi - lo) / 2.0;
        (self.interpolation_rate / spacing).ceil().max(2.0) as usize
    }

    fn resampled_len(&self, span_s: f64) -> Result<usize, HrvError> {
        let points = (span_s * self.interpolation_rate).floor() + 1.0;
        if !(points.is_finite() && points <= MAX_TACHOGRAM_POINTS as f64) {
            return Err(HrvError::RecordingTooLong {
                duration_s: span_s,
                rate: self.interpolation_rate,
            });
        }
        Ok(points as usize)
    }
}

/// Everything computed for one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvFeatures {
    pub time: HrvTime,
    pub frequency: Option<HrvFrequency>,
}

pub const TIME_KEYS: &[&str] = &[
    "HRV_MeanNN",
    "HRV_SDNN",
    "HRV_RMSSD",
    "HRV_SDSD",
    "HRV_CVNN",
    "HRV_CVSD",
    "HRV_MedianNN",
    "HRV_MadNN",
    "HRV_MCVNN",
    "HRV_IQRNN",
    "HRV_MinNN",
    "HRV_MaxNN",
    "HRV_pNN50",
    "HRV_pNN20",
];

pub const FREQUENCY_KEYS: &[&str] = &[
    "HRV_VLF",
    "HRV_LF",
    "HRV_HF",
    "HRV_VHF",
    "HRV_TP",
    "HRV_LFHF",
    "HRV_LFn",
    "HRV_HFn",
    "HRV_LnHF",
];

impl HrvTime {
    pub fn get(&self, key: &str) -> Option<f64> {
        let value = match key {
            "HRV_MeanNN" => self.mean_nn,
            "HRV_SDNN" => self.sdnn,
            "HRV_RMSSD" => self.rmssd,
            "HRV_SDSD" => self.sdsd,
            "HRV_CVNN" => self.cvnn,
            "HRV_CVSD" => self.cvsd,
            "HRV_MedianNN" => self.median_nn,
            "HRV_MadNN" => self.mad_nn,
            "HRV_MCVNN" => self.mcvnn,
            "HRV_IQRNN" => self.iqr_nn,
            "HRV_MinNN" => self.min_nn,
            "HRV_MaxNN" => self.max_nn,
            "HRV_pNN50" => self.pnn50,
            "HRV_pNN20" => self.pnn20,
            _ => return None,
        };
        Some(value)
    }
}

impl HrvFrequency {
    pub fn get(&self, key: &str) -> Option<f64> {
        let value = match key {
            "HRV_VLF" => self.vlf,
            "HRV_LF" => self.lf,
            "HRV_HF" => self.hf,
            "HRV_VHF" => self.vhf,
            "HRV_TP" => self.total_power,
            "HRV_LFHF" => self.lf_hf,
            "HRV_LFn" => self.lfn,
            "HRV_HFn" => self.hfn,
            "HRV_LnHF" => self.ln_hf,
            _ => return None,
        };
        Some(value)
    }
}

impl HrvFeatures {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.time
            .get(key)
            .or_else(|| self.frequency.as_ref().and_then(|f| f.get(key)))
    }
}

pub fn is_frequency_key(key: &str) -> bool {
    FREQUENCY_KEYS.contains(&key)
}

pub fn is_known_key(key: &str) -> bool {
    TIME_KEYS.contains(&key) || is_frequency_key(key)
}

pub fn hrv_time(peaks: &Peaks) -> Result<HrvTime, HrvError> {
    if peaks.len() < 3 {
        return Err(HrvError::InsufficientBeats {
            needed: 3,
            got: peaks.len(),
        });
    }
    let rri = peaks.to_rr_ms().rr;
    let n = rri.len();
    let diffs: Vec<f64> = rri.windows(2).map(|w| w[1] - w[0]).collect();

    let mean_nn = mean(&rri);
    let sdnn = std_dev(&rri, 1);
    let rmssd = (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt();
    let sdsd = std_dev(&diffs, 1);

    let mut sorted = rri.clone();
    sorted.sort_by(f64::total_cmp);
    let median_nn = percentile(&sorted, 0.5);
    let mut deviations: Vec<f64> = rri.iter().map(|x| (x - median_nn).abs()).collect();
    deviations.sort_by(f64::total_cmp);
    let mad_nn = 1.4826 * percentile(&deviations, 0.5);
    let iqr_nn = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);

    let pnn = |threshold: f64| {
        let count = diffs.iter().filter(|d| d.abs() > threshold).count();
        count as f64 / n as f64 * 100.0
    };

    Ok(HrvTime {
        n,
        mean_nn,
        sdnn,
        rmssd,
        sdsd,
        cvnn: sdnn / mean_nn,
        cvsd: rmssd / mean_nn,
        median_nn,
        mad_nn,
        mcvnn: mad_nn / median_nn,
        iqr_nn,
        min_nn: sorted[0],
        max_nn: sorted[n - 1],
        pnn50: pnn(50.0),
        pnn20: pnn(20.0),
    })
}

/// Spectrum of the resampled RR tachogram. Each interval is stamped at the
/// peak that closes it.
pub fn hrv_psd(peaks: &Peaks, cfg: &FrequencyConfig) -> Result<Psd, HrvError> {
    if peaks.len() < 3 {
        return Err(HrvError::InsufficientBeats {
            needed: 3,
            got: peaks.len(),
        });
    }
    let rri = peaks.to_rr_ms().rr;
    let times = peaks.times_s().split_off(1);
    let span = times[times.len() - 1] - times[0];
    let points = cfg.resampled_len(span)?;
    let needed = cfg.min_window_points().saturating_mul(2);
    if points < needed {
        return Err(HrvError::SignalTooShort {
            needed,
            got: points,
        });
    }
    let rate = cfg.interpolation_rate;
    let signal = resample_linear(&times, &rri, rate);
    let ideal = (cfg.window_duration_s() * rate).round() as usize;
    let nperseg = ideal.min(signal.len() / 2);
    welch(&signal, rate, nperseg)
}

pub fn hrv_frequency(peaks: &Peaks, cfg: &FrequencyConfig) -> Result<HrvFrequency, HrvError> {
    let psd = hrv_psd(peaks, cfg)?;
    let bands = &cfg.bands;
    let vlf = psd.band_power(bands.vlf);
    let lf = psd.band_power(bands.lf);
    let hf = psd.band_power(bands.hf);
    let vhf = psd.band_power(bands.vhf);
    let total_power: f64 = [vlf, lf, hf, vhf].iter().filter(|p| p.is_finite()).sum();
    let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { f64::NAN };
    Ok(HrvFrequency {
        vlf,
        lf,
        hf,
        vhf,
        total_power,
        lf_hf: ratio(lf, hf),
        lfn: ratio(lf, total_power),
        hfn: ratio(hf, total_power),
        ln_hf: if hf > 0.0 { hf.ln() } else { f64::NAN },
    })
}

/// Time-domain features always; frequency-domain only when asked for.
pub fn hrv_features(
    peaks: &Peaks,
    cfg: &FrequencyConfig,
    with_frequency: bool,
) -> Result<HrvFeatures, HrvError> {
    let time = hrv_time(peaks)?;
    let frequency = if with_frequency {
        Some(hrv_frequency(peaks, cfg)?)
    } else {
        None
    };
    Ok(HrvFeatures { time, frequency })
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn std_dev(data: &[f64], ddof: usize) -> f64 {
    if data.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(data);
    let ss = data.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    (ss / (data.len() - ddof) as f64).sqrt()
}

/// Linear-interpolated quantile of already sorted data.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
