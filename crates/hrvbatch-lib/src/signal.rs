use crate::error::HrvError;
use serde::{Deserialize, Serialize};

/// Inter-beat intervals as exported by the wearable (seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IbiSeries {
    pub ibi: Vec<f64>,
}

impl IbiSeries {
    pub fn len(&self) -> usize {
        self.ibi.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ibi.is_empty()
    }
    /// Seconds to milliseconds, element by element.
    pub fn to_rr_ms(&self) -> RRSeries {
        RRSeries {
            rr: self.ibi.iter().map(|s| s * 1000.0).collect(),
        }
    }
}

/// RR intervals (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn len(&self) -> usize {
        self.rr.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }
    pub fn duration_s(&self) -> f64 {
        self.rr.iter().sum::<f64>() / 1000.0
    }
}

/// R-peak sample indices on a timeline sampled at `fs` Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peaks {
    pub fs: f64,
    pub indices: Vec<usize>,
}

impl Peaks {
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Intervals between consecutive peaks, in milliseconds.
    pub fn to_rr_ms(&self) -> RRSeries {
        let rr = self
            .indices
            .windows(2)
            .map(|w| (w[1] as f64 - w[0] as f64) / self.fs * 1000.0)
            .collect();
        RRSeries { rr }
    }

    pub fn times_s(&self) -> Vec<f64> {
        self.indices.iter().map(|&i| i as f64 / self.fs).collect()
    }

    pub fn duration_s(&self) -> f64 {
        match (self.indices.first(), self.indices.last()) {
            (Some(&first), Some(&last)) => (last - first) as f64 / self.fs,
            _ => 0.0,
        }
    }
}

/// Rebuild peak positions from a run of RR intervals.
///
/// The first beat sits at sample 0 and every later beat at the rounded
/// cumulative interval sum, so `n` intervals yield `n + 1` peaks.
pub fn intervals_to_peaks(rr: &RRSeries, fs: f64) -> Result<Peaks, HrvError> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(HrvError::InvalidSamplingRate(fs));
    }
    if rr.is_empty() {
        return Err(HrvError::InsufficientBeats { needed: 2, got: 1 });
    }
    let mut indices = Vec::with_capacity(rr.len() + 1);
    indices.push(0);
    let mut elapsed_ms = 0.0;
    for (idx, &interval) in rr.rr.iter().enumerate() {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(HrvError::InvalidInterval {
                index: idx,
                value: interval,
            });
        }
        elapsed_ms += interval;
        let position = (elapsed_ms * fs / 1000.0).round();
        if position >= usize::MAX as f64 {
            return Err(HrvError::TimelineOverflow { index: idx });
        }
        indices.push(position as usize);
    }
    Ok(Peaks { fs, indices })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ibi_seconds_scale_to_rr_milliseconds() {
        let ibi = IbiSeries {
            ibi: vec![0.8125, 0.75, 1.0],
        };
        let rr = ibi.to_rr_ms();
        assert_eq!(rr.rr, vec![812.5, 750.0, 1000.0]);
        assert_eq!(rr.len(), ibi.len());
    }

    #[test]
    fn peaks_accumulate_rounded_intervals() {
        let rr = RRSeries {
            rr: vec![1000.0, 500.0, 1000.0],
        };
        let peaks = intervals_to_peaks(&rr, 64.0).unwrap();
        assert_eq!(peaks.indices, vec![0, 64, 96, 160]);
        assert_eq!(peaks.to_rr_ms().rr, vec![1000.0, 500.0, 1000.0]);
        assert!((peaks.duration_s() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn rounding_uses_cumulative_time() {
        // 10 ms is 0.64 samples at 64 Hz
        let rr = RRSeries {
            rr: vec![10.0, 10.0, 10.0],
        };
        let peaks = intervals_to_peaks(&rr, 64.0).unwrap();
        assert_eq!(peaks.indices, vec![0, 1, 1, 2]);
    }

    #[test]
    fn rejects_non_positive_intervals() {
        let rr = RRSeries {
            rr: vec![800.0, 0.0],
        };
        assert!(matches!(
            intervals_to_peaks(&rr, 64.0),
            Err(HrvError::InvalidInterval { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_intervals_past_the_timeline() {
        let rr = RRSeries {
            rr: vec![800.0, 1e300, 800.0],
        };
        assert_eq!(
            intervals_to_peaks(&rr, 64.0),
            Err(HrvError::TimelineOverflow { index: 1 })
        );
    }

    #[test]
    fn rejects_bad_sampling_rate() {
        let rr = RRSeries { rr: vec![800.0] };
        assert!(matches!(
            intervals_to_peaks(&rr, 0.0),
            Err(HrvError::InvalidSamplingRate(_))
        ));
    }
}
