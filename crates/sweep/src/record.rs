use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::digest::DigestMode;
use crate::scheme::SchemeSizes;
use crate::trial::TrialSample;

pub const RECORD_HEADER: &str =
    "|MLEN|MTOTLEN|PUBLEN|PRVLEN|SIGLEN|KGTM|SIGTM|CHECKTM|HASHSZ|";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    #[serde(with = "duration_secs")]
    pub mean: Duration,
    #[serde(with = "duration_secs")]
    pub min: Duration,
    #[serde(with = "duration_secs")]
    pub max: Duration,
}

impl TimingStats {
    /// Equal-weight mean; `None` for an empty sample set.
    pub fn from_samples<I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = Duration>,
    {
        let mut count: u128 = 0;
        let mut total: u128 = 0;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;
        for sample in samples {
            count += 1;
            total += sample.as_nanos();
            min = min.min(sample);
            max = max.max(sample);
        }
        if count == 0 {
            return None;
        }
        let mean = total / count;
        Some(Self {
            mean: Duration::new(
                (mean / 1_000_000_000) as u64,
                (mean % 1_000_000_000) as u32,
            ),
            min,
            max,
        })
    }
}

/// Aggregate of one sweep step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub algorithm: String,
    pub digest_mode: DigestMode,
    pub trials: usize,
    pub message_length: usize,
    pub signed_total_length: usize,
    pub public_key_length: usize,
    pub secret_key_length: usize,
    pub signature_overhead_length: usize,
    pub keygen_time: TimingStats,
    pub sign_time: TimingStats,
    pub verify_time: TimingStats,
    pub digest_length_used: usize,
    pub sign_peak_heap: usize,
    pub verify_peak_heap: usize,
}

impl SweepRecord {
    /// Folds the step's samples; `None` when no trial ran.
    pub fn aggregate(
        algorithm: &str,
        digest_mode: DigestMode,
        message_length: usize,
        sizes: &SchemeSizes,
        samples: &[TrialSample],
    ) -> Option<Self> {
        let last = samples.last()?;
        let stats = |phase: fn(&TrialSample) -> Duration| {
            TimingStats::from_samples(samples.iter().map(phase))
        };
        let keygen_time = stats(|s| s.keygen_duration)?;
        let sign_time = stats(|s| s.sign_duration)?;
        let verify_time = stats(|s| s.verify_duration)?;
        let signed_total_length = samples
            .iter()
            .map(|s| s.signed_total_length)
            .max()
            .unwrap_or_default();
        let digest_length_used = last.recovered_length;
        let trials = samples.len();

        Some(Self {
            algorithm: algorithm.to_owned(),
            digest_mode,
            trials,
            message_length,
            signed_total_length,
            public_key_length: sizes.public_key_bytes,
            secret_key_length: sizes.secret_key_bytes,
            signature_overhead_length: signed_total_length
                .saturating_sub(digest_length_used),
            keygen_time,
            sign_time,
            verify_time,
            digest_length_used,
            sign_peak_heap: mean_of(samples, |s| s.sign_peak_heap),
            verify_peak_heap: mean_of(samples, |s| s.verify_peak_heap),
        })
    }

    /// The pipe-delimited row, without the line terminator.
    pub fn pipe_row(&self) -> PipeRow<'_> {
        PipeRow(self)
    }
}

fn mean_of(samples: &[TrialSample], field: fn(&TrialSample) -> usize) -> usize {
    samples.iter().map(field).sum::<usize>() / samples.len().max(1)
}

pub struct PipeRow<'a>(&'a SweepRecord);

impl fmt::Display for PipeRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        write!(
            f,
            "|{}|{}|{}|{}|{}|{:.6}|{:.6}|{:.6}|{}|",
            r.message_length,
            r.signed_total_length,
            r.public_key_length,
            r.secret_key_length,
            r.signature_overhead_length,
            r.keygen_time.mean.as_secs_f64(),
            r.sign_time.mean.as_secs_f64(),
            r.verify_time.mean.as_secs_f64(),
            r.digest_length_used,
        )
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(keygen_us: u64, sign_us: u64, verify_us: u64) -> TrialSample {
        TrialSample {
            keygen_duration: Duration::from_micros(keygen_us),
            sign_duration: Duration::from_micros(sign_us),
            verify_duration: Duration::from_micros(verify_us),
            verify_ok: true,
            recovered_length: 32,
            signed_total_length: 32 + 666,
            sign_peak_heap: 100,
            verify_peak_heap: 40,
            corruption_detected: None,
        }
    }

    fn sizes() -> SchemeSizes {
        SchemeSizes {
            public_key_bytes: 897,
            secret_key_bytes: 1281,
            max_signature_bytes: 752,
        }
    }

    #[test]
    fn timing_mean_stays_within_sample_bounds() {
        let samples = [3_u64, 17, 5, 11, 2].map(Duration::from_nanos);
        let stats = TimingStats::from_samples(samples).unwrap();
        assert_eq!(stats.min, Duration::from_nanos(2));
        assert_eq!(stats.max, Duration::from_nanos(17));
        assert_eq!(stats.mean, Duration::from_nanos(7));
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
    }

    #[test]
    fn timing_stats_of_nothing_is_none() {
        assert_eq!(TimingStats::from_samples([]), None);
    }

    #[test]
    fn aggregate_averages_each_phase() {
        let samples = [sample(10, 100, 20), sample(30, 300, 40)];
        let record = SweepRecord::aggregate(
            "Falcon-512",
            DigestMode::Sha256,
            4096,
            &sizes(),
            &samples,
        )
        .unwrap();

        assert_eq!(record.trials, 2);
        assert_eq!(record.keygen_time.mean, Duration::from_micros(20));
        assert_eq!(record.sign_time.mean, Duration::from_micros(200));
        assert_eq!(record.verify_time.mean, Duration::from_micros(30));
        assert_eq!(record.digest_length_used, 32);
        assert_eq!(record.signature_overhead_length, 666);
        assert_eq!(record.public_key_length, 897);
        assert_eq!(record.sign_peak_heap, 100);
    }

    #[test]
    fn aggregate_keeps_largest_signed_length() {
        let mut shorter = sample(1, 1, 1);
        shorter.signed_total_length = 32 + 650;
        let samples = [shorter, sample(1, 1, 1)];
        let record = SweepRecord::aggregate(
            "Falcon-512",
            DigestMode::Sha256,
            64,
            &sizes(),
            &samples,
        )
        .unwrap();
        assert_eq!(record.signed_total_length, 32 + 666);
    }

    #[test]
    fn aggregate_of_no_samples_is_none() {
        assert!(SweepRecord::aggregate(
            "x",
            DigestMode::None,
            64,
            &sizes(),
            &[]
        )
        .is_none());
    }

    #[test]
    fn pipe_row_matches_fixed_layout() {
        let samples = [sample(1_500, 250, 125)];
        let record = SweepRecord::aggregate(
            "Falcon-512",
            DigestMode::Sha256,
            128,
            &sizes(),
            &samples,
        )
        .unwrap();
        assert_eq!(
            record.pipe_row().to_string(),
            "|128|698|897|1281|666|0.001500|0.000250|0.000125|32|"
        );
        assert_eq!(RECORD_HEADER.matches('|').count(), 10);
        assert_eq!(record.pipe_row().to_string().matches('|').count(), 10);
    }

    #[test]
    fn json_encodes_durations_as_seconds() {
        let record = SweepRecord::aggregate(
            "ML-DSA-65",
            DigestMode::None,
            64,
            &sizes(),
            &[sample(2_000_000, 1, 1)],
        )
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["keygen_time"]["mean"], 2.0);
        assert_eq!(json["digest_mode"], "none");

        let decoded: SweepRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.keygen_time.mean, Duration::from_secs(2));
        assert_eq!(decoded.message_length, record.message_length);
        assert_eq!(decoded.algorithm, record.algorithm);
    }
}
