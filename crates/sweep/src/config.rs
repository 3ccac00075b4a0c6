use crate::digest::DigestMode;
use crate::error::SweepError;

pub const DEFAULT_MIN_LENGTH: usize = 64;
/// Roughly 18 MB.
pub const DEFAULT_MAX_LENGTH: usize = 18_000_000;
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;
pub const DEFAULT_TRIALS_PER_STEP: usize = 10;

/// Parameters of one sweep over a single scheme.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub growth_factor: f64,
    pub trials_per_step: usize,
    pub digest_mode: DigestMode,
    /// Flip one byte of every signed message and expect verify to reject it.
    pub corruption_check: bool,
    /// Fixed PRNG seed for payloads and corruption offsets.
    pub seed: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            trials_per_step: DEFAULT_TRIALS_PER_STEP,
            digest_mode: DigestMode::None,
            corruption_check: false,
            seed: None,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), SweepError> {
        if !self.growth_factor.is_finite() || self.growth_factor <= 1.0 {
            return Err(SweepError::configuration(format!(
                "growth factor must be a finite number greater than 1, got {}",
                self.growth_factor
            )));
        }
        if self.min_length >= self.max_length {
            return Err(SweepError::configuration(format!(
                "minimum length {} must be below maximum length {}",
                self.min_length, self.max_length
            )));
        }
        if self.trials_per_step == 0 {
            return Err(SweepError::configuration(
                "at least one trial per step is required",
            ));
        }
        // floor(L * g) > L for every L >= min once it holds for min.
        if next_length(self.min_length, self.growth_factor) <= self.min_length
        {
            return Err(SweepError::configuration(format!(
                "growth factor {} does not grow minimum length {}",
                self.growth_factor, self.min_length
            )));
        }
        Ok(())
    }
}

pub(crate) fn next_length(length: usize, growth_factor: f64) -> usize {
    // Float-to-int casts saturate, so huge products clamp to usize::MAX.
    (length as f64 * growth_factor).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rejected(config: SweepConfig, needle: &str) {
        match config.validate() {
            Err(SweepError::Configuration(reason)) => {
                assert!(reason.contains(needle), "unexpected reason: {reason}")
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        SweepConfig::default()
            .validate()
            .expect("defaults should validate");
    }

    #[test]
    fn growth_factor_must_exceed_one() {
        for growth_factor in [1.0, 0.5, -2.0, f64::NAN, f64::INFINITY] {
            assert_rejected(
                SweepConfig {
                    growth_factor,
                    ..SweepConfig::default()
                },
                "growth factor",
            );
        }
    }

    #[test]
    fn min_length_must_be_below_max_length() {
        assert_rejected(
            SweepConfig {
                min_length: 1024,
                max_length: 1024,
                ..SweepConfig::default()
            },
            "minimum length",
        );
    }

    #[test]
    fn zero_trials_are_rejected() {
        assert_rejected(
            SweepConfig {
                trials_per_step: 0,
                ..SweepConfig::default()
            },
            "trial",
        );
    }

    #[test]
    fn stalled_growth_is_rejected() {
        assert_rejected(
            SweepConfig {
                min_length: 0,
                ..SweepConfig::default()
            },
            "does not grow",
        );
        assert_rejected(
            SweepConfig {
                min_length: 1,
                growth_factor: 1.5,
                ..SweepConfig::default()
            },
            "does not grow",
        );
    }

    #[test]
    fn next_length_floors_the_product() {
        assert_eq!(next_length(64, 2.0), 128);
        assert_eq!(next_length(10, 1.55), 15);
        assert_eq!(next_length(usize::MAX / 2, 4.0), usize::MAX);
    }
}
