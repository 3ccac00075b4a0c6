use std::fmt;
use std::io;

use thiserror::Error;

use crate::trial::TrialPhase;

/// Failures reported by a scheme adapter.
#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("key generation failed: {0}")]
    Keygen(String),

    #[error("signing failed: {0}")]
    Sign(String),

    #[error("signed message needs {needed} bytes but capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("signature verification failed")]
    VerificationFailed,
}

/// Which round-trip check rejected a freshly signed message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundTripCheck {
    Verification,
    RecoveredLength { expected: usize, actual: usize },
    RecoveredBytes { first_mismatch: usize },
}

impl fmt::Display for RoundTripCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verification => {
                write!(f, "verification rejected an untouched signed message")
            }
            Self::RecoveredLength { expected, actual } => write!(
                f,
                "recovered message length {actual}, expected {expected}"
            ),
            Self::RecoveredBytes { first_mismatch } => write!(
                f,
                "recovered message differs from input at byte {first_mismatch}"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid sweep configuration: {0}")]
    Configuration(String),

    #[error("cannot allocate a {length}-byte payload")]
    Allocation { length: usize },

    #[error(
        "{phase} failed at message length {message_length}, trial {trial}: {source}"
    )]
    Scheme {
        phase: TrialPhase,
        message_length: usize,
        trial: usize,
        #[source]
        source: SchemeError,
    },

    #[error(
        "correctness violation at message length {message_length}, trial {trial}: {check}"
    )]
    CorrectnessViolation {
        message_length: usize,
        trial: usize,
        check: RoundTripCheck,
    },

    #[error(
        "corrupted signed message still verified at message length {message_length}, \
trial {trial} (offset {offset}, delta {delta:#04x})"
    )]
    CorruptionUndetected {
        message_length: usize,
        trial: usize,
        offset: usize,
        delta: u8,
    },

    #[error("result sink write failed: {0}")]
    Io(#[from] io::Error),

    #[error("result serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SweepError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}
