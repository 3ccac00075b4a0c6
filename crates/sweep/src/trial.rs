use std::fmt;
use std::time::Duration;

use rand::Rng;
use tracing::{trace, warn};

use crate::digest::DigestMode;
use crate::error::{RoundTripCheck, SchemeError, SweepError};
use crate::measure_time;
use crate::memory;
use crate::scheme::{SignatureScheme, SignedMessage};

/// Progress of one trial.
///
/// `Display` names the operation that leaves the state, which is what an
/// error raised while in that state was attempting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrialPhase {
    Idle,
    KeyGenerated,
    Signed,
    Verified,
    CorruptionInjected,
    ReVerified,
    Done,
}

impl fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation = match self {
            Self::Idle => "key generation",
            Self::KeyGenerated => "signing",
            Self::Signed => "verification",
            Self::Verified => "corruption injection",
            Self::CorruptionInjected => "re-verification",
            Self::ReVerified | Self::Done => "trial completion",
        };
        f.write_str(operation)
    }
}

/// Measurements of a trial that passed every round-trip check. Failing
/// trials end in a [`SweepError`] instead, so samples only exist for
/// verified round trips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialSample {
    pub keygen_duration: Duration,
    pub sign_duration: Duration,
    pub verify_duration: Duration,
    /// Always `true` for a returned sample.
    pub verify_ok: bool,
    pub recovered_length: usize,
    pub signed_total_length: usize,
    pub sign_peak_heap: usize,
    pub verify_peak_heap: usize,
    /// `Some(true)` when the corruption branch ran and verify rejected it.
    pub corruption_detected: Option<bool>,
}

/// A single-byte modification applied to a signed message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Corruption {
    pub offset: usize,
    pub delta: u8,
}

impl Corruption {
    /// Picks a uniform offset and a uniform non-zero delta.
    pub fn random<R: Rng>(rng: &mut R, len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        Some(Self {
            offset: rng.random_range(0..len),
            delta: rng.random_range(1..=u8::MAX),
        })
    }

    pub fn apply(&self, bytes: &mut [u8]) {
        bytes[self.offset] = bytes[self.offset].wrapping_add(self.delta);
    }

    pub fn revert(&self, bytes: &mut [u8]) {
        bytes[self.offset] = bytes[self.offset].wrapping_sub(self.delta);
    }
}

/// Runs keygen, sign and verify for one signing input and checks the
/// round trip.
pub struct TrialRunner<'s> {
    scheme: &'s dyn SignatureScheme,
    digest_mode: DigestMode,
    corruption_check: bool,
}

impl<'s> TrialRunner<'s> {
    pub fn new(
        scheme: &'s dyn SignatureScheme,
        digest_mode: DigestMode,
        corruption_check: bool,
    ) -> Self {
        Self {
            scheme,
            digest_mode,
            corruption_check,
        }
    }

    /// `input` is the preprocessed payload of a `message_length`-byte
    /// message; `rng` drives the corruption branch.
    pub fn run<R: Rng>(
        &self,
        input: &[u8],
        message_length: usize,
        trial: usize,
        rng: &mut R,
    ) -> Result<TrialSample, SweepError> {
        let scheme_error = |phase: TrialPhase, source: SchemeError| {
            SweepError::Scheme {
                phase,
                message_length,
                trial,
                source,
            }
        };
        let violation = |check: RoundTripCheck| {
            SweepError::CorrectnessViolation {
                message_length,
                trial,
                check,
            }
        };

        let mut phase = TrialPhase::Idle;
        let (keypair, keygen_duration) =
            measure_time(|| self.scheme.generate_keypair());
        let keypair = keypair.map_err(|source| scheme_error(phase, source))?;
        phase = TrialPhase::KeyGenerated;
        trace!(?phase, ?keygen_duration, message_length, trial);

        let mut signed =
            SignedMessage::for_message(&self.scheme.sizes(), input.len());
        let ((signed_result, sign_duration), sign_peak_heap) =
            memory::measure_peak(|| {
                measure_time(|| {
                    self.scheme.sign(keypair.secret_key(), input, &mut signed)
                })
            });
        signed_result.map_err(|source| scheme_error(phase, source))?;
        phase = TrialPhase::Signed;
        trace!(?phase, ?sign_duration, signed_len = signed.len());

        let ((verified, verify_duration), verify_peak_heap) =
            memory::measure_peak(|| {
                measure_time(|| {
                    self.scheme.verify(keypair.public_key(), signed.as_bytes())
                })
            });
        let recovered = match verified {
            Ok(recovered) => recovered,
            Err(SchemeError::VerificationFailed) => {
                return Err(violation(RoundTripCheck::Verification));
            }
            Err(source) => return Err(scheme_error(phase, source)),
        };
        let expected = self.digest_mode.signing_input_len(message_length);
        if recovered.len() != expected {
            return Err(violation(RoundTripCheck::RecoveredLength {
                expected,
                actual: recovered.len(),
            }));
        }
        if let Some(first_mismatch) = first_mismatch(&recovered, input) {
            return Err(violation(RoundTripCheck::RecoveredBytes {
                first_mismatch,
            }));
        }
        phase = TrialPhase::Verified;
        trace!(?phase, ?verify_duration, recovered_len = recovered.len());

        let mut corruption_detected = None;
        let public_key = keypair.public_key();
        if self.corruption_check {
            if let Some(corruption) = Corruption::random(rng, signed.len()) {
                corruption.apply(signed.as_mut_bytes());
                phase = TrialPhase::CorruptionInjected;
                trace!(
                    ?phase,
                    offset = corruption.offset,
                    delta = corruption.delta
                );

                match self.scheme.verify(public_key, signed.as_bytes()) {
                    Err(SchemeError::VerificationFailed) => {}
                    Ok(_) => {
                        warn!(
                            algorithm = self.scheme.algorithm_name(),
                            message_length,
                            trial,
                            offset = corruption.offset,
                            delta = corruption.delta,
                            "corrupted signed message verified"
                        );
                        return Err(SweepError::CorruptionUndetected {
                            message_length,
                            trial,
                            offset: corruption.offset,
                            delta: corruption.delta,
                        });
                    }
                    Err(source) => return Err(scheme_error(phase, source)),
                }

                corruption.revert(signed.as_mut_bytes());
                match self.scheme.verify(public_key, signed.as_bytes()) {
                    Ok(restored) => {
                        if let Some(check) = compare(&restored, &recovered) {
                            return Err(violation(check));
                        }
                    }
                    Err(SchemeError::VerificationFailed) => {
                        return Err(violation(RoundTripCheck::Verification));
                    }
                    Err(source) => return Err(scheme_error(phase, source)),
                }
                phase = TrialPhase::ReVerified;
                trace!(?phase);
                corruption_detected = Some(true);
            }
        }

        phase = TrialPhase::Done;
        trace!(?phase, message_length, trial);
        Ok(TrialSample {
            keygen_duration,
            sign_duration,
            verify_duration,
            verify_ok: true,
            recovered_length: recovered.len(),
            signed_total_length: signed.len(),
            sign_peak_heap,
            verify_peak_heap,
            corruption_detected,
        })
    }
}

/// The check `actual` fails against `expected`, if any.
fn compare(actual: &[u8], expected: &[u8]) -> Option<RoundTripCheck> {
    if actual.len() != expected.len() {
        return Some(RoundTripCheck::RecoveredLength {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    first_mismatch(actual, expected).map(|first_mismatch| {
        RoundTripCheck::RecoveredBytes { first_mismatch }
    })
}

fn first_mismatch(left: &[u8], right: &[u8]) -> Option<usize> {
    if left == right {
        return None;
    }
    left.iter()
        .zip(right)
        .position(|(a, b)| a != b)
        .or(Some(left.len().min(right.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{KeyPair, SchemeFamily, SchemeSizes};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::toy::{ToyScheme, TOY_TAG_BYTES};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Wraps the toy scheme and misbehaves in one configurable way.
    enum Faulty {
        Keygen,
        Sign,
        RejectAll,
        TruncateRecovered,
        FlipRecovered,
        AcceptAnything,
        /// Counts verify calls; the third one, after the restore,
        /// returns altered bytes.
        DriftOnReverify(AtomicUsize),
        /// Like `DriftOnReverify`, but drops the last byte.
        ShrinkOnReverify(AtomicUsize),
    }

    impl SignatureScheme for Faulty {
        fn algorithm_name(&self) -> &'static str {
            "faulty"
        }

        fn family(&self) -> SchemeFamily {
            SchemeFamily::Classical
        }

        fn sizes(&self) -> SchemeSizes {
            ToyScheme.sizes()
        }

        fn generate_keypair(&self) -> Result<KeyPair, SchemeError> {
            match self {
                Self::Keygen => Err(SchemeError::Keygen("no entropy".into())),
                _ => ToyScheme.generate_keypair(),
            }
        }

        fn sign(
            &self,
            secret_key: &[u8],
            message: &[u8],
            out: &mut SignedMessage,
        ) -> Result<(), SchemeError> {
            match self {
                Self::Sign => Err(SchemeError::Sign("boom".into())),
                _ => ToyScheme.sign(secret_key, message, out),
            }
        }

        fn verify(
            &self,
            public_key: &[u8],
            signed_message: &[u8],
        ) -> Result<Vec<u8>, SchemeError> {
            match self {
                Self::RejectAll => Err(SchemeError::VerificationFailed),
                Self::TruncateRecovered => {
                    let mut recovered =
                        ToyScheme.verify(public_key, signed_message)?;
                    recovered.pop();
                    Ok(recovered)
                }
                Self::FlipRecovered => {
                    let mut recovered =
                        ToyScheme.verify(public_key, signed_message)?;
                    recovered[3] ^= 0xFF;
                    Ok(recovered)
                }
                Self::AcceptAnything => {
                    Ok(signed_message[TOY_TAG_BYTES..].to_vec())
                }
                Self::DriftOnReverify(calls)
                | Self::ShrinkOnReverify(calls) => {
                    let call = calls.fetch_add(1, Ordering::Relaxed);
                    let mut recovered =
                        ToyScheme.verify(public_key, signed_message)?;
                    if call == 2 {
                        match self {
                            Self::DriftOnReverify(_) => recovered[5] ^= 0x01,
                            _ => {
                                recovered.pop();
                            }
                        }
                    }
                    Ok(recovered)
                }
                _ => ToyScheme.verify(public_key, signed_message),
            }
        }
    }

    fn run(
        scheme: &dyn SignatureScheme,
        corruption_check: bool,
    ) -> Result<TrialSample, SweepError> {
        let input = vec![0x5A_u8; 64];
        let mut rng = StdRng::seed_from_u64(11);
        TrialRunner::new(scheme, DigestMode::None, corruption_check)
            .run(&input, input.len(), 2, &mut rng)
    }

    #[test]
    fn successful_trial_records_sizes() {
        let sample = run(&ToyScheme, false).unwrap();
        assert!(sample.verify_ok);
        assert_eq!(sample.recovered_length, 64);
        assert_eq!(sample.signed_total_length, 64 + TOY_TAG_BYTES);
        assert_eq!(sample.corruption_detected, None);
    }

    #[test]
    fn corruption_branch_expects_rejection() {
        let sample = run(&ToyScheme, true).unwrap();
        assert_eq!(sample.corruption_detected, Some(true));
    }

    #[test]
    fn keygen_failure_is_reported_with_phase() {
        match run(&Faulty::Keygen, false) {
            Err(SweepError::Scheme { phase, trial, .. }) => {
                assert_eq!(phase, TrialPhase::Idle);
                assert_eq!(trial, 2);
            }
            other => panic!("expected keygen failure, got {other:?}"),
        }
    }

    #[test]
    fn sign_failure_is_reported_with_phase() {
        match run(&Faulty::Sign, false) {
            Err(SweepError::Scheme {
                phase,
                source: SchemeError::Sign(_),
                ..
            }) => assert_eq!(phase, TrialPhase::KeyGenerated),
            other => panic!("expected sign failure, got {other:?}"),
        }
    }

    #[test]
    fn rejected_round_trip_is_a_violation() {
        assert!(matches!(
            run(&Faulty::RejectAll, false),
            Err(SweepError::CorrectnessViolation {
                message_length: 64,
                trial: 2,
                check: RoundTripCheck::Verification,
            })
        ));
    }

    #[test]
    fn wrong_recovered_length_is_a_violation() {
        assert!(matches!(
            run(&Faulty::TruncateRecovered, false),
            Err(SweepError::CorrectnessViolation {
                check: RoundTripCheck::RecoveredLength {
                    expected: 64,
                    actual: 63
                },
                ..
            })
        ));
    }

    #[test]
    fn wrong_recovered_bytes_are_a_violation() {
        assert!(matches!(
            run(&Faulty::FlipRecovered, false),
            Err(SweepError::CorrectnessViolation {
                check: RoundTripCheck::RecoveredBytes { first_mismatch: 3 },
                ..
            })
        ));
    }

    #[test]
    fn accepted_corruption_is_an_anomaly() {
        assert!(matches!(
            run(&Faulty::AcceptAnything, true),
            Err(SweepError::CorruptionUndetected { trial: 2, .. })
        ));
    }

    #[test]
    fn reverify_after_restore_names_the_mismatch() {
        assert!(matches!(
            run(&Faulty::DriftOnReverify(AtomicUsize::new(0)), true),
            Err(SweepError::CorrectnessViolation {
                check: RoundTripCheck::RecoveredBytes { first_mismatch: 5 },
                ..
            })
        ));
        assert!(matches!(
            run(&Faulty::ShrinkOnReverify(AtomicUsize::new(0)), true),
            Err(SweepError::CorrectnessViolation {
                check: RoundTripCheck::RecoveredLength {
                    expected: 64,
                    actual: 63
                },
                ..
            })
        ));
    }

    #[test]
    fn compare_checks_length_before_bytes() {
        assert_eq!(compare(b"abc", b"abc"), None);
        assert_eq!(
            compare(b"ab", b"abc"),
            Some(RoundTripCheck::RecoveredLength {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            compare(b"abx", b"abc"),
            Some(RoundTripCheck::RecoveredBytes { first_mismatch: 2 })
        );
    }

    #[test]
    fn digest_mode_sets_expected_recovered_length() {
        let input = DigestMode::Sha512.reduce(&[7_u8; 10]).into_owned();
        let mut rng = StdRng::seed_from_u64(0);
        let sample = TrialRunner::new(&ToyScheme, DigestMode::Sha512, false)
            .run(&input, 10, 0, &mut rng)
            .unwrap();
        assert_eq!(sample.recovered_length, 64);
    }

    #[test]
    fn corruption_is_non_zero_and_reversible() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..256 {
            let corruption = Corruption::random(&mut rng, 17).unwrap();
            assert!(corruption.offset < 17);
            assert_ne!(corruption.delta, 0);

            let original = [0xFF_u8; 17];
            let mut bytes = original;
            corruption.apply(&mut bytes);
            assert_ne!(bytes, original);
            corruption.revert(&mut bytes);
            assert_eq!(bytes, original);
        }
        assert_eq!(Corruption::random(&mut rng, 0), None);
    }

    #[test]
    fn first_mismatch_finds_difference() {
        assert_eq!(first_mismatch(b"abc", b"abc"), None);
        assert_eq!(first_mismatch(b"abc", b"abd"), Some(2));
        assert_eq!(first_mismatch(b"ab", b"abc"), Some(2));
    }
}
