use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::SweepError;

pub const BENCH_MESSAGE_SIZES: [usize; 4] = [32, 256, 1024, 4096];
pub const BENCH_MESSAGE_BYTE: u8 = 0x42;

/// Fills fresh payloads from a seedable PRNG.
///
/// The stream only has to be statistically independent across trials so
/// that compressible or repeated inputs do not skew timings; it is not a
/// key-material source.
#[derive(Debug)]
pub struct MessageGenerator {
    rng: StdRng,
}

impl MessageGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn generate(&mut self, length: usize) -> Result<Vec<u8>, SweepError> {
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(length)
            .map_err(|_| SweepError::Allocation { length })?;
        payload.resize(length, 0);
        self.rng.fill_bytes(&mut payload);
        Ok(payload)
    }
}

/// Constant-filled message for micro-benchmarks.
pub fn bench_message(size: usize) -> Vec<u8> {
    vec![BENCH_MESSAGE_BYTE; size]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length() {
        let mut generator = MessageGenerator::from_seed(1);
        for length in [0_usize, 1, 64, 4097] {
            assert_eq!(generator.generate(length).unwrap().len(), length);
        }
    }

    #[test]
    fn consecutive_payloads_differ() {
        let mut generator = MessageGenerator::from_seed(42);
        let first = generator.generate(256).unwrap();
        let second = generator.generate(256).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn same_seed_reproduces_payloads() {
        let mut a = MessageGenerator::from_seed(9);
        let mut b = MessageGenerator::from_seed(9);
        assert_eq!(a.generate(128).unwrap(), b.generate(128).unwrap());
    }

    #[test]
    fn payload_bytes_are_roughly_uniform() {
        let mut generator = MessageGenerator::from_seed(3);
        let payload = generator.generate(1 << 16).unwrap();
        let ones: u32 = payload.iter().map(|byte| byte.count_ones()).sum();
        let ratio = f64::from(ones) / (payload.len() * 8) as f64;
        assert!((0.49..0.51).contains(&ratio), "bit ratio {ratio}");
    }

    #[test]
    fn oversized_payload_reports_allocation_error() {
        let mut generator = MessageGenerator::from_seed(0);
        match generator.generate(usize::MAX) {
            Err(SweepError::Allocation { length }) => {
                assert_eq!(length, usize::MAX)
            }
            other => panic!("expected allocation error, got {other:?}"),
        }
    }

    #[test]
    fn bench_message_uses_expected_fill_byte() {
        let message = bench_message(16);
        assert_eq!(message.len(), 16);
        assert!(message.iter().all(|&byte| byte == BENCH_MESSAGE_BYTE));
    }
}
