//! Message-size sweep engine for signature schemes.
//!
//! A [`Sweep`] walks message lengths geometrically, runs a batch of
//! keygen/sign/verify trials per length through a [`SignatureScheme`]
//! adapter and folds each batch into one [`SweepRecord`].

pub mod config;
pub mod digest;
pub mod error;
pub mod memory;
pub mod message;
pub mod record;
pub mod report;
pub mod scheme;
pub mod sink;
pub mod sweep;
pub mod toy;
pub mod trial;

pub use config::SweepConfig;
pub use digest::{DigestMode, SHA256_LEN, SHA512_LEN};
pub use error::{RoundTripCheck, SchemeError, SweepError};
pub use memory::TrackingAllocator;
pub use message::{bench_message, MessageGenerator, BENCH_MESSAGE_SIZES};
pub use record::{SweepRecord, TimingStats, RECORD_HEADER};
pub use scheme::{
    KeyPair, SchemeFamily, SchemeSizes, SignatureScheme, SignedMessage,
};
pub use sink::{JsonLinesSink, PipeSink, RecordSink};
pub use sweep::{LengthSchedule, Sweep};
pub use toy::ToyScheme;
pub use trial::{Corruption, TrialPhase, TrialRunner, TrialSample};

use std::time::{Duration, Instant};

pub fn measure_time<T, F>(operation: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let value = operation();
    (value, start.elapsed())
}
