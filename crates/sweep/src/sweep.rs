use std::iter::FusedIterator;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

use crate::config::{next_length, SweepConfig};
use crate::error::SweepError;
use crate::message::MessageGenerator;
use crate::record::SweepRecord;
use crate::scheme::SignatureScheme;
use crate::sink::RecordSink;
use crate::trial::{TrialRunner, TrialSample};

/// Keeps corruption offsets independent of the payload stream when both
/// derive from one fixed seed.
const CORRUPTION_SEED_TWEAK: u64 = 0x9e37_79b9_7f4a_7c15;

/// Message lengths `min, floor(min * g), ...` strictly below `max`.
#[derive(Clone, Debug)]
pub struct LengthSchedule {
    next: usize,
    max_length: usize,
    growth_factor: f64,
}

impl LengthSchedule {
    /// Expects a validated configuration.
    fn new(config: &SweepConfig) -> Self {
        Self {
            next: config.min_length,
            max_length: config.max_length,
            growth_factor: config.growth_factor,
        }
    }
}

impl Iterator for LengthSchedule {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.max_length {
            return None;
        }
        let current = self.next;
        self.next = next_length(current, self.growth_factor).max(current + 1);
        Some(current)
    }
}

impl FusedIterator for LengthSchedule {}

/// One pass over the configured message lengths for one scheme.
///
/// Yields one record per length, lazily. The sweep is consumed as it runs
/// and stops for good after the first error.
pub struct Sweep<'s> {
    scheme: &'s dyn SignatureScheme,
    config: SweepConfig,
    lengths: LengthSchedule,
    generator: MessageGenerator,
    corruption_rng: StdRng,
    samples: Vec<TrialSample>,
    failed: bool,
}

impl<'s> Sweep<'s> {
    pub fn new(
        scheme: &'s dyn SignatureScheme,
        config: SweepConfig,
    ) -> Result<Self, SweepError> {
        config.validate()?;
        let (generator, corruption_rng) = match config.seed {
            Some(seed) => (
                MessageGenerator::from_seed(seed),
                StdRng::seed_from_u64(seed ^ CORRUPTION_SEED_TWEAK),
            ),
            None => (MessageGenerator::from_os_rng(), StdRng::from_os_rng()),
        };
        Ok(Self {
            scheme,
            lengths: LengthSchedule::new(&config),
            samples: Vec::with_capacity(config.trials_per_step),
            config,
            generator,
            corruption_rng,
            failed: false,
        })
    }

    /// Lengths this sweep will visit, without running any trial.
    pub fn lengths(&self) -> LengthSchedule {
        self.lengths.clone()
    }

    pub fn step_count(&self) -> usize {
        self.lengths().count()
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Emits every record to `sink` as soon as its step completes and
    /// returns the number of records written.
    pub fn run<S: RecordSink>(self, mut sink: S) -> Result<usize, SweepError> {
        let algorithm = self.scheme.algorithm_name();
        let digest_mode = self.config.digest_mode;
        info!(
            algorithm,
            %digest_mode,
            steps = self.step_count(),
            trials = self.config.trials_per_step,
            "sweep started"
        );
        let mut emitted = 0;
        for record in self {
            sink.emit(&record?)?;
            emitted += 1;
        }
        info!(algorithm, %digest_mode, records = emitted, "sweep finished");
        Ok(emitted)
    }

    fn run_step(
        &mut self,
        message_length: usize,
    ) -> Result<SweepRecord, SweepError> {
        let runner = TrialRunner::new(
            self.scheme,
            self.config.digest_mode,
            self.config.corruption_check,
        );
        self.samples.clear();
        for trial in 0..self.config.trials_per_step {
            let payload = self.generator.generate(message_length)?;
            let input = self.config.digest_mode.reduce(&payload);
            let sample = runner.run(
                &input,
                message_length,
                trial,
                &mut self.corruption_rng,
            )?;
            self.samples.push(sample);
        }

        SweepRecord::aggregate(
            self.scheme.algorithm_name(),
            self.config.digest_mode,
            message_length,
            &self.scheme.sizes(),
            &self.samples,
        )
        .ok_or_else(|| SweepError::configuration("step ran no trials"))
    }
}

impl Iterator for Sweep<'_> {
    type Item = Result<SweepRecord, SweepError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let message_length = self.lengths.next()?;
        match self.run_step(message_length) {
            Ok(record) => {
                debug!(
                    algorithm = %record.algorithm,
                    message_length,
                    row = %record.pipe_row(),
                    "step complete"
                );
                Some(Ok(record))
            }
            Err(err) => {
                error!(
                    algorithm = self.scheme.algorithm_name(),
                    message_length,
                    error = %err,
                    "sweep aborted"
                );
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Sweep<'_> {}
