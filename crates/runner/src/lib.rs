//! Scheme registry and output layout for the `sigsweep` binary.

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use dilithium::{MlDsaParamSet, MlDsaScheme};
use falcon::{FalconParamSet, FalconScheme};
use rsa_scheme::{RsaParamSet, RsaScheme};
use sphincs_plus::{SphincsPlusParamSet, SphincsPlusScheme};
use sweep::digest::ParseDigestModeError;
use sweep::{DigestMode, JsonLinesSink, PipeSink, RecordSink, SignatureScheme};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("unknown scheme `{name}`; known schemes: {known}")]
    UnknownScheme { name: String, known: String },

    #[error(transparent)]
    Digest(#[from] ParseDigestModeError),
}

/// Every scheme the binary can sweep, in run order.
pub fn registry() -> Vec<Box<dyn SignatureScheme>> {
    let mut schemes: Vec<Box<dyn SignatureScheme>> = Vec::new();
    for set in MlDsaParamSet::ALL {
        schemes.push(Box::new(MlDsaScheme::new(set)));
    }
    for set in FalconParamSet::ALL {
        schemes.push(Box::new(FalconScheme::new(set)));
    }
    for set in SphincsPlusParamSet::ALL {
        schemes.push(Box::new(SphincsPlusScheme::new(set)));
    }
    for set in RsaParamSet::ALL {
        schemes.push(Box::new(RsaScheme::new(set)));
    }
    schemes.push(Box::new(ed25519_scheme::ED25519));
    schemes
}

pub fn scheme_names() -> Vec<&'static str> {
    registry().iter().map(|s| s.algorithm_name()).collect()
}

/// Resolves names case-insensitively; empty or `all` selects everything.
pub fn select_schemes(
    names: &[String],
) -> Result<Vec<Box<dyn SignatureScheme>>, RunnerError> {
    if names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case("all"))
    {
        return Ok(registry());
    }
    let mut available = registry();
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let position = available
            .iter()
            .position(|s| s.algorithm_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| RunnerError::UnknownScheme {
                name: name.clone(),
                known: scheme_names().join(", "),
            })?;
        selected.push(available.swap_remove(position));
    }
    Ok(selected)
}

/// `all` or a single digest mode.
pub fn parse_digest_modes(
    value: &str,
) -> Result<Vec<DigestMode>, ParseDigestModeError> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(DigestMode::ALL.to_vec());
    }
    Ok(vec![value.parse()?])
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// `|field|...|` rows terminated by CRLF
    #[default]
    Pipe,
    /// one JSON object per line
    Json,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pipe => "txt",
            Self::Json => "jsonl",
        }
    }
}

/// `SPHINCS+-SHA2-128f-simple` becomes `sphincsplus-sha2-128f-simple`.
pub fn file_stem(algorithm: &str) -> String {
    algorithm
        .to_ascii_lowercase()
        .replace('+', "plus")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

pub fn output_path(
    output_dir: &Path,
    algorithm: &str,
    digest_mode: DigestMode,
    format: OutputFormat,
) -> PathBuf {
    let name = format!(
        "{}{}.{}",
        file_stem(algorithm),
        digest_mode.file_suffix(),
        format.extension()
    );
    output_dir.join(name)
}

pub fn open_sink(
    path: &Path,
    format: OutputFormat,
) -> io::Result<Box<dyn RecordSink>> {
    Ok(match format {
        OutputFormat::Pipe => Box::new(PipeSink::create(path)?),
        OutputFormat::Json => Box::new(JsonLinesSink::create(path)?),
    })
}

/// Echoes rows to stdout the way the file sink writes them.
pub fn console_sink() -> PipeSink<BufWriter<io::Stdout>> {
    PipeSink::new(BufWriter::new(io::stdout()))
}

/// Each row reaches the file before the console sees it, so a closed
/// stdout still leaves that row on disk.
pub fn file_then_console<C: RecordSink>(
    file: Box<dyn RecordSink>,
    console: C,
) -> (Box<dyn RecordSink>, C) {
    (file, console)
}
