use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

pub const SHA256_LEN: usize = 32;
pub const SHA512_LEN: usize = 64;

/// What is handed to the scheme: the raw payload or a digest of it.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DigestMode {
    #[default]
    None,
    Sha256,
    Sha512,
}

impl DigestMode {
    pub const ALL: [DigestMode; 3] = [Self::None, Self::Sha256, Self::Sha512];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Fixed digest length, `None` for the pass-through mode.
    pub const fn output_len(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Sha256 => Some(SHA256_LEN),
            Self::Sha512 => Some(SHA512_LEN),
        }
    }

    /// Length of the signing input for a payload of `message_length` bytes.
    pub const fn signing_input_len(self, message_length: usize) -> usize {
        match self.output_len() {
            Some(len) => len,
            None => message_length,
        }
    }

    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Sha256 => "_sha256",
            Self::Sha512 => "_sha512",
        }
    }

    /// Digests run for every payload length, including the empty payload.
    pub fn reduce(self, payload: &[u8]) -> Cow<'_, [u8]> {
        match self {
            Self::None => Cow::Borrowed(payload),
            Self::Sha256 => Cow::Owned(Sha256::digest(payload).to_vec()),
            Self::Sha512 => Cow::Owned(Sha512::digest(payload).to_vec()),
        }
    }
}

impl fmt::Display for DigestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestMode {
    type Err = ParseDigestModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "");
        match normalized.as_str() {
            "none" | "raw" => Ok(Self::None),
            "sha256" | "a" => Ok(Self::Sha256),
            "sha512" | "b" => Ok(Self::Sha512),
            _ => Err(ParseDigestModeError(value.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown digest mode: {0}; expected one of: none, sha256, sha512")]
pub struct ParseDigestModeError(String);
