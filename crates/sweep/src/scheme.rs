use std::fmt;

use crate::error::SchemeError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemeFamily {
    Lattice,
    HashBased,
    Classical,
}

impl SchemeFamily {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lattice => "lattice",
            Self::HashBased => "hash-based",
            Self::Classical => "classical",
        }
    }
}

impl fmt::Display for SchemeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size constants reported by the underlying library.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SchemeSizes {
    pub public_key_bytes: usize,
    pub secret_key_bytes: usize,
    /// Upper bound on what signing adds to the message.
    pub max_signature_bytes: usize,
}

impl SchemeSizes {
    pub fn signed_message_capacity(&self, message_len: usize) -> usize {
        message_len.saturating_add(self.max_signature_bytes)
    }
}

#[derive(Clone, Debug)]
pub struct KeyPair {
    public_key: Vec<u8>,
    secret_key: Vec<u8>,
}

impl KeyPair {
    pub fn new(public_key: Vec<u8>, secret_key: Vec<u8>) -> Self {
        Self {
            public_key,
            secret_key,
        }
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }
}

/// Output buffer for `sign`, bounded by the scheme's worst-case size.
#[derive(Clone, Debug)]
pub struct SignedMessage {
    bytes: Vec<u8>,
    capacity: usize,
}

impl SignedMessage {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn for_message(sizes: &SchemeSizes, message_len: usize) -> Self {
        Self::with_capacity(sizes.signed_message_capacity(message_len))
    }

    /// Appends `chunk`, refusing to grow past the declared capacity.
    pub fn write(&mut self, chunk: &[u8]) -> Result<(), SchemeError> {
        let needed = self.bytes.len().saturating_add(chunk.len());
        if needed > self.capacity {
            return Err(SchemeError::BufferTooSmall {
                needed,
                capacity: self.capacity,
            });
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Uniform keygen/sign/verify surface over one concrete signature scheme.
///
/// Signed messages use the attached encoding: `verify` recovers the signed
/// input from the signed message. Adapters over detached-signature
/// libraries prepend the signature to the message.
pub trait SignatureScheme {
    fn algorithm_name(&self) -> &'static str;
    fn family(&self) -> SchemeFamily;
    fn sizes(&self) -> SchemeSizes;

    fn generate_keypair(&self) -> Result<KeyPair, SchemeError>;

    fn sign(
        &self,
        secret_key: &[u8],
        message: &[u8],
        out: &mut SignedMessage,
    ) -> Result<(), SchemeError>;

    /// Returns the recovered message, or [`SchemeError::VerificationFailed`].
    fn verify(
        &self,
        public_key: &[u8],
        signed_message: &[u8],
    ) -> Result<Vec<u8>, SchemeError>;
}

/// Splits an attached `signature || message` encoding.
pub fn split_signed(
    signed_message: &[u8],
    signature_len: usize,
) -> Result<(&[u8], &[u8]), SchemeError> {
    if signed_message.len() < signature_len {
        return Err(SchemeError::VerificationFailed);
    }
    Ok(signed_message.split_at(signature_len))
}

pub fn check_length(
    what: &'static str,
    bytes: &[u8],
    expected: usize,
) -> Result<(), SchemeError> {
    if bytes.len() != expected {
        return Err(SchemeError::InvalidLength {
            what,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_message_capacity_adds_signature_bound() {
        let sizes = SchemeSizes {
            public_key_bytes: 10,
            secret_key_bytes: 10,
            max_signature_bytes: 20,
        };
        assert_eq!(sizes.signed_message_capacity(100), 120);
        assert_eq!(sizes.signed_message_capacity(usize::MAX), usize::MAX);
    }

    #[test]
    fn write_past_capacity_is_rejected() {
        let mut signed = SignedMessage::with_capacity(8);
        signed.write(&[1, 2, 3, 4, 5]).unwrap();
        match signed.write(&[6, 7, 8, 9]) {
            Err(SchemeError::BufferTooSmall { needed, capacity }) => {
                assert_eq!((needed, capacity), (9, 8));
            }
            other => panic!("expected BufferTooSmall, got {other:?}"),
        }
        assert_eq!(signed.as_bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn split_signed_rejects_truncated_input() {
        assert!(matches!(
            split_signed(&[0_u8; 3], 4),
            Err(SchemeError::VerificationFailed)
        ));
        let (signature, message) = split_signed(&[1, 2, 3, 4, 5], 2).unwrap();
        assert_eq!(signature, &[1, 2]);
        assert_eq!(message, &[3, 4, 5]);
    }

    #[test]
    fn check_length_reports_mismatch() {
        assert!(check_length("secret key", &[0_u8; 32], 32).is_ok());
        assert!(matches!(
            check_length("secret key", &[0_u8; 31], 32),
            Err(SchemeError::InvalidLength {
                expected: 32,
                actual: 31,
                ..
            })
        ));
    }
}
