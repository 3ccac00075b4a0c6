//! Ed25519 as a classical baseline for the post-quantum sweeps.

use ed25519_dalek::{
    Signature, Signer, SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};
use rand::RngCore;
use sweep::scheme::split_signed;
use sweep::{
    KeyPair, SchemeError, SchemeFamily, SchemeSizes, SignatureScheme,
    SignedMessage,
};

/// Secret keys are the 32-byte seed; signed messages are
/// `signature || message`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Scheme;

pub const ED25519: Ed25519Scheme = Ed25519Scheme;

fn key_bytes<const N: usize>(
    what: &'static str,
    bytes: &[u8],
) -> Result<[u8; N], SchemeError> {
    bytes.try_into().map_err(|_| SchemeError::InvalidLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}

impl SignatureScheme for Ed25519Scheme {
    fn algorithm_name(&self) -> &'static str {
        "Ed25519"
    }

    fn family(&self) -> SchemeFamily {
        SchemeFamily::Classical
    }

    fn sizes(&self) -> SchemeSizes {
        SchemeSizes {
            public_key_bytes: PUBLIC_KEY_LENGTH,
            secret_key_bytes: SECRET_KEY_LENGTH,
            max_signature_bytes: SIGNATURE_LENGTH,
        }
    }

    fn generate_keypair(&self) -> Result<KeyPair, SchemeError> {
        let mut seed = [0_u8; SECRET_KEY_LENGTH];
        rand::rng().fill_bytes(&mut seed);
        let signing_key = SigningKey::from_bytes(&seed);
        Ok(KeyPair::new(
            signing_key.verifying_key().to_bytes().to_vec(),
            seed.to_vec(),
        ))
    }

    fn sign(
        &self,
        secret_key: &[u8],
        message: &[u8],
        out: &mut SignedMessage,
    ) -> Result<(), SchemeError> {
        let seed = key_bytes::<SECRET_KEY_LENGTH>("secret key", secret_key)?;
        let signature = SigningKey::from_bytes(&seed).sign(message);
        out.write(&signature.to_bytes())?;
        out.write(message)
    }

    fn verify(
        &self,
        public_key: &[u8],
        signed_message: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        let public_key =
            key_bytes::<PUBLIC_KEY_LENGTH>("public key", public_key)?;
        let (signature, message) =
            split_signed(signed_message, SIGNATURE_LENGTH)?;
        let verifying_key = VerifyingKey::from_bytes(&public_key)
            .map_err(|_| SchemeError::VerificationFailed)?;
        let signature = Signature::from_slice(signature)
            .map_err(|_| SchemeError::VerificationFailed)?;
        verifying_key
            .verify_strict(message, &signature)
            .map_err(|_| SchemeError::VerificationFailed)?;
        Ok(message.to_vec())
    }
}
