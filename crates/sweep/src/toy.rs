//! A keyed-hash stand-in scheme with fixed sizes.
//!
//! It is not a signature scheme in any security sense: the "public" key is
//! derived from the secret and the tag is a truncated SHA-256. It exists so
//! that the engine can be exercised end to end with cheap, predictable
//! sizes.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::SchemeError;
use crate::scheme::{
    check_length, split_signed, KeyPair, SchemeFamily, SchemeSizes,
    SignatureScheme, SignedMessage,
};

pub const TOY_KEY_BYTES: usize = 10;
pub const TOY_TAG_BYTES: usize = 20;

#[derive(Clone, Copy, Debug, Default)]
pub struct ToyScheme;

impl ToyScheme {
    fn public_from_secret(secret_key: &[u8]) -> [u8; TOY_KEY_BYTES] {
        let digest = Sha256::digest(secret_key);
        let mut public_key = [0_u8; TOY_KEY_BYTES];
        public_key.copy_from_slice(&digest[..TOY_KEY_BYTES]);
        public_key
    }

    fn tag(public_key: &[u8], message: &[u8]) -> [u8; TOY_TAG_BYTES] {
        let mut hasher = Sha256::new();
        hasher.update(public_key);
        hasher.update(message);
        let digest = hasher.finalize();
        let mut tag = [0_u8; TOY_TAG_BYTES];
        tag.copy_from_slice(&digest[..TOY_TAG_BYTES]);
        tag
    }
}

impl SignatureScheme for ToyScheme {
    fn algorithm_name(&self) -> &'static str {
        "toy-sha256"
    }

    fn family(&self) -> SchemeFamily {
        SchemeFamily::HashBased
    }

    fn sizes(&self) -> SchemeSizes {
        SchemeSizes {
            public_key_bytes: TOY_KEY_BYTES,
            secret_key_bytes: TOY_KEY_BYTES,
            max_signature_bytes: TOY_TAG_BYTES,
        }
    }

    fn generate_keypair(&self) -> Result<KeyPair, SchemeError> {
        let mut secret_key = [0_u8; TOY_KEY_BYTES];
        rand::rng().fill_bytes(&mut secret_key);
        let public_key = Self::public_from_secret(&secret_key);
        Ok(KeyPair::new(public_key.to_vec(), secret_key.to_vec()))
    }

    fn sign(
        &self,
        secret_key: &[u8],
        message: &[u8],
        out: &mut SignedMessage,
    ) -> Result<(), SchemeError> {
        check_length("secret key", secret_key, TOY_KEY_BYTES)?;
        let public_key = Self::public_from_secret(secret_key);
        out.write(&Self::tag(&public_key, message))?;
        out.write(message)
    }

    fn verify(
        &self,
        public_key: &[u8],
        signed_message: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        check_length("public key", public_key, TOY_KEY_BYTES)?;
        let (tag, message) = split_signed(signed_message, TOY_TAG_BYTES)?;
        if tag != Self::tag(public_key, message) {
            return Err(SchemeError::VerificationFailed);
        }
        Ok(message.to_vec())
    }
}
