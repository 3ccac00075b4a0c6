//! RSA PKCS#1 v1.5 signatures over SHA-256 as a classical baseline.

use std::fmt;
use std::str::FromStr;

use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey,
    EncodeRsaPublicKey,
};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::rand_core::OsRng;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use sweep::scheme::split_signed;
use sweep::{
    KeyPair, SchemeError, SchemeFamily, SchemeSizes, SignatureScheme,
    SignedMessage,
};
use thiserror::Error;

/// Modulus sizes. Keys use the public exponent 65537.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RsaParamSet {
    Rsa2048,
    Rsa3072,
}

impl RsaParamSet {
    pub const ALL: [RsaParamSet; 2] = [Self::Rsa2048, Self::Rsa3072];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rsa2048 => "RSA-2048",
            Self::Rsa3072 => "RSA-3072",
        }
    }

    pub const fn modulus_bits(self) -> usize {
        match self {
            Self::Rsa2048 => 2048,
            Self::Rsa3072 => 3072,
        }
    }

    pub const fn modulus_bytes(self) -> usize {
        self.modulus_bits() / 8
    }
}

impl fmt::Display for RsaParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown RSA parameter set `{0}`")]
pub struct ParseParamSetError(String);

impl FromStr for RsaParamSet {
    type Err = ParseParamSetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|set| set.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ParseParamSetError(value.to_owned()))
    }
}

/// DER TLV length for `content` bytes of content.
const fn der_len(content: usize) -> usize {
    let length_octets = if content < 0x80 {
        1
    } else if content <= 0xFF {
        2
    } else if content <= 0xFFFF {
        3
    } else {
        4
    };
    1 + length_octets + content
}

/// An unsigned integer of `bytes` bytes whose top bit may be set.
const fn der_uint_len(bytes: usize) -> usize {
    der_len(bytes + 1)
}

/// `e = 65537` encodes as three content bytes.
const EXPONENT_DER_LEN: usize = der_len(3);

/// `RSAPublicKey ::= SEQUENCE { n, e }`. Exact, since `n` always has its
/// top bit set.
const fn public_key_der_len(modulus: usize) -> usize {
    der_len(der_uint_len(modulus) + EXPONENT_DER_LEN)
}

/// Upper bound for a two-prime `RSAPrivateKey`: version, `n`, `e`, `d`,
/// then `p`, `q`, `dP`, `dQ` and `qInv` at half the modulus size.
const fn secret_key_der_max_len(modulus: usize) -> usize {
    der_len(
        der_len(1)
            + 2 * der_uint_len(modulus)
            + EXPONENT_DER_LEN
            + 5 * der_uint_len(modulus / 2),
    )
}

/// RSASSA-PKCS1-v1_5 with SHA-256 through the `rsa` crate.
///
/// Keys travel as PKCS#1 DER. Signed messages are
/// `signature || message`, and the signature is exactly one modulus long.
#[derive(Clone, Copy, Debug)]
pub struct RsaScheme {
    param_set: RsaParamSet,
}

pub const RSA_2048: RsaScheme = RsaScheme::new(RsaParamSet::Rsa2048);
pub const RSA_3072: RsaScheme = RsaScheme::new(RsaParamSet::Rsa3072);

impl RsaScheme {
    pub const fn new(param_set: RsaParamSet) -> Self {
        Self { param_set }
    }

    pub fn param_set(&self) -> RsaParamSet {
        self.param_set
    }
}

impl SignatureScheme for RsaScheme {
    fn algorithm_name(&self) -> &'static str {
        self.param_set.as_str()
    }

    fn family(&self) -> SchemeFamily {
        SchemeFamily::Classical
    }

    /// The secret key size is the largest DER encoding the modulus allows;
    /// actual keys may be a few bytes shorter.
    fn sizes(&self) -> SchemeSizes {
        let modulus = self.param_set.modulus_bytes();
        SchemeSizes {
            public_key_bytes: public_key_der_len(modulus),
            secret_key_bytes: secret_key_der_max_len(modulus),
            max_signature_bytes: modulus,
        }
    }

    fn generate_keypair(&self) -> Result<KeyPair, SchemeError> {
        let keygen_error = |err: &dyn fmt::Display| {
            SchemeError::Keygen(err.to_string())
        };
        let private_key =
            RsaPrivateKey::new(&mut OsRng, self.param_set.modulus_bits())
                .map_err(|err| keygen_error(&err))?;
        let public_key = private_key
            .to_public_key()
            .to_pkcs1_der()
            .map_err(|err| keygen_error(&err))?;
        let secret_key = private_key
            .to_pkcs1_der()
            .map_err(|err| keygen_error(&err))?;
        Ok(KeyPair::new(
            public_key.as_bytes().to_vec(),
            secret_key.as_bytes().to_vec(),
        ))
    }

    fn sign(
        &self,
        secret_key: &[u8],
        message: &[u8],
        out: &mut SignedMessage,
    ) -> Result<(), SchemeError> {
        let private_key = RsaPrivateKey::from_pkcs1_der(secret_key)
            .map_err(|err| SchemeError::Sign(err.to_string()))?;
        let signature = SigningKey::<Sha256>::new(private_key)
            .try_sign(message)
            .map_err(|err| SchemeError::Sign(err.to_string()))?;
        out.write(&signature.to_bytes())?;
        out.write(message)
    }

    fn verify(
        &self,
        public_key: &[u8],
        signed_message: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        let (signature, message) =
            split_signed(signed_message, self.param_set.modulus_bytes())?;
        let public_key = RsaPublicKey::from_pkcs1_der(public_key)
            .map_err(|_| SchemeError::VerificationFailed)?;
        let signature = Signature::try_from(signature)
            .map_err(|_| SchemeError::VerificationFailed)?;
        VerifyingKey::<Sha256>::new(public_key)
            .verify(message, &signature)
            .map_err(|_| SchemeError::VerificationFailed)?;
        Ok(message.to_vec())
    }
}
