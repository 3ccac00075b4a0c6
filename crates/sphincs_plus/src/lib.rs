use std::fmt;
use std::str::FromStr;

use pqcrypto_traits::sign::{
    PublicKey as _, SecretKey as _, SignedMessage as _,
};
use sweep::scheme::check_length;
use sweep::{
    KeyPair, SchemeError, SchemeFamily, SchemeSizes, SignatureScheme,
    SignedMessage,
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SphincsPlusParamSet {
    Sha2_128fSimple,
    Sha2_128sSimple,
    Shake128fSimple,
    Shake128sSimple,
}

impl SphincsPlusParamSet {
    pub const ALL: [SphincsPlusParamSet; 4] = [
        Self::Sha2_128fSimple,
        Self::Sha2_128sSimple,
        Self::Shake128fSimple,
        Self::Shake128sSimple,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha2_128fSimple => "SPHINCS+-SHA2-128f-simple",
            Self::Sha2_128sSimple => "SPHINCS+-SHA2-128s-simple",
            Self::Shake128fSimple => "SPHINCS+-SHAKE-128f-simple",
            Self::Shake128sSimple => "SPHINCS+-SHAKE-128s-simple",
        }
    }
}

impl fmt::Display for SphincsPlusParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown SPHINCS+ parameter set `{0}`")]
pub struct ParseParamSetError(String);

impl FromStr for SphincsPlusParamSet {
    type Err = ParseParamSetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|set| set.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ParseParamSetError(value.to_owned()))
    }
}

macro_rules! with_module {
    ($set:expr, $m:ident => $body:expr) => {
        match $set {
            SphincsPlusParamSet::Sha2_128fSimple => {
                use pqcrypto_sphincsplus::sphincssha2128fsimple as $m;
                $body
            }
            SphincsPlusParamSet::Sha2_128sSimple => {
                use pqcrypto_sphincsplus::sphincssha2128ssimple as $m;
                $body
            }
            SphincsPlusParamSet::Shake128fSimple => {
                use pqcrypto_sphincsplus::sphincsshake128fsimple as $m;
                $body
            }
            SphincsPlusParamSet::Shake128sSimple => {
                use pqcrypto_sphincsplus::sphincsshake128ssimple as $m;
                $body
            }
        }
    };
}

#[derive(Clone, Copy, Debug)]
pub struct SphincsPlusScheme {
    param_set: SphincsPlusParamSet,
}

pub const SPHINCS_PLUS_SHA2_128F_SIMPLE: SphincsPlusScheme =
    SphincsPlusScheme::new(SphincsPlusParamSet::Sha2_128fSimple);
pub const SPHINCS_PLUS_SHAKE_128F_SIMPLE: SphincsPlusScheme =
    SphincsPlusScheme::new(SphincsPlusParamSet::Shake128fSimple);

impl SphincsPlusScheme {
    pub const fn new(param_set: SphincsPlusParamSet) -> Self {
        Self { param_set }
    }

    pub fn param_set(&self) -> SphincsPlusParamSet {
        self.param_set
    }
}

impl SignatureScheme for SphincsPlusScheme {
    fn algorithm_name(&self) -> &'static str {
        self.param_set.as_str()
    }

    fn family(&self) -> SchemeFamily {
        SchemeFamily::HashBased
    }

    fn sizes(&self) -> SchemeSizes {
        with_module!(self.param_set, m => SchemeSizes {
            public_key_bytes: m::public_key_bytes(),
            secret_key_bytes: m::secret_key_bytes(),
            max_signature_bytes: m::signature_bytes(),
        })
    }

    fn generate_keypair(&self) -> Result<KeyPair, SchemeError> {
        Ok(with_module!(self.param_set, m => {
            let (public_key, secret_key) = m::keypair();
            KeyPair::new(
                public_key.as_bytes().to_vec(),
                secret_key.as_bytes().to_vec(),
            )
        }))
    }

    fn sign(
        &self,
        secret_key: &[u8],
        message: &[u8],
        out: &mut SignedMessage,
    ) -> Result<(), SchemeError> {
        check_length("secret key", secret_key, self.sizes().secret_key_bytes)?;
        with_module!(self.param_set, m => {
            let secret_key = m::SecretKey::from_bytes(secret_key)
                .map_err(|_| SchemeError::Sign("malformed secret key".into()))?;
            out.write(m::sign(message, &secret_key).as_bytes())
        })
    }

    fn verify(
        &self,
        public_key: &[u8],
        signed_message: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        check_length("public key", public_key, self.sizes().public_key_bytes)?;
        with_module!(self.param_set, m => {
            let public_key = m::PublicKey::from_bytes(public_key)
                .map_err(|_| SchemeError::VerificationFailed)?;
            let signed = m::SignedMessage::from_bytes(signed_message)
                .map_err(|_| SchemeError::VerificationFailed)?;
            m::open(&signed, &public_key)
                .map_err(|_| SchemeError::VerificationFailed)
        })
    }
}
