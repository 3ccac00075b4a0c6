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
pub enum FalconParamSet {
    Falcon512,
    Falcon1024,
}

impl FalconParamSet {
    pub const ALL: [FalconParamSet; 2] = [Self::Falcon512, Self::Falcon1024];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Falcon512 => "Falcon-512",
            Self::Falcon1024 => "Falcon-1024",
        }
    }
}

impl fmt::Display for FalconParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown Falcon parameter set `{0}`")]
pub struct ParseParamSetError(String);

impl FromStr for FalconParamSet {
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
            FalconParamSet::Falcon512 => {
                use pqcrypto_falcon::falcon512 as $m;
                $body
            }
            FalconParamSet::Falcon1024 => {
                use pqcrypto_falcon::falcon1024 as $m;
                $body
            }
        }
    };
}

/// Falcon through PQClean. Signatures are compressed, so signed message
/// lengths vary between trials.
#[derive(Clone, Copy, Debug)]
pub struct FalconScheme {
    param_set: FalconParamSet,
}

pub const FALCON_512: FalconScheme =
    FalconScheme::new(FalconParamSet::Falcon512);
pub const FALCON_1024: FalconScheme =
    FalconScheme::new(FalconParamSet::Falcon1024);

impl FalconScheme {
    pub const fn new(param_set: FalconParamSet) -> Self {
        Self { param_set }
    }

    pub fn param_set(&self) -> FalconParamSet {
        self.param_set
    }
}

impl SignatureScheme for FalconScheme {
    fn algorithm_name(&self) -> &'static str {
        self.param_set.as_str()
    }

    fn family(&self) -> SchemeFamily {
        SchemeFamily::Lattice
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
