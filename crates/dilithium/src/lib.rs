//! ML-DSA (FIPS 204) behind the sweep's scheme interface.

use std::fmt;
use std::mem::size_of;
use std::str::FromStr;

use ml_dsa::{
    EncodedSignature, EncodedSigningKey, EncodedVerifyingKey, KeyGen, MlDsa44,
    MlDsa65, MlDsa87, Signature, SigningKey, VerifyingKey, B32,
};
use rand::RngCore;
use sweep::scheme::{check_length, split_signed};
use sweep::{
    KeyPair, SchemeError, SchemeFamily, SchemeSizes, SignatureScheme,
    SignedMessage,
};
use thiserror::Error;

/// Signing context; the sweep always signs with the empty context.
const CONTEXT: &[u8] = &[];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MlDsaParamSet {
    MlDsa44,
    MlDsa65,
    MlDsa87,
}

impl MlDsaParamSet {
    pub const ALL: [MlDsaParamSet; 3] =
        [Self::MlDsa44, Self::MlDsa65, Self::MlDsa87];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MlDsa44 => "ML-DSA-44",
            Self::MlDsa65 => "ML-DSA-65",
            Self::MlDsa87 => "ML-DSA-87",
        }
    }
}

impl fmt::Display for MlDsaParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown ML-DSA parameter set `{0}`")]
pub struct ParseParamSetError(String);

impl FromStr for MlDsaParamSet {
    type Err = ParseParamSetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|set| set.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ParseParamSetError(value.to_owned()))
    }
}

macro_rules! with_params {
    ($set:expr, $p:ident => $body:expr) => {
        match $set {
            MlDsaParamSet::MlDsa44 => {
                type $p = MlDsa44;
                $body
            }
            MlDsaParamSet::MlDsa65 => {
                type $p = MlDsa65;
                $body
            }
            MlDsaParamSet::MlDsa87 => {
                type $p = MlDsa87;
                $body
            }
        }
    };
}

/// Deterministic ML-DSA signing with fresh random key seeds.
///
/// Signed messages are `signature || message`.
#[derive(Clone, Copy, Debug)]
pub struct MlDsaScheme {
    param_set: MlDsaParamSet,
}

pub const ML_DSA_44: MlDsaScheme = MlDsaScheme::new(MlDsaParamSet::MlDsa44);
pub const ML_DSA_65: MlDsaScheme = MlDsaScheme::new(MlDsaParamSet::MlDsa65);
pub const ML_DSA_87: MlDsaScheme = MlDsaScheme::new(MlDsaParamSet::MlDsa87);

impl MlDsaScheme {
    pub const fn new(param_set: MlDsaParamSet) -> Self {
        Self { param_set }
    }

    pub fn param_set(&self) -> MlDsaParamSet {
        self.param_set
    }
}

impl SignatureScheme for MlDsaScheme {
    fn algorithm_name(&self) -> &'static str {
        self.param_set.as_str()
    }

    fn family(&self) -> SchemeFamily {
        SchemeFamily::Lattice
    }

    fn sizes(&self) -> SchemeSizes {
        with_params!(self.param_set, P => SchemeSizes {
            public_key_bytes: size_of::<EncodedVerifyingKey<P>>(),
            secret_key_bytes: size_of::<EncodedSigningKey<P>>(),
            max_signature_bytes: size_of::<EncodedSignature<P>>(),
        })
    }

    fn generate_keypair(&self) -> Result<KeyPair, SchemeError> {
        let mut seed = [0_u8; 32];
        rand::rng().fill_bytes(&mut seed);
        let seed = B32::from(seed);
        Ok(with_params!(self.param_set, P => {
            let keypair = P::key_gen_internal(&seed);
            KeyPair::new(
                keypair.verifying_key().encode().as_slice().to_vec(),
                keypair.signing_key().encode().as_slice().to_vec(),
            )
        }))
    }

    fn sign(
        &self,
        secret_key: &[u8],
        message: &[u8],
        out: &mut SignedMessage,
    ) -> Result<(), SchemeError> {
        let sizes = self.sizes();
        check_length("secret key", secret_key, sizes.secret_key_bytes)?;
        let signature = with_params!(self.param_set, P => {
            let encoded = EncodedSigningKey::<P>::try_from(secret_key)
                .map_err(|err| SchemeError::Sign(err.to_string()))?;
            SigningKey::<P>::decode(&encoded)
                .sign_deterministic(message, CONTEXT)
                .map_err(|err| SchemeError::Sign(err.to_string()))?
                .encode()
                .as_slice()
                .to_vec()
        });
        out.write(&signature)?;
        out.write(message)
    }

    fn verify(
        &self,
        public_key: &[u8],
        signed_message: &[u8],
    ) -> Result<Vec<u8>, SchemeError> {
        let sizes = self.sizes();
        check_length("public key", public_key, sizes.public_key_bytes)?;
        let (signature, message) =
            split_signed(signed_message, sizes.max_signature_bytes)?;
        let verified = with_params!(self.param_set, P => {
            let Ok(encoded) = EncodedVerifyingKey::<P>::try_from(public_key)
            else {
                return Err(SchemeError::VerificationFailed);
            };
            let verifying_key = VerifyingKey::<P>::decode(&encoded);
            EncodedSignature::<P>::try_from(signature)
                .ok()
                .and_then(|encoded| Signature::<P>::decode(&encoded))
                .is_some_and(|signature| {
                    verifying_key.verify_with_context(
                        message, CONTEXT, &signature,
                    )
                })
        });
        if !verified {
            return Err(SchemeError::VerificationFailed);
        }
        Ok(message.to_vec())
    }
}
