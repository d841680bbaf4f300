//! Threshold ECDSA with Paillier based MtA share conversion.
//!
//! A [`ThresholdEcdsa`] instance owns the key shares of a group together with
//! one Paillier keypair per participant. Signing goes through two steps:
//! [`ThresholdEcdsa::deal`] samples the nonce shares of a quorum and runs the
//! MtA matrix, returning an [`EcdsaSession`]; [`EcdsaSession::sign`] then
//! consumes that session so its nonces can never sign twice.
use std::collections::BTreeMap;

use elliptic_curve::{
    bigint::U256,
    ops::{Invert, Reduce},
    point::AffineCoordinates,
    scalar::IsHigh,
    PrimeField,
};
use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    AffinePoint, FieldBytes, ProjectivePoint, Scalar,
};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    crypto::{curve::CurveContext, hash::Address},
    errors::{InitializationError, ProtocolError},
    keygen::{keygen, KeygenOutput},
    mta::{generate_keypairs, PaillierKeyPair},
    participants::{Participant, ParticipantList},
    threshold::ProtocolParameters,
};

pub mod deal;
mod sign;

pub use deal::EcdsaSession;

pub const SIGNATURE_RSV_LEN: usize = 65;
const SCALAR_LEN: usize = 32;
/// Offset between the recovery parameter and the `v` byte.
const V_OFFSET: u8 = 27;

/// Interprets a 32 byte message digest as a scalar.
pub fn message_scalar(msg_hash: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*msg_hash))
}

/// Get the x coordinate of a point, as a scalar
pub(crate) fn x_coordinate(point: &AffinePoint) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&point.x())
}

/// A recoverable ECDSA signature over secp256k1.
///
/// `s` is always in the lower half of the scalar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    pub r: Scalar,
    pub s: Scalar,
    /// Parity of the y coordinate of `R`, adjusted for the normalisation of
    /// `s`.
    pub recovery_param: u8,
}

/// Hex form of an [`EcdsaSignature`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedEcdsaSignature {
    pub r: String,
    pub s: String,
    #[serde(rename = "recoveryParam")]
    pub recovery_param: u8,
    pub v: u8,
}

impl EcdsaSignature {
    /// `27 + recovery_param`
    pub fn v(&self) -> u8 {
        V_OFFSET + self.recovery_param
    }

    #[must_use]
    // This verification tests the signature including whether s has been normalized
    pub fn verify(&self, public_key: &ProjectivePoint, msg_hash: &[u8; 32]) -> bool {
        if self.r.is_zero().into() || self.s.is_zero().into() || self.s.is_high().into() {
            return false;
        }
        let Some(s_inv) = Option::<Scalar>::from(Invert::invert_vartime(&self.s)) else {
            return false;
        };
        let msg = message_scalar(msg_hash);
        let reproduced =
            (ProjectivePoint::GENERATOR * (msg * s_inv)) + (*public_key * (self.r * s_inv));
        x_coordinate(&reproduced.to_affine()) == self.r
    }

    /// Big-endian `r` and `s` as `0x` prefixed hex.
    pub fn encode(&self) -> EncodedEcdsaSignature {
        EncodedEcdsaSignature {
            r: format!("0x{}", hex::encode(self.r.to_bytes())),
            s: format!("0x{}", hex::encode(self.s.to_bytes())),
            recovery_param: self.recovery_param,
            v: self.v(),
        }
    }

    /// `r || s || v`
    pub fn to_rsv_bytes(&self) -> [u8; SIGNATURE_RSV_LEN] {
        let mut out = [0u8; SIGNATURE_RSV_LEN];
        let bytes = self
            .r
            .to_bytes()
            .into_iter()
            .chain(self.s.to_bytes())
            .chain(std::iter::once(self.v()));
        for (o, b) in out.iter_mut().zip(bytes) {
            *o = b;
        }
        out
    }

    /// Parses `r || s || v`, accepting `v` both as `27`/`28` and `0`/`1`.
    pub fn from_rsv_bytes(bytes: &[u8; SIGNATURE_RSV_LEN]) -> Result<Self, ProtocolError> {
        let (r_bytes, rest) = bytes.split_at(SCALAR_LEN);
        let (s_bytes, v_bytes) = rest.split_at(SCALAR_LEN);
        let r = parse_scalar(r_bytes, "r")?;
        let s = parse_scalar(s_bytes, "s")?;
        let recovery_param = match v_bytes.first().copied() {
            Some(v @ (27 | 28)) => v - V_OFFSET,
            Some(v @ (0 | 1)) => v,
            v => {
                return Err(ProtocolError::InvalidEncoding(format!(
                    "unsupported recovery byte {v:?}"
                )))
            }
        };
        Ok(Self {
            r,
            s,
            recovery_param,
        })
    }

    /// Recovers the public key that produced this signature over `msg_hash`.
    pub fn recover(&self, msg_hash: &[u8; 32]) -> Result<ProjectivePoint, ProtocolError> {
        let signature = Signature::from_scalars(self.r.to_bytes(), self.s.to_bytes())
            .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(self.recovery_param).ok_or_else(|| {
            ProtocolError::InvalidEncoding(format!(
                "invalid recovery parameter {}",
                self.recovery_param
            ))
        })?;
        let key = VerifyingKey::recover_from_prehash(msg_hash, &signature, recovery_id)
            .map_err(|e| ProtocolError::AssertionFailed(format!("recovery failed: {e}")))?;
        Ok(ProjectivePoint::from(*key.as_affine()))
    }

    /// Ethereum address of the signer, as `ecrecover` would compute it.
    pub fn recover_address(&self, msg_hash: &[u8; 32]) -> Result<Address, ProtocolError> {
        self.recover(msg_hash).map(|pk| Address::from_point(&pk))
    }
}

fn parse_scalar(bytes: &[u8], name: &str) -> Result<Scalar, ProtocolError> {
    let repr = FieldBytes::clone_from_slice(bytes);
    Option::from(Scalar::from_repr(repr))
        .ok_or_else(|| ProtocolError::InvalidEncoding(format!("{name} is not a canonical scalar")))
}

/// A signing group: key shares plus one Paillier keypair per participant.
pub struct ThresholdEcdsa {
    ctx: CurveContext,
    params: ProtocolParameters,
    keygen: KeygenOutput,
    keypairs: BTreeMap<Participant, PaillierKeyPair>,
}

impl ThresholdEcdsa {
    /// Runs key generation and creates every Paillier keypair.
    #[instrument(level = "debug", skip_all, fields(n = params.participants, t = params.threshold))]
    pub fn build(
        ctx: CurveContext,
        params: ProtocolParameters,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self, ProtocolError> {
        params.validate()?;
        let participants = params.participant_list()?;
        let keygen = keygen(&ctx, &params, rng)?;
        let keypairs = generate_keypairs(&participants, params.paillier_modulus_bits)?;
        info!(participants = participants.len(), "threshold ecdsa group ready");
        Self::new(ctx, keygen, keypairs)
    }

    /// Assembles a group out of existing key shares and keypairs.
    pub fn new(
        ctx: CurveContext,
        keygen: KeygenOutput,
        keypairs: BTreeMap<Participant, PaillierKeyPair>,
    ) -> Result<Self, ProtocolError> {
        let participants = keygen.participants();
        let n = u32::try_from(participants.len())
            .map_err(|_| InitializationError::TooManyParticipants(participants.len()))?;
        if participants != ParticipantList::range(n) {
            return Err(InitializationError::BadParameters(
                "key shares must belong to participants 1..=n".to_string(),
            )
            .into());
        }
        for p in participants.iter() {
            if !keypairs.contains_key(&p) {
                return Err(InitializationError::MissingKeypair(p).into());
            }
        }
        let paillier_modulus_bits = keypairs
            .values()
            .map(PaillierKeyPair::modulus_bits)
            .min()
            .ok_or(InitializationError::NoParticipants)?;
        let params = ProtocolParameters {
            participants: participants.len(),
            threshold: keygen.threshold,
            paillier_modulus_bits,
        };
        params.validate()?;
        Ok(Self {
            ctx,
            params,
            keygen,
            keypairs,
        })
    }

    pub fn parameters(&self) -> &ProtocolParameters {
        &self.params
    }

    pub fn keygen_output(&self) -> &KeygenOutput {
        &self.keygen
    }

    pub fn public_key(&self) -> ProjectivePoint {
        self.keygen.public_key
    }

    pub fn address(&self) -> Address {
        self.keygen.address()
    }

    /// Validates `signers` and prepares a one-shot signing session for them.
    pub fn deal(
        &self,
        signers: &[u32],
        rng: &mut impl CryptoRngCore,
    ) -> Result<EcdsaSession, ProtocolError> {
        let signers = self.params.validate_signers(signers)?;
        deal::deal(&self.ctx, &self.keygen, &self.keypairs, &signers, rng)
    }

    /// Deals a fresh session and signs `msg_hash` with it.
    pub fn sign(
        &self,
        msg_hash: &[u8; 32],
        signers: &[u32],
        rng: &mut impl CryptoRngCore,
    ) -> Result<EcdsaSignature, ProtocolError> {
        self.deal(signers, rng)?.sign(msg_hash)
    }
}
