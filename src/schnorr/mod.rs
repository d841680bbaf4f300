//! Threshold Schnorr signatures with an Ethereum style challenge.
//!
//! A signature is the pair `(e, s)` with `e = keccak256(address(R) || m)`
//! and `s = k + x * e`; it verifies when `G * s - X * e` hashes back to `e`.
//! Unlike ECDSA no multiplicative step is needed: the nonce and the
//! response are both linear in the shares, so they are simply interpolated.
use k256::{ProjectivePoint, Scalar};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use zeroize::Zeroizing;

use crate::{
    crypto::{
        curve::CurveContext,
        hash::{schnorr_challenge, Address},
    },
    errors::{InitializationError, ProtocolError},
    keygen::{keygen, KeygenOutput},
    threshold::ProtocolParameters,
};

mod sign;

pub use sign::SchnorrSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchnorrSignature {
    /// The challenge.
    pub e: Scalar,
    pub s: Scalar,
}

impl SchnorrSignature {
    /// Recomputes `R = G * s - X * e` and checks that it hashes to `e`.
    #[must_use]
    pub fn verify(&self, public_key: &ProjectivePoint, msg: &[u8]) -> bool {
        let big_r = ProjectivePoint::GENERATOR * self.s - *public_key * self.e;
        if big_r == ProjectivePoint::IDENTITY {
            return false;
        }
        schnorr_challenge(&big_r, msg) == self.e
    }

    /// `e` and `s` as `0x` prefixed big-endian hex.
    pub fn encode(&self) -> (String, String) {
        (
            format!("0x{}", hex::encode(self.e.to_bytes())),
            format!("0x{}", hex::encode(self.s.to_bytes())),
        )
    }
}

/// Single party Schnorr signing under the same challenge convention.
pub fn sign_single(
    ctx: &CurveContext,
    secret: &Scalar,
    msg: &[u8],
    rng: &mut impl CryptoRngCore,
) -> Result<SchnorrSignature, ProtocolError> {
    if !ctx.is_valid_private_key(secret) {
        return Err(InitializationError::BadParameters("invalid private key".to_string()).into());
    }
    let k = Zeroizing::new(ctx.random_nonzero_scalar(rng));
    let big_r = ctx.public_point(&k);
    let e = schnorr_challenge(&big_r, msg);
    Ok(SchnorrSignature {
        e,
        s: *k + *secret * e,
    })
}

/// A Schnorr signing group holding the key shares of every participant.
pub struct ThresholdSchnorr {
    ctx: CurveContext,
    params: ProtocolParameters,
    keygen: KeygenOutput,
}

impl ThresholdSchnorr {
    #[instrument(level = "debug", skip_all, fields(n = params.participants, t = params.threshold))]
    pub fn build(
        ctx: CurveContext,
        params: ProtocolParameters,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self, ProtocolError> {
        let keygen = keygen(&ctx, &params, rng)?;
        Ok(Self {
            ctx,
            params,
            keygen,
        })
    }

    pub fn new(ctx: CurveContext, keygen: KeygenOutput) -> Result<Self, ProtocolError> {
        let params = ProtocolParameters::new(keygen.shares.len(), keygen.threshold)?;
        let expected = params.participant_list()?;
        if keygen.participants() != expected {
            return Err(InitializationError::BadParameters(
                "key shares must belong to participants 1..=n".to_string(),
            )
            .into());
        }
        Ok(Self {
            ctx,
            params,
            keygen,
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

    /// Validates `signers` and deals the nonce shares of a new session.
    pub fn deal(
        &self,
        signers: &[u32],
        rng: &mut impl CryptoRngCore,
    ) -> Result<SchnorrSession, ProtocolError> {
        let signers = self.params.validate_signers(signers)?;
        sign::deal(&self.ctx, &self.keygen, &signers, rng)
    }

    /// Deals a fresh session and signs `msg` with it.
    pub fn threshold_sign(
        &self,
        msg: &[u8],
        signers: &[u32],
        rng: &mut impl CryptoRngCore,
    ) -> Result<SchnorrSignature, ProtocolError> {
        self.deal(signers, rng)?.sign(msg)
    }
}
