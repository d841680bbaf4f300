use frost_secp256k1::Secp256K1Sha256;
use k256::{ProjectivePoint, Scalar};
use rand_core::CryptoRngCore;
use tracing::{debug, error, instrument};
use zeroize::Zeroizing;

use super::SchnorrSignature;
use crate::{
    crypto::{
        curve::CurveContext, hash::schnorr_challenge, lagrange::interpolate_in_exponent,
        polynomials::Polynomial,
    },
    errors::{InitializationError, ProtocolError},
    keygen::KeygenOutput,
    participants::{ParticipantList, SecretShares},
};

type C = Secp256K1Sha256;

/// A dealt Schnorr session: the nonce shares of a quorum and the public
/// nonce `R`. Signing consumes it.
pub struct SchnorrSession {
    signers: ParticipantList,
    public_key: ProjectivePoint,
    big_r: ProjectivePoint,
    nonces: SecretShares<Scalar>,
    shares: SecretShares<Scalar>,
}

impl SchnorrSession {
    pub fn signers(&self) -> &ParticipantList {
        &self.signers
    }

    pub fn big_r(&self) -> ProjectivePoint {
        self.big_r
    }

    /// Produces `(e, s)` for `msg`, consuming the session.
    ///
    /// Each signer answers `s_i = k_i + x_i * e`; the responses lie on a
    /// polynomial of degree `t - 1` whose value at zero is `k + x * e`.
    pub fn sign(self, msg: &[u8]) -> Result<SchnorrSignature, ProtocolError> {
        let e = schnorr_challenge(&self.big_r, msg);

        let mut responses = SecretShares::new();
        for p in self.signers.iter() {
            let (Some(k_i), Some(x_i)) = (self.nonces.get(&p), self.shares.get(&p)) else {
                return Err(ProtocolError::AssertionFailed(format!(
                    "missing session state for participant {p}"
                )));
            };
            responses.insert(p, *k_i + *x_i * e);
        }
        let s = Polynomial::<C>::eval_interpolation(&responses, None)?;

        let sig = SchnorrSignature { e, s };
        if !sig.verify(&self.public_key, msg) {
            error!("threshold schnorr signature failed to verify");
            return Err(ProtocolError::AssertionFailed(
                "signature failed to verify".to_string(),
            ));
        }
        debug!(signers = self.signers.len(), "schnorr signature produced");
        Ok(sig)
    }
}

/// Every signer deals a nonce polynomial of degree `t - 1` to the quorum.
/// The nonce share of signer `i` is the sum of all those polynomials at
/// `i`, and `R` is interpolated in the exponent from the points `G * k_i`.
#[instrument(level = "debug", skip_all, fields(signers = signers.len()))]
pub(super) fn deal(
    ctx: &CurveContext,
    keygen: &KeygenOutput,
    signers: &ParticipantList,
    rng: &mut impl CryptoRngCore,
) -> Result<SchnorrSession, ProtocolError> {
    if signers.len() < keygen.threshold {
        return Err(InitializationError::NotEnoughSigners {
            threshold: keygen.threshold,
            found: signers.len(),
        }
        .into());
    }

    let mut shares = SecretShares::new();
    for p in signers.iter() {
        let share = keygen.share(p).ok_or(ProtocolError::InvalidShare(p))?;
        shares.insert(p, *share);
    }

    let polynomials: Zeroizing<Vec<Polynomial<C>>> = Zeroizing::new(
        signers
            .iter()
            .map(|_| Polynomial::random(keygen.threshold, rng))
            .collect(),
    );
    let nonces: SecretShares<Scalar> = signers
        .iter()
        .map(|p| (p, Polynomial::eval_sum_on_participant(polynomials.iter(), p)))
        .collect();

    let points: Vec<ProjectivePoint> = nonces.values().map(|k| ctx.public_point(k)).collect();
    let big_r = interpolate_in_exponent::<C>(&signers.scalars::<C>(), &points, None)?;
    if big_r == ProjectivePoint::IDENTITY {
        return Err(ProtocolError::DegenerateNonce(
            "nonce commitment is the identity".to_string(),
        ));
    }

    Ok(SchnorrSession {
        signers: signers.clone(),
        public_key: keygen.public_key,
        big_r,
        nonces,
        shares,
    })
}
