//! Trusted-dealer style key generation by additive composition of
//! per-participant polynomials.
//!
//! Every participant `i` owns a random polynomial `f_i` of degree `t - 1`.
//! The group secret is `x = sum_i f_i(0)` and participant `j` holds the share
//! `sum_i f_i(j)`, so any `t` shares interpolate to `x` at zero.
use std::collections::BTreeMap;

use frost_secp256k1::Secp256K1Sha256;
use k256::{ProjectivePoint, Scalar};
use rand_core::CryptoRngCore;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroize;

use crate::{
    crypto::{
        curve::CurveContext,
        hash::Address,
        polynomials::{Polynomial, PolynomialCommitment},
    },
    errors::{InitializationError, ProtocolError},
    participants::{Participant, ParticipantList},
    threshold::ProtocolParameters,
};

type C = Secp256K1Sha256;

/// Upper bound on whole-batch resampling of the keygen polynomials.
pub const MAX_KEYGEN_ATTEMPTS: usize = 16;

/// Output of [`keygen`].
///
/// Shares are wiped from memory when this value is dropped.
#[derive(Clone)]
pub struct KeygenOutput {
    /// Aggregate public key `G * x`.
    pub public_key: ProjectivePoint,
    /// The secret share of every participant.
    pub shares: BTreeMap<Participant, Scalar>,
    /// `G * f_i(0)` for the polynomial owned by each participant.
    pub participant_public_keys: BTreeMap<Participant, ProjectivePoint>,
    /// Sum of the coefficient commitments of every polynomial.
    pub commitment: PolynomialCommitment<C>,
    pub threshold: usize,
}

impl Drop for KeygenOutput {
    fn drop(&mut self) {
        self.shares.values_mut().for_each(Zeroize::zeroize);
    }
}

impl KeygenOutput {
    pub fn participants(&self) -> ParticipantList {
        let ids: Vec<Participant> = self.shares.keys().copied().collect();
        // keys of a map are already distinct
        ParticipantList::new(&ids).unwrap_or_else(|| ParticipantList::range(0))
    }

    pub fn share(&self, participant: Participant) -> Option<&Scalar> {
        self.shares.get(&participant)
    }

    /// Checks the share of `participant` against the published commitments.
    pub fn verify_share(
        &self,
        ctx: &CurveContext,
        participant: Participant,
    ) -> Result<(), ProtocolError> {
        let share = self
            .shares
            .get(&participant)
            .ok_or(ProtocolError::InvalidShare(participant))?;
        if ctx.public_point(share) != self.commitment.eval_on_participant(participant) {
            return Err(ProtocolError::InvalidShare(participant));
        }
        Ok(())
    }

    /// Interpolates the group secret from the shares of `signers`.
    ///
    /// Only meant for tests and audits: it materialises the private key.
    pub fn reconstruct_secret(&self, signers: &ParticipantList) -> Result<Scalar, ProtocolError> {
        if signers.len() < self.threshold {
            return Err(InitializationError::NotEnoughSigners {
                threshold: self.threshold,
                found: signers.len(),
            }
            .into());
        }
        let mut subset = BTreeMap::new();
        for p in signers.iter() {
            let share = self.shares.get(&p).ok_or(ProtocolError::InvalidShare(p))?;
            subset.insert(p, *share);
        }
        let secret = Polynomial::<C>::eval_interpolation(&subset, None);
        subset.values_mut().for_each(Zeroize::zeroize);
        secret
    }

    /// Ethereum address of the aggregate public key.
    pub fn address(&self) -> Address {
        Address::from_point(&self.public_key)
    }
}

/// Generates shares of a fresh secret for `params.participants` parties.
#[instrument(level = "debug", skip_all, fields(n = params.participants, t = params.threshold))]
pub fn keygen(
    ctx: &CurveContext,
    params: &ProtocolParameters,
    rng: &mut impl CryptoRngCore,
) -> Result<KeygenOutput, ProtocolError> {
    params.validate()?;
    let participants = params.participant_list()?;
    let mut polynomials = sample_polynomials(&participants, params.threshold, rng, |s| {
        ctx.is_valid_private_key(s)
    })?;

    let participant_public_keys: BTreeMap<Participant, ProjectivePoint> = polynomials
        .iter()
        .map(|(p, f)| (*p, ctx.public_point(&f.eval_on_zero())))
        .collect();
    let public_key = participant_public_keys
        .values()
        .fold(ProjectivePoint::IDENTITY, |acc, pk| acc + pk);

    let shares: BTreeMap<Participant, Scalar> = participants
        .iter()
        .map(|p| (p, Polynomial::eval_sum_on_participant(polynomials.values(), p)))
        .collect();

    let commitment = polynomials.values().fold(
        PolynomialCommitment::new(Vec::new()),
        |acc, f| acc.add(&f.commit_polynomial()),
    );

    polynomials.values_mut().for_each(Zeroize::zeroize);

    let output = KeygenOutput {
        public_key,
        shares,
        participant_public_keys,
        commitment,
        threshold: params.threshold,
    };
    for p in participants.iter() {
        output.verify_share(ctx, p)?;
    }

    info!(
        participants = participants.len(),
        threshold = params.threshold,
        "key generation complete"
    );
    Ok(output)
}

/// Draws one polynomial per participant, resampling the entire batch until
/// every constant term satisfies `is_valid`.
fn sample_polynomials(
    participants: &ParticipantList,
    threshold: usize,
    rng: &mut impl CryptoRngCore,
    is_valid: impl Fn(&Scalar) -> bool,
) -> Result<BTreeMap<Participant, Polynomial<C>>, ProtocolError> {
    for attempt in 1..=MAX_KEYGEN_ATTEMPTS {
        let polynomials: BTreeMap<Participant, Polynomial<C>> = participants
            .iter()
            .map(|p| (p, Polynomial::random(threshold, rng)))
            .collect();
        if polynomials.values().all(|f| is_valid(&f.eval_on_zero())) {
            debug!(attempt, "sampled keygen polynomials");
            return Ok(polynomials);
        }
        warn!(attempt, "invalid constant term, resampling keygen polynomials");
    }
    Err(ProtocolError::InvalidPrivateKey {
        attempts: MAX_KEYGEN_ATTEMPTS,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::seq::SliceRandom;
    use rand_chacha::ChaCha20Rng;
    use rand_core::{OsRng, SeedableRng};

    fn params(n: usize, t: usize) -> ProtocolParameters {
        ProtocolParameters::new(n, t).unwrap()
    }

    #[test]
    fn any_threshold_subset_recovers_the_secret() {
        let ctx = CurveContext::secp256k1();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for n in 1..=20usize {
            for t in 1..=n {
                let output = keygen(&ctx, &params(n, t), &mut rng).unwrap();
                let mut ids: Vec<Participant> = output.shares.keys().copied().collect();
                ids.shuffle(&mut rng);
                let size = t + (n - t) / 2;
                let subset = ParticipantList::new(ids.get(..size).unwrap()).unwrap();
                let secret = output.reconstruct_secret(&subset).unwrap();
                assert_eq!(ProjectivePoint::GENERATOR * secret, output.public_key);
            }
        }
    }

    #[test]
    fn public_key_is_sum_of_participant_keys() {
        let ctx = CurveContext::secp256k1();
        let output = keygen(&ctx, &params(5, 3), &mut OsRng).unwrap();
        assert_eq!(output.participant_public_keys.len(), 5);
        let sum = output
            .participant_public_keys
            .values()
            .fold(ProjectivePoint::IDENTITY, |acc, pk| acc + pk);
        assert_eq!(sum, output.public_key);
        assert_eq!(output.commitment.eval_on_zero(), output.public_key);
    }

    #[test]
    fn shares_verify_and_tampering_is_detected() {
        let ctx = CurveContext::secp256k1();
        let mut output = keygen(&ctx, &params(4, 2), &mut OsRng).unwrap();
        for p in output.participants().iter() {
            assert!(output.verify_share(&ctx, p).is_ok());
        }
        let victim = Participant::from(3u32);
        if let Some(share) = output.shares.get_mut(&victim) {
            *share += Scalar::ONE;
        }
        assert_eq!(
            output.verify_share(&ctx, victim),
            Err(ProtocolError::InvalidShare(victim))
        );
        assert_eq!(
            output.verify_share(&ctx, Participant::from(9u32)),
            Err(ProtocolError::InvalidShare(Participant::from(9u32)))
        );
    }

    #[test]
    fn too_few_shares_cannot_reconstruct() {
        let ctx = CurveContext::secp256k1();
        let output = keygen(&ctx, &params(5, 3), &mut OsRng).unwrap();
        let subset = ParticipantList::new(&[Participant::from(1u32), Participant::from(5u32)])
            .unwrap();
        assert_eq!(
            output.reconstruct_secret(&subset),
            Err(ProtocolError::Initialization(
                InitializationError::NotEnoughSigners {
                    threshold: 3,
                    found: 2
                }
            ))
        );
    }

    #[test]
    fn single_participant_share_is_the_secret() {
        let ctx = CurveContext::secp256k1();
        let output = keygen(&ctx, &params(1, 1), &mut OsRng).unwrap();
        let share = output.share(Participant::from(1u32)).copied().unwrap();
        assert_eq!(ProjectivePoint::GENERATOR * share, output.public_key);
    }

    #[test]
    fn resampling_is_bounded() {
        let participants = ParticipantList::range(3);
        let result = sample_polynomials(&participants, 2, &mut OsRng, |_| false);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPrivateKey {
                attempts: MAX_KEYGEN_ATTEMPTS
            })
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let ctx = CurveContext::secp256k1();
        let bad = ProtocolParameters {
            participants: 3,
            threshold: 0,
            paillier_modulus_bits: 2048,
        };
        assert_eq!(
            keygen(&ctx, &bad, &mut OsRng).err(),
            Some(ProtocolError::Initialization(
                InitializationError::ThresholdIsZero
            ))
        );
    }
}
