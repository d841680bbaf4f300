//! Nonce dealing for threshold ECDSA.
//!
//! Every signer `i` samples `k_i` and `gamma_i` and derives
//! `w_i = lambda_i * x_i`. For every ordered pair `(i, j)` of signers two MtA
//! runs under `i`'s keypair convert `k_i * gamma_j` and `k_i * w_j` into
//! additive shares, from which each signer obtains `delta_i` and `sigma_i`
//! with `sum delta_i = k * gamma` and `sum sigma_i = k * x`.
//! The public nonce is `R = Gamma * delta^-1 = G * k^-1`.
use std::collections::BTreeMap;

use k256::{AffinePoint, ProjectivePoint, Scalar};
use rand_core::CryptoRngCore;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, error, instrument};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    crypto::{curve::CurveContext, random::RngSeed},
    errors::{InitializationError, ProtocolError},
    keygen::KeygenOutput,
    mta::{run_mta, MtaShares, PaillierKeyPair},
    participants::{Participant, ParticipantList, SecretShares},
};

/// A dealt, not yet used, ECDSA signing session.
///
/// Signing consumes the session. The nonce shares it holds are wiped on
/// drop, whether or not it was used.
pub struct EcdsaSession {
    pub(crate) ctx: CurveContext,
    pub(crate) signers: ParticipantList,
    pub(crate) public_key: ProjectivePoint,
    pub(crate) big_r: AffinePoint,
    pub(crate) r: Scalar,
    pub(crate) k: SecretShares<Scalar>,
    pub(crate) sigma: SecretShares<Scalar>,
}

impl EcdsaSession {
    pub fn signers(&self) -> &ParticipantList {
        &self.signers
    }

    /// The public nonce point `R`.
    pub fn big_r(&self) -> AffinePoint {
        self.big_r
    }

    /// `r = x(R)`
    pub fn r(&self) -> Scalar {
        self.r
    }
}

/// One cell of the MtA matrix: owner `i` with `k_i`, counterparty `j`.
struct MtaCell {
    owner: Participant,
    counterparty: Participant,
    seed: RngSeed,
}

/// Shares of `k_i * gamma_j` and `k_i * w_j`.
#[derive(Zeroize, ZeroizeOnDrop)]
struct CellOutput {
    nonce: MtaShares,
    key: MtaShares,
}

fn missing(what: &str, p: Participant) -> ProtocolError {
    ProtocolError::AssertionFailed(format!("missing {what} for participant {p}"))
}

type Cells = BTreeMap<(Participant, Participant), CellOutput>;

/// Deals a session for an already validated quorum.
#[instrument(level = "debug", skip_all, fields(signers = signers.len()))]
pub fn deal(
    ctx: &CurveContext,
    keygen: &KeygenOutput,
    keypairs: &BTreeMap<Participant, PaillierKeyPair>,
    signers: &ParticipantList,
    rng: &mut impl CryptoRngCore,
) -> Result<EcdsaSession, ProtocolError> {
    if signers.len() < keygen.threshold {
        return Err(InitializationError::NotEnoughSigners {
            threshold: keygen.threshold,
            found: signers.len(),
        }
        .into());
    }
    for p in signers.iter() {
        if !keypairs.contains_key(&p) {
            return Err(InitializationError::MissingKeypair(p).into());
        }
    }

    let mut k = SecretShares::new();
    let mut gamma = SecretShares::new();
    let mut w = SecretShares::new();
    for p in signers.iter() {
        let share = keygen.share(p).ok_or(ProtocolError::InvalidShare(p))?;
        let lambda = signers.lagrange::<frost_secp256k1::Secp256K1Sha256>(p)?;
        k.insert(p, ctx.random_nonzero_scalar(rng));
        gamma.insert(p, ctx.random_nonzero_scalar(rng));
        w.insert(p, lambda * share);
    }

    let cells: Vec<MtaCell> = signers
        .iter()
        .flat_map(move |i| signers.iter().map(move |j| (i, j)))
        .map(|(owner, counterparty)| MtaCell {
            owner,
            counterparty,
            seed: RngSeed::random(&mut *rng),
        })
        .collect();
    debug!(cells = cells.len(), "running mta matrix");

    let outputs: Cells = cells
        .par_iter()
        .map(|cell| -> Result<_, ProtocolError> {
            let mut rng = cell.seed.to_rng();
            let keypair = keypairs
                .get(&cell.owner)
                .ok_or(InitializationError::MissingKeypair(cell.owner))?;
            let k_i = k.get(&cell.owner).ok_or_else(|| missing("k", cell.owner))?;
            let gamma_j = gamma
                .get(&cell.counterparty)
                .ok_or_else(|| missing("gamma", cell.counterparty))?;
            let w_j = w
                .get(&cell.counterparty)
                .ok_or_else(|| missing("w", cell.counterparty))?;
            let output = CellOutput {
                nonce: run_mta(ctx, keypair, k_i, gamma_j, &mut rng)?,
                key: run_mta(ctx, keypair, k_i, w_j, &mut rng)?,
            };
            Ok(((cell.owner, cell.counterparty), output))
        })
        .collect::<Result<Cells, ProtocolError>>()?;

    check_diagonal(signers, &k, &gamma, &w, &outputs)?;
    let (delta, sigma) = aggregate(signers, &k, &gamma, &w, &outputs)?;
    let (big_r, r) = derive_nonce(ctx, &delta, &gamma)?;

    debug!("ecdsa session dealt");
    Ok(EcdsaSession {
        ctx: ctx.clone(),
        signers: signers.clone(),
        public_key: keygen.public_key,
        big_r,
        r,
        k,
        sigma,
    })
}

/// Diagonal cells are computed locally, so they must convert exactly.
fn check_diagonal(
    signers: &ParticipantList,
    k: &SecretShares<Scalar>,
    gamma: &SecretShares<Scalar>,
    w: &SecretShares<Scalar>,
    outputs: &Cells,
) -> Result<(), ProtocolError> {
    for p in signers.iter() {
        let cell = outputs
            .get(&(p, p))
            .ok_or_else(|| missing("diagonal mta cell", p))?;
        let k_i = k.get(&p).ok_or_else(|| missing("k", p))?;
        let gamma_i = gamma.get(&p).ok_or_else(|| missing("gamma", p))?;
        let w_i = w.get(&p).ok_or_else(|| missing("w", p))?;
        if cell.nonce.alpha + cell.nonce.beta != *k_i * gamma_i
            || cell.key.alpha + cell.key.beta != *k_i * w_i
        {
            error!(participant = %p, "diagonal mta cell does not convert");
            return Err(ProtocolError::Homomorphic(format!(
                "mta conversion mismatch for participant {p}"
            )));
        }
    }
    Ok(())
}

/// `delta = sum_i delta_i` and the per-signer `sigma_i`, where
/// `delta_i = k_i * gamma_i + sum_{j != i} (alpha_ij + beta_ji)` and `sigma_i`
/// is built the same way from the key cells.
fn aggregate(
    signers: &ParticipantList,
    k: &SecretShares<Scalar>,
    gamma: &SecretShares<Scalar>,
    w: &SecretShares<Scalar>,
    outputs: &Cells,
) -> Result<(Scalar, SecretShares<Scalar>), ProtocolError> {
    let mut delta = Scalar::ZERO;
    let mut sigma = SecretShares::new();
    for i in signers.iter() {
        let k_i = k.get(&i).ok_or_else(|| missing("k", i))?;
        let gamma_i = gamma.get(&i).ok_or_else(|| missing("gamma", i))?;
        let w_i = w.get(&i).ok_or_else(|| missing("w", i))?;
        let mut delta_i = *k_i * gamma_i;
        let mut sigma_i = *k_i * w_i;
        for j in signers.others(i) {
            let sent = outputs.get(&(i, j)).ok_or_else(|| missing("mta cell", i))?;
            let received = outputs.get(&(j, i)).ok_or_else(|| missing("mta cell", j))?;
            delta_i += sent.nonce.alpha + received.nonce.beta;
            sigma_i += sent.key.alpha + received.key.beta;
        }
        delta += delta_i;
        sigma.insert(i, sigma_i);
        delta_i.zeroize();
    }
    Ok((delta, sigma))
}

/// `R = Gamma * delta^-1` and `r = x(R)`.
fn derive_nonce(
    ctx: &CurveContext,
    delta: &Scalar,
    gamma: &SecretShares<Scalar>,
) -> Result<(AffinePoint, Scalar), ProtocolError> {
    let delta_inv = Option::<Scalar>::from(delta.invert())
        .ok_or_else(|| ProtocolError::DegenerateNonce("k * gamma is zero".to_string()))?;
    let big_gamma = gamma
        .values()
        .fold(ProjectivePoint::IDENTITY, |acc, g| acc + ctx.public_point(g));
    let big_r = (big_gamma * delta_inv).to_affine();
    let r = ctx
        .x_coordinate(&big_r)
        .ok_or_else(|| ProtocolError::DegenerateNonce("x(R) exceeds the group order".to_string()))?;
    if bool::from(r.is_zero()) {
        return Err(ProtocolError::DegenerateNonce("r is zero".to_string()));
    }
    Ok((big_r, r))
}

#[cfg(test)]
mod test {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    struct Inputs {
        signers: ParticipantList,
        k: SecretShares<Scalar>,
        gamma: SecretShares<Scalar>,
        w: SecretShares<Scalar>,
        outputs: Cells,
    }

    /// Random inputs with every cell split into honest additive shares.
    fn honest_inputs(n: u32, seed: u64) -> Inputs {
        let ctx = CurveContext::secp256k1();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let signers = ParticipantList::range(n);
        let draw = |rng: &mut ChaCha20Rng| -> SecretShares<Scalar> {
            signers
                .iter()
                .map(|p| (p, ctx.random_nonzero_scalar(rng)))
                .collect()
        };
        let k = draw(&mut rng);
        let gamma = draw(&mut rng);
        let w = draw(&mut rng);
        let mut outputs = Cells::new();
        for i in signers.iter() {
            for j in signers.iter() {
                let k_i = *k.get(&i).unwrap();
                let split = |product: Scalar, rng: &mut ChaCha20Rng| {
                    let alpha = ctx.random_scalar(rng);
                    MtaShares {
                        alpha,
                        beta: product - alpha,
                    }
                };
                let nonce = split(k_i * gamma.get(&j).unwrap(), &mut rng);
                let key = split(k_i * w.get(&j).unwrap(), &mut rng);
                outputs.insert((i, j), CellOutput { nonce, key });
            }
        }
        Inputs {
            signers,
            k,
            gamma,
            w,
            outputs,
        }
    }

    fn sum(shares: &SecretShares<Scalar>) -> Scalar {
        shares.values().fold(Scalar::ZERO, |acc, v| acc + v)
    }

    #[test]
    fn aggregation_yields_the_products() {
        let inputs = honest_inputs(3, 1);
        check_diagonal(&inputs.signers, &inputs.k, &inputs.gamma, &inputs.w, &inputs.outputs)
            .unwrap();
        let (delta, sigma) =
            aggregate(&inputs.signers, &inputs.k, &inputs.gamma, &inputs.w, &inputs.outputs)
                .unwrap();
        assert_eq!(delta, sum(&inputs.k) * sum(&inputs.gamma));
        assert_eq!(sum(&sigma), sum(&inputs.k) * sum(&inputs.w));
    }

    #[test]
    fn tampered_diagonal_cell_is_rejected() {
        let mut inputs = honest_inputs(2, 2);
        let p = Participant::from(2u32);
        if let Some(cell) = inputs.outputs.get_mut(&(p, p)) {
            cell.key.beta += Scalar::ONE;
        }
        let result =
            check_diagonal(&inputs.signers, &inputs.k, &inputs.gamma, &inputs.w, &inputs.outputs);
        assert!(matches!(result, Err(ProtocolError::Homomorphic(_))));
    }

    #[test]
    fn missing_diagonal_cell_is_rejected() {
        let mut inputs = honest_inputs(2, 3);
        let p = Participant::from(1u32);
        inputs.outputs.remove(&(p, p));
        let result =
            check_diagonal(&inputs.signers, &inputs.k, &inputs.gamma, &inputs.w, &inputs.outputs);
        assert!(matches!(result, Err(ProtocolError::AssertionFailed(_))));
    }

    #[test]
    fn zero_delta_is_degenerate() {
        let ctx = CurveContext::secp256k1();
        let inputs = honest_inputs(2, 4);
        assert!(matches!(
            derive_nonce(&ctx, &Scalar::ZERO, &inputs.gamma),
            Err(ProtocolError::DegenerateNonce(_))
        ));
    }

    #[test]
    fn nonce_is_gamma_over_delta() {
        let ctx = CurveContext::secp256k1();
        let inputs = honest_inputs(3, 5);
        let (delta, _) =
            aggregate(&inputs.signers, &inputs.k, &inputs.gamma, &inputs.w, &inputs.outputs)
                .unwrap();
        let (big_r, r) = derive_nonce(&ctx, &delta, &inputs.gamma).unwrap();
        let k_inv = Option::<Scalar>::from(sum(&inputs.k).invert()).unwrap();
        assert_eq!(ProjectivePoint::from(big_r), ctx.public_point(&k_inv));
        assert_eq!(Some(r), ctx.x_coordinate(&big_r));
    }
}
