//! Multiplicative-to-additive share conversion over Paillier encryption.
//!
//! The owner `P` holds `a` together with a Paillier keypair, the counterparty
//! `Q` holds `b`. After the exchange below `P` holds `alpha` and `Q` holds
//! `beta` with `alpha + beta = a * b (mod n)`, and neither learns the other
//! party's input.
//!
//! 1. `P` sends `c1 = Enc(a)`.
//! 2. `Q` samples an integer `beta'` below `n^2 * 2^128` and answers
//!    `c2 = b * c1 + Enc(beta')`, keeping `beta = -(beta' mod n)`.
//! 3. `P` decrypts `alpha = Dec(c2) mod n`.
//!
//! `Dec(c2) = a * b + beta'` as an integer. The mask is `2^128` times wider
//! than the product, so the plaintext is statistically independent of `b`;
//! a mask drawn from `[0, n)` would let `P` read `b` off as `Dec(c2) / a`.
//!
//! The participants are assumed to follow the protocol: no range proofs are
//! attached to `c1` or `c2`.
use std::collections::BTreeMap;

use k256::Scalar;
use libpaillier::{unknown_order::BigNumber, Ciphertext, DecryptionKey, EncryptionKey};
use rand_core::CryptoRngCore;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, error, instrument};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    crypto::curve::CurveContext,
    errors::{InitializationError, ProtocolError},
    participants::{Participant, ParticipantList},
    threshold::MIN_PAILLIER_MODULUS_BITS,
};

/// Bounded retries for drawing two distinct primes.
const MAX_PRIME_ATTEMPTS: usize = 8;

/// Statistical distance, in bits, between `Dec(c2)` and a value that does not
/// depend on the counterparty input.
pub const MASK_SECURITY_BITS: usize = 128;

/// A long lived Paillier keypair owned by one participant.
pub struct PaillierKeyPair {
    decryption_key: DecryptionKey,
    encryption_key: EncryptionKey,
    modulus_bits: usize,
}

impl PaillierKeyPair {
    /// Generates a keypair whose modulus has `modulus_bits` bits.
    pub fn generate(modulus_bits: usize) -> Result<Self, ProtocolError> {
        if modulus_bits < MIN_PAILLIER_MODULUS_BITS {
            return Err(InitializationError::PaillierModulusTooSmall {
                bits: modulus_bits,
                min: MIN_PAILLIER_MODULUS_BITS,
            }
            .into());
        }
        let prime_bits = modulus_bits / 2;
        for _ in 0..MAX_PRIME_ATTEMPTS {
            let p = BigNumber::prime(prime_bits);
            let q = BigNumber::prime(prime_bits);
            if p == q {
                continue;
            }
            let decryption_key = DecryptionKey::with_primes_unchecked(&p, &q).ok_or_else(|| {
                ProtocolError::Homomorphic("could not build a paillier key".to_string())
            })?;
            let encryption_key = EncryptionKey::from(&decryption_key);
            return Ok(Self {
                decryption_key,
                encryption_key,
                modulus_bits,
            });
        }
        error!("failed to sample two distinct paillier primes");
        Err(ProtocolError::Homomorphic(
            "could not sample distinct primes".to_string(),
        ))
    }

    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.encryption_key
    }

    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    /// Encrypts a scalar under this keypair.
    pub fn encrypt(
        &self,
        ctx: &CurveContext,
        value: &Scalar,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Ciphertext, ProtocolError> {
        encrypt_with(&self.encryption_key, &ctx.scalar_to_bignum(value), rng)
    }

    /// Decrypts a ciphertext and reduces the plaintext modulo the group
    /// order.
    pub fn decrypt(&self, ctx: &CurveContext, c: &Ciphertext) -> Result<Scalar, ProtocolError> {
        let bytes = self.decryption_key.decrypt(c).ok_or_else(|| {
            error!("paillier decryption failed");
            ProtocolError::Homomorphic("decryption failed".to_string())
        })?;
        let plaintext = BigNumber::from_slice(&bytes);
        ctx.bignum_to_scalar(&plaintext)
    }
}

fn encrypt_with(
    ek: &EncryptionKey,
    plaintext: &BigNumber,
    rng: &mut impl CryptoRngCore,
) -> Result<Ciphertext, ProtocolError> {
    let nonce = BigNumber::from_rng(ek.n(), rng);
    let (ciphertext, _nonce) = ek
        .encrypt(plaintext.to_bytes(), Some(nonce))
        .ok_or_else(|| ProtocolError::Homomorphic("encryption failed".to_string()))?;
    Ok(ciphertext)
}

/// Generates a keypair for every participant in parallel.
///
/// Returns once every keypair exists; sessions must not start before.
#[instrument(level = "debug", skip(participants), fields(n = participants.len()))]
pub fn generate_keypairs(
    participants: &ParticipantList,
    modulus_bits: usize,
) -> Result<BTreeMap<Participant, PaillierKeyPair>, ProtocolError> {
    let keypairs = participants
        .participants()
        .par_iter()
        .map(|p| PaillierKeyPair::generate(modulus_bits).map(|kp| (*p, kp)))
        .collect::<Result<BTreeMap<_, _>, ProtocolError>>()?;
    debug!(count = keypairs.len(), "generated paillier keypairs");
    Ok(keypairs)
}

/// Additive shares of a product, `alpha` held by the owner and `beta` by the
/// counterparty.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MtaShares {
    pub alpha: Scalar,
    pub beta: Scalar,
}

/// Step 1, run by the owner: `Enc(a)`.
pub fn owner_encrypt(
    ctx: &CurveContext,
    keypair: &PaillierKeyPair,
    a: &Scalar,
    rng: &mut impl CryptoRngCore,
) -> Result<Ciphertext, ProtocolError> {
    keypair.encrypt(ctx, a, rng)
}

/// Exclusive upper bound `n^2 * 2^MASK_SECURITY_BITS` of the counterparty
/// mask `beta'`.
pub fn mask_bound(ctx: &CurveContext) -> BigNumber {
    let two_64 = BigNumber::from(u64::MAX) + BigNumber::one();
    let slack = (0..MASK_SECURITY_BITS / 64).fold(BigNumber::one(), |acc, _| &acc * &two_64);
    &(ctx.order() * ctx.order()) * &slack
}

/// Step 2, run by the counterparty: `b * c1 + Enc(beta')`.
///
/// Returns the reply ciphertext and the counterparty share
/// `beta = -(beta' mod n)`. Fails when the owner modulus is too small for
/// `a * b + beta'` to stay below it.
pub fn counterparty_respond(
    ctx: &CurveContext,
    owner_key: &EncryptionKey,
    c1: &Ciphertext,
    b: &Scalar,
    rng: &mut impl CryptoRngCore,
) -> Result<(Ciphertext, Scalar), ProtocolError> {
    let bound = mask_bound(ctx);
    // a * b < n^2 <= bound, so the sum stays below 2 * bound
    if &(&bound + &bound) >= owner_key.n() {
        error!("paillier modulus cannot hold the masked product");
        return Err(ProtocolError::Homomorphic(
            "paillier modulus too small for the mta mask".to_string(),
        ));
    }
    let beta_prime = BigNumber::from_rng(&bound, rng);
    let scaled = owner_key
        .mul(c1, &ctx.scalar_to_bignum(b))
        .ok_or_else(|| ProtocolError::Homomorphic("homomorphic scaling failed".to_string()))?;
    let masked = encrypt_with(owner_key, &beta_prime, rng)?;
    let c2 = owner_key
        .add(&scaled, &masked)
        .ok_or_else(|| ProtocolError::Homomorphic("homomorphic addition failed".to_string()))?;
    let beta = -ctx.bignum_to_scalar(&beta_prime)?;
    Ok((c2, beta))
}

/// Step 3, run by the owner: `alpha = Dec(c2) mod n`.
pub fn owner_decrypt(
    ctx: &CurveContext,
    keypair: &PaillierKeyPair,
    c2: &Ciphertext,
) -> Result<Scalar, ProtocolError> {
    keypair.decrypt(ctx, c2)
}

/// Runs the three steps in process for an owner input `a` and a
/// counterparty input `b`.
pub fn run_mta(
    ctx: &CurveContext,
    keypair: &PaillierKeyPair,
    a: &Scalar,
    b: &Scalar,
    rng: &mut impl CryptoRngCore,
) -> Result<MtaShares, ProtocolError> {
    let c1 = owner_encrypt(ctx, keypair, a, rng)?;
    let (c2, beta) = counterparty_respond(ctx, keypair.encryption_key(), &c1, b, rng)?;
    let alpha = owner_decrypt(ctx, keypair, &c2)?;
    Ok(MtaShares { alpha, beta })
}
