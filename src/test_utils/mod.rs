#![allow(clippy::panic, clippy::missing_panics_doc, clippy::unwrap_used)]
//! Helpers shared by the unit tests, the integration tests and the benches.
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRngCore, RngCore, SeedableRng};
use tracing_subscriber::EnvFilter;

use crate::{
    crypto::curve::CurveContext, ecdsa::ThresholdEcdsa, schnorr::ThresholdSchnorr,
    threshold::ProtocolParameters,
};

/// Smallest accepted Paillier modulus, which keeps keypair generation fast.
pub const TEST_PAILLIER_MODULUS_BITS: usize = 1024;

/// Installs a `tracing` subscriber honouring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Type for a deterministic RNG
pub type MockCryptoRng = ChaCha20Rng;

pub fn deterministic_rng(seed: u64) -> MockCryptoRng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Validated parameters using the test sized Paillier modulus.
pub fn test_parameters(participants: usize, threshold: usize) -> ProtocolParameters {
    ProtocolParameters::new(participants, threshold)
        .unwrap()
        .with_paillier_modulus_bits(TEST_PAILLIER_MODULUS_BITS)
        .unwrap()
}

pub fn build_ecdsa(
    participants: usize,
    threshold: usize,
    rng: &mut impl CryptoRngCore,
) -> ThresholdEcdsa {
    ThresholdEcdsa::build(
        CurveContext::secp256k1(),
        test_parameters(participants, threshold),
        rng,
    )
    .unwrap()
}

pub fn build_schnorr(
    participants: usize,
    threshold: usize,
    rng: &mut impl CryptoRngCore,
) -> ThresholdSchnorr {
    ThresholdSchnorr::build(
        CurveContext::secp256k1(),
        test_parameters(participants, threshold),
        rng,
    )
    .unwrap()
}

/// A uniformly random 32 byte message digest.
pub fn random_message(rng: &mut impl RngCore) -> [u8; 32] {
    let mut msg = [0u8; 32];
    rng.fill_bytes(&mut msg);
    msg
}
