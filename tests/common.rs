#![allow(dead_code)]
use mta_threshold_signatures::{
    k256::ProjectivePoint,
    test_utils::{self, MockCryptoRng},
    Address, KeygenOutput,
};

pub use test_utils::{build_ecdsa, build_schnorr, random_message, test_parameters};

/// Deterministic generator with tracing installed, so that every test can
/// start with a single call.
pub fn setup(seed: u64) -> MockCryptoRng {
    test_utils::init_tracing();
    test_utils::deterministic_rng(seed)
}

/// Address of the sum of the per-polynomial public keys.
pub fn address_of_participant_keys(keygen: &KeygenOutput) -> Address {
    let sum = keygen
        .participant_public_keys
        .values()
        .fold(ProjectivePoint::IDENTITY, |acc, pk| acc + pk);
    Address::from_point(&sum)
}
