#![allow(clippy::unwrap_used)]
mod common;

use common::{address_of_participant_keys, build_schnorr, random_message, setup};
use mta_threshold_signatures::{
    schnorr::sign_single, CurveContext, InitializationError, ProtocolError,
};

#[test]
fn five_participants_threshold_two() {
    let mut rng = setup(99);
    let group = build_schnorr(5, 2, &mut rng);
    assert_eq!(
        group.address(),
        address_of_participant_keys(group.keygen_output())
    );
    let msg = random_message(&mut rng);
    let sig = group.threshold_sign(&msg, &[2, 4], &mut rng).unwrap();
    assert!(sig.verify(&group.public_key(), &msg));
}

#[test]
fn all_participants_sign() {
    let mut rng = setup(100);
    let group = build_schnorr(6, 4, &mut rng);
    let msg = random_message(&mut rng);
    let sig = group
        .threshold_sign(&msg, &[1, 2, 3, 4, 5, 6], &mut rng)
        .unwrap();
    assert!(sig.verify(&group.public_key(), &msg));
}

#[test]
fn single_party_signature_verifies() {
    let ctx = CurveContext::secp256k1();
    let mut rng = setup(101);
    let secret = ctx.random_nonzero_scalar(&mut rng);
    let public_key = ctx.public_point(&secret);
    let msg = random_message(&mut rng);
    let sig = sign_single(&ctx, &secret, &msg, &mut rng).unwrap();
    assert!(sig.verify(&public_key, &msg));
    assert!(!sig.verify(&ctx.public_point(&(secret + secret)), &msg));
}

#[test]
fn out_of_range_signer() {
    let mut rng = setup(102);
    let group = build_schnorr(3, 2, &mut rng);
    let msg = random_message(&mut rng);
    assert_eq!(
        group.threshold_sign(&msg, &[1, 7], &mut rng).err(),
        Some(ProtocolError::Initialization(
            InitializationError::SignerOutOfRange { signer: 7, max: 3 }
        ))
    );
}
