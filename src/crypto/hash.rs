//! Keccak-256 based hashing: Ethereum style addresses and the Schnorr
//! challenge.
use std::fmt;

use elliptic_curve::{ops::Reduce, sec1::ToEncodedPoint};
use k256::{FieldBytes, ProjectivePoint, Scalar, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

const HASH_LEN: usize = 32;
pub const ADDRESS_LEN: usize = 20;

/// The output of Keccak-256.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashOutput([u8; HASH_LEN]);

impl HashOutput {
    pub fn to_bytes(self) -> [u8; HASH_LEN] {
        self.0
    }
}

impl AsRef<[u8]> for HashOutput {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Keccak-256 of the concatenation of all the given slices.
pub fn keccak256<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> HashOutput {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    HashOutput(hasher.finalize().into())
}

/// A 20 byte Ethereum style account address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The last 20 bytes of the Keccak-256 hash of the uncompressed point
    /// coordinates (without the SEC1 tag).
    pub fn from_point(point: &ProjectivePoint) -> Self {
        let encoded = point.to_affine().to_encoded_point(false);
        let coordinates = encoded.as_bytes().get(1..).unwrap_or_default();
        let digest = keccak256([coordinates]).to_bytes();
        let mut out = [0u8; ADDRESS_LEN];
        for (o, d) in out.iter_mut().zip(digest.iter().skip(HASH_LEN - ADDRESS_LEN)) {
            *o = *d;
        }
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// `e = keccak256(address(R) || msg)`, reduced into a scalar.
pub fn schnorr_challenge(big_r: &ProjectivePoint, msg: &[u8]) -> Scalar {
    let address = Address::from_point(big_r);
    let digest = keccak256([address.as_bytes().as_slice(), msg]).to_bytes();
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(digest))
}
