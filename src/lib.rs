pub mod crypto;
pub mod errors;
pub mod keygen;
pub mod mta;
pub mod participants;
pub mod threshold;

pub mod ecdsa;
pub mod schnorr;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use crypto::{curve::CurveContext, hash::Address};
pub use ecdsa::{EcdsaSession, EcdsaSignature, EncodedEcdsaSignature, ThresholdEcdsa};
pub use errors::{InitializationError, ProtocolError};
pub use keygen::{keygen, KeygenOutput};
pub use participants::{Participant, ParticipantList};
pub use schnorr::{SchnorrSession, SchnorrSignature, ThresholdSchnorr};
pub use threshold::ProtocolParameters;

pub use frost_core;
pub use frost_secp256k1;
pub use k256;
