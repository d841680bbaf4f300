use thiserror::Error;

use crate::participants::Participant;

/// Rejections raised while checking parameters and quorums.
///
/// These are always returned before any cryptographic work has started,
/// so no secret material exists yet when one of them is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitializationError {
    #[error("the number of participants must be at least 1")]
    NoParticipants,

    #[error("threshold must be at least 1")]
    ThresholdIsZero,

    #[error("threshold {threshold} exceeds the number of participants {participants}")]
    ThresholdTooLarge {
        threshold: usize,
        participants: usize,
    },

    #[error("participant count {0} does not fit a participant identifier")]
    TooManyParticipants(usize),

    #[error("the signer list is empty")]
    EmptySigners,

    #[error("signer {signer} is outside of the participant range 1..={max}")]
    SignerOutOfRange { signer: u32, max: usize },

    #[error("signer {0} appears more than once")]
    DuplicateSigner(Participant),

    #[error("{found} signers cannot reach the threshold {threshold}")]
    NotEnoughSigners { threshold: usize, found: usize },

    #[error("paillier modulus of {bits} bits is below the minimum of {min} bits")]
    PaillierModulusTooSmall { bits: usize, min: usize },

    #[error("missing encryption keypair for participant {0}")]
    MissingKeypair(Participant),

    #[error("bad parameters: {0}")]
    BadParameters(String),
}

/// Failures happening while a protocol is running.
///
/// Any of these aborts the session that raised it: the caller has to start
/// over with fresh randomness.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("no valid private key batch after {attempts} attempts")]
    InvalidPrivateKey { attempts: usize },

    #[error("invalid arguments for polynomial interpolation")]
    InvalidInterpolationArguments,

    #[error("degenerate nonce: {0}")]
    DegenerateNonce(String),

    #[error("homomorphic operation failed: {0}")]
    Homomorphic(String),

    #[error("share of participant {0} does not match the published commitments")]
    InvalidShare(Participant),

    #[error("invalid signature encoding: {0}")]
    InvalidEncoding(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error(transparent)]
    Initialization(#[from] InitializationError),
}
