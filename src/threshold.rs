//! Protocol parameters and their validation.
//!
//! Provides a safe API to validate the number of participants (`n`), the
//! signing threshold (`t`) and the Paillier modulus size before any secret
//! material is produced, and to turn a caller supplied signer list into a
//! checked quorum.
//!
//! # Parameters
//!
//! - **`n`**: Total participants, identified as `1..=n`.
//! - **`t` (threshold)**: Minimum participants required to produce a signature, `1 <= t <= n`.
//! - **`paillier_modulus_bits`**: Size of every participant's Paillier modulus.
//!
//! # Usage
//! ```
//! use mta_threshold_signatures::threshold::ProtocolParameters;
//!
//! let params = ProtocolParameters::new(5, 2).unwrap();
//! let quorum = params.validate_signers(&[2, 4]).unwrap();
//! assert_eq!(quorum.len(), 2);
//!
//! // a signer outside of 1..=5
//! assert!(params.validate_signers(&[2, 6]).is_err());
//! // threshold larger than the number of participants
//! assert!(ProtocolParameters::new(3, 4).is_err());
//! ```
use serde::{Deserialize, Serialize};

use crate::{
    errors::InitializationError,
    participants::{Participant, ParticipantList},
};

/// Smallest accepted Paillier modulus. It must hold `a * b + beta'` where the
/// MtA mask `beta'` ranges up to `n^2 * 2^128`, about 641 bits for secp256k1.
pub const MIN_PAILLIER_MODULUS_BITS: usize = 1024;
pub const DEFAULT_PAILLIER_MODULUS_BITS: usize = 2048;

const fn default_paillier_modulus_bits() -> usize {
    DEFAULT_PAILLIER_MODULUS_BITS
}

/// Static configuration of a threshold signing group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    /// Total number of participants `n`.
    pub participants: usize,
    /// Number of participants required to sign.
    pub threshold: usize,
    #[serde(default = "default_paillier_modulus_bits")]
    pub paillier_modulus_bits: usize,
}

impl ProtocolParameters {
    /// Validated parameters with the default Paillier modulus size.
    pub fn new(participants: usize, threshold: usize) -> Result<Self, InitializationError> {
        let params = Self {
            participants,
            threshold,
            paillier_modulus_bits: DEFAULT_PAILLIER_MODULUS_BITS,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_paillier_modulus_bits(self, bits: usize) -> Result<Self, InitializationError> {
        let params = Self {
            paillier_modulus_bits: bits,
            ..self
        };
        params.validate()?;
        Ok(params)
    }

    /// Parses and validates parameters from their JSON form.
    pub fn from_json(json: &str) -> Result<Self, InitializationError> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| InitializationError::BadParameters(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), InitializationError> {
        validate_threshold(self.participants, self.threshold)?;
        if self.paillier_modulus_bits < MIN_PAILLIER_MODULUS_BITS {
            return Err(InitializationError::PaillierModulusTooSmall {
                bits: self.paillier_modulus_bits,
                min: MIN_PAILLIER_MODULUS_BITS,
            });
        }
        if self.paillier_modulus_bits % 2 != 0 {
            return Err(InitializationError::BadParameters(format!(
                "paillier modulus size must be even, found: {}",
                self.paillier_modulus_bits
            )));
        }
        Ok(())
    }

    /// Every participant `1..=n`.
    pub fn participant_list(&self) -> Result<ParticipantList, InitializationError> {
        let n = u32::try_from(self.participants)
            .map_err(|_| InitializationError::TooManyParticipants(self.participants))?;
        Ok(ParticipantList::range(n))
    }

    /// Checks a signer list against these parameters.
    ///
    /// Signers must be non empty, inside `1..=n`, distinct, and at least
    /// `threshold` of them.
    pub fn validate_signers(&self, signers: &[u32]) -> Result<ParticipantList, InitializationError> {
        if signers.is_empty() {
            return Err(InitializationError::EmptySigners);
        }
        let mut seen = Vec::with_capacity(signers.len());
        for &signer in signers {
            let in_range = usize::try_from(signer)
                .map(|s| s >= 1 && s <= self.participants)
                .unwrap_or(false);
            if !in_range {
                return Err(InitializationError::SignerOutOfRange {
                    signer,
                    max: self.participants,
                });
            }
            let participant = Participant::from(signer);
            if seen.contains(&participant) {
                return Err(InitializationError::DuplicateSigner(participant));
            }
            seen.push(participant);
        }
        if seen.len() < self.threshold {
            return Err(InitializationError::NotEnoughSigners {
                threshold: self.threshold,
                found: seen.len(),
            });
        }
        ParticipantList::new(&seen).ok_or_else(|| {
            InitializationError::BadParameters("signer list contains duplicates".to_string())
        })
    }
}

/// Validates `1 <= threshold <= participants` and that every participant
/// fits an identifier.
pub fn validate_threshold(participants: usize, threshold: usize) -> Result<(), InitializationError> {
    if participants == 0 {
        return Err(InitializationError::NoParticipants);
    }
    if u32::try_from(participants).is_err() {
        return Err(InitializationError::TooManyParticipants(participants));
    }
    if threshold == 0 {
        return Err(InitializationError::ThresholdIsZero);
    }
    if threshold > participants {
        return Err(InitializationError::ThresholdTooLarge {
            threshold,
            participants,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_success() {
        assert_eq!(validate_threshold(5, 2), Ok(()));
        // Minimal configuration: n=1, t=1
        assert_eq!(validate_threshold(1, 1), Ok(()));
        // t = n
        assert_eq!(validate_threshold(7, 7), Ok(()));
    }

    #[test]
    fn threshold_failures() {
        assert_eq!(
            validate_threshold(0, 0),
            Err(InitializationError::NoParticipants)
        );
        assert_eq!(
            validate_threshold(3, 0),
            Err(InitializationError::ThresholdIsZero)
        );
        assert_eq!(
            validate_threshold(3, 4),
            Err(InitializationError::ThresholdTooLarge {
                threshold: 4,
                participants: 3
            })
        );
    }

    #[test]
    fn paillier_modulus_bounds() {
        let params = ProtocolParameters::new(3, 2).unwrap();
        assert_eq!(params.paillier_modulus_bits, DEFAULT_PAILLIER_MODULUS_BITS);
        assert!(params.with_paillier_modulus_bits(1024).is_ok());
        assert_eq!(
            params.with_paillier_modulus_bits(512),
            Err(InitializationError::PaillierModulusTooSmall {
                bits: 512,
                min: MIN_PAILLIER_MODULUS_BITS
            })
        );
        assert!(matches!(
            params.with_paillier_modulus_bits(1025),
            Err(InitializationError::BadParameters(_))
        ));
    }

    #[test]
    fn signers_are_checked() {
        let params = ProtocolParameters::new(5, 2).unwrap();
        let quorum = params.validate_signers(&[4, 2]).unwrap();
        assert_eq!(
            quorum.participants(),
            &[Participant::from(2u32), Participant::from(4u32)]
        );

        assert_eq!(
            params.validate_signers(&[]),
            Err(InitializationError::EmptySigners)
        );
        assert_eq!(
            params.validate_signers(&[0, 2]),
            Err(InitializationError::SignerOutOfRange { signer: 0, max: 5 })
        );
        assert_eq!(
            params.validate_signers(&[2, 6]),
            Err(InitializationError::SignerOutOfRange { signer: 6, max: 5 })
        );
        assert_eq!(
            params.validate_signers(&[2, 2]),
            Err(InitializationError::DuplicateSigner(Participant::from(2u32)))
        );
        assert_eq!(
            params.validate_signers(&[3]),
            Err(InitializationError::NotEnoughSigners {
                threshold: 2,
                found: 1
            })
        );
    }

    #[test]
    fn parameters_from_json() {
        let params = ProtocolParameters::from_json(r#"{"participants": 4, "threshold": 3}"#).unwrap();
        assert_eq!(params.participants, 4);
        assert_eq!(params.threshold, 3);
        assert_eq!(params.paillier_modulus_bits, DEFAULT_PAILLIER_MODULUS_BITS);

        let params = ProtocolParameters::from_json(
            r#"{"participants": 4, "threshold": 3, "paillier_modulus_bits": 1024}"#,
        )
        .unwrap();
        assert_eq!(params.paillier_modulus_bits, 1024);

        assert_eq!(
            ProtocolParameters::from_json(r#"{"participants": 2, "threshold": 3}"#),
            Err(InitializationError::ThresholdTooLarge {
                threshold: 3,
                participants: 2
            })
        );
        assert!(matches!(
            ProtocolParameters::from_json(r#"{"participants": "two"}"#),
            Err(InitializationError::BadParameters(_))
        ));
    }
}
