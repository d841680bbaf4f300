use elliptic_curve::scalar::IsHigh;
use k256::Scalar;
use subtle::ConditionallySelectable;
use tracing::{debug, error};

use super::{deal::EcdsaSession, message_scalar, EcdsaSignature};
use crate::errors::ProtocolError;

impl EcdsaSession {
    /// Signs a 32 byte message digest, consuming the session.
    ///
    /// Every signer contributes `s_i = m * k_i + r * sigma_i`; the sum is
    /// normalised to low `s` and checked against the group public key before
    /// it is returned.
    pub fn sign(self, msg_hash: &[u8; 32]) -> Result<EcdsaSignature, ProtocolError> {
        let m = message_scalar(msg_hash);

        let mut s = Scalar::ZERO;
        for p in self.signers.iter() {
            let k_i = self.k.get(&p).ok_or_else(|| {
                ProtocolError::AssertionFailed(format!("missing nonce share for {p}"))
            })?;
            let sigma_i = self.sigma.get(&p).ok_or_else(|| {
                ProtocolError::AssertionFailed(format!("missing key product share for {p}"))
            })?;
            let s_i = m * k_i + self.r * sigma_i;
            s += s_i;
        }
        if bool::from(s.is_zero()) {
            return Err(ProtocolError::DegenerateNonce("s is zero".to_string()));
        }

        // Normalize s, which mirrors R and therefore flips its parity
        let is_high = s.is_high();
        s.conditional_assign(&(-s), is_high);
        let recovery_param = u8::from(self.ctx.is_y_odd(&self.big_r)) ^ is_high.unwrap_u8();

        let sig = EcdsaSignature {
            r: self.r,
            s,
            recovery_param,
        };

        if !sig.verify(&self.public_key, msg_hash) {
            error!("threshold ecdsa signature failed to verify");
            return Err(ProtocolError::AssertionFailed(
                "signature failed to verify".to_string(),
            ));
        };
        debug!(signers = self.signers.len(), "ecdsa signature produced");
        Ok(sig)
    }
}
