//! Explicit curve context for secp256k1.
//!
//! Every component receives a [`CurveContext`] instead of reaching for a
//! process-wide reduction context, so independent protocol instances never
//! share mutable state.
use elliptic_curve::{point::AffineCoordinates, Field, PrimeField};
use k256::{AffinePoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar};
use libpaillier::unknown_order::BigNumber;
use rand_core::CryptoRngCore;

use crate::errors::ProtocolError;

const SCALAR_LEN: usize = 32;

/// Immutable description of the group the protocols run over.
#[derive(Clone, Debug)]
pub struct CurveContext {
    order: BigNumber,
}

impl Default for CurveContext {
    fn default() -> Self {
        Self::secp256k1()
    }
}

impl CurveContext {
    pub fn secp256k1() -> Self {
        // n - 1 is the largest canonical scalar
        let order = BigNumber::from_slice((-Scalar::ONE).to_bytes()) + BigNumber::one();
        Self { order }
    }

    /// The group order `n`.
    pub fn order(&self) -> &BigNumber {
        &self.order
    }

    /// `G * scalar`
    pub fn public_point(&self, scalar: &Scalar) -> ProjectivePoint {
        ProjectivePoint::GENERATOR * scalar
    }

    /// Scalars are always reduced, so the only invalid private key left is 0.
    pub fn is_valid_private_key(&self, scalar: &Scalar) -> bool {
        !bool::from(scalar.is_zero())
    }

    /// Uniform scalar in `[0, n)`.
    pub fn random_scalar(&self, rng: &mut impl CryptoRngCore) -> Scalar {
        Scalar::random(&mut *rng)
    }

    /// Uniform scalar in `[1, n)`, i.e. a valid private key.
    pub fn random_nonzero_scalar(&self, rng: &mut impl CryptoRngCore) -> Scalar {
        *NonZeroScalar::random(&mut *rng)
    }

    pub fn scalar_to_bignum(&self, scalar: &Scalar) -> BigNumber {
        BigNumber::from_slice(scalar.to_bytes())
    }

    /// Reduces an arbitrary integer modulo the group order.
    pub fn bignum_to_scalar(&self, value: &BigNumber) -> Result<Scalar, ProtocolError> {
        let reduced = value.nmod(&self.order);
        let bytes = reduced.to_bytes();
        let offset = SCALAR_LEN.checked_sub(bytes.len()).ok_or_else(|| {
            ProtocolError::AssertionFailed("reduced integer does not fit a scalar".to_string())
        })?;
        let mut repr = [0u8; SCALAR_LEN];
        repr.get_mut(offset..)
            .ok_or_else(|| ProtocolError::AssertionFailed("scalar encoding overflow".to_string()))?
            .copy_from_slice(&bytes);
        Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(repr))).ok_or_else(|| {
            ProtocolError::AssertionFailed("reduced integer is not a canonical scalar".to_string())
        })
    }

    /// The x coordinate of a point as a scalar, or `None` when it is not
    /// below the group order.
    pub fn x_coordinate(&self, point: &AffinePoint) -> Option<Scalar> {
        Option::from(Scalar::from_repr(point.x()))
    }

    /// Whether the y coordinate of a point is odd.
    pub fn is_y_odd(&self, point: &AffinePoint) -> bool {
        point.y_is_odd().into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn order_round_trips_to_zero() {
        let ctx = CurveContext::secp256k1();
        assert_eq!(ctx.bignum_to_scalar(ctx.order()).unwrap(), Scalar::ZERO);
        let n_plus_5 = ctx.order().clone() + BigNumber::from(5u64);
        assert_eq!(ctx.bignum_to_scalar(&n_plus_5).unwrap(), Scalar::from(5u64));
    }

    #[test]
    fn scalar_bignum_round_trip() {
        let ctx = CurveContext::secp256k1();
        for _ in 0..100 {
            let s = ctx.random_scalar(&mut OsRng);
            let bn = ctx.scalar_to_bignum(&s);
            assert_eq!(ctx.bignum_to_scalar(&bn).unwrap(), s);
        }
    }

    #[test]
    fn private_key_validity() {
        let ctx = CurveContext::secp256k1();
        assert!(!ctx.is_valid_private_key(&Scalar::ZERO));
        assert!(ctx.is_valid_private_key(&ctx.random_nonzero_scalar(&mut OsRng)));
    }

    #[test]
    fn parity_matches_the_sec1_tag() {
        use elliptic_curve::sec1::ToEncodedPoint;
        let ctx = CurveContext::secp256k1();
        for _ in 0..16 {
            let p = ctx.public_point(&ctx.random_nonzero_scalar(&mut OsRng)).to_affine();
            let tag = p.to_encoded_point(true).as_bytes().first().copied().unwrap();
            assert_eq!(tag == 3, ctx.is_y_odd(&p));
        }
    }

    #[test]
    fn x_coordinate_of_the_generator() {
        let ctx = CurveContext::secp256k1();
        let g = ProjectivePoint::GENERATOR.to_affine();
        let x = ctx.x_coordinate(&g).unwrap();
        assert_eq!(x.to_bytes(), g.x());
    }
}
