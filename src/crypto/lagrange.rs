//! Lagrange interpolation over the scalar field, and in the exponent.
use frost_core::{Field, Group};

use super::ciphersuite::{Ciphersuite, Element, Scalar};
use crate::errors::ProtocolError;

/// Computes the lagrange coefficient using a set of given points
/// lamda_i(x) = \prod_j (x - x_j)/(x_i - x_j)
/// where j != i
/// If x is None then consider it as 0
///
/// Only the first occurrence of `i` is skipped: a duplicated abscissa makes
/// the denominator vanish and the inversion fails.
pub fn compute_lagrange_coefficient<C: Ciphersuite>(
    points_set: &[Scalar<C>],
    i: &Scalar<C>,
    x: Option<&Scalar<C>>,
) -> Result<Scalar<C>, ProtocolError> {
    let position = points_set
        .iter()
        .position(|p| p == i)
        .ok_or(ProtocolError::InvalidInterpolationArguments)?;

    let mut num = <<C::Group as Group>::Field>::one();
    let mut den = <<C::Group as Group>::Field>::one();

    let others = points_set
        .iter()
        .enumerate()
        .filter(|(k, _)| *k != position)
        .map(|(_, j)| j);

    if let Some(x) = x {
        for j in others {
            num = num * (*x - *j);
            den = den * (*i - *j);
        }
    } else {
        for j in others {
            // Both signs inverted just to avoid requiring an extra negation
            num = num * *j;
            den = den * (*j - *i);
        }
    }

    let den = <<C::Group as Group>::Field>::invert(&den)
        .map_err(|_| ProtocolError::InvalidInterpolationArguments)?;
    Ok(num * den)
}

/// Interpolates group elements `points[k] = G * y_k` at `x` without ever
/// learning the `y_k`.
pub fn interpolate_in_exponent<C: Ciphersuite>(
    identifiers: &[Scalar<C>],
    points: &[Element<C>],
    x: Option<&Scalar<C>>,
) -> Result<Element<C>, ProtocolError> {
    if identifiers.len() != points.len() || identifiers.is_empty() {
        return Err(ProtocolError::InvalidInterpolationArguments);
    }
    let mut interpolation = <C::Group as Group>::identity();
    for (id, point) in identifiers.iter().zip(points) {
        let lambda = compute_lagrange_coefficient::<C>(identifiers, id, x)?;
        interpolation = interpolation + (*point * lambda);
    }
    Ok(interpolation)
}

/// Polynomial interpolation from parallel `(x, y)` samples.
#[derive(Clone)]
pub struct LagrangeInterpolator<C: Ciphersuite> {
    xs: Vec<Scalar<C>>,
    ys: Vec<Scalar<C>>,
}

impl<C: Ciphersuite> LagrangeInterpolator<C> {
    /// Rejects empty input, mismatched lengths and repeated abscissas.
    pub fn new(xs: Vec<Scalar<C>>, ys: Vec<Scalar<C>>) -> Result<Self, ProtocolError> {
        if xs.is_empty() || xs.len() != ys.len() {
            return Err(ProtocolError::InvalidInterpolationArguments);
        }
        for (k, a) in xs.iter().enumerate() {
            if xs.iter().skip(k + 1).any(|b| a == b) {
                return Err(ProtocolError::InvalidInterpolationArguments);
            }
        }
        Ok(Self { xs, ys })
    }

    /// `basis(x, x_i) = prod_{j != i} (x - x_j) / (x_i - x_j)`
    pub fn basis(&self, x: Option<&Scalar<C>>, xi: &Scalar<C>) -> Result<Scalar<C>, ProtocolError> {
        compute_lagrange_coefficient::<C>(&self.xs, xi, x)
    }

    /// Value of the interpolated polynomial at `x` (zero when `None`).
    pub fn evaluate(&self, x: Option<&Scalar<C>>) -> Result<Scalar<C>, ProtocolError> {
        let mut acc = <<C::Group as Group>::Field>::zero();
        for (xi, yi) in self.xs.iter().zip(&self.ys) {
            acc = acc + *yi * self.basis(x, xi)?;
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::polynomials::Polynomial;
    use frost_secp256k1::Secp256K1Sha256;
    use k256::{ProjectivePoint, Scalar};
    use rand_core::OsRng;

    type C = Secp256K1Sha256;

    fn ids(n: u64) -> Vec<Scalar> {
        (1..=n).map(Scalar::from).collect()
    }

    #[test]
    fn recovers_polynomial_values() {
        let f = Polynomial::<C>::generate_polynomial(None, 3, &mut OsRng);
        let xs = ids(4);
        let ys = xs.iter().map(|x| f.eval_on_point(*x)).collect();
        let lagrange = LagrangeInterpolator::<C>::new(xs, ys).unwrap();

        assert_eq!(lagrange.evaluate(None).unwrap(), f.eval_on_zero());
        let point = Scalar::from(1234u64);
        assert_eq!(
            lagrange.evaluate(Some(&point)).unwrap(),
            f.eval_on_point(point)
        );
    }

    #[test]
    fn basis_is_indicator_on_samples() {
        let xs = ids(5);
        let ys = vec![Scalar::ZERO; 5];
        let lagrange = LagrangeInterpolator::<C>::new(xs.clone(), ys).unwrap();
        for (a, xa) in xs.iter().enumerate() {
            for (b, xb) in xs.iter().enumerate() {
                let expected = if a == b { Scalar::ONE } else { Scalar::ZERO };
                assert_eq!(lagrange.basis(Some(xb), xa).unwrap(), expected);
            }
        }
    }

    #[test]
    fn duplicate_abscissas_are_rejected() {
        let xs = vec![Scalar::from(1u64), Scalar::from(2u64), Scalar::from(1u64)];
        let ys = vec![Scalar::ONE; 3];
        assert_eq!(
            LagrangeInterpolator::<C>::new(xs.clone(), ys).err(),
            Some(ProtocolError::InvalidInterpolationArguments)
        );
        assert_eq!(
            compute_lagrange_coefficient::<C>(&xs, &Scalar::from(1u64), None).unwrap_err(),
            ProtocolError::InvalidInterpolationArguments
        );
    }

    #[test]
    fn unknown_point_and_empty_set_are_rejected() {
        let xs = ids(3);
        assert!(compute_lagrange_coefficient::<C>(&xs, &Scalar::from(9u64), None).is_err());
        assert!(compute_lagrange_coefficient::<C>(&[], &Scalar::ONE, None).is_err());
        assert!(LagrangeInterpolator::<C>::new(vec![], vec![]).is_err());
        assert!(LagrangeInterpolator::<C>::new(ids(2), vec![Scalar::ONE]).is_err());
    }

    #[test]
    fn exponent_interpolation_matches_scalar_interpolation() {
        let f = Polynomial::<C>::generate_polynomial(None, 2, &mut OsRng);
        let xs = ids(3);
        let points: Vec<ProjectivePoint> = xs
            .iter()
            .map(|x| ProjectivePoint::GENERATOR * f.eval_on_point(*x))
            .collect();
        let at_zero = interpolate_in_exponent::<C>(&xs, &points, None).unwrap();
        assert_eq!(at_zero, ProjectivePoint::GENERATOR * f.eval_on_zero());
    }
}
