use std::collections::BTreeMap;

use frost_core::{Field, Group};
use rand_core::CryptoRngCore;
use zeroize::Zeroize;

use super::{
    ciphersuite::{Ciphersuite, Element, Scalar},
    lagrange::compute_lagrange_coefficient,
};
use crate::{errors::ProtocolError, participants::Participant};

#[derive(Clone)]
pub struct Polynomial<C: Ciphersuite>(Vec<Scalar<C>>);

impl<C: Ciphersuite> Polynomial<C> {
    /// Constructs the polynomial out of scalars
    /// The first scalar (coefficients[0]) is the constant term
    pub fn new(coefficients: Vec<Scalar<C>>) -> Self {
        Self(coefficients)
    }

    pub fn coefficients(&self) -> &[Scalar<C>] {
        &self.0
    }

    /// Outputs the degree of the polynomial
    pub fn degree(&self) -> usize {
        let zero = <C::Group as Group>::Field::zero();
        self.0
            .iter()
            .rposition(|c| *c != zero)
            .unwrap_or(0)
    }

    /// Creates a polynomial p of the given degree
    /// and sets p(0) = secret
    /// if the secret is not given then it is picked at random
    pub fn generate_polynomial(
        secret: Option<Scalar<C>>,
        degree: usize,
        rng: &mut impl CryptoRngCore,
    ) -> Self {
        let poly_size = degree + 1;
        let mut coefficients = Vec::with_capacity(poly_size);
        let secret = secret.unwrap_or_else(|| <C::Group as Group>::Field::random(rng));

        coefficients.push(secret);
        for _ in 1..poly_size {
            coefficients.push(<C::Group as Group>::Field::random(rng));
        }
        Self::new(coefficients)
    }

    /// A uniformly random polynomial with `threshold` coefficients, i.e. of
    /// degree `threshold - 1`.
    pub fn random(threshold: usize, rng: &mut impl CryptoRngCore) -> Self {
        Self::generate_polynomial(None, threshold.saturating_sub(1), rng)
    }

    /// Returns the constant term
    pub fn eval_on_zero(&self) -> Scalar<C> {
        self.0
            .first()
            .copied()
            .unwrap_or_else(<<C::Group as Group>::Field as Field>::zero)
    }

    /// Evaluate the polynomial with the given coefficients
    /// at the point using Horner's method.
    /// See `polynomial_evaluate` in RFC 9591:
    /// https://datatracker.ietf.org/doc/html/rfc9591#name-additional-polynomial-opera
    pub fn eval_on_point(&self, point: Scalar<C>) -> Scalar<C> {
        if point == <C::Group as Group>::Field::zero() {
            return self.eval_on_zero();
        }
        let mut value = <C::Group as Group>::Field::zero();
        for coeff in self.0.iter().skip(1).rev() {
            value = value + *coeff;
            value = value * point;
        }
        value + self.eval_on_zero()
    }

    /// Evaluates a polynomial on the identifier of a participant
    pub fn eval_on_participant(&self, participant: Participant) -> Scalar<C> {
        self.eval_on_point(participant.scalar::<C>())
    }

    /// Sum of several polynomials evaluated at the same participant.
    pub fn eval_sum_on_participant<'a, I>(polynomials: I, participant: Participant) -> Scalar<C>
    where
        I: IntoIterator<Item = &'a Self>,
        C: 'a,
    {
        polynomials
            .into_iter()
            .fold(<C::Group as Group>::Field::zero(), |acc, p| {
                acc + p.eval_on_participant(participant)
            })
    }

    /// Computes polynomial interpolation on a specific point
    /// from the shares held by each participant of the map
    pub fn eval_interpolation(
        shares: &BTreeMap<Participant, Scalar<C>>,
        point: Option<&Scalar<C>>,
    ) -> Result<Scalar<C>, ProtocolError> {
        let identifiers: Vec<Scalar<C>> = shares.keys().map(|p| p.scalar::<C>()).collect();
        let mut interpolation = <C::Group as Group>::Field::zero();
        for (id, share) in identifiers.iter().zip(shares.values()) {
            let lagrange_coefficient = compute_lagrange_coefficient::<C>(&identifiers, id, point)?;
            interpolation = interpolation + lagrange_coefficient * *share;
        }
        Ok(interpolation)
    }

    /// Commits to a polynomial returning a sequence of group coefficients
    /// Creates a commitment vector of coefficients * G
    pub fn commit_polynomial(&self) -> PolynomialCommitment<C> {
        let coefficients = self
            .0
            .iter()
            .map(|c| <C::Group as Group>::generator() * *c)
            .collect();
        PolynomialCommitment::new(coefficients)
    }
}

impl<C: Ciphersuite> Zeroize for Polynomial<C>
where
    Scalar<C>: Zeroize,
{
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/******************* Polynomial Commitment *******************/
/// Feldman commitment to a polynomial: every coefficient multiplied by G.
#[derive(Clone)]
pub struct PolynomialCommitment<C: Ciphersuite>(Vec<Element<C>>);

impl<C: Ciphersuite> PolynomialCommitment<C> {
    pub fn new(coefcommitments: Vec<Element<C>>) -> Self {
        Self(coefcommitments)
    }

    pub fn coefficients(&self) -> &[Element<C>] {
        &self.0
    }

    /// Commitment to the constant term
    pub fn eval_on_zero(&self) -> Element<C> {
        self.0
            .first()
            .copied()
            .unwrap_or_else(<C::Group as Group>::identity)
    }

    /// Evaluates the committed polynomial in the exponent, giving
    /// `G * f(point)` without knowing `f`.
    pub fn eval_on_point(&self, point: Scalar<C>) -> Element<C> {
        let mut value = <C::Group as Group>::identity();
        for coeff in self.0.iter().rev() {
            value = value * point + *coeff;
        }
        value
    }

    pub fn eval_on_participant(&self, participant: Participant) -> Element<C> {
        self.eval_on_point(participant.scalar::<C>())
    }

    /// Coefficient-wise sum, i.e. the commitment to the sum of the
    /// committed polynomials.
    pub fn add(&self, other: &Self) -> Self {
        let len = self.0.len().max(other.0.len());
        let identity = <C::Group as Group>::identity();
        let coefficients = (0..len)
            .map(|k| {
                let a = self.0.get(k).copied().unwrap_or(identity);
                let b = other.0.get(k).copied().unwrap_or(identity);
                a + b
            })
            .collect();
        Self(coefficients)
    }
}
