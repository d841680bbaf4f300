pub mod ciphersuite;
pub mod curve;
pub mod hash;
pub mod lagrange;
pub mod polynomials;
pub mod random;
