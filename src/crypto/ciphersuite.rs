// Generic Ciphersuite Trait
use frost_core::{Field, Group};
use frost_secp256k1::Secp256K1Sha256;

/// Curves the polynomial and interpolation layer can run over.
pub trait Ciphersuite: frost_core::Ciphersuite {}

pub type Scalar<C> = <<<C as frost_core::Ciphersuite>::Group as Group>::Field as Field>::Scalar;
pub type Element<C> = <<C as frost_core::Ciphersuite>::Group as Group>::Element;

impl Ciphersuite for Secp256K1Sha256 {}
