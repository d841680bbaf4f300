use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRngCore, SeedableRng};
use zeroize::{Zeroize, ZeroizeOnDrop};

const SEED_LEN: usize = 32;

/// Seed of an independent random stream.
///
/// Work that runs in parallel cannot share the caller's generator, so each
/// task receives its own seed split off the session generator.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RngSeed([u8; SEED_LEN]);

impl RngSeed {
    /// Generate a new seed by sampling from an RNG.
    pub fn random<R: CryptoRngCore>(rng: &mut R) -> Self {
        let mut out = [0u8; SEED_LEN];
        rng.fill_bytes(&mut out);
        Self(out)
    }

    /// The generator seeded with this value.
    pub fn to_rng(&self) -> ChaCha20Rng {
        ChaCha20Rng::from_seed(self.0)
    }
}
