//! Random string generation for external identifiers

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Source of random strings, injected wherever an external ID is minted
pub trait StringGenerator: Send + Sync {
    /// Produce a string of exactly `len` characters
    fn generate(&self, len: usize) -> String;
}

/// Alphanumeric strings drawn from the operating system RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptoStringGenerator;

impl StringGenerator for CryptoStringGenerator {
    fn generate(&self, len: usize) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

/// Always returns the same string (test double)
#[derive(Debug, Clone)]
pub struct FixedStringGenerator(pub String);

impl StringGenerator for FixedStringGenerator {
    fn generate(&self, _len: usize) -> String {
        self.0.clone()
    }
}
