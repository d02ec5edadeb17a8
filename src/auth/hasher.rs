//! One-way secret hashing. The algorithm sits behind [`PasswordHasher`].

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, secret: &str) -> String;
    /// Constant-time comparison against a stored hash. Malformed hashes never verify.
    fn verify(&self, secret: &str, hashed: &str) -> bool;
}

pub const DEFAULT_ROUNDS: u32 = 100_000;
const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Salted, iterated SHA-256. Stored as `sha256$<rounds>$<salt hex>$<digest hex>`.
#[derive(Clone, Debug)]
pub struct SaltedSha256Hasher {
    rounds: u32,
}

impl SaltedSha256Hasher {
    pub fn new() -> Self {
        Self::with_rounds(DEFAULT_ROUNDS)
    }

    pub fn with_rounds(rounds: u32) -> Self {
        SaltedSha256Hasher {
            rounds: rounds.max(1),
        }
    }

    fn digest(secret: &str, salt: &[u8], rounds: u32) -> [u8; 32] {
        let mut out: [u8; 32] = Sha256::new()
            .chain_update(salt)
            .chain_update(secret.as_bytes())
            .finalize()
            .into();
        for _ in 1..rounds {
            out = Sha256::new()
                .chain_update(out)
                .chain_update(salt)
                .finalize()
                .into();
        }
        out
    }
}

impl Default for SaltedSha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for SaltedSha256Hasher {
    fn hash(&self, secret: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill(&mut salt);
        let digest = Self::digest(secret, &salt, self.rounds);
        format!(
            "{}${}${}${}",
            SCHEME,
            self.rounds,
            hex::encode(salt),
            hex::encode(digest)
        )
    }

    fn verify(&self, secret: &str, hashed: &str) -> bool {
        let mut parts = hashed.split('$');
        let (Some(scheme), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let (Ok(rounds), Ok(salt), Ok(expected)) =
            (rounds.parse::<u32>(), hex::decode(salt), hex::decode(expected))
        else {
            return false;
        };
        let actual = Self::digest(secret, &salt, rounds.max(1));
        bool::from(actual.as_slice().ct_eq(expected.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_own_hashes_only() {
        let h = SaltedSha256Hasher::with_rounds(10);
        let stored = h.hash("s3cret");
        assert!(stored.starts_with("sha256$10$"));
        assert!(h.verify("s3cret", &stored));
        assert!(!h.verify("s3cret!", &stored));
    }

    #[test]
    fn salts_differ_per_hash() {
        let h = SaltedSha256Hasher::with_rounds(2);
        assert_ne!(h.hash("same"), h.hash("same"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let h = SaltedSha256Hasher::with_rounds(2);
        assert!(!h.verify("x", ""));
        assert!(!h.verify("x", "md5$1$00$00"));
        assert!(!h.verify("x", "sha256$two$00$00"));
        assert!(!h.verify("x", "sha256$1$zz$00"));
    }
}
