//! One-way salted password hashing.
//!
//! The bcrypt hash string embeds its cost factor, so the work factor can be
//! raised later without invalidating stored hashes.

/// Hash a raw password with the given bcrypt cost factor.
pub fn hash_password(raw: &str, cost: u32) -> anyhow::Result<String> {
    Ok(bcrypt::hash(raw, cost)?)
}

/// Verify a raw password against a stored hash.
///
/// A malformed stored hash counts as a failed verification rather than an
/// error; the caller answers with the same uniform credentials failure
/// either way.
pub fn verify_password(raw: &str, hash: &str) -> bool {
    bcrypt::verify(raw, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the suite fast; production cost comes from settings.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("hunter22", TEST_COST).unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("hunter22", TEST_COST).unwrap();
        let b = hash_password("hunter22", TEST_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_fails_closed() {
        assert!(!verify_password("hunter22", "not-a-bcrypt-hash"));
    }
}
