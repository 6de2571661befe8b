//! Token mint: produces 16-character lowercase-hex correlation tokens.
//!
//! Generalized from the workspace's API-token generator. That generator hashes
//! its output with SHA-256 before ever storing it, because its tokens are
//! *secrets* presented back for authentication. A Ricochet token is the
//! opposite: it is meant to appear in plaintext inside a payload and travel
//! back to us over an untrusted channel, so there is nothing to hash — the
//! mint just needs enough entropy that two injections in the same campaign
//! never collide (birthday bound ≈ 2^-32 at 10^6 injections).

use rand::{thread_rng, RngCore};
use ricochet_types::Token;

/// Mints a fresh correlation token using a cryptographically-secure RNG.
///
/// Draws 8 random bytes from [`rand::thread_rng`] and hex-encodes them,
/// yielding exactly 16 lowercase-hex characters (64 bits of entropy) —
/// always a valid token by construction.
#[must_use]
pub fn mint_token() -> Token {
    let mut bytes = [0u8; 8];
    thread_rng().fill_bytes(&mut bytes);
    Token::from_trusted(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn minted_tokens_satisfy_i1() {
        for _ in 0..1000 {
            let token = mint_token();
            assert_eq!(token.as_str().len(), 16);
            assert!(token
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        }
    }

    #[test]
    fn minted_tokens_are_practically_unique() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(mint_token()));
        }
    }
}
