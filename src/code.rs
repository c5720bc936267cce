//! Deterministic verification-code derivation
//!
//! The same 6-character code is computed independently by the external
//! issuer (the Discord bot) and by the link authority, from
//! `world_name|username|secret_key`. No network round trip and no
//! per-code secret is ever stored: the code itself is the proof,
//! reconstructible by anyone holding all three inputs.
//!
//! The hash is a djb2 variant, deliberately not cryptographic — the
//! secrecy boundary is the unpublished secret key, not collision
//! resistance. Changing the hash, the separator, the input order, or the
//! charset silently breaks wire compatibility with the issuer.

/// Output length of a verification code.
pub const CODE_LENGTH: usize = 6;

/// Code alphabet: digits and uppercase letters minus the visually
/// ambiguous `0`, `O`, `I`, `L`.
pub const CHARSET: &[u8] = b"123456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// djb2-style rolling hash: seed 5381, `hash = (hash * 33) ^ char`,
/// wrapping unsigned 32-bit. Operates on Unicode scalar values, matching
/// the issuer's `charCodeAt` for the BMP inputs in use.
pub fn simple_hash(s: &str) -> u32 {
    let mut hash: u32 = 5381;
    for c in s.chars() {
        hash = hash.wrapping_mul(33) ^ (c as u32);
    }
    hash
}

/// Derives the 6-character code for `(world_name, username, secret_key)`.
///
/// The message is joined with `|` in exactly that order, hashed, and the
/// hash consumed base-`CHARSET.len()` across the six output positions.
/// Output is always uppercase.
pub fn derive_code(world_name: &str, username: &str, secret_key: &str) -> String {
    let message = format!("{}|{}|{}", world_name, username, secret_key);
    let mut hash = simple_hash(&message);

    let base = CHARSET.len() as u32;
    let mut code = String::with_capacity(CODE_LENGTH);
    for _ in 0..CODE_LENGTH {
        code.push(CHARSET[(hash % base) as usize] as char);
        hash /= base;
    }
    code
}

/// Normalizes a submitted code for comparison and ledger keying.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Case-insensitive check of a submitted code against the expected
/// derivation for `username` under this world and secret.
pub fn matches(input_code: &str, username: &str, world_name: &str, secret_key: &str) -> bool {
    normalize(input_code) == derive_code(world_name, username, secret_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_hash_known_vectors() {
        // Empty input leaves the seed untouched.
        assert_eq!(simple_hash(""), 5381);
        assert_eq!(simple_hash("demo|alice|abc123"), 2_017_487_796);
    }

    #[test]
    fn test_derive_code_known_vector() {
        assert_eq!(derive_code("demo", "alice", "abc123"), "NXU15W");
    }

    #[test]
    fn test_derive_code_deterministic() {
        let a = derive_code("slaparena", "somebody", "8d51ff7ae9ceee41");
        let b = derive_code("slaparena", "somebody", "8d51ff7ae9ceee41");
        assert_eq!(a, b);
        assert_eq!(a.len(), CODE_LENGTH);
    }

    #[test]
    fn test_derive_code_alphabet() {
        let code = derive_code("demo", "alice", "abc123");
        assert!(code.bytes().all(|b| CHARSET.contains(&b)));
        // The ambiguous characters never appear.
        for code in ["demo", "other", "slaparena"]
            .iter()
            .map(|w| derive_code(w, "user", "secret"))
        {
            assert!(!code.contains(['0', 'O', 'I', 'L']));
        }
    }

    #[test]
    fn test_derive_code_input_sensitivity() {
        let base = derive_code("demo", "alice", "abc123");
        assert_ne!(derive_code("demp", "alice", "abc123"), base);
        assert_ne!(derive_code("demo", "bob", "abc123"), base);
        assert_ne!(derive_code("demo", "alice", "abc124"), base);
    }

    #[test]
    fn test_matches_case_insensitive() {
        let code = derive_code("demo", "alice", "abc123");
        assert!(matches(&code.to_lowercase(), "alice", "demo", "abc123"));
        assert!(matches(&code, "alice", "demo", "abc123"));
        assert!(!matches("111111", "alice", "demo", "abc123"));
    }

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize("  nxu15w "), "NXU15W");
    }
}
