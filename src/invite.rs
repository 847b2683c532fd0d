//! Invite code generation.
//!
//! Codes are 8 characters from the upper-case base-36 alphabet, generated
//! once per team at creation time and immutable thereafter.

use rand::Rng;

/// Length of every invite code.
pub const CODE_LENGTH: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random invite code.
///
/// Uniqueness is enforced by the caller against the teams table; this only
/// produces a candidate.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Normalize a user-supplied code for lookup: codes are matched
/// case-insensitively and stored upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_codes_vary() {
        // 36^8 possibilities; a handful of draws colliding would mean a broken RNG
        let codes: std::collections::HashSet<String> = (0..64).map(|_| generate_code()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" ab12Cd34 "), "AB12CD34");
        assert_eq!(normalize_code("XYZXYZ00"), "XYZXYZ00");
    }
}
