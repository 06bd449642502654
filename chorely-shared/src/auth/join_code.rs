//! Family join codes
//!
//! Codes are short, random, and easy to read aloud: the alphabet leaves out
//! `0`, `O`, `1` and `I`. Lookups normalize user input first, so
//! ` abcd2345 ` finds the family whose code is `ABCD2345`.

use rand::Rng;

/// Characters a code may contain
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every generated code
pub const JOIN_CODE_LENGTH: usize = 8;

/// Generates a new random join code
///
/// Uniqueness is not checked here; the caller retries on collision.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();

    (0..JOIN_CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of user-supplied input
pub fn normalize_join_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Whether a normalized code could have been generated by [`generate_join_code`]
pub fn is_valid_join_code(code: &str) -> bool {
    code.len() == JOIN_CODE_LENGTH && code.bytes().all(|b| ALPHABET.contains(&b))
}
