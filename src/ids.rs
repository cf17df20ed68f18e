use rand::Rng;

/// URL-safe alphabet used for generated identifiers
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_-";

pub const ID_LENGTH: usize = 10;

/// Generate a random 10-character identifier.
///
/// Uniqueness is probabilistic (64^10 possibilities); callers do not check
/// for collisions.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
