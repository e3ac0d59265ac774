//! Client-side event and item identifiers

use rand::Rng;

/// Alphabet without look-alike characters (`0`, `O`, `I`, `l`)
const ID_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Generate an id of `length` characters that starts with `prefix`
///
/// The prefix counts toward the length. When the prefix is already at least
/// `length` characters it is returned unchanged.
pub fn generate_id(prefix: &str, length: usize) -> String {
    if length <= prefix.len() {
        return prefix.to_string();
    }

    let mut rng = rand::rng();
    let mut id = String::with_capacity(length);
    id.push_str(prefix);
    for _ in prefix.len()..length {
        let idx = rng.random_range(0..ID_ALPHABET.len());
        id.push(ID_ALPHABET[idx] as char);
    }
    id
}
