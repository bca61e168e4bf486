//! Offer code generation

use rand::Rng;

/// Uppercase alphanumeric alphabet: 36^8 combinations for the random part.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RANDOM_LEN: usize = 8;

/// Generate a display code of the form `<PREFIX>-<RANDOM8>`.
///
/// Probabilistically unique only; the issuance service checks the store and
/// retries on collision.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(prefix.len() + 1 + RANDOM_LEN);
    code.push_str(prefix);
    code.push('-');
    for _ in 0..RANDOM_LEN {
        code.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = generate("DNEST");
        let (prefix, random) = code.split_once('-').unwrap();
        assert_eq!(prefix, "DNEST");
        assert_eq!(random.len(), 8);
        assert!(random
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_codes_vary() {
        let codes: std::collections::HashSet<_> = (0..100).map(|_| generate("VNEST")).collect();
        // 36^8 combinations; 100 draws colliding would point at a broken RNG
        assert_eq!(codes.len(), 100);
    }
}
