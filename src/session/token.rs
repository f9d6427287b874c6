//! Random session token generation.

use ring::rand::{SecureRandom, SystemRandom};

/// Length of every issued token
pub const TOKEN_LENGTH: usize = 60;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above it are discarded so every character is equally likely.
const ACCEPT_BELOW: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Generate a token of [`TOKEN_LENGTH`] alphanumeric characters from the
/// operating system CSPRNG.
pub fn generate_token(rng: &SystemRandom) -> Result<String, ring::error::Unspecified> {
    let mut token = String::with_capacity(TOKEN_LENGTH);
    let mut buf = [0u8; TOKEN_LENGTH];

    while token.len() < TOKEN_LENGTH {
        rng.fill(&mut buf)?;
        for byte in buf {
            if byte < ACCEPT_BELOW {
                token.push(ALPHABET[(byte as usize) % ALPHABET.len()] as char);
                if token.len() == TOKEN_LENGTH {
                    break;
                }
            }
        }
    }

    Ok(token)
}

/// Cheap shape check run before any store lookup.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_token_shape() {
        let rng = SystemRandom::new();
        let token = generate_token(&rng).unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(is_well_formed(&token));
    }

    #[test]
    fn test_tokens_very_likely_distinct() {
        let rng = SystemRandom::new();
        let tokens: HashSet<String> = (0..500).map(|_| generate_token(&rng).unwrap()).collect();
        assert_eq!(tokens.len(), 500);
    }

    #[test]
    fn test_uses_whole_alphabet() {
        let rng = SystemRandom::new();
        let seen: HashSet<char> = (0..200)
            .flat_map(|_| generate_token(&rng).unwrap().chars().collect::<Vec<_>>())
            .collect();
        // 12,000 draws over 62 symbols; missing one is vanishingly unlikely
        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn test_is_well_formed_rejects_bad_input() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"a".repeat(59)));
        assert!(!is_well_formed(&format!("{}!", "a".repeat(59))));
        assert!(is_well_formed(&"a".repeat(60)));
    }
}
