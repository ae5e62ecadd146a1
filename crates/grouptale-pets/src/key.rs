//! Validated pet state keys.

use std::fmt;

use crate::PetError;

/// Longest accepted key.
const MAX_KEY_LEN: usize = 128;

/// A key that is safe to use as a map key and as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PetKey(String);

impl PetKey {
    /// Validates `raw` as a key.
    ///
    /// # Errors
    /// Returns [`PetError::InvalidKey`] unless `raw` is 1 to 128
    /// characters of `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, PetError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_KEY_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(raw.to_owned()))
        } else {
            Err(PetError::InvalidKey(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_wallet_like_keys() {
        assert!(PetKey::parse("0xAbC123").is_ok());
        assert!(PetKey::parse("player_1-main").is_ok());
    }

    #[test]
    fn test_parse_rejects_path_tricks_and_empty() {
        for bad in ["", "../etc/passwd", "a/b", "a.json", "with space"] {
            assert!(
                matches!(PetKey::parse(bad), Err(PetError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overlong_key() {
        assert!(PetKey::parse(&"a".repeat(MAX_KEY_LEN)).is_ok());
        assert!(PetKey::parse(&"a".repeat(MAX_KEY_LEN + 1)).is_err());
    }
}
