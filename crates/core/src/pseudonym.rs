//! Patient identifier pseudonymisation.
//!
//! The national patient identifier never leaves the engine in clear text. It is replaced by
//! its MD5 digest, rendered as 32 lowercase hex characters, which lets the receiving system
//! link repeat reports for the same person without learning the identifier.

use md5::{Digest, Md5};

/// Returns the lowercase hex MD5 digest of `value`'s UTF-8 bytes.
pub fn pseudonymise(value: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_lowercase_hex() {
        let digest = pseudonymise("ABC123");
        assert_eq!(digest, "bbf2dead374654cbb32a917afd236656");
        assert_eq!(digest, pseudonymise("ABC123"));
        assert!(!digest.contains("ABC123"));
    }

    #[test]
    fn distinct_inputs_give_distinct_digests() {
        assert_ne!(pseudonymise("ABC123"), pseudonymise("ABC124"));
        assert_eq!(pseudonymise("").len(), 32);
    }
}
