//! XOR-stream value obfuscation
//!
//! Every stored value is XORed byte-by-byte against the UTF-8 bytes of the
//! configured key, cycling the key when the value is longer. The transform
//! is its own inverse, so one `apply` encrypts and a second decrypts.
//!
//! This is reversible obfuscation, NOT cryptographically secure
//! encryption: it hides values from casual inspection of the backing file
//! and nothing more. Callers needing real confidentiality must encrypt
//! before handing bytes to the store.

/// Key used when the caller configures none.
pub(crate) const DEFAULT_KEY: &str = "EncryptionKey";

/// Cycling XOR stream cipher.
pub(crate) struct XorCipher {
    key: Vec<u8>,
}

impl XorCipher {
    /// Builds a cipher from the configured key, falling back to
    /// [`DEFAULT_KEY`] when empty.
    pub fn new(key: &str) -> Self {
        let key = if key.is_empty() { DEFAULT_KEY } else { key };
        Self {
            key: key.as_bytes().to_vec(),
        }
    }

    /// XORs `data` in place against the cycling key bytes.
    pub fn apply(&self, data: &mut [u8]) {
        for (index, byte) in data.iter_mut().enumerate() {
            *byte ^= self.key[index % self.key.len()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_twice_is_identity() {
        let cipher = XorCipher::new("1234abcd");
        let original = b"round trip payload".to_vec();
        let mut data = original.clone();

        cipher.apply(&mut data);
        assert_ne!(data, original);
        cipher.apply(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_key_cycles_past_its_length() {
        let cipher = XorCipher::new("ab");
        let mut data = vec![0u8; 5];
        cipher.apply(&mut data);
        assert_eq!(data, vec![b'a', b'b', b'a', b'b', b'a']);
    }

    #[test]
    fn test_empty_key_uses_default() {
        let defaulted = XorCipher::new("");
        let explicit = XorCipher::new(DEFAULT_KEY);

        let mut a = b"same transform".to_vec();
        let mut b = a.clone();
        defaulted.apply(&mut a);
        explicit.apply(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_value_is_noop() {
        let cipher = XorCipher::new("key");
        let mut data: Vec<u8> = Vec::new();
        cipher.apply(&mut data);
        assert!(data.is_empty());
    }
}
