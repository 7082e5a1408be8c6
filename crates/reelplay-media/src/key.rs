//! Decryption key material as handed over by key delivery.

use std::collections::BTreeMap;
use std::fmt;

/// A 128-bit content key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DecryptionKey([u8; 16]);

impl DecryptionKey {
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecryptionKey(..)")
    }
}

/// Already-decrypted key delivery message: content keys for one CPL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedKdm {
    id: String,
    cpl_id: String,
    keys: BTreeMap<String, DecryptionKey>,
}

impl DecryptedKdm {
    pub fn new(id: impl Into<String>, cpl_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cpl_id: cpl_id.into(),
            keys: BTreeMap::new(),
        }
    }

    /// Add the key for `key_id`.
    pub fn with_key(mut self, key_id: impl Into<String>, key: DecryptionKey) -> Self {
        self.keys.insert(key_id.into(), key);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The CPL these keys were issued for.
    pub fn cpl_id(&self) -> &str {
        &self.cpl_id
    }

    pub fn key(&self, key_id: &str) -> Option<&DecryptionKey> {
        self.keys.get(key_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_debug_is_redacted() {
        let key = DecryptionKey::new([7; 16]);
        assert_eq!(format!("{key:?}"), "DecryptionKey(..)");
    }

    #[test]
    fn test_kdm_lookup() {
        let kdm = DecryptedKdm::new("kdm-1", "cpl-1").with_key("k1", DecryptionKey::new([1; 16]));
        assert_eq!(kdm.cpl_id(), "cpl-1");
        assert!(kdm.key("k1").is_some());
        assert!(kdm.key("k2").is_none());
    }
}
