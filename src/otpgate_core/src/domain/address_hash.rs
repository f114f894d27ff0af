use sha2::{Digest, Sha256};

/// One-way digest of a client network address.
///
/// Raw addresses are never retained; the digest is deterministic so repeated
/// requests from the same address correlate for audit purposes. The empty
/// sentinel marks sessions where no address was supplied at all, which is
/// distinct from hashing an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressHash(String);

impl AddressHash {
    pub fn from_address(raw: &str) -> Self {
        Self(hex::encode(Sha256::digest(raw.as_bytes())))
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Reconstructs a hash from its stored hex form. Storage-layer use only.
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
