//! HMAC key decoding.

use std::fmt;

use super::PolicyError;

/// Prefix that marks a key as hexadecimal.
pub const HEX_PREFIX: &str = "0x";

/// Shared secret used to authenticate every packet.
#[derive(Clone, PartialEq, Eq)]
pub struct HmacKey(Vec<u8>);

impl HmacKey {
    /// Decode the `--hmac` flag.
    ///
    /// An empty string disables HMAC. A `0x` prefix selects hex decoding,
    /// anything else is used byte for byte.
    pub fn decode(raw: &str) -> Result<Option<Self>, PolicyError> {
        if raw.is_empty() {
            return Ok(None);
        }

        match raw.strip_prefix(HEX_PREFIX) {
            Some(digits) => hex::decode(digits)
                .map(|bytes| Some(Self(bytes)))
                .map_err(|e| PolicyError::InvalidHexKey {
                    raw: raw.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(Some(Self(raw.as_bytes().to_vec()))),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Never print key material.
impl fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HmacKey({} bytes)", self.0.len())
    }
}
