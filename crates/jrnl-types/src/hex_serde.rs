//! Serde adapter encoding fixed 32-byte keys as hex strings.

use serde::{self, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
    bytes
        .try_into()
        .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
}

/// Parse a 64-character hex string into 32 bytes.
pub(crate) fn parse32(s: &str) -> Result<[u8; 32], crate::TypeError> {
    let bytes = hex::decode(s).map_err(|e| crate::TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(crate::TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}
