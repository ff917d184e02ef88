//! K1 (secp256k1) key and signature text formats.
//!
//! Public keys are accepted in the legacy `EOS...` form and the `PUB_K1_...`
//! form and always displayed as `PUB_K1_...`, so keys coming from config and
//! from the chain can be compared as strings. Private keys are accepted as WIF
//! or `PVT_K1_...`.

use std::fmt;
use std::str::FromStr;

use base58::{FromBase58, ToBase58};
use ripemd::{Digest, Ripemd160};
use secp256k1::{Secp256k1, SecretKey};
use sha2::Sha256;

use crate::error::{ChainError, Result};

const K1_SUFFIX: &[u8] = b"K1";
const LEGACY_PUBLIC_PREFIX: &str = "EOS";
const PUBLIC_PREFIX: &str = "PUB_K1_";
const PRIVATE_PREFIX: &str = "PVT_K1_";
const SIGNATURE_PREFIX: &str = "SIG_K1_";
const WIF_VERSION: u8 = 0x80;

fn ripemd_checksum(data: &[u8], suffix: &[u8]) -> [u8; 4] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix);
    let hash = hasher.finalize();
    [hash[0], hash[1], hash[2], hash[3]]
}

fn double_sha256_checksum(data: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    [second[0], second[1], second[2], second[3]]
}

fn decode_base58(encoded: &str) -> Result<Vec<u8>> {
    encoded
        .from_base58()
        .map_err(|e| ChainError::InvalidKey(format!("bad base58 in '{}': {:?}", encoded, e)))
}

/// Decode `payload || ripemd160(payload || suffix)[..4]` and verify the checksum
fn decode_ripemd_checked(encoded: &str, suffix: &[u8], payload_len: usize) -> Result<Vec<u8>> {
    let raw = decode_base58(encoded)?;
    if raw.len() != payload_len + 4 {
        return Err(ChainError::InvalidKey(format!(
            "expected {} bytes, got {}",
            payload_len + 4,
            raw.len()
        )));
    }
    let (payload, checksum) = raw.split_at(payload_len);
    if ripemd_checksum(payload, suffix) != checksum {
        return Err(ChainError::InvalidKey(format!("checksum mismatch in '{}'", encoded)));
    }
    Ok(payload.to_vec())
}

fn encode_ripemd_checked(payload: &[u8], suffix: &[u8]) -> String {
    let mut raw = payload.to_vec();
    raw.extend_from_slice(&ripemd_checksum(payload, suffix));
    raw.to_base58()
}

/// Compressed secp256k1 public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 33]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    fn from_slice(bytes: &[u8]) -> Result<Self> {
        let point = secp256k1::PublicKey::from_slice(bytes)
            .map_err(|e| ChainError::InvalidKey(format!("not a curve point: {}", e)))?;
        Ok(Self(point.serialize()))
    }
}

impl FromStr for PublicKey {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix(PUBLIC_PREFIX) {
            Self::from_slice(&decode_ripemd_checked(rest, K1_SUFFIX, 33)?)
        } else if let Some(rest) = s.strip_prefix(LEGACY_PUBLIC_PREFIX) {
            Self::from_slice(&decode_ripemd_checked(rest, &[], 33)?)
        } else {
            Err(ChainError::InvalidKey(format!("unrecognised public key format '{}'", s)))
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PUBLIC_PREFIX, encode_ripemd_checked(&self.0, K1_SUFFIX))
    }
}

/// Normalise a public key string to `PUB_K1_` form, leaving strings that do
/// not parse untouched
pub fn normalize_public_key(key: &str) -> String {
    match key.parse::<PublicKey>() {
        Ok(parsed) => parsed.to_string(),
        Err(_) => key.to_string(),
    }
}

#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    pub fn secret_key(&self) -> &SecretKey {
        &self.0
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::signing_only();
        PublicKey(secp256k1::PublicKey::from_secret_key(&secp, &self.0).serialize())
    }

    fn from_slice(bytes: &[u8]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| ChainError::InvalidKey(format!("invalid private key: {}", e)))
    }
}

impl FromStr for PrivateKey {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix(PRIVATE_PREFIX) {
            return Self::from_slice(&decode_ripemd_checked(rest, K1_SUFFIX, 32)?);
        }

        let raw = decode_base58(s)?;
        if raw.len() != 37 || raw[0] != WIF_VERSION {
            return Err(ChainError::InvalidKey("not a WIF private key".to_string()));
        }
        let (payload, checksum) = raw.split_at(33);
        if double_sha256_checksum(payload) != checksum {
            return Err(ChainError::InvalidKey("WIF checksum mismatch".to_string()));
        }
        Self::from_slice(&payload[1..])
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.public_key())
    }
}

/// Encode a recoverable signature as `SIG_K1_...`
pub fn encode_signature(recovery_id: i32, compact: &[u8; 64]) -> String {
    let mut data = Vec::with_capacity(65);
    data.push((recovery_id + 27 + 4) as u8);
    data.extend_from_slice(compact);
    format!("{}{}", SIGNATURE_PREFIX, encode_ripemd_checked(&data, K1_SUFFIX))
}

/// Decode a `SIG_K1_...` string into its recovery id and compact bytes
pub fn decode_signature(signature: &str) -> Result<(i32, [u8; 64])> {
    let rest = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| ChainError::InvalidKey(format!("unrecognised signature format '{}'", signature)))?;
    let data = decode_ripemd_checked(rest, K1_SUFFIX, 65)?;
    let mut compact = [0u8; 64];
    compact.copy_from_slice(&data[1..]);
    Ok((data[0] as i32 - 27 - 4, compact))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
    const DEV_PVT_K1: &str = "PVT_K1_2bfGi9rYsXQSXXTvJbDAPhHLQUojjaNLomdm3cEJ1XTzMqUt3V";
    const DEV_LEGACY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
    const DEV_PUB_K1: &str = "PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63";

    #[test]
    fn test_public_key_formats_agree() {
        let legacy: PublicKey = DEV_LEGACY.parse().unwrap();
        let k1: PublicKey = DEV_PUB_K1.parse().unwrap();
        assert_eq!(legacy, k1);
        assert_eq!(legacy.to_string(), DEV_PUB_K1);
        assert_eq!(normalize_public_key(DEV_LEGACY), DEV_PUB_K1);
        assert_eq!(normalize_public_key("EOSnotakey"), "EOSnotakey");
        assert_eq!(
            hex::encode(k1.as_bytes()),
            "02c0ded2bc1f1305fb0faac5e6c03ee3a1924234985427b6167ca569d13df435cf"
        );
    }

    #[test]
    fn test_private_key_formats_derive_public_key() {
        let wif: PrivateKey = DEV_WIF.parse().unwrap();
        let k1: PrivateKey = DEV_PVT_K1.parse().unwrap();
        assert_eq!(wif.secret_key(), k1.secret_key());
        assert_eq!(wif.public_key().to_string(), DEV_PUB_K1);
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let tampered = DEV_LEGACY.replace("GDW5CV", "GDW5CW");
        assert!(tampered.parse::<PublicKey>().is_err());
        assert!("PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq64".parse::<PublicKey>().is_err());
        assert!("5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD4".parse::<PrivateKey>().is_err());
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        assert!("PUB_R1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63".parse::<PublicKey>().is_err());
        assert!("".parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_normalize_public_key() {
        assert_eq!(normalize_public_key(DEV_LEGACY), DEV_PUB_K1);
        assert_eq!(normalize_public_key(DEV_PUB_K1), DEV_PUB_K1);
        assert_eq!(normalize_public_key("not-a-key"), "not-a-key");
    }

    #[test]
    fn test_private_key_debug_hides_secret() {
        let key: PrivateKey = DEV_WIF.parse().unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(DEV_WIF));
        assert!(debug.contains(DEV_PUB_K1));
    }

    #[test]
    fn test_signature_encoding_round_trips_recovery_id() {
        let compact = [7u8; 64];
        let encoded = encode_signature(1, &compact);
        assert!(encoded.starts_with("SIG_K1_"));
        assert_eq!(decode_signature(&encoded).unwrap(), (1, compact));
    }
}
