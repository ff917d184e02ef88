use secp256k1::{All, Message, Secp256k1};
use sha2::{Digest, Sha256};

use crate::error::{ChainError, Result};
use crate::keys::{encode_signature, PrivateKey, PublicKey};

/// Nodes only accept canonical signatures; signing is retried with fresh
/// nonce data until one comes out canonical
pub const MAX_SIGNING_ATTEMPTS: u32 = 64;

/// Digest signed for a packed transaction:
/// `sha256(chain_id || packed_trx || 32 zero bytes)`
pub fn signing_digest(chain_id: &[u8], packed_trx: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(chain_id);
    hasher.update(packed_trx);
    hasher.update([0u8; 32]);
    hasher.finalize().into()
}

/// Both `r` and `s` must be exactly 32 bytes once DER-encoded
pub fn is_canonical(compact: &[u8; 64]) -> bool {
    let half_ok = |b: &[u8]| b[0] & 0x80 == 0 && !(b[0] == 0 && b[1] & 0x80 == 0);
    half_ok(&compact[..32]) && half_ok(&compact[32..])
}

/// Signs transactions with the producer's permission key
pub struct TransactionSigner {
    key: PrivateKey,
    secp: Secp256k1<All>,
}

impl TransactionSigner {
    pub fn new(key: PrivateKey) -> Self {
        Self {
            key,
            secp: Secp256k1::new(),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Sign a packed transaction for `chain_id`, returning a `SIG_K1_` string
    pub fn sign(&self, chain_id: &[u8], packed_trx: &[u8]) -> Result<String> {
        let digest = signing_digest(chain_id, packed_trx);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ChainError::Signing(format!("invalid digest: {}", e)))?;

        for attempt in 0..MAX_SIGNING_ATTEMPTS {
            let signature = if attempt == 0 {
                self.secp.sign_ecdsa_recoverable(&message, self.key.secret_key())
            } else {
                let mut nonce = [0u8; 32];
                nonce[..4].copy_from_slice(&attempt.to_le_bytes());
                self.secp
                    .sign_ecdsa_recoverable_with_noncedata(&message, self.key.secret_key(), &nonce)
            };

            let (recovery_id, compact) = signature.serialize_compact();
            if is_canonical(&compact) {
                return Ok(encode_signature(recovery_id.to_i32(), &compact));
            }
            log::debug!("Signature attempt {} not canonical, retrying", attempt + 1);
        }

        Err(ChainError::Signing(format!(
            "no canonical signature after {} attempts",
            MAX_SIGNING_ATTEMPTS
        )))
    }
}
