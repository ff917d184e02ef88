//! Binary packing of the two system-contract transactions the monitor sends.

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::keys::PublicKey;
use crate::name::string_to_name;

const SYSTEM_CONTRACT: &str = "eosio";
/// Key type tag for K1 keys inside packed action data
const K1_KEY_TYPE: u8 = 0;

/// Little-endian writer for the chain's binary format
#[derive(Debug, Default)]
pub struct AbiWriter {
    buf: Vec<u8>,
}

impl AbiWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_varuint32(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_varuint32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn write_name(&mut self, name: &str) -> Result<()> {
        self.write_u64(string_to_name(name)?);
        Ok(())
    }

    pub fn write_public_key(&mut self, key: &PublicKey) {
        self.write_u8(K1_KEY_TYPE);
        self.buf.extend_from_slice(key.as_bytes());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionLevel {
    pub actor: String,
    pub permission: String,
}

impl PermissionLevel {
    pub fn new(actor: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            permission: permission.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub account: String,
    pub name: String,
    pub authorization: Vec<PermissionLevel>,
    /// Already-packed action arguments
    pub data: Vec<u8>,
}

impl Action {
    /// `eosio::regproducer`, registering (or re-registering) with a signing key
    pub fn regproducer(
        authorization: PermissionLevel,
        producer_key: &PublicKey,
        url: &str,
        location: u16,
    ) -> Result<Self> {
        let mut data = AbiWriter::new();
        data.write_name(&authorization.actor)?;
        data.write_public_key(producer_key);
        data.write_string(url);
        data.write_u16(location);

        Ok(Self {
            account: SYSTEM_CONTRACT.to_string(),
            name: "regproducer".to_string(),
            authorization: vec![authorization],
            data: data.into_bytes(),
        })
    }

    /// `eosio::unregprod`
    pub fn unregprod(authorization: PermissionLevel) -> Result<Self> {
        let mut data = AbiWriter::new();
        data.write_name(&authorization.actor)?;

        Ok(Self {
            account: SYSTEM_CONTRACT.to_string(),
            name: "unregprod".to_string(),
            authorization: vec![authorization],
            data: data.into_bytes(),
        })
    }

    fn pack_into(&self, writer: &mut AbiWriter) -> Result<()> {
        writer.write_name(&self.account)?;
        writer.write_name(&self.name)?;
        writer.write_varuint32(self.authorization.len() as u32);
        for level in &self.authorization {
            writer.write_name(&level.actor)?;
            writer.write_name(&level.permission)?;
        }
        writer.write_bytes(&self.data);
        Ok(())
    }
}

/// Transaction header fields are TAPoS-bound to a recent block; resource
/// limits and delay are left at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Seconds since the Unix epoch
    pub expiration: u32,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub actions: Vec<Action>,
}

impl Transaction {
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut writer = AbiWriter::new();
        writer.write_u32(self.expiration);
        writer.write_u16(self.ref_block_num);
        writer.write_u32(self.ref_block_prefix);
        writer.write_varuint32(0); // max_net_usage_words
        writer.write_u8(0); // max_cpu_usage_ms
        writer.write_varuint32(0); // delay_sec
        writer.write_varuint32(0); // context_free_actions
        writer.write_varuint32(self.actions.len() as u32);
        for action in &self.actions {
            action.pack_into(&mut writer)?;
        }
        writer.write_varuint32(0); // transaction_extensions
        Ok(writer.into_bytes())
    }

    /// Transaction id as reported by the chain: sha256 of the packed bytes
    pub fn id(packed: &[u8]) -> String {
        hex::encode(Sha256::digest(packed))
    }
}
