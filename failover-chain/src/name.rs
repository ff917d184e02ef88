//! Account and action names, packed into 64 bits the way the chain stores them.

use crate::error::{ChainError, Result};

const MAX_NAME_LEN: usize = 13;

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

/// Encode a name such as `eosio` or `producer1`.
///
/// The first twelve characters take five bits each; a thirteenth character
/// only has four bits left and must be one of `.1-5a-j`.
pub fn string_to_name(name: &str) -> Result<u64> {
    let bytes = name.as_bytes();
    if bytes.len() > MAX_NAME_LEN {
        return Err(ChainError::InvalidName(name.to_string()));
    }

    let mut value = 0u64;
    for (i, c) in bytes.iter().enumerate() {
        let symbol = char_to_symbol(*c).ok_or_else(|| ChainError::InvalidName(name.to_string()))?;
        if i < 12 {
            value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
        } else {
            if symbol > 0x0f {
                return Err(ChainError::InvalidName(name.to_string()));
            }
            value |= symbol;
        }
    }
    Ok(value)
}
