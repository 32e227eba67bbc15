//! Solana wire-format transaction helpers
//!
//! A serialized transaction is a compact-u16 signature count, that many
//! 64-byte signature slots, then the message. Legacy messages start directly
//! with the header; versioned messages carry a `0x80 | version` prefix byte.

use crate::shared::constants::SIGNATURE_SIZE;
use crate::shared::error::VaultError;

const VERSIONED_MESSAGE_PREFIX: u8 = 0x80;

/// Decode a compact-u16 ("short vec") length. Returns `(value, bytes_consumed)`.
pub fn decode_short_vec_len(bytes: &[u8]) -> Result<(usize, usize), VaultError> {
    let mut value: usize = 0;
    for (i, byte) in bytes.iter().take(3).enumerate() {
        value |= ((byte & 0x7F) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            if value > u16::MAX as usize {
                return Err(VaultError::encoding("Compact-u16 value overflows u16"));
            }
            return Ok((value, i + 1));
        }
    }
    Err(VaultError::encoding("Truncated compact-u16 length"))
}

/// Encode a compact-u16 length
pub fn encode_short_vec_len(len: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(3);
    let mut rem = len;
    loop {
        let mut byte = (rem & 0x7F) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return out;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

/// Borrowed view over a serialized transaction
#[derive(Debug, Clone, Copy)]
pub struct WireTransaction<'a> {
    raw: &'a [u8],
    signature_count: usize,
    signatures_offset: usize,
    message_offset: usize,
}

impl<'a> WireTransaction<'a> {
    pub fn parse(raw: &'a [u8]) -> Result<Self, VaultError> {
        if raw.is_empty() {
            return Err(VaultError::validation("Transaction bytes are empty"));
        }
        let (signature_count, prefix) = decode_short_vec_len(raw)?;
        let message_offset = prefix + signature_count * SIGNATURE_SIZE;
        if raw.len() <= message_offset {
            return Err(VaultError::validation("Transaction is truncated before its message"));
        }

        let message = &raw[message_offset..];
        let header = if message[0] & VERSIONED_MESSAGE_PREFIX != 0 {
            message.get(1).copied()
        } else {
            Some(message[0])
        };
        match header {
            Some(required) if required as usize == signature_count => {}
            Some(required) => {
                return Err(VaultError::validation(format!(
                    "Message requires {} signatures but transaction has {} slots",
                    required, signature_count
                )))
            }
            None => return Err(VaultError::validation("Message header is missing")),
        }

        Ok(Self {
            raw,
            signature_count,
            signatures_offset: prefix,
            message_offset,
        })
    }

    pub fn signature_count(&self) -> usize {
        self.signature_count
    }

    /// The bytes a signer signs
    pub fn message(&self) -> &'a [u8] {
        &self.raw[self.message_offset..]
    }

    pub fn signature(&self, slot: usize) -> Option<&'a [u8]> {
        if slot >= self.signature_count {
            return None;
        }
        let start = self.signatures_offset + slot * SIGNATURE_SIZE;
        Some(&self.raw[start..start + SIGNATURE_SIZE])
    }

    /// Copy of the transaction with `signature` written into `slot`
    pub fn with_signature(&self, slot: usize, signature: &[u8]) -> Result<Vec<u8>, VaultError> {
        if signature.len() != SIGNATURE_SIZE {
            return Err(VaultError::validation(format!(
                "Signature must be {} bytes, got {}",
                SIGNATURE_SIZE,
                signature.len()
            )));
        }
        if slot >= self.signature_count {
            return Err(VaultError::validation(format!(
                "Signature slot {} out of range ({} slots)",
                slot, self.signature_count
            )));
        }
        let mut signed = self.raw.to_vec();
        let start = self.signatures_offset + slot * SIGNATURE_SIZE;
        signed[start..start + SIGNATURE_SIZE].copy_from_slice(signature);
        Ok(signed)
    }
}

/// Write the fee-payer signature (slot 0) into a serialized transaction
pub fn attach_fee_payer_signature(transaction: &[u8], signature: &[u8]) -> Result<Vec<u8>, VaultError> {
    WireTransaction::parse(transaction)?.with_signature(0, signature)
}
