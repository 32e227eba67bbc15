//! Utility functions for the vault core
//!
//! This module contains common utility functions used throughout the vault core.

use crate::shared::error::VaultError;

/// Encode bytes as Base58 (Bitcoin alphabet). Leading zero bytes become leading '1's.
pub fn base58_encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a Base58 string (Bitcoin alphabet)
pub fn base58_decode(encoded: &str) -> Result<Vec<u8>, VaultError> {
    Ok(bs58::decode(encoded).into_vec()?)
}

/// Convert hex string to bytes
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, VaultError> {
    let hex = hex.trim_start_matches("0x");
    hex::decode(hex)
        .map_err(|e| VaultError::validation(format!("Invalid hex string: {}", e)))
}

/// Convert bytes to hex string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a big-endian u64 carried in a result extra
pub fn u64_from_be_bytes(bytes: &[u8]) -> Result<u64, VaultError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| VaultError::encoding(format!("Expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

/// Short printable form of a Base58 key, e.g. `7xKX...gAsU`
pub fn abbreviate(base58: &str) -> String {
    let chars: Vec<char> = base58.chars().collect();
    if chars.len() <= 12 {
        return base58.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base58_known_vectors() {
        assert_eq!(base58_encode(&[]), "");
        assert_eq!(base58_encode(&[0x00]), "1");
        assert_eq!(base58_encode(&[0x00, 0x00, 0x01]), "112");
        assert_eq!(base58_encode(b"hello world"), "StV1DL6CwTryKyV");
        assert_eq!(base58_encode(&[0x01, 0x02, 0x03, 0x04]), "2VfUX");
        // System program id
        assert_eq!(base58_encode(&[0u8; 32]), "11111111111111111111111111111111");
    }

    #[test]
    fn test_base58_decode_rejects_invalid_alphabet() {
        assert!(base58_decode("0OIl").is_err());
        assert_eq!(base58_decode("1").expect("decode"), vec![0x00]);
    }

    #[test]
    fn test_hex_conversion() {
        let original = vec![1, 2, 3, 4, 5];
        let hex = bytes_to_hex(&original);
        let converted = hex_to_bytes(&hex)
            .expect("Failed to convert hex back to bytes");
        assert_eq!(original, converted);
    }

    #[test]
    fn test_u64_from_be_bytes() {
        assert_eq!(u64_from_be_bytes(&42u64.to_be_bytes()).expect("decode"), 42);
        assert!(u64_from_be_bytes(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("short"), "short");
        assert_eq!(abbreviate("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"), "7xKX...gAsU");
    }

    #[test]
    fn test_abbreviate_multibyte_input() {
        assert_eq!(abbreviate("ééééé-key-ééééé"), "éééé...éééé");
        assert_eq!(abbreviate("ключ"), "ключ");
        assert_eq!(abbreviate("🔑🔑🔑🔑🔑🔑🔑🔑🔑🔑🔑🔑🔑"), "🔑🔑🔑🔑...🔑🔑🔑🔑");
    }

    proptest! {
        #[test]
        fn prop_base58_round_trip(bytes in proptest::collection::vec(any::<u8>(), 1..64)) {
            let encoded = base58_encode(&bytes);
            let decoded = base58_decode(&encoded).expect("round trip decode");
            prop_assert_eq!(&decoded, &bytes);

            let leading_zeros = bytes.iter().take_while(|b| **b == 0).count();
            let leading_ones = encoded.chars().take_while(|c| *c == '1').count();
            prop_assert_eq!(leading_zeros, leading_ones);
        }
    }
}
