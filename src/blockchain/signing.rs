// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local transaction signer.

use alloy::{network::EthereumWallet, signers::local::PrivateKeySigner};

use super::client::ChainError;

/// Create a signer from a hex-encoded private key.
///
/// # Arguments
/// * `private_key_hex` - 64 hex characters, with or without `0x` prefix
///
/// # Returns
/// A `PrivateKeySigner` used for transactions, orders and market challenges.
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, ChainError> {
    let trimmed = private_key_hex.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    let key_bytes =
        alloy::hex::decode(hex).map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
}

/// Create an Ethereum wallet from a signer.
pub fn wallet_from_signer(signer: PrivateKeySigner) -> EthereumWallet {
    EthereumWallet::from(signer)
}

#[cfg(test)]
mod tests {
    use alloy::network::{Ethereum, NetworkWallet};
    use alloy::primitives::address;

    use super::*;

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_signer_from_hex() {
        let signer = signer_from_hex(TEST_KEY).unwrap();
        assert_eq!(
            signer.address(),
            address!("2c7536e3605d9c16a7a3d7b1898e529396a65c23")
        );

        let prefixed = signer_from_hex(&format!("0x{TEST_KEY}")).unwrap();
        assert_eq!(prefixed.address(), signer.address());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        assert!(matches!(
            signer_from_hex("not-a-key"),
            Err(ChainError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            signer_from_hex("abcd"),
            Err(ChainError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_wallet_from_signer() {
        let signer = signer_from_hex(TEST_KEY).unwrap();
        let address = signer.address();
        let wallet = wallet_from_signer(signer);
        assert_eq!(
            NetworkWallet::<Ethereum>::default_signer_address(&wallet),
            address
        );
    }
}
