// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ENS helpers.

use alloy::primitives::{keccak256, B256};

/// EIP-137 namehash of a (normalized, lower-case) ENS name.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// `true` for names of the form `label(.label)*.eth`.
///
/// Labels may contain lower-case letters, digits, `-` and `_`.
pub fn is_ens_name(value: &str) -> bool {
    let Some(prefix) = value.strip_suffix(".eth") else {
        return false;
    };
    !prefix.is_empty()
        && prefix.split('.').all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::b256;

    use super::*;

    #[test]
    fn namehash_matches_eip137_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
    }

    #[test]
    fn ens_name_shape() {
        assert!(is_ens_name("alice.eth"));
        assert!(is_ens_name("prod-v8-bellecour.main.pools.iexec.eth"));
        assert!(!is_ens_name(".eth"));
        assert!(!is_ens_name("eth"));
        assert!(!is_ens_name("alice..eth"));
        assert!(!is_ens_name("Alice.eth"));
        assert!(!is_ens_name("alice.com"));
    }
}
