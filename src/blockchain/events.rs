// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Receipt log parsing.
//!
//! Creation operations return the minted identifier through emitted events:
//!
//! - **Collections and app whitelists**: ERC-721 `Transfer(from, to, tokenId)`
//!   from the zero address; the token id is the third indexed argument
//!   (`topics[3]`).
//! - **Consumption**: `ProtectedDataConsumed(dealId, protectedData, mode)`
//!   with the deal id in the first data word.

use alloy::primitives::{keccak256, Address, FixedBytes, Log, B256, U256};
use alloy::sol_types::SolEvent;

use super::contracts::IDataProtectorSharing::ProtectedDataConsumed;

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_TOPIC: FixedBytes<32> = FixedBytes::new([
    0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b, 0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37, 0x8d, 0xaa,
    0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16, 0x28, 0xf5, 0x5a, 0x4d, 0xf5, 0x23, 0xb3, 0xef,
]);

/// Token id minted by `emitter` in these logs (a `Transfer` from the zero address).
pub fn minted_token_id(logs: &[Log], emitter: Address) -> Option<U256> {
    logs.iter()
        .filter(|log| log.address == emitter)
        .find_map(|log| {
            let topics = log.topics();
            // Transfer event has 4 topics: [event_sig, from, to, tokenId]
            if topics.len() < 4 || topics[0] != TRANSFER_TOPIC {
                return None;
            }
            if Address::from_word(topics[1]) != Address::ZERO {
                return None;
            }
            Some(U256::from_be_bytes(topics[3].0))
        })
}

/// App whitelist address minted by the registry (token id = address).
pub fn minted_app_whitelist(logs: &[Log], registry: Address) -> Option<Address> {
    minted_token_id(logs, registry)
        .map(|id| Address::from_word(B256::from(id.to_be_bytes::<32>())))
}

/// Deal id from the sharing contract's `ProtectedDataConsumed` event.
pub fn consumed_deal_id(logs: &[Log], sharing: Address) -> Option<B256> {
    logs.iter()
        .filter(|log| log.address == sharing)
        .find_map(|log| {
            let topics = log.topics();
            if topics.first() != Some(&ProtectedDataConsumed::SIGNATURE_HASH) {
                return None;
            }
            let data = &log.data.data;
            (data.len() >= 32).then(|| B256::from_slice(&data[..32]))
        })
}

/// Task id of the `index`-th task of a deal: `keccak256(dealId ‖ uint256(index))`.
pub fn task_id(deal_id: B256, index: u64) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(deal_id.as_slice());
    buf[32..].copy_from_slice(&U256::from(index).to_be_bytes::<32>());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, Bytes};

    use super::*;

    const SHARING: Address = address!("1390c3c6a545198809f1c7c5dd2a1f6a5f9b5a08");
    const OWNER: Address = address!("2222222222222222222222222222222222222222");

    fn transfer_log(emitter: Address, from: Address, to: Address, token_id: U256) -> Log {
        Log::new_unchecked(
            emitter,
            vec![
                TRANSFER_TOPIC,
                from.into_word(),
                to.into_word(),
                B256::from(token_id.to_be_bytes::<32>()),
            ],
            Bytes::new(),
        )
    }

    #[test]
    fn transfer_topic_is_correct() {
        assert_eq!(
            TRANSFER_TOPIC,
            keccak256("Transfer(address,address,uint256)".as_bytes())
        );
    }

    #[test]
    fn mint_reads_third_indexed_argument() {
        let logs = vec![
            // unrelated transfer between users
            transfer_log(SHARING, OWNER, SHARING, U256::from(7)),
            transfer_log(SHARING, Address::ZERO, OWNER, U256::from(42)),
        ];
        assert_eq!(minted_token_id(&logs, SHARING), Some(U256::from(42)));
        assert_eq!(minted_token_id(&logs, OWNER), None);
        assert_eq!(minted_token_id(&[], SHARING), None);
    }

    #[test]
    fn whitelist_address_is_token_id() {
        let whitelist = address!("abababababababababababababababababababab");
        let registry = address!("256bcd881c33bdf9df952f2a0148f27d439f2e64");
        let id = U256::from_be_bytes(whitelist.into_word().0);
        let logs = vec![transfer_log(registry, Address::ZERO, OWNER, id)];
        assert_eq!(minted_app_whitelist(&logs, registry), Some(whitelist));
    }

    #[test]
    fn consumed_event_yields_deal_id() {
        let deal = B256::repeat_byte(0x11);
        let mut data = deal.to_vec();
        data.extend_from_slice(OWNER.into_word().as_slice());
        data.extend_from_slice(&U256::from(1).to_be_bytes::<32>());
        let log = Log::new_unchecked(
            SHARING,
            vec![ProtectedDataConsumed::SIGNATURE_HASH],
            Bytes::from(data),
        );
        assert_eq!(consumed_deal_id(&[log], SHARING), Some(deal));
    }

    #[test]
    fn task_id_is_stable() {
        let deal = B256::repeat_byte(0x11);
        assert_eq!(task_id(deal, 0), task_id(deal, 0));
        assert_ne!(task_id(deal, 0), task_id(deal, 1));
    }
}
