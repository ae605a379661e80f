// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ENS resolution of validated identifiers.

use alloy::primitives::Address;
use tracing::debug;

use super::{failed, Operation};
use crate::blockchain::ChainClient;
use crate::error::{DataProtectorError, ValidationError};
use crate::validators::{AddressOrEns, Restriction};

/// Resolve an address-or-ENS value. A name without an address is a
/// validation failure; an unreachable chain fails the operation.
pub async fn address(
    chain: &dyn ChainClient,
    operation: Operation,
    field: &str,
    value: &AddressOrEns,
) -> Result<Address, DataProtectorError> {
    match value {
        AddressOrEns::Address(address) => Ok(*address),
        AddressOrEns::Ens(name) => {
            let resolved = chain.resolve_ens(name).await.map_err(failed(operation))?;
            debug!(%name, ?resolved, "Resolved ENS name");
            resolved.ok_or_else(|| {
                ValidationError::new(field, format!("ENS name `{name}` does not resolve to an address"))
                    .into()
            })
        }
    }
}

/// Resolve a restriction; `any` becomes the zero address.
pub async fn restriction(
    chain: &dyn ChainClient,
    operation: Operation,
    field: &str,
    value: &Restriction,
) -> Result<Address, DataProtectorError> {
    match value {
        Restriction::Any => Ok(Address::ZERO),
        Restriction::Only(inner) => address(chain, operation, field, inner).await,
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::MockChain;

    const USER: Address = address!("2222222222222222222222222222222222222222");
    const ALICE: Address = address!("a11ce00000000000000000000000000000000000");

    #[tokio::test]
    async fn ens_names_resolve_through_chain() {
        let chain = MockChain::new(USER);
        chain.add_ens("alice.eth", ALICE);

        let resolved = address(
            &chain,
            Operation::TransferOwnership,
            "newOwner",
            &AddressOrEns::Ens("alice.eth".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(resolved, ALICE);

        let direct = address(
            &chain,
            Operation::TransferOwnership,
            "newOwner",
            &AddressOrEns::Address(USER),
        )
        .await
        .unwrap();
        assert_eq!(direct, USER);
    }

    #[tokio::test]
    async fn unknown_name_is_a_validation_error() {
        let chain = MockChain::new(USER);
        let err = address(
            &chain,
            Operation::TransferOwnership,
            "newOwner",
            &AddressOrEns::Ens("nobody.eth".to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("newOwner"));
    }

    #[tokio::test]
    async fn any_is_zero_address() {
        let chain = MockChain::new(USER);
        let resolved = restriction(&chain, Operation::GrantAccess, "authorizedApp", &Restriction::Any)
            .await
            .unwrap();
        assert_eq!(resolved, Address::ZERO);
        assert_eq!(chain.call_count(), 0);
    }
}
