// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Named preflight predicates and the snapshot loaders they run on.
//!
//! Each predicate is pure: it inspects already-loaded state and returns the
//! user-facing message when its invariant does not hold. There is exactly
//! one predicate per invariant; operations compose them through
//! [`Workflow::require`](super::Workflow::require).

use alloy::primitives::{Address, U256};

use crate::blockchain::{
    AccountBalance, ChainClient, ChainError, CollectionDetails, ProtectedDataDetails,
};

pub type Check = Result<(), String>;

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Check {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// On-chain state of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionState {
    pub id: u64,
    /// `None` when the token does not exist
    pub owner: Option<Address>,
    pub details: CollectionDetails,
}

/// On-chain state of a protected data held by the sharing contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedDataState {
    pub address: Address,
    pub details: ProtectedDataDetails,
    /// Collection holding the protected data, if any
    pub collection: Option<CollectionState>,
}

impl ProtectedDataState {
    /// Owner of the protected data for sharing purposes: the owner of its collection.
    pub fn owner(&self) -> Option<Address> {
        self.collection.as_ref().and_then(|c| c.owner)
    }
}

pub async fn load_collection(
    chain: &dyn ChainClient,
    collection_id: u64,
) -> Result<CollectionState, ChainError> {
    let (owner, details) = futures::try_join!(
        chain.collection_owner(collection_id),
        chain.collection_details(collection_id),
    )?;
    Ok(CollectionState {
        id: collection_id,
        owner,
        details,
    })
}

pub async fn load_protected_data(
    chain: &dyn ChainClient,
    protected_data: Address,
) -> Result<ProtectedDataState, ChainError> {
    let details = chain.protected_data_details(protected_data).await?;
    let collection = match details.collection_id {
        Some(id) => Some(load_collection(chain, id).await?),
        None => None,
    };
    Ok(ProtectedDataState {
        address: protected_data,
        details,
        collection,
    })
}

// =============================================================================
// Collections
// =============================================================================

pub fn collection_exists(collection: &CollectionState) -> Check {
    ensure(collection.owner.is_some(), || {
        format!(
            "CollectionTokenId does not exist in the protectedDataSharing contract: {}",
            collection.id
        )
    })
}

pub fn collection_owned_by(collection: &CollectionState, user: Address) -> Check {
    ensure(collection.owner == Some(user), || {
        format!(
            "Collection {} is not owned by user {user:#x}",
            collection.id
        )
    })
}

pub fn collection_not_subscribed(collection: &CollectionState, now: u64) -> Check {
    ensure(
        collection.details.last_subscription_expiration <= now,
        || "Collection has ongoing subscriptions".to_string(),
    )
}

pub fn collection_empty(protected_data_count: usize) -> Check {
    ensure(protected_data_count == 0, || {
        format!("Collection is not empty: it still holds {protected_data_count} protected data")
    })
}

pub fn subscription_offered(collection: &CollectionState) -> Check {
    ensure(collection.details.subscription.duration > 0, || {
        format!(
            "Collection {} has no valid subscription params set",
            collection.id
        )
    })
}

pub fn subscription_terms_match(collection: &CollectionState, price: u64, duration: u64) -> Check {
    let terms = collection.details.subscription;
    ensure(terms.price == price && terms.duration == duration, || {
        format!(
            "Subscription parameters do not match the collection terms: expected price {} and duration {}",
            terms.price, terms.duration
        )
    })
}

// =============================================================================
// Protected data
// =============================================================================

pub fn in_collection(pd: &ProtectedDataState) -> Check {
    ensure(pd.collection.is_some(), || {
        format!(
            "Protected data {:#x} is not part of a collection",
            pd.address
        )
    })
}

pub fn owned_by(pd: &ProtectedDataState, user: Address) -> Check {
    ensure(pd.owner() == Some(user), || {
        format!(
            "Protected data {:#x} is not owned by user {user:#x}",
            pd.address
        )
    })
}

pub fn for_rent(pd: &ProtectedDataState) -> Check {
    ensure(pd.details.is_rentable(), || {
        "This protected data is not available for renting".to_string()
    })
}

pub fn not_for_rent(pd: &ProtectedDataState) -> Check {
    ensure(!pd.details.is_rentable(), || {
        "This protected data is available for renting. Remove it from renting first".to_string()
    })
}

pub fn for_sale(pd: &ProtectedDataState) -> Check {
    ensure(pd.details.for_sale, || {
        "This protected data is not for sale".to_string()
    })
}

pub fn not_for_sale(pd: &ProtectedDataState) -> Check {
    ensure(!pd.details.for_sale, || {
        "This protected data is currently for sale. Remove it from sale first".to_string()
    })
}

pub fn in_subscription(pd: &ProtectedDataState) -> Check {
    ensure(pd.details.in_subscription, || {
        "This protected data is not included in the collection subscription".to_string()
    })
}

pub fn not_in_subscription(pd: &ProtectedDataState) -> Check {
    ensure(!pd.details.in_subscription, || {
        "This protected data is included in the collection subscription. Remove it from the subscription first".to_string()
    })
}

pub fn not_rented(pd: &ProtectedDataState, now: u64) -> Check {
    ensure(pd.details.last_rental_expiration <= now, || {
        "This protected data has active rentals".to_string()
    })
}

/// Not part of a subscription some subscriber is still entitled to.
pub fn not_in_active_subscription(pd: &ProtectedDataState, now: u64) -> Check {
    let subscribed = pd
        .collection
        .as_ref()
        .is_some_and(|c| c.details.last_subscription_expiration > now);
    ensure(!(pd.details.in_subscription && subscribed), || {
        "This protected data is part of a collection with active subscriptions".to_string()
    })
}

pub fn renting_terms_match(pd: &ProtectedDataState, price: u64, duration: u64) -> Check {
    let terms = pd.details.renting;
    ensure(terms.price == price && terms.duration == duration, || {
        format!(
            "Rental parameters do not match the current terms: expected price {} and duration {}",
            terms.price, terms.duration
        )
    })
}

pub fn sale_price_matches(pd: &ProtectedDataState, price: u64) -> Check {
    ensure(pd.details.sale_price == price, || {
        format!(
            "Sale price does not match the current price: expected {}",
            pd.details.sale_price
        )
    })
}

/// Rental still running, or a subscription covering this protected data.
pub fn has_access(
    pd: &ProtectedDataState,
    rental_expiration: u64,
    subscription_expiration: u64,
    now: u64,
) -> Check {
    let rented = rental_expiration > now;
    let subscribed = pd.details.in_subscription && subscription_expiration > now;
    ensure(rented || subscribed, || {
        "You have no valid rental or subscription for this protected data".to_string()
    })
}

// =============================================================================
// Registries and accounts
// =============================================================================

/// Registry-level ownership of a protected data (outside the sharing contract).
pub fn dataset_owned_by(dataset: Address, owner: Option<Address>, user: Address) -> Check {
    match owner {
        None => Err(format!("Protected data {dataset:#x} does not exist")),
        Some(owner) => ensure(owner == user, || {
            format!("Protected data {dataset:#x} is not owned by user {user:#x}")
        }),
    }
}

pub fn app_whitelist_owned_by(
    app_whitelist: Address,
    owner: Option<Address>,
    user: Address,
) -> Check {
    match owner {
        None => Err(format!("App whitelist {app_whitelist:#x} does not exist")),
        Some(owner) => ensure(owner == user, || {
            format!("App whitelist {app_whitelist:#x} is not owned by user {user:#x}")
        }),
    }
}

/// No open order already grants the same app/user pair.
pub fn access_not_granted(existing_orders: u64) -> Check {
    ensure(existing_orders == 0, || {
        "An access has been already granted to this user/app with this protected data".to_string()
    })
}

pub fn workerpool_order_available(found: bool, workerpool: Address) -> Check {
    ensure(found, || {
        format!("Could not find a free workerpool order for workerpool {workerpool:#x}")
    })
}

pub fn sufficient_balance(balance: &AccountBalance, price: u64) -> Check {
    ensure(balance.stake >= U256::from(price), || {
        format!(
            "Not enough nRLC in your iExec account: you have {} and need {price}",
            balance.stake
        )
    })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::blockchain::{RentingParams, SubscriptionParams};
    use crate::testing::MockChain;

    const USER: Address = address!("2222222222222222222222222222222222222222");
    const OTHER: Address = address!("9999999999999999999999999999999999999999");
    const PD: Address = address!("1111111111111111111111111111111111111111");

    fn collection(owner: Option<Address>) -> CollectionState {
        CollectionState {
            id: 1,
            owner,
            details: CollectionDetails::default(),
        }
    }

    fn pd_in_collection(details: ProtectedDataDetails) -> ProtectedDataState {
        ProtectedDataState {
            address: PD,
            details: ProtectedDataDetails {
                collection_id: Some(1),
                ..details
            },
            collection: Some(collection(Some(USER))),
        }
    }

    #[test]
    fn collection_ownership() {
        assert!(collection_exists(&collection(None)).is_err());
        assert!(collection_owned_by(&collection(Some(USER)), USER).is_ok());
        let message = collection_owned_by(&collection(Some(OTHER)), USER).unwrap_err();
        assert!(message.contains("is not owned by"));
    }

    #[test]
    fn empty_collection_message() {
        assert!(collection_empty(0).is_ok());
        assert!(collection_empty(2).unwrap_err().contains("not empty"));
    }

    #[test]
    fn renting_checks() {
        let pd = pd_in_collection(ProtectedDataDetails {
            renting: RentingParams {
                price: 0,
                duration: 2000,
            },
            ..Default::default()
        });
        assert!(for_rent(&pd).is_ok());
        assert!(not_for_rent(&pd).is_err());
        assert!(renting_terms_match(&pd, 0, 2000).is_ok());
        assert!(renting_terms_match(&pd, 0, 1000).is_err());
        assert!(owned_by(&pd, USER).is_ok());
        assert!(owned_by(&pd, OTHER).is_err());
    }

    #[test]
    fn active_subscription_blocks_removal() {
        let mut pd = pd_in_collection(ProtectedDataDetails {
            in_subscription: true,
            ..Default::default()
        });
        if let Some(c) = pd.collection.as_mut() {
            c.details.last_subscription_expiration = 500;
        }
        assert!(not_in_active_subscription(&pd, 100).is_err());
        assert!(not_in_active_subscription(&pd, 500).is_ok());
    }

    #[test]
    fn access_through_rental_or_subscription() {
        let pd = pd_in_collection(ProtectedDataDetails {
            in_subscription: true,
            ..Default::default()
        });
        assert!(has_access(&pd, 200, 0, 100).is_ok());
        assert!(has_access(&pd, 0, 200, 100).is_ok());
        assert!(has_access(&pd, 50, 50, 100).is_err());

        let not_subscribable = pd_in_collection(ProtectedDataDetails::default());
        assert!(has_access(&not_subscribable, 0, 200, 100).is_err());
    }

    #[test]
    fn balance_must_cover_price() {
        let balance = AccountBalance {
            stake: U256::from(10),
            locked: U256::ZERO,
        };
        assert!(sufficient_balance(&balance, 10).is_ok());
        assert!(sufficient_balance(&balance, 11).is_err());
    }

    #[test]
    fn subscription_terms() {
        let mut c = collection(Some(USER));
        assert!(subscription_offered(&c).is_err());
        c.details.subscription = SubscriptionParams {
            price: 3,
            duration: 60,
        };
        assert!(subscription_offered(&c).is_ok());
        assert!(subscription_terms_match(&c, 3, 60).is_ok());
        assert!(subscription_terms_match(&c, 2, 60).is_err());
    }

    #[test]
    fn registry_ownership() {
        assert!(dataset_owned_by(PD, None, USER)
            .unwrap_err()
            .contains("does not exist"));
        assert!(dataset_owned_by(PD, Some(USER), USER).is_ok());
        assert!(app_whitelist_owned_by(PD, Some(OTHER), USER).is_err());
    }

    #[test]
    fn market_checks() {
        assert!(access_not_granted(0).is_ok());
        assert!(access_not_granted(1).unwrap_err().contains("already granted"));
        assert!(workerpool_order_available(false, OTHER)
            .unwrap_err()
            .contains("0x9999"));
    }

    #[tokio::test]
    async fn loader_follows_collection() {
        let chain = MockChain::new(USER);
        chain.add_collection(1, USER, CollectionDetails::default());
        chain.set_protected_data(
            PD,
            ProtectedDataDetails {
                collection_id: Some(1),
                ..Default::default()
            },
        );

        let state = load_protected_data(&chain, PD).await.unwrap();
        assert_eq!(state.owner(), Some(USER));

        let outside = load_protected_data(&chain, OTHER).await.unwrap();
        assert!(outside.collection.is_none());
        assert!(in_collection(&outside).is_err());
    }
}
