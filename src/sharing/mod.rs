// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sharing Namespace
//!
//! Collections, rentals, sales, subscriptions, consumption and app
//! whitelists on the DataProtector sharing contract.
//!
//! Every mutating operation follows the [`Workflow`] template: inputs are
//! validated and resolved, a snapshot of the on-chain state is loaded, the
//! declared invariants are checked in order, and only then are transactions
//! sent. Payments first approve the sharing contract on the iExec account
//! when the current allowance does not cover the price.

mod reads;

pub use reads::{
    GetCollectionSubscriptionsParams, GetProtectedDataInCollectionsParams,
    GetProtectedDataRentalsParams,
};

use std::future::Future;

use alloy::primitives::{Address, B256, U256};
use futures::TryFutureExt;
use serde::Serialize;
use tracing::info;

use crate::blockchain::orders::TEE_SCONE_TAG;
use crate::blockchain::{
    events, AccountBalance, ChainClient, ChainError, SharingCall, TxOutcome, WhitelistCall,
    WorkerpoolOrder,
};
use crate::context::DataProtectorContext;
use crate::error::{DataProtectorError, RemoteError};
use crate::market::WorkerpoolOrderQuery;
use crate::subgraph;
use crate::validators::{self, AddressOrEns};
use crate::workflow::preflight::{self, CollectionState, ProtectedDataState};
use crate::workflow::{resolve, Operation, Workflow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessWithTransactionHash {
    pub tx_hash: String,
}

impl From<TxOutcome> for SuccessWithTransactionHash {
    fn from(outcome: TxOutcome) -> Self {
        Self {
            tx_hash: outcome.tx_hash_hex(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionResponse {
    pub collection_id: u64,
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppWhitelistResponse {
    pub address: Address,
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeProtectedDataResponse {
    pub tx_hash: String,
    pub deal_id: B256,
    /// First task of the deal
    pub task_id: B256,
}

#[derive(Debug, Clone, Default)]
pub struct ConsumeProtectedDataParams {
    pub protected_data: String,
    pub app: String,
    /// Defaults to the configured workerpool
    pub workerpool: Option<String>,
    /// Highest workerpool price accepted, defaults to 0
    pub max_workerpool_price: Option<u64>,
}

/// Snapshot for operations that charge the user's iExec account.
struct PaymentSnapshot<T> {
    target: T,
    balance: AccountBalance,
    allowance: U256,
}

struct RemovalSnapshot {
    collection: CollectionState,
    size: usize,
}

struct AdditionSnapshot {
    collection: CollectionState,
    dataset_owner: Option<Address>,
    approval: Address,
}

struct ConsumeSnapshot {
    protected_data: ProtectedDataState,
    rental_expiration: u64,
    subscription_expiration: u64,
    workerpool_order: Option<WorkerpoolOrder>,
}

/// `sharing` namespace of the SDK.
#[derive(Clone)]
pub struct DataProtectorSharing {
    context: DataProtectorContext,
}

impl DataProtectorSharing {
    pub fn new(context: DataProtectorContext) -> Self {
        Self { context }
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub async fn create_collection(&self) -> Result<CreateCollectionResponse, DataProtectorError> {
        let op = Operation::CreateCollection;
        let user = self.user();
        let sharing = self.sharing();

        Workflow::<()>::new(op)
            .run(async { Ok::<_, RemoteError>(()) }, |_| async move {
                let outcome = self.send(op, SharingCall::CreateCollection { to: user }).await?;
                let collection_id = events::minted_token_id(&outcome.logs, sharing)
                    .and_then(|id| u64::try_from(id).ok())
                    .ok_or_else(|| ChainError::MissingEvent("Transfer".to_string()))?;
                info!(operation = %op, collection_id, "Collection created");
                Ok::<_, RemoteError>(CreateCollectionResponse {
                    collection_id,
                    tx_hash: outcome.tx_hash_hex(),
                })
            })
            .await
    }

    /// Burn an empty collection without running subscriptions.
    pub async fn remove_collection(
        &self,
        collection_id: u64,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::RemoveCollection;
        let collection_id = validators::positive_integer("collectionId", collection_id)?;
        let user = self.user();
        let now = self.context.now();
        let chain = self.chain();
        let indexer = self.context.subgraph.as_ref();

        let outcome = Workflow::new(op)
            .require("collection exists", |s: &RemovalSnapshot| {
                preflight::collection_exists(&s.collection)
            })
            .require("collection owned by user", |s: &RemovalSnapshot| {
                preflight::collection_owned_by(&s.collection, user)
            })
            .require("collection has no ongoing subscription", |s: &RemovalSnapshot| {
                preflight::collection_not_subscribed(&s.collection, now)
            })
            .require("collection is empty", |s: &RemovalSnapshot| {
                preflight::collection_empty(s.size)
            })
            .run(
                async {
                    let (collection, size) = futures::try_join!(
                        preflight::load_collection(chain, collection_id).map_err(RemoteError::from),
                        subgraph::collection_protected_data_count(indexer, collection_id)
                            .map_err(RemoteError::from),
                    )?;
                    Ok::<_, RemoteError>(RemovalSnapshot { collection, size })
                },
                |_| self.send(op, SharingCall::RemoveCollection { collection_id }),
            )
            .await?;
        Ok(outcome.into())
    }

    /// Move a protected data owned by the user into one of their collections.
    /// The sharing contract is approved on the dataset first when needed.
    pub async fn add_to_collection(
        &self,
        collection_id: u64,
        protected_data: &str,
        app_whitelist: Option<&str>,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::AddToCollection;
        let collection_id = validators::positive_integer("collectionId", collection_id)?;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;
        let app_whitelist = app_whitelist
            .map(|v| validators::address("appWhitelist", v))
            .transpose()?
            .unwrap_or(Address::ZERO);

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();
        let sharing = self.sharing();
        let chain = self.chain();

        let outcome = Workflow::new(op)
            .require("collection exists", |s: &AdditionSnapshot| {
                preflight::collection_exists(&s.collection)
            })
            .require("collection owned by user", |s: &AdditionSnapshot| {
                preflight::collection_owned_by(&s.collection, user)
            })
            .require("protected data owned by user", |s: &AdditionSnapshot| {
                preflight::dataset_owned_by(protected_data, s.dataset_owner, user)
            })
            .run(
                async {
                    let (collection, dataset_owner, approval) = futures::try_join!(
                        preflight::load_collection(chain, collection_id),
                        chain.dataset_owner(protected_data),
                        chain.dataset_approval(protected_data),
                    )?;
                    Ok::<_, RemoteError>(AdditionSnapshot {
                        collection,
                        dataset_owner,
                        approval,
                    })
                },
                |s| async move {
                    if s.approval != sharing {
                        let approval = chain.approve_dataset(protected_data, sharing).await?;
                        info!(
                            operation = %op,
                            protected_data = %protected_data,
                            tx_hash = %approval.tx_hash,
                            "Sharing contract approved on protected data"
                        );
                    }
                    self.send(
                        op,
                        SharingCall::AddProtectedDataToCollection {
                            collection_id,
                            protected_data,
                            app_whitelist,
                        },
                    )
                    .await
                },
            )
            .await?;
        Ok(outcome.into())
    }

    pub async fn remove_protected_data_from_collection(
        &self,
        protected_data: &str,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::RemoveProtectedDataFromCollection;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();
        let now = self.context.now();

        let outcome = Workflow::new(op)
            .require("protected data in collection", preflight::in_collection)
            .require("protected data owned by user", |s: &ProtectedDataState| {
                preflight::owned_by(s, user)
            })
            .require("protected data not rented", |s: &ProtectedDataState| {
                preflight::not_rented(s, now)
            })
            .require(
                "protected data not in an active subscription",
                |s: &ProtectedDataState| preflight::not_in_active_subscription(s, now),
            )
            .run(self.load_protected_data(protected_data), |_| {
                self.send(
                    op,
                    SharingCall::RemoveProtectedDataFromCollection { protected_data },
                )
            })
            .await?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Renting
    // =========================================================================

    pub async fn set_protected_data_to_renting(
        &self,
        protected_data: &str,
        price: u64,
        duration: u64,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::SetProtectedDataToRenting;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;
        let duration = validators::duration("duration", duration)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();

        let outcome = Workflow::new(op)
            .require("protected data in collection", preflight::in_collection)
            .require("protected data owned by user", |s: &ProtectedDataState| {
                preflight::owned_by(s, user)
            })
            .require("protected data not for sale", preflight::not_for_sale)
            .run(self.load_protected_data(protected_data), |_| {
                self.send(
                    op,
                    SharingCall::SetProtectedDataToRenting {
                        protected_data,
                        price,
                        duration,
                    },
                )
            })
            .await?;
        Ok(outcome.into())
    }

    pub async fn remove_protected_data_from_renting(
        &self,
        protected_data: &str,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::RemoveProtectedDataFromRenting;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();

        let outcome = Workflow::new(op)
            .require("protected data in collection", preflight::in_collection)
            .require("protected data owned by user", |s: &ProtectedDataState| {
                preflight::owned_by(s, user)
            })
            .require("protected data for rent", preflight::for_rent)
            .run(self.load_protected_data(protected_data), |_| {
                self.send(
                    op,
                    SharingCall::RemoveProtectedDataFromRenting { protected_data },
                )
            })
            .await?;
        Ok(outcome.into())
    }

    /// Rent a protected data on its current terms. `price` and `duration`
    /// must match the published rental parameters.
    pub async fn rent_protected_data(
        &self,
        protected_data: &str,
        price: u64,
        duration: u64,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::RentProtectedData;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;
        let duration = validators::duration("duration", duration)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;

        let outcome = Workflow::new(op)
            .require(
                "protected data in collection",
                |s: &PaymentSnapshot<ProtectedDataState>| preflight::in_collection(&s.target),
            )
            .require(
                "protected data for rent",
                |s: &PaymentSnapshot<ProtectedDataState>| preflight::for_rent(&s.target),
            )
            .require(
                "rental terms match",
                |s: &PaymentSnapshot<ProtectedDataState>| {
                    preflight::renting_terms_match(&s.target, price, duration)
                },
            )
            .require(
                "sufficient balance",
                |s: &PaymentSnapshot<ProtectedDataState>| {
                    preflight::sufficient_balance(&s.balance, price)
                },
            )
            .run(
                self.load_payment(preflight::load_protected_data(self.chain(), protected_data)),
                |s| async move {
                    self.approve_if_needed(op, s.allowance, price).await?;
                    self.send(
                        op,
                        SharingCall::RentProtectedData {
                            protected_data,
                            price,
                            duration,
                        },
                    )
                    .await
                },
            )
            .await?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Sale
    // =========================================================================

    pub async fn set_protected_data_for_sale(
        &self,
        protected_data: &str,
        price: u64,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::SetProtectedDataForSale;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();
        let now = self.context.now();

        let outcome = Workflow::new(op)
            .require("protected data in collection", preflight::in_collection)
            .require("protected data owned by user", |s: &ProtectedDataState| {
                preflight::owned_by(s, user)
            })
            .require("protected data not for rent", preflight::not_for_rent)
            .require("protected data not in subscription", preflight::not_in_subscription)
            .require("protected data not rented", |s: &ProtectedDataState| {
                preflight::not_rented(s, now)
            })
            .run(self.load_protected_data(protected_data), |_| {
                self.send(
                    op,
                    SharingCall::SetProtectedDataForSale {
                        protected_data,
                        price,
                    },
                )
            })
            .await?;
        Ok(outcome.into())
    }

    pub async fn remove_protected_data_for_sale(
        &self,
        protected_data: &str,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::RemoveProtectedDataForSale;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();

        let outcome = Workflow::new(op)
            .require("protected data in collection", preflight::in_collection)
            .require("protected data owned by user", |s: &ProtectedDataState| {
                preflight::owned_by(s, user)
            })
            .require("protected data for sale", preflight::for_sale)
            .run(self.load_protected_data(protected_data), |_| {
                self.send(op, SharingCall::RemoveProtectedDataForSale { protected_data })
            })
            .await?;
        Ok(outcome.into())
    }

    /// Buy a protected data for the user at its current sale price.
    pub async fn buy_protected_data(
        &self,
        protected_data: &str,
        price: u64,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::BuyProtectedData;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();

        let outcome = Workflow::new(op)
            .require(
                "protected data in collection",
                |s: &PaymentSnapshot<ProtectedDataState>| preflight::in_collection(&s.target),
            )
            .require(
                "protected data for sale",
                |s: &PaymentSnapshot<ProtectedDataState>| preflight::for_sale(&s.target),
            )
            .require(
                "sale price matches",
                |s: &PaymentSnapshot<ProtectedDataState>| {
                    preflight::sale_price_matches(&s.target, price)
                },
            )
            .require(
                "sufficient balance",
                |s: &PaymentSnapshot<ProtectedDataState>| {
                    preflight::sufficient_balance(&s.balance, price)
                },
            )
            .run(
                self.load_payment(preflight::load_protected_data(self.chain(), protected_data)),
                |s| async move {
                    self.approve_if_needed(op, s.allowance, price).await?;
                    self.send(
                        op,
                        SharingCall::BuyProtectedData {
                            protected_data,
                            to: user,
                            price,
                        },
                    )
                    .await
                },
            )
            .await?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub async fn set_subscription_params(
        &self,
        collection_id: u64,
        price: u64,
        duration: u64,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::SetSubscriptionParams;
        let collection_id = validators::positive_integer("collectionId", collection_id)?;
        let duration = validators::duration("duration", duration)?;
        let user = self.user();

        let outcome = Workflow::new(op)
            .require("collection exists", preflight::collection_exists)
            .require("collection owned by user", |s: &CollectionState| {
                preflight::collection_owned_by(s, user)
            })
            .run(self.load_collection(collection_id), |_| {
                self.send(
                    op,
                    SharingCall::SetSubscriptionParams {
                        collection_id,
                        price,
                        duration,
                    },
                )
            })
            .await?;
        Ok(outcome.into())
    }

    pub async fn set_protected_data_to_subscription(
        &self,
        protected_data: &str,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::SetProtectedDataToSubscription;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();

        let outcome = Workflow::new(op)
            .require("protected data in collection", preflight::in_collection)
            .require("protected data owned by user", |s: &ProtectedDataState| {
                preflight::owned_by(s, user)
            })
            .require("protected data not for sale", preflight::not_for_sale)
            .run(self.load_protected_data(protected_data), |_| {
                self.send(
                    op,
                    SharingCall::SetProtectedDataToSubscription { protected_data },
                )
            })
            .await?;
        Ok(outcome.into())
    }

    pub async fn remove_protected_data_from_subscription(
        &self,
        protected_data: &str,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::RemoveProtectedDataFromSubscription;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let user = self.user();
        let now = self.context.now();

        let outcome = Workflow::new(op)
            .require("protected data in collection", preflight::in_collection)
            .require("protected data owned by user", |s: &ProtectedDataState| {
                preflight::owned_by(s, user)
            })
            .require("protected data in subscription", preflight::in_subscription)
            .require(
                "collection has no ongoing subscription",
                |s: &ProtectedDataState| {
                    s.collection
                        .as_ref()
                        .map_or(Ok(()), |c| preflight::collection_not_subscribed(c, now))
                },
            )
            .run(self.load_protected_data(protected_data), |_| {
                self.send(
                    op,
                    SharingCall::RemoveProtectedDataFromSubscription { protected_data },
                )
            })
            .await?;
        Ok(outcome.into())
    }

    /// Subscribe to a collection on its current terms.
    pub async fn subscribe_to_collection(
        &self,
        collection_id: u64,
        price: u64,
        duration: u64,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::SubscribeToCollection;
        let collection_id = validators::positive_integer("collectionId", collection_id)?;
        let duration = validators::duration("duration", duration)?;

        let outcome = Workflow::new(op)
            .require("collection exists", |s: &PaymentSnapshot<CollectionState>| {
                preflight::collection_exists(&s.target)
            })
            .require(
                "subscription offered",
                |s: &PaymentSnapshot<CollectionState>| preflight::subscription_offered(&s.target),
            )
            .require(
                "subscription terms match",
                |s: &PaymentSnapshot<CollectionState>| {
                    preflight::subscription_terms_match(&s.target, price, duration)
                },
            )
            .require(
                "sufficient balance",
                |s: &PaymentSnapshot<CollectionState>| {
                    preflight::sufficient_balance(&s.balance, price)
                },
            )
            .run(
                self.load_payment(preflight::load_collection(self.chain(), collection_id)),
                |s| async move {
                    self.approve_if_needed(op, s.allowance, price).await?;
                    self.send(
                        op,
                        SharingCall::SubscribeToCollection {
                            collection_id,
                            price,
                            duration,
                        },
                    )
                    .await
                },
            )
            .await?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Consumption
    // =========================================================================

    /// Start a task on a rented or subscribed protected data. The deal is
    /// matched against the first affordable TEE workerpool order.
    pub async fn consume_protected_data(
        &self,
        params: &ConsumeProtectedDataParams,
    ) -> Result<ConsumeProtectedDataResponse, DataProtectorError> {
        let op = Operation::ConsumeProtectedData;
        let protected_data = validators::address_or_ens("protectedData", &params.protected_data)?;
        let app = validators::address_or_ens("app", &params.app)?;
        let workerpool = validators::address_or_ens(
            "workerpool",
            params
                .workerpool
                .as_deref()
                .unwrap_or(&self.context.config.default_workerpool),
        )?;
        let max_price = params.max_workerpool_price.unwrap_or(0);

        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;
        let app = self.resolve(op, "app", &app).await?;
        let workerpool = self.resolve(op, "workerpool", &workerpool).await?;
        let user = self.user();
        let sharing = self.sharing();
        let now = self.context.now();
        let chain = self.chain();
        let market = self.context.market.as_ref();

        let query = WorkerpoolOrderQuery {
            workerpool: Some(workerpool),
            app: Some(app),
            dataset: Some(protected_data),
            requester: Some(sharing),
            min_tag: Some(TEE_SCONE_TAG),
            category: Some(0),
            page_size: 0,
        };

        Workflow::new(op)
            .require("protected data in collection", |s: &ConsumeSnapshot| {
                preflight::in_collection(&s.protected_data)
            })
            .require("user has access", |s: &ConsumeSnapshot| {
                preflight::has_access(
                    &s.protected_data,
                    s.rental_expiration,
                    s.subscription_expiration,
                    now,
                )
            })
            .require("workerpool order available", |s: &ConsumeSnapshot| {
                preflight::workerpool_order_available(s.workerpool_order.is_some(), workerpool)
            })
            .run(
                async {
                    let state = preflight::load_protected_data(chain, protected_data).await?;
                    let subscription = async {
                        match state.details.collection_id {
                            Some(collection_id) => {
                                chain.subscription_expiration(collection_id, user).await
                            }
                            // outside a collection there is no subscription to read
                            None => Ok(0),
                        }
                    };
                    let (rental_expiration, subscription_expiration, orders) = futures::try_join!(
                        chain
                            .rental_expiration(protected_data, user)
                            .map_err(RemoteError::from),
                        subscription.map_err(RemoteError::from),
                        market.workerpool_orders(&query).map_err(RemoteError::from),
                    )?;
                    let workerpool_order = orders
                        .orders
                        .into_iter()
                        .map(|published| published.order)
                        .find(|order| order.workerpoolprice <= max_price);
                    Ok::<_, RemoteError>(ConsumeSnapshot {
                        protected_data: state,
                        rental_expiration,
                        subscription_expiration,
                        workerpool_order,
                    })
                },
                |s| async move {
                    let Some(workerpool_order) = s.workerpool_order else {
                        return Err(RemoteError::from(ChainError::MissingEvent(
                            "workerpool order".to_string(),
                        )));
                    };
                    let outcome = self
                        .send(
                            op,
                            SharingCall::ConsumeProtectedData {
                                protected_data,
                                workerpool_order,
                                app,
                            },
                        )
                        .await?;
                    let deal_id = events::consumed_deal_id(&outcome.logs, sharing).ok_or_else(
                        || ChainError::MissingEvent("ProtectedDataConsumed".to_string()),
                    )?;
                    let task_id = events::task_id(deal_id, 0);
                    info!(operation = %op, %deal_id, %task_id, "Protected data consumed");
                    Ok::<_, RemoteError>(ConsumeProtectedDataResponse {
                        tx_hash: outcome.tx_hash_hex(),
                        deal_id,
                        task_id,
                    })
                },
            )
            .await
    }

    // =========================================================================
    // App whitelists
    // =========================================================================

    pub async fn create_app_whitelist(
        &self,
    ) -> Result<CreateAppWhitelistResponse, DataProtectorError> {
        let op = Operation::CreateAppWhitelist;
        let user = self.user();
        let registry = self.context.config.contracts.app_whitelist_registry;
        let chain = self.chain();

        Workflow::<()>::new(op)
            .run(async { Ok::<_, RemoteError>(()) }, |_| async move {
                let outcome = chain.send_whitelist(WhitelistCall::Create { owner: user }).await?;
                let address = events::minted_app_whitelist(&outcome.logs, registry)
                    .ok_or_else(|| ChainError::MissingEvent("Transfer".to_string()))?;
                info!(operation = %op, app_whitelist = %address, "App whitelist created");
                Ok::<_, RemoteError>(CreateAppWhitelistResponse {
                    address,
                    tx_hash: outcome.tx_hash_hex(),
                })
            })
            .await
    }

    pub async fn add_app_to_app_whitelist(
        &self,
        app_whitelist: &str,
        app: &str,
    ) -> Result<SuccessWithTransactionHash, DataProtectorError> {
        let op = Operation::AddAppToAppWhitelist;
        let app_whitelist = validators::address("appWhitelist", app_whitelist)?;
        let app = validators::address_or_ens("app", app)?;

        let app = self.resolve(op, "app", &app).await?;
        let user = self.user();
        let chain = self.chain();

        let outcome = Workflow::new(op)
            .require("app whitelist owned by user", |owner: &Option<Address>| {
                preflight::app_whitelist_owned_by(app_whitelist, *owner, user)
            })
            .run(
                chain
                    .app_whitelist_owner(app_whitelist)
                    .map_err(RemoteError::from),
                |_| async move {
                    let outcome = chain
                        .send_whitelist(WhitelistCall::AddApp { app_whitelist, app })
                        .await?;
                    info!(operation = %op, %app_whitelist, %app, "App added to whitelist");
                    Ok::<_, RemoteError>(outcome)
                },
            )
            .await?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn chain(&self) -> &dyn ChainClient {
        self.context.chain.as_ref()
    }

    fn user(&self) -> Address {
        self.chain().signer_address()
    }

    fn sharing(&self) -> Address {
        self.context.config.contracts.sharing
    }

    async fn resolve(
        &self,
        op: Operation,
        field: &str,
        value: &AddressOrEns,
    ) -> Result<Address, DataProtectorError> {
        resolve::address(self.chain(), op, field, value).await
    }

    fn load_collection(
        &self,
        collection_id: u64,
    ) -> impl Future<Output = Result<CollectionState, RemoteError>> + '_ {
        preflight::load_collection(self.chain(), collection_id).map_err(RemoteError::from)
    }

    fn load_protected_data(
        &self,
        protected_data: Address,
    ) -> impl Future<Output = Result<ProtectedDataState, RemoteError>> + '_ {
        preflight::load_protected_data(self.chain(), protected_data).map_err(RemoteError::from)
    }

    /// Load `target` together with the user's account balance and allowance.
    async fn load_payment<T, F>(&self, target: F) -> Result<PaymentSnapshot<T>, RemoteError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        let chain = self.chain();
        let user = self.user();
        let (target, balance, allowance) = futures::try_join!(
            target,
            chain.account_balance(user),
            chain.account_allowance(user, self.sharing()),
        )?;
        Ok(PaymentSnapshot {
            target,
            balance,
            allowance,
        })
    }

    /// Allow the sharing contract to charge `price` when the allowance is short.
    async fn approve_if_needed(
        &self,
        op: Operation,
        allowance: U256,
        price: u64,
    ) -> Result<(), RemoteError> {
        let amount = U256::from(price);
        if amount <= allowance {
            return Ok(());
        }
        let outcome = self.chain().approve_account(self.sharing(), amount).await?;
        info!(operation = %op, %amount, tx_hash = %outcome.tx_hash, "Sharing contract approved");
        Ok(())
    }

    async fn send(&self, op: Operation, call: SharingCall) -> Result<TxOutcome, RemoteError> {
        let method = call.method();
        let outcome = self.chain().send_sharing(call).await?;
        info!(
            operation = %op,
            method,
            tx_hash = %outcome.tx_hash,
            block_number = ?outcome.block_number,
            "Sharing transaction confirmed"
        );
        Ok(outcome)
    }
}
