// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Subgraph-backed read operations of the sharing namespace.

use alloy::primitives::Address;

use super::DataProtectorSharing;
use crate::error::DataProtectorError;
use crate::protector::{optional, page};
use crate::subgraph::{
    self, Collection, CollectionSubscription, ProtectedDataInCollection,
    ProtectedDataInCollectionsFilter, ProtectedDataPricing, ProtectedDataRental, RentalFilter,
    SubscriptionFilter,
};
use crate::validators::{self, AddressOrEns};
use crate::workflow::{failed, resolve, Operation};

#[derive(Debug, Clone, Default)]
pub struct GetCollectionSubscriptionsParams {
    pub collection_id: Option<u64>,
    pub subscriber: Option<String>,
    pub include_past_subscriptions: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GetProtectedDataRentalsParams {
    pub protected_data: Option<String>,
    pub renter: Option<String>,
    pub include_past_rentals: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GetProtectedDataInCollectionsParams {
    pub collection_id: Option<u64>,
    pub collection_owner: Option<String>,
    pub protected_data: Option<String>,
    pub is_rentable: Option<bool>,
    pub is_for_sale: Option<bool>,
    pub is_in_subscription: Option<bool>,
    pub creation_timestamp_gte: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl DataProtectorSharing {
    /// Collections of `owner`. Protected data that is neither rentable, for
    /// sale nor in the subscription is hidden unless requested.
    pub async fn get_collections_by_owner(
        &self,
        owner: &str,
        include_hidden_protected_data: bool,
    ) -> Result<Vec<Collection>, DataProtectorError> {
        let op = Operation::GetCollectionsByOwner;
        let owner = validators::address_or_ens("owner", owner)?;
        let owner = self.resolve(op, "owner", &owner).await?;

        subgraph::collections_by_owner(
            self.context.subgraph.as_ref(),
            owner,
            include_hidden_protected_data,
            self.context.now(),
        )
        .await
        .map_err(failed(op))
    }

    pub async fn get_collection_subscriptions(
        &self,
        params: &GetCollectionSubscriptionsParams,
    ) -> Result<Vec<CollectionSubscription>, DataProtectorError> {
        let op = Operation::GetCollectionSubscriptions;
        let collection_id = params
            .collection_id
            .map(|id| validators::positive_integer("collectionId", id))
            .transpose()?;
        let subscriber = optional(params.subscriber.as_deref(), |v| {
            validators::address_or_ens("subscriber", v)
        })?;

        let filter = SubscriptionFilter {
            collection_id,
            subscriber: self.resolve_optional(op, "subscriber", subscriber).await?,
            include_past: params.include_past_subscriptions,
        };
        subgraph::collection_subscriptions(
            self.context.subgraph.as_ref(),
            &filter,
            self.context.now(),
        )
        .await
        .map_err(failed(op))
    }

    pub async fn get_protected_data_rentals(
        &self,
        params: &GetProtectedDataRentalsParams,
    ) -> Result<Vec<ProtectedDataRental>, DataProtectorError> {
        let op = Operation::GetProtectedDataRentals;
        let protected_data = optional(params.protected_data.as_deref(), |v| {
            validators::address_or_ens("protectedData", v)
        })?;
        let renter = optional(params.renter.as_deref(), |v| {
            validators::address_or_ens("renter", v)
        })?;

        let filter = RentalFilter {
            protected_data: self
                .resolve_optional(op, "protectedData", protected_data)
                .await?,
            renter: self.resolve_optional(op, "renter", renter).await?,
            include_past: params.include_past_rentals,
        };
        subgraph::protected_data_rentals(self.context.subgraph.as_ref(), &filter, self.context.now())
            .await
            .map_err(failed(op))
    }

    pub async fn get_protected_data_in_collections(
        &self,
        params: &GetProtectedDataInCollectionsParams,
    ) -> Result<Vec<ProtectedDataInCollection>, DataProtectorError> {
        let op = Operation::GetProtectedDataInCollections;
        let collection_id = params
            .collection_id
            .map(|id| validators::positive_integer("collectionId", id))
            .transpose()?;
        let collection_owner = optional(params.collection_owner.as_deref(), |v| {
            validators::address_or_ens("collectionOwner", v)
        })?;
        let protected_data = optional(params.protected_data.as_deref(), |v| {
            validators::address_or_ens("protectedData", v)
        })?;
        let page = page(params.page, params.page_size)?;

        let filter = ProtectedDataInCollectionsFilter {
            collection_id,
            collection_owner: self
                .resolve_optional(op, "collectionOwner", collection_owner)
                .await?,
            protected_data: self
                .resolve_optional(op, "protectedData", protected_data)
                .await?,
            is_rentable: params.is_rentable,
            is_for_sale: params.is_for_sale,
            is_in_subscription: params.is_in_subscription,
            creation_timestamp_gte: params.creation_timestamp_gte,
            page,
        };
        subgraph::protected_data_in_collections(
            self.context.subgraph.as_ref(),
            &filter,
            self.context.now(),
        )
        .await
        .map_err(failed(op))
    }

    /// Commercial terms of a protected data. `None` when the subgraph does
    /// not know it.
    pub async fn get_protected_data_pricing_params(
        &self,
        protected_data: &str,
    ) -> Result<Option<ProtectedDataPricing>, DataProtectorError> {
        let op = Operation::GetProtectedDataPricingParams;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;
        let protected_data = self.resolve(op, "protectedData", &protected_data).await?;

        subgraph::protected_data_pricing(self.context.subgraph.as_ref(), protected_data)
            .await
            .map_err(failed(op))
    }

    async fn resolve_optional(
        &self,
        op: Operation,
        field: &str,
        value: Option<AddressOrEns>,
    ) -> Result<Option<Address>, DataProtectorError> {
        match value {
            Some(value) => Ok(Some(resolve::address(self.chain(), op, field, &value).await?)),
            None => Ok(None),
        }
    }
}
