// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mapping of raw subgraph entities into SDK types.
//!
//! The subgraph serializes `BigInt` fields as decimal strings and token ids
//! as hex strings. Both are normalized to `u64` here. Activity flags
//! (`is_active`) are derived from end timestamps against the caller's `now`.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::SubgraphError;
use crate::blockchain::{RentingParams, SubscriptionParams};

// =============================================================================
// Raw entities
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct RawAccount {
    pub id: Address,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSchemaEntry {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTerms {
    #[serde(deserialize_with = "de_u64")]
    pub price: u64,
    #[serde(deserialize_with = "de_u64")]
    pub duration: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSaleParams {
    #[serde(deserialize_with = "de_u64")]
    pub price: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCollectionRef {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    pub owner: Option<RawAccount>,
    pub subscription_params: Option<RawTerms>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRental {
    pub renter: Address,
    pub protected_data: Option<RawProtectedDataRef>,
    #[serde(deserialize_with = "de_u64")]
    pub creation_timestamp: u64,
    #[serde(deserialize_with = "de_u64")]
    pub end_date: u64,
    pub rental_params: Option<RawTerms>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProtectedDataRef {
    pub id: Address,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSubscription {
    pub collection: Option<RawCollectionRef>,
    pub subscriber: RawAccount,
    #[serde(deserialize_with = "de_u64")]
    pub creation_timestamp: u64,
    #[serde(deserialize_with = "de_u64")]
    pub end_date: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawProtectedData {
    pub id: Address,
    #[serde(default)]
    pub name: Option<String>,
    pub owner: Option<RawAccount>,
    #[serde(default)]
    pub schema: Vec<RawSchemaEntry>,
    #[serde(deserialize_with = "de_u64")]
    pub creation_timestamp: u64,
    #[serde(default)]
    pub is_rentable: bool,
    #[serde(default)]
    pub is_included_in_subscription: bool,
    #[serde(default)]
    pub is_for_sale: bool,
    pub collection: Option<RawCollectionRef>,
    pub rental_params: Option<RawTerms>,
    pub sale_params: Option<RawSaleParams>,
    #[serde(default)]
    pub rentals: Vec<RawRental>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCollection {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    pub owner: RawAccount,
    #[serde(deserialize_with = "de_u64")]
    pub creation_timestamp: u64,
    pub subscription_params: Option<RawTerms>,
    #[serde(default)]
    pub protected_datas: Vec<RawProtectedData>,
    #[serde(default)]
    pub subscriptions: Vec<RawSubscription>,
}

// =============================================================================
// SDK shapes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedData {
    pub address: Address,
    pub name: String,
    pub owner: Address,
    /// Flattened schema: `path -> type`
    pub schema: BTreeMap<String, String>,
    pub creation_timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionProtectedData {
    pub address: Address,
    pub name: String,
    pub creation_timestamp: u64,
    pub is_rentable: bool,
    pub is_in_subscription: bool,
    pub is_for_sale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: u64,
    pub owner: Address,
    pub creation_timestamp: u64,
    pub subscription_params: Option<SubscriptionParams>,
    pub protected_data: Vec<CollectionProtectedData>,
    pub subscriptions: Vec<CollectionSubscription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSubscription {
    pub collection_id: Option<u64>,
    pub collection_owner: Option<Address>,
    pub subscriber: Address,
    pub creation_timestamp: u64,
    pub end_date: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedDataRental {
    pub protected_data: Option<Address>,
    pub protected_data_name: Option<String>,
    pub renter: Address,
    pub creation_timestamp: u64,
    pub end_date: u64,
    pub rental_params: Option<RentingParams>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedDataInCollection {
    pub address: Address,
    pub name: String,
    pub owner: Option<Address>,
    pub schema: BTreeMap<String, String>,
    pub creation_timestamp: u64,
    pub collection_id: Option<u64>,
    pub collection_owner: Option<Address>,
    pub is_rentable: bool,
    pub is_in_subscription: bool,
    pub is_for_sale: bool,
    pub rental_params: Option<RentingParams>,
    pub sale_price: Option<u64>,
    pub rentals: Vec<ProtectedDataRental>,
}

/// Monetization summary of a protected data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedDataPricing {
    pub address: Address,
    pub name: String,
    pub collection_id: Option<u64>,
    /// Rentable or included in a subscription at price 0
    pub is_free: bool,
    pub is_rentable: bool,
    pub is_in_subscription: bool,
    pub is_for_sale: bool,
    pub rental_params: Option<RentingParams>,
    pub subscription_params: Option<SubscriptionParams>,
    pub sale_price: Option<u64>,
}

// =============================================================================
// Adapters
// =============================================================================

/// Extract `data.<field>` as a list of `T`.
pub(crate) fn list<T: for<'de> Deserialize<'de>>(
    data: &Value,
    field: &str,
) -> Result<Vec<T>, SubgraphError> {
    let raw = data
        .get(field)
        .ok_or_else(|| SubgraphError::Decode(format!("missing `{field}` in response")))?;
    serde_json::from_value(raw.clone())
        .map_err(|e| SubgraphError::Decode(format!("invalid `{field}`: {e}")))
}

/// `["email:string", "user.age:f64"]` -> `{ "email": "string", "user.age": "f64" }`
pub fn flatten_schema<'a>(entries: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .filter_map(|entry| entry.split_once(':'))
        .map(|(path, kind)| (path.to_string(), kind.to_string()))
        .collect()
}

pub fn is_active(end_date: u64, now: u64) -> bool {
    end_date > now
}

fn renting(terms: Option<RawTerms>) -> Option<RentingParams> {
    terms.map(|t| RentingParams {
        price: t.price,
        duration: t.duration,
    })
}

fn subscription(terms: Option<RawTerms>) -> Option<SubscriptionParams> {
    terms.map(|t| SubscriptionParams {
        price: t.price,
        duration: t.duration,
    })
}

fn schema_of(entries: &[RawSchemaEntry]) -> BTreeMap<String, String> {
    flatten_schema(entries.iter().map(|e| e.id.as_str()))
}

pub(crate) fn protected_data(raw: RawProtectedData) -> Option<ProtectedData> {
    // entries without owner are mid-indexing, skip them
    let owner = raw.owner?.id;
    Some(ProtectedData {
        address: raw.id,
        name: raw.name.unwrap_or_default(),
        owner,
        schema: schema_of(&raw.schema),
        creation_timestamp: raw.creation_timestamp,
    })
}

pub(crate) fn rental(raw: RawRental, now: u64) -> ProtectedDataRental {
    let (protected_data, protected_data_name) = match raw.protected_data {
        Some(pd) => (Some(pd.id), pd.name),
        None => (None, None),
    };
    ProtectedDataRental {
        protected_data,
        protected_data_name,
        renter: raw.renter,
        creation_timestamp: raw.creation_timestamp,
        end_date: raw.end_date,
        rental_params: renting(raw.rental_params),
        is_active: is_active(raw.end_date, now),
    }
}

pub(crate) fn subscription_entry(raw: RawSubscription, now: u64) -> CollectionSubscription {
    let (collection_id, collection_owner) = match raw.collection {
        Some(c) => (Some(c.id), c.owner.map(|o| o.id)),
        None => (None, None),
    };
    CollectionSubscription {
        collection_id,
        collection_owner,
        subscriber: raw.subscriber.id,
        creation_timestamp: raw.creation_timestamp,
        end_date: raw.end_date,
        is_active: is_active(raw.end_date, now),
    }
}

pub(crate) fn collection(
    raw: RawCollection,
    include_hidden: bool,
    now: u64,
) -> Collection {
    let id = raw.id;
    let owner = raw.owner.id;
    Collection {
        id,
        owner,
        creation_timestamp: raw.creation_timestamp,
        subscription_params: subscription(raw.subscription_params),
        protected_data: raw
            .protected_datas
            .into_iter()
            .filter(|pd| include_hidden || pd.is_rentable || pd.is_included_in_subscription)
            .map(|pd| CollectionProtectedData {
                address: pd.id,
                name: pd.name.unwrap_or_default(),
                creation_timestamp: pd.creation_timestamp,
                is_rentable: pd.is_rentable,
                is_in_subscription: pd.is_included_in_subscription,
                is_for_sale: pd.is_for_sale,
            })
            .collect(),
        subscriptions: raw
            .subscriptions
            .into_iter()
            .map(|s| {
                let mut entry = subscription_entry(s, now);
                entry.collection_id.get_or_insert(id);
                entry.collection_owner.get_or_insert(owner);
                entry
            })
            .collect(),
    }
}

pub(crate) fn protected_data_in_collection(
    raw: RawProtectedData,
    now: u64,
) -> ProtectedDataInCollection {
    let (collection_id, collection_owner) = match &raw.collection {
        Some(c) => (Some(c.id), c.owner.as_ref().map(|o| o.id)),
        None => (None, None),
    };
    ProtectedDataInCollection {
        address: raw.id,
        name: raw.name.unwrap_or_default(),
        owner: raw.owner.map(|o| o.id),
        schema: schema_of(&raw.schema),
        creation_timestamp: raw.creation_timestamp,
        collection_id,
        collection_owner,
        is_rentable: raw.is_rentable,
        is_in_subscription: raw.is_included_in_subscription,
        is_for_sale: raw.is_for_sale,
        rental_params: renting(raw.rental_params),
        sale_price: raw.sale_params.map(|s| s.price),
        rentals: raw.rentals.into_iter().map(|r| rental(r, now)).collect(),
    }
}

pub(crate) fn pricing(raw: RawProtectedData) -> ProtectedDataPricing {
    let rental_params = renting(raw.rental_params);
    let subscription_params = raw
        .collection
        .as_ref()
        .and_then(|c| c.subscription_params.as_ref())
        .map(|t| SubscriptionParams {
            price: t.price,
            duration: t.duration,
        });

    let free_rental = raw.is_rentable && rental_params.is_some_and(|p| p.price == 0);
    let free_subscription =
        raw.is_included_in_subscription && subscription_params.is_some_and(|p| p.price == 0);

    ProtectedDataPricing {
        address: raw.id,
        name: raw.name.unwrap_or_default(),
        collection_id: raw.collection.map(|c| c.id),
        is_free: free_rental || free_subscription,
        is_rentable: raw.is_rentable,
        is_in_subscription: raw.is_included_in_subscription,
        is_for_sale: raw.is_for_sale,
        rental_params,
        subscription_params,
        sale_price: raw.sale_params.map(|s| s.price),
    }
}

/// Parse a subgraph numeric: JSON number, decimal string or `0x` hex string.
pub fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    }
}

fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    parse_u64(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an unsigned integer, got {value}")))
}
