// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DataProtector subgraph read layer.
//!
//! Read paths that need no transaction go through the subgraph indexer:
//! build a parameterized query, execute it over a [`GraphQlTransport`] and
//! adapt the raw entities into SDK types. Nothing here retries; a failed
//! request surfaces immediately as a [`SubgraphError`].

pub mod adapters;
pub mod queries;

use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::IgnoredAny, Deserialize};
use serde_json::{json, Value};

pub use adapters::{
    Collection, CollectionProtectedData, CollectionSubscription, ProtectedData,
    ProtectedDataInCollection, ProtectedDataPricing, ProtectedDataRental,
};
use queries::{address_key, collection_key, variables, Where};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on entities fetched by unpaginated reads.
const MAX_FIRST: u32 = 1000;

/// Executes GraphQL documents against the subgraph.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    /// Run `query` and return its `data` object.
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, SubgraphError>;
}

/// [`GraphQlTransport`] over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpSubgraphClient {
    http: Client,
    url: String,
}

impl HttpSubgraphClient {
    pub fn new(url: impl Into<String>) -> Result<Self, SubgraphError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SubgraphError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

#[async_trait]
impl GraphQlTransport for HttpSubgraphClient {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, SubgraphError> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| SubgraphError::Http(format!("POST {} failed: {e}", self.url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SubgraphError::Http(format!(
                "POST {} returned {status}: {body}",
                self.url
            )));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| SubgraphError::Decode(format!("invalid GraphQL response: {e}")))?;
        into_data(body)
    }
}

fn into_data(body: GraphQlResponse) -> Result<Value, SubgraphError> {
    if !body.errors.is_empty() {
        return Err(SubgraphError::Query(
            body.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    body.data
        .ok_or_else(|| SubgraphError::Decode("response has neither data nor errors".to_string()))
}

// =============================================================================
// Filters
// =============================================================================

/// Zero-based page of `page_size` entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn skip(&self) -> u32 {
        self.page.saturating_mul(self.page_size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: MAX_FIRST,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProtectedDataFilter {
    pub owner: Option<Address>,
    /// Schema entries (`path:type`) the protected data must contain
    pub required_schema: Vec<String>,
    pub creation_timestamp_gte: Option<u64>,
    pub page: Page,
}

#[derive(Debug, Clone, Default)]
pub struct ProtectedDataInCollectionsFilter {
    pub collection_id: Option<u64>,
    pub collection_owner: Option<Address>,
    pub protected_data: Option<Address>,
    pub is_rentable: Option<bool>,
    pub is_for_sale: Option<bool>,
    pub is_in_subscription: Option<bool>,
    pub creation_timestamp_gte: Option<u64>,
    pub page: Page,
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    pub collection_id: Option<u64>,
    pub subscriber: Option<Address>,
    pub include_past: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RentalFilter {
    pub protected_data: Option<Address>,
    pub renter: Option<Address>,
    pub include_past: bool,
}

// =============================================================================
// Typed reads
// =============================================================================

pub async fn protected_data(
    transport: &dyn GraphQlTransport,
    filter: &ProtectedDataFilter,
) -> Result<Vec<ProtectedData>, SubgraphError> {
    let mut filter_where = Where::new()
        .opt("owner", filter.owner.map(address_key))
        .opt(
            "creationTimestamp_gte",
            filter.creation_timestamp_gte.map(|t| t.to_string()),
        );
    if !filter.required_schema.is_empty() {
        filter_where = filter_where.eq("schema_contains", filter.required_schema.clone());
    }

    let data = transport
        .execute(
            queries::PROTECTED_DATA,
            variables(filter_where, filter.page.page_size, filter.page.skip()),
        )
        .await?;

    Ok(adapters::list(&data, "protectedDatas")?
        .into_iter()
        .filter_map(adapters::protected_data)
        .collect())
}

pub async fn collections_by_owner(
    transport: &dyn GraphQlTransport,
    owner: Address,
    include_hidden_protected_data: bool,
    now: u64,
) -> Result<Vec<Collection>, SubgraphError> {
    let data = transport
        .execute(
            queries::COLLECTIONS,
            variables(Where::new().eq("owner", address_key(owner)), MAX_FIRST, 0),
        )
        .await?;

    Ok(adapters::list(&data, "collections")?
        .into_iter()
        .map(|raw| adapters::collection(raw, include_hidden_protected_data, now))
        .collect())
}

pub async fn collection_subscriptions(
    transport: &dyn GraphQlTransport,
    filter: &SubscriptionFilter,
    now: u64,
) -> Result<Vec<CollectionSubscription>, SubgraphError> {
    let mut filter_where = Where::new()
        .opt("collection", filter.collection_id.map(collection_key))
        .opt("subscriber", filter.subscriber.map(address_key));
    if !filter.include_past {
        filter_where = filter_where.eq("endDate_gt", now.to_string());
    }

    let data = transport
        .execute(
            queries::COLLECTION_SUBSCRIPTIONS,
            variables(filter_where, MAX_FIRST, 0),
        )
        .await?;

    Ok(adapters::list(&data, "collectionSubscriptions")?
        .into_iter()
        .map(|raw| adapters::subscription_entry(raw, now))
        .collect())
}

pub async fn protected_data_rentals(
    transport: &dyn GraphQlTransport,
    filter: &RentalFilter,
    now: u64,
) -> Result<Vec<ProtectedDataRental>, SubgraphError> {
    let mut filter_where = Where::new()
        .opt("protectedData", filter.protected_data.map(address_key))
        .opt("renter", filter.renter.map(address_key));
    if !filter.include_past {
        filter_where = filter_where.eq("endDate_gt", now.to_string());
    }

    let data = transport
        .execute(
            queries::PROTECTED_DATA_RENTALS,
            variables(filter_where, MAX_FIRST, 0),
        )
        .await?;

    Ok(adapters::list(&data, "rentals")?
        .into_iter()
        .map(|raw| adapters::rental(raw, now))
        .collect())
}

fn in_collections_where(filter: &ProtectedDataInCollectionsFilter) -> Where {
    let collection = Where::new().opt("owner", filter.collection_owner.map(address_key));
    Where::new()
        .opt("id", filter.protected_data.map(address_key))
        .opt("collection", filter.collection_id.map(collection_key))
        .opt("isRentable", filter.is_rentable)
        .opt("isForSale", filter.is_for_sale)
        .opt("isIncludedInSubscription", filter.is_in_subscription)
        .opt(
            "creationTimestamp_gte",
            filter.creation_timestamp_gte.map(|t| t.to_string()),
        )
        // only protected data held by the sharing contract
        .opt(
            "collection_not",
            filter.collection_id.is_none().then_some(Value::Null),
        )
        .nested("collection", collection)
}

pub async fn protected_data_in_collections(
    transport: &dyn GraphQlTransport,
    filter: &ProtectedDataInCollectionsFilter,
    now: u64,
) -> Result<Vec<ProtectedDataInCollection>, SubgraphError> {
    let data = transport
        .execute(
            queries::PROTECTED_DATA_IN_COLLECTIONS,
            variables(
                in_collections_where(filter),
                filter.page.page_size,
                filter.page.skip(),
            ),
        )
        .await?;

    Ok(adapters::list(&data, "protectedDatas")?
        .into_iter()
        .map(|raw| adapters::protected_data_in_collection(raw, now))
        .collect())
}

/// Pricing of a single protected data, `None` when it is unknown to the subgraph.
pub async fn protected_data_pricing(
    transport: &dyn GraphQlTransport,
    protected_data: Address,
) -> Result<Option<ProtectedDataPricing>, SubgraphError> {
    let filter_where = Where::new().eq("id", address_key(protected_data));
    let data = transport
        .execute(
            queries::PROTECTED_DATA_IN_COLLECTIONS,
            variables(filter_where, 1, 0),
        )
        .await?;

    Ok(adapters::list(&data, "protectedDatas")?
        .into_iter()
        .next()
        .map(adapters::pricing))
}

/// Number of protected data currently held in a collection (capped at 1000).
pub async fn collection_protected_data_count(
    transport: &dyn GraphQlTransport,
    collection_id: u64,
) -> Result<usize, SubgraphError> {
    let filter_where = Where::new().eq("collection", collection_key(collection_id));
    let data = transport
        .execute(
            queries::COLLECTION_PROTECTED_DATA,
            variables(filter_where, MAX_FIRST, 0),
        )
        .await?;

    Ok(adapters::list::<IgnoredAny>(&data, "protectedDatas")?.len())
}

/// Errors from the subgraph layer.
#[derive(Debug, thiserror::Error)]
pub enum SubgraphError {
    #[error("Subgraph request failed: {0}")]
    Http(String),

    #[error("Subgraph query failed: {}", .0.join("; "))]
    Query(Vec<String>),

    #[error("Subgraph response was invalid: {0}")]
    Decode(String),
}

impl SubgraphError {
    /// `true` when the indexer could not be reached.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, SubgraphError::Http(_))
    }
}
