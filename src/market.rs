// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! iExec market API (orderbook).
//!
//! Granted accesses are dataset orders published on the market; consuming a
//! protected data needs a matching workerpool order from the same orderbook.
//!
//! Publishing requires authentication: the market hands out a challenge
//! (`GET /challenge`) which is signed as EIP-712 typed data and sent back as
//! `authorization: <hash>_<signature>_<address>`.

use std::borrow::Cow;
use std::time::Duration;

use alloy::{
    primitives::{Address, B256, U256},
    signers::{local::PrivateKeySigner, Signer},
    sol_types::{Eip712Domain, SolStruct},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::blockchain::contracts::Challenge;
use crate::blockchain::{SignedDatasetOrder, WorkerpoolOrder};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CHALLENGE_DOMAIN_NAME: &str = "iExec Gateway";
const CHALLENGE_DOMAIN_VERSION: &str = "1";

/// Dataset orderbook filter. `None` restrictions match any value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetOrderQuery {
    pub dataset: Option<Address>,
    pub app: Option<Address>,
    pub requester: Option<Address>,
    /// Only orders restricted to exactly `app` (no wildcard orders)
    pub app_strict: bool,
    pub requester_strict: bool,
    pub page: u32,
    pub page_size: u32,
}

/// Workerpool orderbook filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerpoolOrderQuery {
    pub workerpool: Option<Address>,
    pub app: Option<Address>,
    pub dataset: Option<Address>,
    pub requester: Option<Address>,
    pub min_tag: Option<B256>,
    pub category: Option<u64>,
    pub page_size: u32,
}

/// An order as listed by the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedOrder<T> {
    pub order_hash: B256,
    pub order: T,
    /// Volume not yet consumed
    #[serde(default)]
    pub remaining: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub publication_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPage<T> {
    /// Total matching orders (all pages)
    pub count: u64,
    pub orders: Vec<PublishedOrder<T>>,
}

/// Read and publish orders on the iExec market.
#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn dataset_orders(
        &self,
        query: &DatasetOrderQuery,
    ) -> Result<OrderPage<SignedDatasetOrder>, MarketError>;

    async fn workerpool_orders(
        &self,
        query: &WorkerpoolOrderQuery,
    ) -> Result<OrderPage<WorkerpoolOrder>, MarketError>;

    /// Publish a signed dataset order and return its order hash.
    async fn publish_dataset_order(&self, order: &SignedDatasetOrder) -> Result<B256, MarketError>;
}

/// [`Marketplace`] over the market REST API.
#[derive(Debug, Clone)]
pub struct MarketApiClient {
    http: Client,
    base_url: String,
    chain_id: u64,
    signer: PrivateKeySigner,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse<T> {
    #[serde(default)]
    count: u64,
    #[serde(default = "Vec::new")]
    orders: Vec<PublishedOrder<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    published: Published,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Published {
    order_hash: B256,
}

#[derive(Debug, Deserialize)]
struct ChallengeResponse {
    data: ChallengeTypedData,
}

#[derive(Debug, Deserialize)]
struct ChallengeTypedData {
    message: ChallengeMessage,
}

#[derive(Debug, Deserialize)]
struct ChallengeMessage {
    challenge: String,
}

impl MarketApiClient {
    pub fn new(
        base_url: impl Into<String>,
        chain_id: u64,
        signer: PrivateKeySigner,
    ) -> Result<Self, MarketError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MarketError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chain_id,
            signer,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, MarketError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .send()
            .await
            .map_err(|e| MarketError::Http(format!("GET {path} failed: {e}")))?;

        read_body(path, response).await
    }

    async fn authorization(&self) -> Result<String, MarketError> {
        let challenge: ChallengeResponse = self
            .get_json(
                "/challenge",
                &[
                    ("chainId", self.chain_id.to_string()),
                    ("address", format!("{:#x}", self.signer.address())),
                ],
            )
            .await?;

        authorization_header(&self.signer, self.chain_id, challenge.data.message.challenge).await
    }
}

#[async_trait]
impl Marketplace for MarketApiClient {
    async fn dataset_orders(
        &self,
        query: &DatasetOrderQuery,
    ) -> Result<OrderPage<SignedDatasetOrder>, MarketError> {
        let params = dataset_order_params(self.chain_id, query);
        let response: OrdersResponse<SignedDatasetOrder> =
            self.get_json("/datasetorders", &params).await?;
        debug!(count = response.count, "Fetched dataset orders");
        Ok(OrderPage {
            count: response.count,
            orders: response.orders,
        })
    }

    async fn workerpool_orders(
        &self,
        query: &WorkerpoolOrderQuery,
    ) -> Result<OrderPage<WorkerpoolOrder>, MarketError> {
        let params = workerpool_order_params(self.chain_id, query);
        let response: OrdersResponse<WorkerpoolOrder> =
            self.get_json("/workerpoolorders", &params).await?;
        Ok(OrderPage {
            count: response.count,
            orders: response.orders,
        })
    }

    async fn publish_dataset_order(&self, order: &SignedDatasetOrder) -> Result<B256, MarketError> {
        let authorization = self.authorization().await?;
        let path = "/datasetorders";
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .query(&[("chainId", self.chain_id.to_string())])
            .header("authorization", authorization)
            .json(&json!({ "order": order }))
            .send()
            .await
            .map_err(|e| MarketError::Http(format!("POST {path} failed: {e}")))?;

        let published: PublishResponse = read_body(path, response).await?;
        Ok(published.published.order_hash)
    }
}

/// Decode a market response. The API answers `{ ok: false, error }` for
/// rejected requests, sometimes with a success status code.
async fn read_body<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, MarketError> {
    let status = response.status();
    if status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(MarketError::Http(format!(
            "{path} returned {status}: {body}"
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| MarketError::Decode(format!("{path} invalid JSON: {e}")))?;
    decode_body(path, body)
}

fn decode_body<T: DeserializeOwned>(path: &str, body: Value) -> Result<T, MarketError> {
    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(MarketError::Rejected(message));
    }
    serde_json::from_value(body).map_err(|e| MarketError::Decode(format!("{path}: {e}")))
}

fn dataset_order_params(chain_id: u64, query: &DatasetOrderQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("chainId", chain_id.to_string())];
    if let Some(dataset) = query.dataset {
        params.push(("dataset", format!("{dataset:#x}")));
    }
    if let Some(app) = query.app {
        params.push(("app", format!("{app:#x}")));
        params.push(("isAppStrict", query.app_strict.to_string()));
    }
    if let Some(requester) = query.requester {
        params.push(("requester", format!("{requester:#x}")));
        params.push(("isRequesterStrict", query.requester_strict.to_string()));
    }
    if query.page_size > 0 {
        params.push(("pageIndex", query.page.to_string()));
        params.push(("pageSize", query.page_size.to_string()));
    }
    params
}

fn workerpool_order_params(
    chain_id: u64,
    query: &WorkerpoolOrderQuery,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("chainId", chain_id.to_string())];
    let addresses = [
        ("workerpool", query.workerpool),
        ("app", query.app),
        ("dataset", query.dataset),
        ("requester", query.requester),
    ];
    for (key, value) in addresses {
        if let Some(address) = value {
            params.push((key, format!("{address:#x}")));
        }
    }
    if let Some(tag) = query.min_tag {
        params.push(("minTag", format!("{tag:#x}")));
    }
    if let Some(category) = query.category {
        params.push(("category", category.to_string()));
    }
    if query.page_size > 0 {
        params.push(("pageSize", query.page_size.to_string()));
    }
    params
}

/// `<hash>_<signature>_<address>` for a market challenge.
async fn authorization_header(
    signer: &PrivateKeySigner,
    chain_id: u64,
    challenge: String,
) -> Result<String, MarketError> {
    let domain = Eip712Domain::new(
        Some(Cow::Borrowed(CHALLENGE_DOMAIN_NAME)),
        Some(Cow::Borrowed(CHALLENGE_DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        None,
        None,
    );
    let hash = Challenge { challenge }.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| MarketError::Signing(e.to_string()))?;

    Ok(format!(
        "{hash:#x}_{}_{:#x}",
        alloy::hex::encode_prefixed(signature.as_bytes()),
        signer.address()
    ))
}

/// Errors from the market API.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Market request failed: {0}")]
    Http(String),

    #[error("Market rejected the request: {0}")]
    Rejected(String),

    #[error("Market response was invalid: {0}")]
    Decode(String),

    #[error("Market authentication failed: {0}")]
    Signing(String),
}

impl MarketError {
    /// `true` when the market API could not be reached.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, MarketError::Http(_))
    }
}
