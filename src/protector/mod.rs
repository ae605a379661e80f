// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Core Namespace
//!
//! Protected data listing, access grants (dataset orders), ownership
//! transfer and task following.
//!
//! | Operation | Remote calls |
//! |-----------|--------------|
//! | `get_protected_data` | subgraph |
//! | `grant_access` | registry owner + orderbook (preflight), sign, market publish |
//! | `get_granted_access` | orderbook |
//! | `revoke_one_access` | hub `manageDatasetOrder` (close) |
//! | `revoke_all_access` | orderbook, then one close per order |
//! | `transfer_ownership` | registry `transferFrom` |
//! | `get_user_voucher` | voucher hub `getVoucher`, voucher views |
//! | `watch_task` / `wait_for_task_completion` | hub `viewTask` polling |

pub mod granted_access;
pub mod task;

use alloy::primitives::{Address, U256};
use futures::TryFutureExt;
use serde::Serialize;
use tracing::info;

pub use granted_access::{format_granted_access, GrantedAccess};
pub use task::{TaskEvent, TaskWatch};

use crate::blockchain::contracts::DatasetOrder;
use crate::blockchain::orders::{random_salt, TEE_SCONE_TAG};
use crate::blockchain::{ChainError, VoucherInfo};
use crate::context::{unix_now, DataProtectorContext};
use crate::error::{DataProtectorError, RemoteError};
use crate::market::{DatasetOrderQuery, MarketError, PublishedOrder};
use crate::subgraph::{self, Page, ProtectedData, ProtectedDataFilter};
use crate::validators::{self, AddressOrEns, MAX_PAGE_SIZE};
use crate::workflow::{failed, preflight, resolve, Operation, Workflow};

#[derive(Debug, Clone, Default)]
pub struct GetProtectedDataParams {
    pub owner: Option<String>,
    /// Schema entries (`path:type`) the protected data must contain
    pub required_schema: Vec<String>,
    pub creation_timestamp_gte: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct GrantAccessParams {
    pub protected_data: String,
    pub authorized_app: String,
    /// User address, ENS name or `any`
    pub authorized_user: String,
    /// nRLC per access, defaults to 0
    pub price_per_access: Option<u64>,
    /// Defaults to 1
    pub number_of_access: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct GetGrantedAccessParams {
    pub protected_data: Option<String>,
    pub authorized_app: Option<String>,
    pub authorized_user: Option<String>,
    /// Exclude accesses granted to `any` user
    pub is_user_strict: bool,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct RevokeAllAccessParams {
    pub protected_data: String,
    pub authorized_app: Option<String>,
    pub authorized_user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedAccessPage {
    pub count: u64,
    pub granted_access: Vec<GrantedAccess>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedAccess {
    pub access: GrantedAccess,
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub address: Address,
    pub to: Address,
    pub tx_hash: String,
}

/// `core` namespace of the SDK.
#[derive(Clone)]
pub struct DataProtectorCore {
    context: DataProtectorContext,
}

impl DataProtectorCore {
    pub fn new(context: DataProtectorContext) -> Self {
        Self { context }
    }

    pub async fn get_protected_data(
        &self,
        params: &GetProtectedDataParams,
    ) -> Result<Vec<ProtectedData>, DataProtectorError> {
        let op = Operation::GetProtectedData;
        let owner = optional(params.owner.as_deref(), |v| {
            validators::address_or_ens("owner", v)
        })?;
        let page = page(params.page, params.page_size)?;
        let required_schema = params
            .required_schema
            .iter()
            .map(|entry| validators::non_empty("requiredSchema", entry))
            .collect::<Result<Vec<_>, _>>()?;

        let owner = match owner {
            Some(owner) => Some(resolve::address(self.chain(), op, "owner", &owner).await?),
            None => None,
        };

        let filter = ProtectedDataFilter {
            owner,
            required_schema,
            creation_timestamp_gte: params.creation_timestamp_gte,
            page,
        };
        subgraph::protected_data(self.context.subgraph.as_ref(), &filter)
            .await
            .map_err(failed(op))
    }

    /// Sign and publish a dataset order authorizing `authorized_app` run by
    /// `authorized_user` to use the protected data.
    pub async fn grant_access(
        &self,
        params: &GrantAccessParams,
    ) -> Result<GrantedAccess, DataProtectorError> {
        let op = Operation::GrantAccess;
        let protected_data = validators::address_or_ens("protectedData", &params.protected_data)?;
        let app = validators::address_or_ens("authorizedApp", &params.authorized_app)?;
        let user = validators::address_or_any("authorizedUser", &params.authorized_user)?;
        let price = params.price_per_access.unwrap_or(0);
        let volume =
            validators::positive_integer("numberOfAccess", params.number_of_access.unwrap_or(1))?;

        let chain = self.chain();
        let market = self.context.market.as_ref();
        let protected_data = resolve::address(chain, op, "protectedData", &protected_data).await?;
        let app = resolve::address(chain, op, "authorizedApp", &app).await?;
        let user = resolve::restriction(chain, op, "authorizedUser", &user).await?;
        let signer = chain.signer_address();

        struct Snapshot {
            owner: Option<Address>,
            existing: u64,
        }

        let query = DatasetOrderQuery {
            dataset: Some(protected_data),
            app: Some(app),
            requester: Some(user),
            app_strict: true,
            requester_strict: true,
            page: 0,
            page_size: 0,
        };

        let signed = Workflow::new(op)
            .require("protected data owned by user", |s: &Snapshot| {
                preflight::dataset_owned_by(protected_data, s.owner, signer)
            })
            .require("access not already granted", |s: &Snapshot| {
                preflight::access_not_granted(s.existing)
            })
            .run(
                async {
                    let (owner, existing) = futures::try_join!(
                        chain.dataset_owner(protected_data).map_err(RemoteError::from),
                        market.dataset_orders(&query).map_err(RemoteError::from),
                    )?;
                    Ok::<_, RemoteError>(Snapshot {
                        owner,
                        existing: existing.count,
                    })
                },
                |_| async {
                    let order = DatasetOrder {
                        dataset: protected_data,
                        datasetprice: U256::from(price),
                        volume: U256::from(volume),
                        tag: TEE_SCONE_TAG,
                        apprestrict: app,
                        workerpoolrestrict: Address::ZERO,
                        requesterrestrict: user,
                        salt: random_salt(),
                    };
                    let signed = chain.sign_dataset_order(order).await?;
                    let order_hash = market.publish_dataset_order(&signed).await?;
                    info!(
                        operation = %op,
                        protected_data = %protected_data,
                        %order_hash,
                        "Dataset order published"
                    );
                    Ok::<_, RemoteError>(signed)
                },
            )
            .await?;

        Ok(format_granted_access(&signed, Some(volume))?)
    }

    pub async fn get_granted_access(
        &self,
        params: &GetGrantedAccessParams,
    ) -> Result<GrantedAccessPage, DataProtectorError> {
        let op = Operation::GetGrantedAccess;
        let protected_data = optional(params.protected_data.as_deref(), |v| {
            validators::address_or_ens("protectedData", v)
        })?;
        let app = optional(params.authorized_app.as_deref(), |v| {
            validators::address_or_ens("authorizedApp", v)
        })?;
        let user = optional(params.authorized_user.as_deref(), |v| {
            validators::address_or_ens("authorizedUser", v)
        })?;
        let page = page(params.page, params.page_size)?;

        let query = DatasetOrderQuery {
            dataset: self.resolve_optional(op, "protectedData", protected_data).await?,
            app: self.resolve_optional(op, "authorizedApp", app).await?,
            requester: self.resolve_optional(op, "authorizedUser", user).await?,
            app_strict: false,
            requester_strict: params.is_user_strict,
            page: page.page,
            page_size: page.page_size,
        };

        let orders = self
            .context
            .market
            .dataset_orders(&query)
            .await
            .map_err(failed(op))?;

        Ok(GrantedAccessPage {
            count: orders.count,
            granted_access: format_orders(op, &orders.orders)?,
        })
    }

    /// Close a granted access on chain.
    pub async fn revoke_one_access(
        &self,
        granted_access: &GrantedAccess,
    ) -> Result<RevokedAccess, DataProtectorError> {
        let op = Operation::RevokeOneAccess;
        let order = granted_access.to_order()?;

        let outcome = self
            .chain()
            .cancel_dataset_order(&order)
            .await
            .map_err(failed(op))?;
        info!(operation = %op, tx_hash = %outcome.tx_hash, "Granted access revoked");

        Ok(RevokedAccess {
            access: granted_access.clone(),
            tx_hash: outcome.tx_hash_hex(),
        })
    }

    /// Revoke every access matching the filter, one transaction at a time.
    pub async fn revoke_all_access(
        &self,
        params: &RevokeAllAccessParams,
    ) -> Result<Vec<RevokedAccess>, DataProtectorError> {
        let op = Operation::RevokeAllAccess;
        let protected_data = validators::address_or_ens("protectedData", &params.protected_data)?;
        let app = optional(params.authorized_app.as_deref(), |v| {
            validators::address_or_any("authorizedApp", v)
        })?;
        let user = optional(params.authorized_user.as_deref(), |v| {
            validators::address_or_any("authorizedUser", v)
        })?;

        let chain = self.chain();
        let protected_data = resolve::address(chain, op, "protectedData", &protected_data).await?;
        let app = match app {
            Some(app) => Some(resolve::restriction(chain, op, "authorizedApp", &app).await?),
            None => None,
        };
        let user = match user {
            Some(user) => Some(resolve::restriction(chain, op, "authorizedUser", &user).await?),
            None => None,
        };

        let mut query = DatasetOrderQuery {
            dataset: Some(protected_data),
            app,
            requester: user,
            app_strict: app.is_some(),
            requester_strict: user.is_some(),
            page: 0,
            page_size: MAX_PAGE_SIZE,
        };

        let mut granted = Vec::new();
        loop {
            let page = self
                .context
                .market
                .dataset_orders(&query)
                .await
                .map_err(failed(op))?;
            let fetched = page.orders.len();
            granted.extend(format_orders(op, &page.orders)?);
            if fetched == 0 || granted.len() as u64 >= page.count {
                break;
            }
            query.page += 1;
        }

        let mut revoked = Vec::with_capacity(granted.len());
        for access in granted {
            let order = access.to_order()?;
            let outcome = chain
                .cancel_dataset_order(&order)
                .await
                .map_err(failed(op))?;
            revoked.push(RevokedAccess {
                access,
                tx_hash: outcome.tx_hash_hex(),
            });
        }
        info!(operation = %op, count = revoked.len(), "Granted accesses revoked");
        Ok(revoked)
    }

    pub async fn transfer_ownership(
        &self,
        protected_data: &str,
        new_owner: &str,
    ) -> Result<TransferResponse, DataProtectorError> {
        let op = Operation::TransferOwnership;
        let protected_data = validators::address_or_ens("protectedData", protected_data)?;
        let new_owner = validators::address_or_ens("newOwner", new_owner)?;

        let chain = self.chain();
        let protected_data = resolve::address(chain, op, "protectedData", &protected_data).await?;
        let new_owner = resolve::address(chain, op, "newOwner", &new_owner).await?;

        let outcome = Workflow::<()>::new(op)
            .run(async { Ok::<_, RemoteError>(()) }, |_| async {
                chain
                    .transfer_dataset(protected_data, new_owner)
                    .await
                    .map_err(RemoteError::from)
            })
            .await?;
        info!(
            operation = %op,
            protected_data = %protected_data,
            to = %new_owner,
            tx_hash = %outcome.tx_hash,
            "Protected data ownership transferred"
        );

        Ok(TransferResponse {
            address: protected_data,
            to: new_owner,
            tx_hash: outcome.tx_hash_hex(),
        })
    }

    /// Voucher held by `owner`. Fails when the account has none.
    pub async fn get_user_voucher(&self, owner: &str) -> Result<VoucherInfo, DataProtectorError> {
        let op = Operation::GetUserVoucher;
        let owner = validators::address_or_ens("owner", owner)?;

        let chain = self.chain();
        let owner = resolve::address(chain, op, "owner", &owner).await?;
        chain
            .user_voucher(owner)
            .await
            .map_err(failed(op))?
            .ok_or_else(|| {
                failed(op)(ChainError::Reverted(format!("no voucher found for {owner}")))
            })
    }

    /// Start following a task. Events arrive on the returned [`TaskWatch`].
    pub fn watch_task(&self, task_id: &str) -> Result<TaskWatch, DataProtectorError> {
        let task_id = validators::bytes32("taskId", task_id)?;
        Ok(task::spawn(
            self.context.chain.clone(),
            task_id,
            self.context.config.task_poll_interval,
            unix_now,
        ))
    }

    /// Follow a task to its end. `on_status` sees every intermediate status
    /// change; the terminal event is returned.
    pub async fn wait_for_task_completion<F>(
        &self,
        task_id: &str,
        mut on_status: F,
    ) -> Result<TaskEvent, DataProtectorError>
    where
        F: FnMut(&TaskEvent),
    {
        let mut watch = self.watch_task(task_id)?;
        while let Some(event) = watch.next().await {
            let event = event?;
            if event.is_terminal() {
                return Ok(event);
            }
            on_status(&event);
        }
        Err(failed(Operation::WaitForTaskCompletion)(ChainError::MissingEvent(
            "task watcher stopped before a terminal status".to_string(),
        )))
    }

    fn chain(&self) -> &dyn crate::blockchain::ChainClient {
        self.context.chain.as_ref()
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

/// Validate an optional parameter.
pub(crate) fn optional<T, E>(
    value: Option<&str>,
    validate: impl FnOnce(&str) -> Result<T, E>,
) -> Result<Option<T>, E> {
    value.map(validate).transpose()
}

/// Validated page, defaulting to the first page of the maximum size.
pub(crate) fn page(page: Option<u32>, page_size: Option<u32>) -> Result<Page, DataProtectorError> {
    let page_size = validators::page_size("pageSize", page_size.unwrap_or(MAX_PAGE_SIZE))?;
    Ok(Page {
        page: page.unwrap_or(0),
        page_size,
    })
}

fn format_orders<T: Serialize>(
    op: Operation,
    orders: &[PublishedOrder<T>],
) -> Result<Vec<GrantedAccess>, DataProtectorError> {
    orders
        .iter()
        .map(|published| {
            format_granted_access(&published.order, Some(published.remaining))
                .map_err(|e| failed(op)(MarketError::Decode(e.to_string())))
        })
        .collect()
}
