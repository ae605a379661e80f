// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain client for the iExec DataProtector contracts.
//!
//! [`ChainClient`] is the single seam for every on-chain read and write the
//! SDK performs. [`AlloyChainClient`] implements it over an alloy HTTP
//! provider with a local signer; tests substitute an in-memory fake.

use alloy::{
    contract::SolCallBuilder,
    primitives::{
        aliases::{U40, U72},
        Address, B256, U256,
    },
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol_types::{Eip712Domain, SolCall},
};
use async_trait::async_trait;

use super::contracts::{
    DatasetOrder, IAppWhitelist, IAppWhitelistRegistry, IDataProtectorSharing, IDatasetRegistry,
    IENSRegistry, IENSResolver, IVoucher, IVoucherHub, IexecHub,
};
use super::ens::namehash;
use super::orders::{self, SignedDatasetOrder, WorkerpoolOrder};
use super::signing::wallet_from_signer;
use super::types::*;
use crate::config::{ContractAddresses, DataProtectorConfig};

/// Mutating calls on the sharing contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharingCall {
    CreateCollection {
        to: Address,
    },
    RemoveCollection {
        collection_id: u64,
    },
    AddProtectedDataToCollection {
        collection_id: u64,
        protected_data: Address,
        app_whitelist: Address,
    },
    RemoveProtectedDataFromCollection {
        protected_data: Address,
    },
    SetProtectedDataToRenting {
        protected_data: Address,
        price: u64,
        duration: u64,
    },
    RemoveProtectedDataFromRenting {
        protected_data: Address,
    },
    RentProtectedData {
        protected_data: Address,
        price: u64,
        duration: u64,
    },
    SetProtectedDataForSale {
        protected_data: Address,
        price: u64,
    },
    RemoveProtectedDataForSale {
        protected_data: Address,
    },
    BuyProtectedData {
        protected_data: Address,
        to: Address,
        price: u64,
    },
    SetSubscriptionParams {
        collection_id: u64,
        price: u64,
        duration: u64,
    },
    SetProtectedDataToSubscription {
        protected_data: Address,
    },
    RemoveProtectedDataFromSubscription {
        protected_data: Address,
    },
    SubscribeToCollection {
        collection_id: u64,
        price: u64,
        duration: u64,
    },
    ConsumeProtectedData {
        protected_data: Address,
        workerpool_order: WorkerpoolOrder,
        app: Address,
    },
}

impl SharingCall {
    /// Contract method name, for logs.
    pub fn method(&self) -> &'static str {
        match self {
            SharingCall::CreateCollection { .. } => "createCollection",
            SharingCall::RemoveCollection { .. } => "removeCollection",
            SharingCall::AddProtectedDataToCollection { .. } => "addProtectedDataToCollection",
            SharingCall::RemoveProtectedDataFromCollection { .. } => {
                "removeProtectedDataFromCollection"
            }
            SharingCall::SetProtectedDataToRenting { .. } => "setProtectedDataToRenting",
            SharingCall::RemoveProtectedDataFromRenting { .. } => "removeProtectedDataFromRenting",
            SharingCall::RentProtectedData { .. } => "rentProtectedData",
            SharingCall::SetProtectedDataForSale { .. } => "setProtectedDataForSale",
            SharingCall::RemoveProtectedDataForSale { .. } => "removeProtectedDataForSale",
            SharingCall::BuyProtectedData { .. } => "buyProtectedData",
            SharingCall::SetSubscriptionParams { .. } => "setSubscriptionParams",
            SharingCall::SetProtectedDataToSubscription { .. } => "setProtectedDataToSubscription",
            SharingCall::RemoveProtectedDataFromSubscription { .. } => {
                "removeProtectedDataFromSubscription"
            }
            SharingCall::SubscribeToCollection { .. } => "subscribeToCollection",
            SharingCall::ConsumeProtectedData { .. } => "consumeProtectedData",
        }
    }
}

/// Mutating calls on the app whitelist registry and whitelists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistCall {
    Create { owner: Address },
    AddApp { app_whitelist: Address, app: Address },
}

/// Every on-chain interaction of the SDK.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the account signing transactions and orders.
    fn signer_address(&self) -> Address;

    /// Resolve an ENS name. `Ok(None)` when the name has no address.
    async fn resolve_ens(&self, name: &str) -> Result<Option<Address>, ChainError>;

    // ---------------------------------------------------------------------
    // Dataset registry
    // ---------------------------------------------------------------------

    /// Owner of a protected data, `None` when it is not registered.
    async fn dataset_owner(&self, dataset: Address) -> Result<Option<Address>, ChainError>;

    /// Address approved to transfer the protected data.
    async fn dataset_approval(&self, dataset: Address) -> Result<Address, ChainError>;

    async fn approve_dataset(
        &self,
        dataset: Address,
        spender: Address,
    ) -> Result<TxOutcome, ChainError>;

    async fn transfer_dataset(&self, dataset: Address, to: Address)
        -> Result<TxOutcome, ChainError>;

    // ---------------------------------------------------------------------
    // PoCo hub
    // ---------------------------------------------------------------------

    async fn account_balance(&self, account: Address) -> Result<AccountBalance, ChainError>;

    async fn account_allowance(&self, owner: Address, spender: Address)
        -> Result<U256, ChainError>;

    /// Allow `spender` to move `amount` nRLC of the signer's account.
    async fn approve_account(&self, spender: Address, amount: U256)
        -> Result<TxOutcome, ChainError>;

    async fn sign_dataset_order(&self, order: DatasetOrder)
        -> Result<SignedDatasetOrder, ChainError>;

    /// Close a published dataset order on the hub.
    async fn cancel_dataset_order(
        &self,
        order: &SignedDatasetOrder,
    ) -> Result<TxOutcome, ChainError>;

    async fn view_task(&self, task_id: B256) -> Result<TaskView, ChainError>;

    // ---------------------------------------------------------------------
    // Voucher hub
    // ---------------------------------------------------------------------

    /// Voucher of `account`, `None` when it holds none or the network has
    /// no voucher hub.
    async fn user_voucher(&self, account: Address) -> Result<Option<VoucherInfo>, ChainError>;

    // ---------------------------------------------------------------------
    // Sharing contract
    // ---------------------------------------------------------------------

    /// Owner of a collection, `None` when the collection does not exist.
    async fn collection_owner(&self, collection_id: u64) -> Result<Option<Address>, ChainError>;

    async fn collection_details(&self, collection_id: u64)
        -> Result<CollectionDetails, ChainError>;

    async fn protected_data_details(
        &self,
        protected_data: Address,
    ) -> Result<ProtectedDataDetails, ChainError>;

    /// End of `renter`'s rental of a protected data (0 when never rented).
    async fn rental_expiration(
        &self,
        protected_data: Address,
        renter: Address,
    ) -> Result<u64, ChainError>;

    /// End of `subscriber`'s subscription to a collection (0 when never subscribed).
    async fn subscription_expiration(
        &self,
        collection_id: u64,
        subscriber: Address,
    ) -> Result<u64, ChainError>;

    async fn send_sharing(&self, call: SharingCall) -> Result<TxOutcome, ChainError>;

    // ---------------------------------------------------------------------
    // App whitelists
    // ---------------------------------------------------------------------

    /// Owner of an app whitelist, `None` when it does not exist.
    async fn app_whitelist_owner(&self, app_whitelist: Address)
        -> Result<Option<Address>, ChainError>;

    async fn send_whitelist(&self, call: WhitelistCall) -> Result<TxOutcome, ChainError>;
}

/// [`ChainClient`] over an alloy HTTP provider with a local signer.
pub struct AlloyChainClient {
    chain_id: u64,
    contracts: ContractAddresses,
    signer: PrivateKeySigner,
    provider: DynProvider,
}

impl AlloyChainClient {
    /// Create a client for the configured network.
    pub fn new(config: &DataProtectorConfig, signer: PrivateKeySigner) -> Result<Self, ChainError> {
        let url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .wallet(wallet_from_signer(signer.clone()))
            .connect_http(url)
            .erased();

        Ok(Self {
            chain_id: config.chain_id,
            contracts: config.contracts.clone(),
            signer,
            provider,
        })
    }

    fn domain(&self) -> Eip712Domain {
        orders::order_domain(self.chain_id, self.contracts.hub)
    }

    fn sharing(&self) -> IDataProtectorSharing::IDataProtectorSharingInstance<DynProvider> {
        IDataProtectorSharing::new(self.contracts.sharing, self.provider.clone())
    }

    fn registry(&self) -> IDatasetRegistry::IDatasetRegistryInstance<DynProvider> {
        IDatasetRegistry::new(self.contracts.dataset_registry, self.provider.clone())
    }

    fn hub(&self) -> IexecHub::IexecHubInstance<DynProvider> {
        IexecHub::new(self.contracts.hub, self.provider.clone())
    }

    fn whitelist_registry(&self) -> IAppWhitelistRegistry::IAppWhitelistRegistryInstance<DynProvider> {
        IAppWhitelistRegistry::new(self.contracts.app_whitelist_registry, self.provider.clone())
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn signer_address(&self) -> Address {
        self.signer.address()
    }

    async fn resolve_ens(&self, name: &str) -> Result<Option<Address>, ChainError> {
        let node = namehash(name);

        let registry = IENSRegistry::new(self.contracts.ens_registry, self.provider.clone());
        let resolver: Address = registry
            .resolver(node)
            .call()
            .await
            .map_err(contract_error)?;
        if resolver.is_zero() {
            return Ok(None);
        }

        let resolver = IENSResolver::new(resolver, self.provider.clone());
        let resolved: Address = resolver.addr(node).call().await.map_err(contract_error)?;
        Ok((!resolved.is_zero()).then_some(resolved))
    }

    async fn dataset_owner(&self, dataset: Address) -> Result<Option<Address>, ChainError> {
        let registry = self.registry();
        none_if_reverted(registry.ownerOf(token_id(dataset)).call().await)
    }

    async fn dataset_approval(&self, dataset: Address) -> Result<Address, ChainError> {
        let registry = self.registry();
        registry
            .getApproved(token_id(dataset))
            .call()
            .await
            .map_err(contract_error)
    }

    async fn approve_dataset(
        &self,
        dataset: Address,
        spender: Address,
    ) -> Result<TxOutcome, ChainError> {
        let registry = self.registry();
        confirm(registry.approve(spender, token_id(dataset))).await
    }

    async fn transfer_dataset(
        &self,
        dataset: Address,
        to: Address,
    ) -> Result<TxOutcome, ChainError> {
        let registry = self.registry();
        confirm(registry.transferFrom(self.signer.address(), to, token_id(dataset))).await
    }

    async fn account_balance(&self, account: Address) -> Result<AccountBalance, ChainError> {
        let hub = self.hub();
        let account = hub.viewAccount(account).call().await.map_err(contract_error)?;
        Ok(AccountBalance {
            stake: account.stake,
            locked: account.locked,
        })
    }

    async fn account_allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        let hub = self.hub();
        hub.allowance(owner, spender)
            .call()
            .await
            .map_err(contract_error)
    }

    async fn approve_account(
        &self,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ChainError> {
        let hub = self.hub();
        confirm(hub.approve(spender, amount)).await
    }

    async fn sign_dataset_order(
        &self,
        order: DatasetOrder,
    ) -> Result<SignedDatasetOrder, ChainError> {
        orders::sign_dataset_order(&self.signer, order, &self.domain()).await
    }

    async fn cancel_dataset_order(
        &self,
        order: &SignedDatasetOrder,
    ) -> Result<TxOutcome, ChainError> {
        let request = orders::sign_close_operation(&self.signer, order, &self.domain()).await?;
        let hub = self.hub();
        confirm(hub.manageDatasetOrder(request)).await
    }

    async fn view_task(&self, task_id: B256) -> Result<TaskView, ChainError> {
        let hub = self.hub();
        let task = hub.viewTask(task_id).call().await.map_err(contract_error)?;
        Ok(TaskView {
            task_id,
            deal_id: task.dealid,
            status: TaskStatus::from_chain(task.status),
            final_deadline: task.finalDeadline.saturating_to(),
            results: task.results,
        })
    }

    async fn user_voucher(&self, account: Address) -> Result<Option<VoucherInfo>, ChainError> {
        let Some(voucher_hub) = self.contracts.voucher_hub else {
            return Ok(None);
        };
        let voucher_hub = IVoucherHub::new(voucher_hub, self.provider.clone());
        let address: Address = voucher_hub
            .getVoucher(account)
            .call()
            .await
            .map_err(contract_error)?;
        if address.is_zero() {
            return Ok(None);
        }

        let voucher = IVoucher::new(address, self.provider.clone());
        let (voucher_type, balance, expiration) = futures::try_join!(
            async { voucher.getType().call().await.map_err(contract_error) },
            async { voucher.getBalance().call().await.map_err(contract_error) },
            async { voucher.getExpiration().call().await.map_err(contract_error) },
        )?;
        Ok(Some(VoucherInfo {
            address,
            voucher_type: voucher_type.saturating_to(),
            balance,
            expiration: expiration.saturating_to(),
        }))
    }

    async fn collection_owner(&self, collection_id: u64) -> Result<Option<Address>, ChainError> {
        let sharing = self.sharing();
        none_if_reverted(sharing.ownerOf(U256::from(collection_id)).call().await)
    }

    async fn collection_details(
        &self,
        collection_id: u64,
    ) -> Result<CollectionDetails, ChainError> {
        let sharing = self.sharing();
        let details = sharing
            .collectionDetails(U256::from(collection_id))
            .call()
            .await
            .map_err(contract_error)?;
        Ok(CollectionDetails {
            last_subscription_expiration: details.lastSubscriptionExpiration.to(),
            app_whitelist: details.appWhitelist,
            subscription: SubscriptionParams {
                price: details.subscriptionParams.price.saturating_to(),
                duration: details.subscriptionParams.duration.to(),
            },
        })
    }

    async fn protected_data_details(
        &self,
        protected_data: Address,
    ) -> Result<ProtectedDataDetails, ChainError> {
        let sharing = self.sharing();
        let details = sharing
            .protectedDataDetails(protected_data)
            .call()
            .await
            .map_err(contract_error)?;
        let collection: u64 = details.collection.saturating_to();
        Ok(ProtectedDataDetails {
            collection_id: (collection != 0).then_some(collection),
            last_rental_expiration: details.lastRentalExpiration.to(),
            in_subscription: details.inSubscription,
            renting: RentingParams {
                price: details.rentingParams.price.saturating_to(),
                duration: details.rentingParams.duration.to(),
            },
            for_sale: details.sellingParams.isForSale,
            sale_price: details.sellingParams.price.saturating_to(),
        })
    }

    async fn rental_expiration(
        &self,
        protected_data: Address,
        renter: Address,
    ) -> Result<u64, ChainError> {
        let sharing = self.sharing();
        sharing
            .getProtectedDataRenter(protected_data, renter)
            .call()
            .await
            .map(|expiration| expiration.to())
            .map_err(contract_error)
    }

    async fn subscription_expiration(
        &self,
        collection_id: u64,
        subscriber: Address,
    ) -> Result<u64, ChainError> {
        let sharing = self.sharing();
        sharing
            .getCollectionSubscriber(U256::from(collection_id), subscriber)
            .call()
            .await
            .map(|expiration| expiration.to())
            .map_err(contract_error)
    }

    async fn send_sharing(&self, call: SharingCall) -> Result<TxOutcome, ChainError> {
        tracing::debug!(method = call.method(), "Sending sharing contract transaction");
        let sharing = self.sharing();
        match call {
            SharingCall::CreateCollection { to } => confirm(sharing.createCollection(to)).await,
            SharingCall::RemoveCollection { collection_id } => {
                confirm(sharing.removeCollection(U256::from(collection_id))).await
            }
            SharingCall::AddProtectedDataToCollection {
                collection_id,
                protected_data,
                app_whitelist,
            } => {
                confirm(sharing.addProtectedDataToCollection(
                    U256::from(collection_id),
                    protected_data,
                    app_whitelist,
                ))
                .await
            }
            SharingCall::RemoveProtectedDataFromCollection { protected_data } => {
                confirm(sharing.removeProtectedDataFromCollection(protected_data)).await
            }
            SharingCall::SetProtectedDataToRenting {
                protected_data,
                price,
                duration,
            } => {
                confirm(sharing.setProtectedDataToRenting(
                    protected_data,
                    U72::from(price),
                    U40::from(duration),
                ))
                .await
            }
            SharingCall::RemoveProtectedDataFromRenting { protected_data } => {
                confirm(sharing.removeProtectedDataFromRenting(protected_data)).await
            }
            SharingCall::RentProtectedData {
                protected_data,
                price,
                duration,
            } => {
                let terms = IDataProtectorSharing::RentingParams {
                    price: U72::from(price),
                    duration: U40::from(duration),
                };
                confirm(sharing.rentProtectedData(protected_data, terms)).await
            }
            SharingCall::SetProtectedDataForSale {
                protected_data,
                price,
            } => {
                confirm(sharing.setProtectedDataForSale(protected_data, U72::from(price)))
                    .await
            }
            SharingCall::RemoveProtectedDataForSale { protected_data } => {
                confirm(sharing.removeProtectedDataForSale(protected_data)).await
            }
            SharingCall::BuyProtectedData {
                protected_data,
                to,
                price,
            } => {
                confirm(sharing.buyProtectedData(protected_data, to, U72::from(price))).await
            }
            SharingCall::SetSubscriptionParams {
                collection_id,
                price,
                duration,
            } => {
                let terms = IDataProtectorSharing::SubscriptionParams {
                    price: U72::from(price),
                    duration: U40::from(duration),
                };
                confirm(sharing.setSubscriptionParams(U256::from(collection_id), terms)).await
            }
            SharingCall::SetProtectedDataToSubscription { protected_data } => {
                confirm(sharing.setProtectedDataToSubscription(protected_data)).await
            }
            SharingCall::RemoveProtectedDataFromSubscription { protected_data } => {
                confirm(sharing.removeProtectedDataFromSubscription(protected_data)).await
            }
            SharingCall::SubscribeToCollection {
                collection_id,
                price,
                duration,
            } => {
                let terms = IDataProtectorSharing::SubscriptionParams {
                    price: U72::from(price),
                    duration: U40::from(duration),
                };
                confirm(sharing.subscribeToCollection(U256::from(collection_id), terms)).await
            }
            SharingCall::ConsumeProtectedData {
                protected_data,
                workerpool_order,
                app,
            } => {
                confirm(sharing.consumeProtectedData(
                    protected_data,
                    workerpool_order.to_abi(),
                    app,
                ))
                .await
            }
        }
    }

    async fn app_whitelist_owner(
        &self,
        app_whitelist: Address,
    ) -> Result<Option<Address>, ChainError> {
        let registry = self.whitelist_registry();
        none_if_reverted(registry.ownerOf(token_id(app_whitelist)).call().await)
    }

    async fn send_whitelist(&self, call: WhitelistCall) -> Result<TxOutcome, ChainError> {
        match call {
            WhitelistCall::Create { owner } => {
                let registry = self.whitelist_registry();
                confirm(registry.createAppWhitelist(owner)).await
            }
            WhitelistCall::AddApp { app_whitelist, app } => {
                let whitelist = IAppWhitelist::new(app_whitelist, self.provider.clone());
                confirm(whitelist.addApp(app)).await
            }
        }
    }
}

/// ERC-721 token id of a registry entry whose id is its contract address.
fn token_id(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

/// Send a contract call and wait for its receipt.
async fn confirm<P: Provider, C: SolCall>(
    call: SolCallBuilder<P, C>,
) -> Result<TxOutcome, ChainError> {
    let pending = call.send().await.map_err(contract_error)?;
    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| ChainError::Rpc(format!("Failed to get receipt: {e}")))?;

    let tx_hash = receipt.transaction_hash;
    if !receipt.status() {
        return Err(ChainError::TransactionFailed(format!(
            "transaction {tx_hash:#x} reverted"
        )));
    }

    Ok(TxOutcome {
        tx_hash,
        block_number: receipt.block_number,
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| log.inner.clone())
            .collect(),
    })
}

/// Classify a contract error: an error response from the node is a semantic
/// rejection, anything else means the node could not be reached.
fn contract_error(e: alloy::contract::Error) -> ChainError {
    match &e {
        alloy::contract::Error::TransportError(transport) if !transport.is_error_resp() => {
            ChainError::Rpc(e.to_string())
        }
        _ => ChainError::Reverted(e.to_string()),
    }
}

fn none_if_reverted(
    result: Result<Address, alloy::contract::Error>,
) -> Result<Option<Address>, ChainError> {
    match result {
        Ok(owner) => Ok(Some(owner)),
        Err(e) => match contract_error(e) {
            ChainError::Reverted(_) => Ok(None),
            other => Err(other),
        },
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract call rejected: {0}")]
    Reverted(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Expected event not found: {0}")]
    MissingEvent(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl ChainError {
    /// `true` when the chain node itself was unreachable.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, ChainError::Rpc(_))
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::config::Environment;

    #[test]
    fn token_id_is_address_as_integer() {
        let addr = address!("00000000000000000000000000000000000000ff");
        assert_eq!(token_id(addr), U256::from(255));
    }

    #[test]
    fn only_transport_failures_are_protocol_errors() {
        assert!(ChainError::Rpc("timeout".to_string()).is_protocol_error());
        assert!(!ChainError::Reverted("nope".to_string()).is_protocol_error());
        assert!(!ChainError::TransactionFailed("0x".to_string()).is_protocol_error());
    }

    #[test]
    fn client_rejects_bad_rpc_url() {
        let mut config = DataProtectorConfig::for_environment(Environment::Prod);
        config.rpc_url = "not a url".to_string();
        let signer = crate::blockchain::signing::signer_from_hex(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        assert!(matches!(
            AlloyChainClient::new(&config, signer),
            Err(ChainError::InvalidRpcUrl(_))
        ));
    }

    #[test]
    fn sharing_call_names_match_contract() {
        let pd = address!("1111111111111111111111111111111111111111");
        assert_eq!(
            SharingCall::RentProtectedData {
                protected_data: pd,
                price: 0,
                duration: 2000
            }
            .method(),
            "rentProtectedData"
        );
        assert_eq!(
            SharingCall::RemoveCollection { collection_id: 1 }.method(),
            "removeCollection"
        );
    }
}
