// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory fakes of the remote seams. Every call is recorded so tests can
//! assert what was (and was not) sent.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{keccak256, Address, Bytes, Log, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::blockchain::contracts::{DatasetOrder, IDataProtectorSharing::ProtectedDataConsumed};
use crate::blockchain::events::TRANSFER_TOPIC;
use crate::blockchain::{
    orders, AccountBalance, ChainClient, ChainError, CollectionDetails, ProtectedDataDetails,
    SharingCall, SignedDatasetOrder, TaskView, TxOutcome, VoucherInfo, WhitelistCall,
    WorkerpoolOrder,
};
use crate::config::{DataProtectorConfig, Environment};
use crate::context::DataProtectorContext;
use crate::market::{
    DatasetOrderQuery, MarketError, Marketplace, OrderPage, PublishedOrder, WorkerpoolOrderQuery,
};
use crate::subgraph::{GraphQlTransport, SubgraphError};

pub const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// Deal id emitted by the fake `consumeProtectedData`.
pub const CONSUMED_DEAL: B256 = B256::repeat_byte(0xde);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

enum Failure {
    Reverted(String),
    Unreachable(String),
}

impl Failure {
    fn to_error(&self) -> ChainError {
        match self {
            Failure::Reverted(m) => ChainError::Reverted(m.clone()),
            Failure::Unreachable(m) => ChainError::Rpc(m.clone()),
        }
    }
}

#[derive(Default)]
struct ChainState {
    ens: HashMap<String, Address>,
    dataset_owners: HashMap<Address, Address>,
    dataset_approvals: HashMap<Address, Address>,
    balances: HashMap<Address, AccountBalance>,
    allowances: HashMap<(Address, Address), U256>,
    collections: HashMap<u64, (Address, CollectionDetails)>,
    protected_data: HashMap<Address, ProtectedDataDetails>,
    rentals: HashMap<(Address, Address), u64>,
    subscriptions: HashMap<(u64, Address), u64>,
    whitelists: HashMap<Address, Address>,
    vouchers: HashMap<Address, VoucherInfo>,
    tasks: HashMap<B256, VecDeque<TaskView>>,
    failures: HashMap<&'static str, Failure>,

    calls: Vec<&'static str>,
    sharing_calls: Vec<SharingCall>,
    whitelist_calls: Vec<WhitelistCall>,
    hub_approvals: Vec<(Address, U256)>,
    dataset_approves: Vec<(Address, Address)>,
    transfers: Vec<(Address, Address)>,
    cancelled: Vec<SignedDatasetOrder>,
    next_token: u64,
    tx_count: u64,
}

/// Fake [`ChainClient`].
pub struct MockChain {
    user: Address,
    config: DataProtectorConfig,
    signer: PrivateKeySigner,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new(user: Address) -> Self {
        Self {
            user,
            config: DataProtectorConfig::for_environment(Environment::Prod),
            signer: TEST_KEY.parse().unwrap(),
            state: Mutex::new(ChainState {
                next_token: 1,
                ..Default::default()
            }),
        }
    }

    pub fn add_ens(&self, name: &str, address: Address) {
        lock(&self.state).ens.insert(name.to_string(), address);
    }

    pub fn set_dataset_owner(&self, dataset: Address, owner: Address) {
        lock(&self.state).dataset_owners.insert(dataset, owner);
    }

    pub fn set_dataset_approval(&self, dataset: Address, spender: Address) {
        lock(&self.state).dataset_approvals.insert(dataset, spender);
    }

    pub fn set_balance(&self, account: Address, stake: u64) {
        lock(&self.state).balances.insert(
            account,
            AccountBalance {
                stake: U256::from(stake),
                locked: U256::ZERO,
            },
        );
    }

    pub fn set_allowance(&self, owner: Address, spender: Address, amount: u64) {
        lock(&self.state)
            .allowances
            .insert((owner, spender), U256::from(amount));
    }

    pub fn add_collection(&self, id: u64, owner: Address, details: CollectionDetails) {
        lock(&self.state).collections.insert(id, (owner, details));
    }

    pub fn set_protected_data(&self, protected_data: Address, details: ProtectedDataDetails) {
        lock(&self.state)
            .protected_data
            .insert(protected_data, details);
    }

    pub fn set_rental(&self, protected_data: Address, renter: Address, end: u64) {
        lock(&self.state)
            .rentals
            .insert((protected_data, renter), end);
    }

    pub fn set_subscription(&self, collection_id: u64, subscriber: Address, end: u64) {
        lock(&self.state)
            .subscriptions
            .insert((collection_id, subscriber), end);
    }

    pub fn add_whitelist(&self, whitelist: Address, owner: Address) {
        lock(&self.state).whitelists.insert(whitelist, owner);
    }

    pub fn set_voucher(&self, account: Address, voucher: VoucherInfo) {
        lock(&self.state).vouchers.insert(account, voucher);
    }

    /// Successive `view_task` answers; the last one repeats.
    pub fn push_task(&self, view: TaskView) {
        lock(&self.state)
            .tasks
            .entry(view.task_id)
            .or_default()
            .push_back(view);
    }

    /// Make `method` fail with a contract rejection.
    pub fn reject(&self, method: &'static str, message: &str) {
        lock(&self.state)
            .failures
            .insert(method, Failure::Reverted(message.to_string()));
    }

    /// Make `method` fail as if the node were down.
    pub fn unreachable(&self, method: &'static str) {
        lock(&self.state)
            .failures
            .insert(method, Failure::Unreachable("connection refused".to_string()));
    }

    pub fn heal(&self, method: &'static str) {
        lock(&self.state).failures.remove(method);
    }

    pub fn call_count(&self) -> usize {
        lock(&self.state).calls.len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.state).calls.clone()
    }

    pub fn sharing_calls(&self) -> Vec<SharingCall> {
        lock(&self.state).sharing_calls.clone()
    }

    pub fn whitelist_calls(&self) -> Vec<WhitelistCall> {
        lock(&self.state).whitelist_calls.clone()
    }

    pub fn hub_approvals(&self) -> Vec<(Address, U256)> {
        lock(&self.state).hub_approvals.clone()
    }

    pub fn dataset_approves(&self) -> Vec<(Address, Address)> {
        lock(&self.state).dataset_approves.clone()
    }

    pub fn transfers(&self) -> Vec<(Address, Address)> {
        lock(&self.state).transfers.clone()
    }

    pub fn cancelled(&self) -> Vec<SignedDatasetOrder> {
        lock(&self.state).cancelled.clone()
    }

    /// Record a call and return the configured failure, if any.
    fn enter(&self, method: &'static str) -> Result<MutexGuard<'_, ChainState>, ChainError> {
        let mut state = lock(&self.state);
        state.calls.push(method);
        match state.failures.get(method).map(Failure::to_error) {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }

    fn outcome(state: &mut ChainState, logs: Vec<Log>) -> TxOutcome {
        state.tx_count += 1;
        TxOutcome {
            tx_hash: keccak256(state.tx_count.to_be_bytes()),
            block_number: Some(state.tx_count),
            logs,
        }
    }

    fn mint_log(emitter: Address, to: Address, token_id: U256) -> Log {
        Log::new_unchecked(
            emitter,
            vec![
                TRANSFER_TOPIC,
                Address::ZERO.into_word(),
                to.into_word(),
                B256::from(token_id.to_be_bytes::<32>()),
            ],
            Bytes::new(),
        )
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn signer_address(&self) -> Address {
        self.user
    }

    async fn resolve_ens(&self, name: &str) -> Result<Option<Address>, ChainError> {
        let state = self.enter("resolve_ens")?;
        Ok(state.ens.get(name).copied())
    }

    async fn dataset_owner(&self, dataset: Address) -> Result<Option<Address>, ChainError> {
        let state = self.enter("dataset_owner")?;
        Ok(state.dataset_owners.get(&dataset).copied())
    }

    async fn dataset_approval(&self, dataset: Address) -> Result<Address, ChainError> {
        let state = self.enter("dataset_approval")?;
        Ok(state
            .dataset_approvals
            .get(&dataset)
            .copied()
            .unwrap_or_default())
    }

    async fn approve_dataset(
        &self,
        dataset: Address,
        spender: Address,
    ) -> Result<TxOutcome, ChainError> {
        let mut state = self.enter("approve_dataset")?;
        state.dataset_approves.push((dataset, spender));
        state.dataset_approvals.insert(dataset, spender);
        Ok(Self::outcome(&mut state, Vec::new()))
    }

    async fn transfer_dataset(
        &self,
        dataset: Address,
        to: Address,
    ) -> Result<TxOutcome, ChainError> {
        let mut state = self.enter("transfer_dataset")?;
        state.transfers.push((dataset, to));
        state.dataset_owners.insert(dataset, to);
        Ok(Self::outcome(&mut state, Vec::new()))
    }

    async fn account_balance(&self, account: Address) -> Result<AccountBalance, ChainError> {
        let state = self.enter("account_balance")?;
        Ok(state.balances.get(&account).copied().unwrap_or_default())
    }

    async fn account_allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        let state = self.enter("account_allowance")?;
        Ok(state
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn approve_account(
        &self,
        spender: Address,
        amount: U256,
    ) -> Result<TxOutcome, ChainError> {
        let mut state = self.enter("approve_account")?;
        state.hub_approvals.push((spender, amount));
        let user = self.user;
        state.allowances.insert((user, spender), amount);
        Ok(Self::outcome(&mut state, Vec::new()))
    }

    async fn sign_dataset_order(
        &self,
        order: DatasetOrder,
    ) -> Result<SignedDatasetOrder, ChainError> {
        drop(self.enter("sign_dataset_order")?);
        let domain = orders::order_domain(self.config.chain_id, self.config.contracts.hub);
        orders::sign_dataset_order(&self.signer, order, &domain).await
    }

    async fn cancel_dataset_order(
        &self,
        order: &SignedDatasetOrder,
    ) -> Result<TxOutcome, ChainError> {
        let mut state = self.enter("cancel_dataset_order")?;
        state.cancelled.push(order.clone());
        Ok(Self::outcome(&mut state, Vec::new()))
    }

    async fn view_task(&self, task_id: B256) -> Result<TaskView, ChainError> {
        let mut state = self.enter("view_task")?;
        let queue = state.tasks.get_mut(&task_id);
        let view = match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        view.ok_or_else(|| ChainError::Reverted(format!("unknown task {task_id}")))
    }

    async fn user_voucher(&self, account: Address) -> Result<Option<VoucherInfo>, ChainError> {
        let state = self.enter("user_voucher")?;
        Ok(state.vouchers.get(&account).cloned())
    }

    async fn collection_owner(&self, collection_id: u64) -> Result<Option<Address>, ChainError> {
        let state = self.enter("collection_owner")?;
        Ok(state.collections.get(&collection_id).map(|(owner, _)| *owner))
    }

    async fn collection_details(
        &self,
        collection_id: u64,
    ) -> Result<CollectionDetails, ChainError> {
        let state = self.enter("collection_details")?;
        Ok(state
            .collections
            .get(&collection_id)
            .map(|(_, details)| details.clone())
            .unwrap_or_default())
    }

    async fn protected_data_details(
        &self,
        protected_data: Address,
    ) -> Result<ProtectedDataDetails, ChainError> {
        let state = self.enter("protected_data_details")?;
        Ok(state
            .protected_data
            .get(&protected_data)
            .cloned()
            .unwrap_or_default())
    }

    async fn rental_expiration(
        &self,
        protected_data: Address,
        renter: Address,
    ) -> Result<u64, ChainError> {
        let state = self.enter("rental_expiration")?;
        Ok(state
            .rentals
            .get(&(protected_data, renter))
            .copied()
            .unwrap_or_default())
    }

    async fn subscription_expiration(
        &self,
        collection_id: u64,
        subscriber: Address,
    ) -> Result<u64, ChainError> {
        let state = self.enter("subscription_expiration")?;
        Ok(state
            .subscriptions
            .get(&(collection_id, subscriber))
            .copied()
            .unwrap_or_default())
    }

    async fn send_sharing(&self, call: SharingCall) -> Result<TxOutcome, ChainError> {
        let mut state = self.enter("send_sharing")?;
        state.sharing_calls.push(call.clone());

        let sharing = self.config.contracts.sharing;
        let logs = match call {
            SharingCall::CreateCollection { to } => {
                let id = state.next_token;
                state.next_token += 1;
                state
                    .collections
                    .insert(id, (to, CollectionDetails::default()));
                vec![Self::mint_log(sharing, to, U256::from(id))]
            }
            SharingCall::ConsumeProtectedData { protected_data, .. } => {
                let mut data = CONSUMED_DEAL.to_vec();
                data.extend_from_slice(protected_data.into_word().as_slice());
                data.extend_from_slice(&U256::from(1).to_be_bytes::<32>());
                vec![Log::new_unchecked(
                    sharing,
                    vec![ProtectedDataConsumed::SIGNATURE_HASH],
                    Bytes::from(data),
                )]
            }
            _ => Vec::new(),
        };
        Ok(Self::outcome(&mut state, logs))
    }

    async fn app_whitelist_owner(
        &self,
        app_whitelist: Address,
    ) -> Result<Option<Address>, ChainError> {
        let state = self.enter("app_whitelist_owner")?;
        Ok(state.whitelists.get(&app_whitelist).copied())
    }

    async fn send_whitelist(&self, call: WhitelistCall) -> Result<TxOutcome, ChainError> {
        let mut state = self.enter("send_whitelist")?;
        state.whitelist_calls.push(call.clone());

        let logs = match call {
            WhitelistCall::Create { owner } => {
                let whitelist = Address::repeat_byte(0xaa);
                state.whitelists.insert(whitelist, owner);
                let id = U256::from_be_slice(whitelist.as_slice());
                vec![Self::mint_log(
                    self.config.contracts.app_whitelist_registry,
                    owner,
                    id,
                )]
            }
            WhitelistCall::AddApp { .. } => Vec::new(),
        };
        Ok(Self::outcome(&mut state, logs))
    }
}

/// Fake [`GraphQlTransport`] answering with canned `data` fields.
#[derive(Default)]
pub struct MockSubgraph {
    responses: Mutex<Map<String, Value>>,
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockSubgraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `field` with `value` in every response.
    pub fn respond(&self, field: &str, value: Value) {
        lock(&self.responses).insert(field.to_string(), value);
    }

    pub fn unreachable(&self) {
        *lock(&self.failure) = Some("connection refused".to_string());
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl GraphQlTransport for MockSubgraph {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, SubgraphError> {
        lock(&self.calls).push((query.to_string(), variables));
        if let Some(message) = lock(&self.failure).clone() {
            return Err(SubgraphError::Http(message));
        }
        Ok(Value::Object(lock(&self.responses).clone()))
    }
}

/// Fake [`Marketplace`].
#[derive(Default)]
pub struct MockMarket {
    dataset_orders: Mutex<Vec<PublishedOrder<SignedDatasetOrder>>>,
    workerpool_orders: Mutex<Vec<PublishedOrder<WorkerpoolOrder>>>,
    published: Mutex<Vec<SignedDatasetOrder>>,
    queries: Mutex<Vec<DatasetOrderQuery>>,
    calls: Mutex<usize>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dataset_order(&self, order: SignedDatasetOrder, remaining: u64) {
        lock(&self.dataset_orders).push(PublishedOrder {
            order_hash: keccak256(&order.sign),
            order,
            remaining,
            status: "open".to_string(),
            publication_timestamp: None,
        });
    }

    pub fn add_workerpool_order(&self, order: WorkerpoolOrder) {
        lock(&self.workerpool_orders).push(PublishedOrder {
            order_hash: keccak256(&order.sign),
            order,
            remaining: 1,
            status: "open".to_string(),
            publication_timestamp: None,
        });
    }

    pub fn published(&self) -> Vec<SignedDatasetOrder> {
        lock(&self.published).clone()
    }

    pub fn dataset_queries(&self) -> Vec<DatasetOrderQuery> {
        lock(&self.queries).clone()
    }

    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl Marketplace for MockMarket {
    async fn dataset_orders(
        &self,
        query: &DatasetOrderQuery,
    ) -> Result<OrderPage<SignedDatasetOrder>, MarketError> {
        *lock(&self.calls) += 1;
        lock(&self.queries).push(query.clone());
        let orders: Vec<_> = lock(&self.dataset_orders)
            .iter()
            .filter(|o| query.dataset.is_none_or(|d| o.order.dataset == d))
            .filter(|o| query.app.is_none_or(|a| o.order.apprestrict == a))
            .filter(|o| query.requester.is_none_or(|r| o.order.requesterrestrict == r))
            .cloned()
            .collect();
        Ok(OrderPage {
            count: orders.len() as u64,
            orders,
        })
    }

    async fn workerpool_orders(
        &self,
        query: &WorkerpoolOrderQuery,
    ) -> Result<OrderPage<WorkerpoolOrder>, MarketError> {
        *lock(&self.calls) += 1;
        let orders: Vec<_> = lock(&self.workerpool_orders)
            .iter()
            .filter(|o| query.workerpool.is_none_or(|w| o.order.workerpool == w))
            .cloned()
            .collect();
        Ok(OrderPage {
            count: orders.len() as u64,
            orders,
        })
    }

    async fn publish_dataset_order(&self, order: &SignedDatasetOrder) -> Result<B256, MarketError> {
        *lock(&self.calls) += 1;
        lock(&self.published).push(order.clone());
        Ok(keccak256(&order.sign))
    }
}

/// Context wired to fresh fakes.
pub struct Harness {
    pub chain: Arc<MockChain>,
    pub subgraph: Arc<MockSubgraph>,
    pub market: Arc<MockMarket>,
    pub context: DataProtectorContext,
}

impl Harness {
    pub fn new(user: Address) -> Self {
        let chain = Arc::new(MockChain::new(user));
        let subgraph = Arc::new(MockSubgraph::new());
        let market = Arc::new(MockMarket::new());
        let mut config = DataProtectorConfig::for_environment(Environment::Prod);
        config.task_poll_interval = std::time::Duration::from_millis(10);
        let context = DataProtectorContext {
            config,
            chain: chain.clone(),
            subgraph: subgraph.clone(),
            market: market.clone(),
        };
        Self {
            chain,
            subgraph,
            market,
            context,
        }
    }

    /// No remote call of any kind was made.
    pub fn untouched(&self) -> bool {
        self.chain.call_count() == 0
            && self.subgraph.calls().is_empty()
            && self.market.call_count() == 0
    }
}
