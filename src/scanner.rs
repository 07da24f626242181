pub mod payload;

use std::sync::Arc;

use anyhow::Context;
use ethers::{
    abi::RawLog,
    contract::EthEvent,
    providers::Middleware,
    types::{Address, Bytes, Filter, U256},
};
use serde::{Deserialize, Serialize};

use crate::{
    commons::ScannerSettings,
    contracts::DepositFilter,
    scanner::payload::PayloadKind,
    storage::{Checkpoint, KeyValueStore},
};

// limit the block span of a single logs query to comply with rpc providers
pub const DEFAULT_MAX_RANGE: u64 = 1000;
// limit the number of queries per invocation to stay within the host's
// execution time budget
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

const APPROVAL_DEADLINE_SECONDS: u64 = 3600;

/// Immutable per-scanner configuration, injected at construction.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub swapper_engine: Address,
    pub dao_collateral: Address,
    pub rwa_token: Address,
    pub max_range: u64,
    pub max_requests: u32,
    pub payload: PayloadKind,
}

impl From<&ScannerSettings> for ScannerConfig {
    fn from(settings: &ScannerSettings) -> Self {
        Self {
            swapper_engine: settings.swapper_engine,
            dao_collateral: settings.dao_collateral,
            rwa_token: settings.rwa_token,
            max_range: settings.max_range.unwrap_or(DEFAULT_MAX_RANGE),
            max_requests: settings.max_requests.unwrap_or(DEFAULT_MAX_REQUESTS),
            payload: settings.payload,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    pub data: Bytes,
}

/// Outcome of one invocation, consumed immediately by the host network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionDecision {
    Skip { message: String },
    Execute { calls: Vec<Call> },
}

/// The `{canExec, message?, callData?}` wire shape the host network expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3FunctionResult {
    pub can_exec: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_data: Option<Vec<Call>>,
}

impl ExecutionDecision {
    pub fn to_result(&self) -> Web3FunctionResult {
        match self {
            ExecutionDecision::Skip { message } => Web3FunctionResult {
                can_exec: false,
                message: Some(message.clone()),
                call_data: None,
            },
            ExecutionDecision::Execute { calls } => Web3FunctionResult {
                can_exec: true,
                message: None,
                call_data: Some(calls.clone()),
            },
        }
    }
}

/// Incremental deposit log scanner. Fully re-entrant, all state between
/// invocations lives in the key-value store.
pub struct Scanner<M> {
    provider: Arc<M>,
    storage: Arc<dyn KeyValueStore>,
    config: ScannerConfig,
}

impl<M: Middleware> Scanner<M> {
    pub fn new(provider: Arc<M>, storage: Arc<dyn KeyValueStore>, config: ScannerConfig) -> Self {
        Self {
            provider,
            storage,
            config,
        }
    }

    /// Performs one watcher invocation: scan new blocks since the checkpoint,
    /// commit progress and decide whether a transaction should be submitted.
    pub async fn run(&self) -> anyhow::Result<ExecutionDecision> {
        let current_block = self
            .provider
            .get_block_number()
            .await
            .map_err(|error| anyhow::anyhow!("{error}"))
            .context("could not get current block number")?
            .as_u64();

        let mut checkpoint = Checkpoint::load(self.storage.as_ref(), current_block)
            .await
            .context("could not load checkpoint")?;
        tracing::info!("last processed block: {}", checkpoint.last_block_number);
        tracing::info!("total events matched: {}", checkpoint.total_events);

        let mut logs = Vec::new();
        let mut requests = 0u32;
        let mut last_block = checkpoint.last_block_number;
        while last_block < current_block && requests < self.config.max_requests {
            requests += 1;
            let from_block = last_block + 1;
            let to_block = (from_block + self.config.max_range).min(current_block);
            tracing::info!(
                "fetching log events from blocks {} to {}",
                from_block,
                to_block
            );

            let filter = Filter::new()
                .address(self.config.swapper_engine)
                .topic0(DepositFilter::signature())
                .from_block(from_block)
                .to_block(to_block);
            match self.provider.get_logs(&filter).await {
                Ok(batch) => {
                    logs.extend(batch);
                    last_block = to_block;
                }
                Err(error) => {
                    // the checkpoint is left untouched so the whole range
                    // scanned in this invocation is retried on the next one
                    return Ok(ExecutionDecision::Skip {
                        message: format!("Rpc call failed: {error}"),
                    });
                }
            }
        }

        let new_events = logs.len() as u64;
        tracing::info!("matched {} new events", new_events);

        // last decoded record wins, earlier matches are intentionally
        // overwritten
        let mut last_deposit: Option<DepositFilter> = None;
        for log in logs {
            let raw_log = RawLog {
                topics: log.topics,
                data: log.data.to_vec(),
            };
            match DepositFilter::decode_log(&raw_log) {
                Ok(deposit) => {
                    tracing::info!(
                        "event found: requester {:?}, order id {}, amount {}",
                        deposit.requester,
                        deposit.order_id,
                        deposit.amount
                    );
                    last_deposit = Some(deposit);
                }
                Err(error) => {
                    tracing::warn!("skipping log that does not decode as a deposit - {}", error)
                }
            }
        }

        // the checkpoint always advances to the observed head, even when the
        // request budget truncated the scan or no events were found
        checkpoint.last_block_number = current_block.max(checkpoint.last_block_number);
        checkpoint.total_events += new_events;
        checkpoint
            .commit(self.storage.as_ref())
            .await
            .context("could not commit checkpoint")?;

        let deposit = match last_deposit {
            Some(deposit) => deposit,
            None => {
                return Ok(ExecutionDecision::Skip {
                    message: format!(
                        "Total events matched: {} (at block #{})",
                        checkpoint.total_events, current_block
                    ),
                })
            }
        };

        let block = self
            .provider
            .get_block(current_block)
            .await
            .map_err(|error| anyhow::anyhow!("{error}"))
            .context(format!("could not get block {current_block}"))?
            .context(format!("no block returned for number {current_block}"))?;
        let deadline = block.timestamp + U256::from(APPROVAL_DEADLINE_SECONDS);

        let data = payload::build_call_data(self.config.payload, &self.config, &deposit, deadline);
        Ok(ExecutionDecision::Execute {
            calls: vec![Call {
                to: self.config.dao_collateral,
                data,
            }],
        })
    }
}
