use std::sync::Arc;

use anyhow::Context;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, H256},
};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::http_client::HttpClient;

pub const TRIGGER_TYPE_EVENT: &str = "event";

const DASHBOARD_BASE_URL: &str = "https://beta.app.gelato.network";

/// On-chain event condition that makes the network invoke the watcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub address: Address,
    pub topics: Vec<Vec<H256>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: String,
    pub filter: EventFilter,
    pub block_confirmations: u64,
}

/// Fixed configuration forwarded to every watcher invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserArgs {
    pub swapper_engine: Address,
    pub dao_collateral: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub name: String,
    pub web3_function_hash: String,
    pub web3_function_args: UserArgs,
    pub trigger: Trigger,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedCreateTaskRequest<'a> {
    #[serde(flatten)]
    payload: &'a CreateTaskPayload,
    creator: Address,
    signature: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResponse {
    pub task_id: String,
    pub tx_hash: H256,
}

/// Client for the automation network's task registration API. The network
/// owns task scheduling and execution, this client only registers the watcher
/// against it.
pub struct AutomateClient {
    http_client: Arc<HttpClient>,
    wallet: LocalWallet,
    chain_id: u64,
}

impl AutomateClient {
    pub fn new(http_client: Arc<HttpClient>, wallet: LocalWallet, chain_id: u64) -> Self {
        Self {
            http_client,
            wallet,
            chain_id,
        }
    }

    /// Registers the task, authenticating the request with an EIP-191
    /// signature of the canonical payload json.
    pub async fn create_task(
        &self,
        payload: &CreateTaskPayload,
    ) -> anyhow::Result<CreateTaskResponse> {
        let canonical =
            serde_json::to_string(payload).context("could not serialize task payload")?;
        let signature = self
            .wallet
            .sign_message(canonical.as_bytes())
            .await
            .context("could not sign task payload")?;
        let request = SignedCreateTaskRequest {
            payload,
            creator: self.wallet.address(),
            signature: format!("0x{signature}"),
        };

        let response = self
            .http_client
            .request(Method::POST, format!("/automate/{}/tasks", self.chain_id))
            .await?
            .json(&request)
            .send()
            .await
            .context("could not send task creation request")?
            .error_for_status()
            .context("task creation request was rejected")?;

        response
            .json::<CreateTaskResponse>()
            .await
            .context("could not deserialize task creation response")
    }

    pub fn dashboard_url(&self, task_id: &str) -> String {
        format!(
            "{}/task/{}?chainId={}",
            DASHBOARD_BASE_URL, task_id, self.chain_id
        )
    }
}
