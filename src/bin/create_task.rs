use std::{env, num::NonZeroU32, path::Path, process::exit, sync::Arc};

use anyhow::Context;
use ethers::{
    providers::{Http, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use governor::{Quota, RateLimiter};
use swapper_engine_watcher::{
    automate::{
        AutomateClient, CreateTaskPayload, EventFilter, Trigger, UserArgs, TRIGGER_TYPE_EVENT,
    },
    http_client::HttpClient,
    ipfs, telemetry,
};

const TASK_NAME: &str = "swapper-engine-watcher";
const BUNDLE_PATH: &str = "web3-functions/swapper-engine/index.js";

const DEFAULT_IPFS_API_ENDPOINT: &str = "http://127.0.0.1:5001";
const DEFAULT_AUTOMATE_API_ENDPOINT: &str = "https://api.gelato.digital";
const MAX_CALLS_PER_SECOND_AUTOMATE: u32 = 1;

// fixed task configuration from the production deployment
const SWAPPER_ENGINE_ADDRESS: &str = "0x71B9B0F6C999CBbB0FeF9c92B80D54e4973214da";
const DAO_COLLATERAL_ADDRESS: &str = "0x8F143A5D62de01EAdAF9ef16d4d3694380066D9F";
const TRIGGER_ADDRESS: &str = "0xB969B0d14F7682bAF37ba7c364b351B830a812B2";
const TRIGGER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f1638bdbf32b18aa9e2a072b04";
const TRIGGER_BLOCK_CONFIRMATIONS: u64 = 12;

#[tokio::main]
async fn main() {
    if let Err(error) = telemetry::init().context("could not initialize logging system") {
        tracing::error!("{:#}", error);
        exit(1);
    }

    if let Err(error) = run().await {
        tracing::error!("{:#}", error);
        exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let private_key = env::var("PRIVATE_KEY").context("missing env PRIVATE_KEY")?;
    let provider_urls = env::var("PROVIDER_URLS").context("missing env PROVIDER_URLS")?;
    let provider_url = provider_urls
        .split(',')
        .next()
        .context("PROVIDER_URLS is empty")?;

    let provider =
        Provider::<Http>::try_from(provider_url).context("could not create rpc provider")?;
    let chain_id = provider
        .get_chainid()
        .await
        .context("could not get chain id from provider")?
        .as_u64();
    let wallet = private_key
        .parse::<LocalWallet>()
        .context("could not parse private key to local wallet")?
        .with_chain_id(chain_id);

    tracing::info!("publishing function bundle on ipfs");
    let ipfs_api_endpoint =
        env::var("IPFS_API_ENDPOINT").unwrap_or_else(|_| DEFAULT_IPFS_API_ENDPOINT.to_owned());
    let ipfs_http_client = Arc::new(
        HttpClient::builder()
            .base_url(ipfs_api_endpoint)
            .build()
            .context("could not build ipfs http client")?,
    );
    let cid = ipfs::publish_bundle(ipfs_http_client, Path::new(BUNDLE_PATH)).await?;
    tracing::info!("function bundle cid: {}", cid);

    tracing::info!("creating automate task");
    let automate_api_endpoint = env::var("AUTOMATE_API_ENDPOINT")
        .unwrap_or_else(|_| DEFAULT_AUTOMATE_API_ENDPOINT.to_owned());
    let automate_http_client = Arc::new(
        HttpClient::builder()
            .base_url(automate_api_endpoint)
            .rate_limiter(RateLimiter::direct(Quota::per_second(
                NonZeroU32::new(MAX_CALLS_PER_SECOND_AUTOMATE).unwrap(),
            )))
            .build()
            .context("could not build automate http client")?,
    );
    let automate = AutomateClient::new(automate_http_client, wallet, chain_id);

    let payload = CreateTaskPayload {
        name: TASK_NAME.to_owned(),
        web3_function_hash: cid,
        web3_function_args: UserArgs {
            swapper_engine: SWAPPER_ENGINE_ADDRESS
                .parse::<Address>()
                .context("could not parse swapper engine address")?,
            dao_collateral: DAO_COLLATERAL_ADDRESS
                .parse::<Address>()
                .context("could not parse dao collateral address")?,
        },
        trigger: Trigger {
            kind: TRIGGER_TYPE_EVENT.to_owned(),
            filter: EventFilter {
                address: TRIGGER_ADDRESS
                    .parse::<Address>()
                    .context("could not parse trigger address")?,
                topics: vec![vec![TRIGGER_TOPIC
                    .parse()
                    .context("could not parse trigger topic")?]],
            },
            block_confirmations: TRIGGER_BLOCK_CONFIRMATIONS,
        },
    };
    let created = automate.create_task(&payload).await?;
    tracing::info!(
        "task created, task id: {} (tx hash 0x{:x})",
        created.task_id,
        created.tx_hash
    );

    tracing::info!("waiting for registration transaction confirmation");
    let receipt = PendingTransaction::new(created.tx_hash, &provider)
        .await
        .context("could not wait for registration transaction confirmation")?;
    if receipt.is_none() {
        anyhow::bail!("registration transaction 0x{:x} was dropped", created.tx_hash);
    }

    println!("> {}", automate.dashboard_url(&created.task_id));
    Ok(())
}
