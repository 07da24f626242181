use std::sync::Arc;

use ethers::{
    abi::AbiDecode,
    contract::EthEvent,
    providers::{MockProvider, Provider},
    types::{Address, BigEndianHash, Block, Bytes, Log, H256, U256, U64},
};
use swapper_engine_watcher::{
    contracts::{DepositFilter, SwapRwaToStbcCall},
    scanner::{payload::PayloadKind, Call, ExecutionDecision, Scanner, ScannerConfig},
    storage::{KeyValueStore, MemoryStore, LAST_BLOCK_NUMBER_KEY, TOTAL_EVENTS_KEY},
};

fn engine_address() -> Address {
    Address::repeat_byte(0x11)
}

fn collateral_address() -> Address {
    Address::repeat_byte(0x22)
}

fn test_config() -> ScannerConfig {
    ScannerConfig {
        swapper_engine: engine_address(),
        dao_collateral: collateral_address(),
        rwa_token: Address::repeat_byte(0x33),
        max_range: 1000,
        max_requests: 100,
        payload: PayloadKind::DirectSwap,
    }
}

fn deposit_log(requester: Address, order_id: u64, amount: u64) -> Log {
    let mut amount_data = [0u8; 32];
    U256::from(amount).to_big_endian(&mut amount_data);
    Log {
        address: engine_address(),
        topics: vec![
            DepositFilter::signature(),
            H256::from(requester),
            H256::from_uint(&U256::from(order_id)),
        ],
        data: Bytes::from(amount_data.to_vec()),
        block_hash: None,
        block_number: None,
        transaction_hash: None,
        transaction_index: None,
        log_index: None,
        transaction_log_index: None,
        log_type: None,
        removed: None,
    }
}

fn block_with_timestamp(timestamp: u64) -> Block<H256> {
    Block {
        timestamp: U256::from(timestamp),
        ..Default::default()
    }
}

fn scanner_with_config(
    provider: Provider<MockProvider>,
    store: Arc<MemoryStore>,
    config: ScannerConfig,
) -> Scanner<Provider<MockProvider>> {
    Scanner::new(Arc::new(provider), store, config)
}

#[tokio::test]
async fn test_first_invocation_seeds_checkpoint_and_skips() {
    let (provider, mock) = Provider::mocked();
    // responses are popped in reverse push order: head first, then the single
    // logs query covering the seeded range [4001, 5000]
    mock.push::<Vec<Log>, _>(Vec::new()).unwrap();
    mock.push(U64::from(5000)).unwrap();

    let store = Arc::new(MemoryStore::new());
    let scanner = scanner_with_config(provider, store.clone(), test_config());

    let decision = scanner.run().await.expect("invocation failed");
    assert_eq!(
        decision,
        ExecutionDecision::Skip {
            message: "Total events matched: 0 (at block #5000)".to_owned()
        }
    );
    assert_eq!(
        store.get(LAST_BLOCK_NUMBER_KEY).await.unwrap(),
        Some("5000".to_owned())
    );
    assert_eq!(
        store.get(TOTAL_EVENTS_KEY).await.unwrap(),
        Some("0".to_owned())
    );
}

#[tokio::test]
async fn test_chunked_scan_performs_three_requests() {
    let (provider, mock) = Provider::mocked();
    // ranges [101, 1101], [1102, 2102], [2103, 2500]
    for _ in 0..3 {
        mock.push::<Vec<Log>, _>(Vec::new()).unwrap();
    }
    mock.push(U64::from(2500)).unwrap();

    let store = Arc::new(MemoryStore::new());
    store.set(LAST_BLOCK_NUMBER_KEY, "100").await.unwrap();
    store.set(TOTAL_EVENTS_KEY, "3").await.unwrap();
    let scanner = scanner_with_config(provider, store.clone(), test_config());

    let decision = scanner.run().await.expect("invocation failed");
    // a fourth query would have errored on the exhausted mock and produced an
    // rpc failure skip instead
    assert_eq!(
        decision,
        ExecutionDecision::Skip {
            message: "Total events matched: 3 (at block #2500)".to_owned()
        }
    );
    assert_eq!(
        store.get(LAST_BLOCK_NUMBER_KEY).await.unwrap(),
        Some("2500".to_owned())
    );
    assert_eq!(
        store.get(TOTAL_EVENTS_KEY).await.unwrap(),
        Some("3".to_owned())
    );
}

#[tokio::test]
async fn test_rpc_failure_leaves_checkpoint_untouched() {
    let (provider, mock) = Provider::mocked();
    // only the first of the three needed logs responses is available, the
    // second query fails mid-loop
    mock.push::<Vec<Log>, _>(Vec::new()).unwrap();
    mock.push(U64::from(2500)).unwrap();

    let store = Arc::new(MemoryStore::new());
    store.set(LAST_BLOCK_NUMBER_KEY, "100").await.unwrap();
    store.set(TOTAL_EVENTS_KEY, "3").await.unwrap();
    let scanner = scanner_with_config(provider, store.clone(), test_config());

    let decision = scanner.run().await.expect("invocation failed");
    match decision {
        ExecutionDecision::Skip { message } => {
            assert!(message.starts_with("Rpc call failed:"), "{message}")
        }
        other => panic!("expected a skip decision, got {other:?}"),
    }
    assert_eq!(
        store.get(LAST_BLOCK_NUMBER_KEY).await.unwrap(),
        Some("100".to_owned())
    );
    assert_eq!(
        store.get(TOTAL_EVENTS_KEY).await.unwrap(),
        Some("3".to_owned())
    );
}

#[tokio::test]
async fn test_execute_takes_last_matched_order() {
    let requester = Address::repeat_byte(0x44);
    let (provider, mock) = Provider::mocked();
    mock.push(block_with_timestamp(1_700_000_000)).unwrap();
    mock.push::<Vec<Log>, _>(vec![
        deposit_log(requester, 7, 70),
        deposit_log(requester, 8, 80),
        deposit_log(requester, 9, 90),
    ])
    .unwrap();
    mock.push(U64::from(5000)).unwrap();

    let store = Arc::new(MemoryStore::new());
    store.set(LAST_BLOCK_NUMBER_KEY, "4500").await.unwrap();
    store.set(TOTAL_EVENTS_KEY, "3").await.unwrap();
    let scanner = scanner_with_config(provider, store.clone(), test_config());

    let decision = scanner.run().await.expect("invocation failed");
    let calls = match decision {
        ExecutionDecision::Execute { calls } => calls,
        other => panic!("expected an execute decision, got {other:?}"),
    };
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, collateral_address());

    let call =
        SwapRwaToStbcCall::decode(calls[0].data.as_ref()).expect("could not decode call data");
    assert_eq!(call.order_ids_to_take, vec![U256::from(9)]);
    assert_eq!(call.amount_in_token_decimals, U256::from(90));
    assert_eq!(call.rwa_token, test_config().rwa_token);
    assert!(!call.partial_matching);
    assert_eq!(call.approval.deadline, U256::from(1_700_000_000u64 + 3600));
    assert_eq!(call.approval.v, 27);

    assert_eq!(
        store.get(LAST_BLOCK_NUMBER_KEY).await.unwrap(),
        Some("5000".to_owned())
    );
    assert_eq!(
        store.get(TOTAL_EVENTS_KEY).await.unwrap(),
        Some("6".to_owned())
    );
}

#[tokio::test]
async fn test_request_budget_bounds_invocation() {
    let (provider, mock) = Provider::mocked();
    // budget of two requests, the head is far beyond what they can cover
    mock.push::<Vec<Log>, _>(Vec::new()).unwrap();
    mock.push::<Vec<Log>, _>(Vec::new()).unwrap();
    mock.push(U64::from(1000)).unwrap();

    let store = Arc::new(MemoryStore::new());
    store.set(LAST_BLOCK_NUMBER_KEY, "0").await.unwrap();
    store.set(TOTAL_EVENTS_KEY, "0").await.unwrap();
    let scanner = scanner_with_config(
        provider,
        store.clone(),
        ScannerConfig {
            max_range: 10,
            max_requests: 2,
            ..test_config()
        },
    );

    let decision = scanner.run().await.expect("invocation failed");
    assert_eq!(
        decision,
        ExecutionDecision::Skip {
            message: "Total events matched: 0 (at block #1000)".to_owned()
        }
    );
    // the checkpoint still jumps to the observed head even though the scan
    // was truncated by the request budget
    assert_eq!(
        store.get(LAST_BLOCK_NUMBER_KEY).await.unwrap(),
        Some("1000".to_owned())
    );
}

#[tokio::test]
async fn test_undecodable_logs_are_counted_but_not_executed() {
    let (provider, mock) = Provider::mocked();
    let bad_log = Log {
        topics: vec![DepositFilter::signature()],
        ..deposit_log(Address::repeat_byte(0x44), 1, 1)
    };
    mock.push::<Vec<Log>, _>(vec![bad_log]).unwrap();
    mock.push(U64::from(5000)).unwrap();

    let store = Arc::new(MemoryStore::new());
    store.set(LAST_BLOCK_NUMBER_KEY, "4500").await.unwrap();
    store.set(TOTAL_EVENTS_KEY, "0").await.unwrap();
    let scanner = scanner_with_config(provider, store.clone(), test_config());

    let decision = scanner.run().await.expect("invocation failed");
    assert_eq!(
        decision,
        ExecutionDecision::Skip {
            message: "Total events matched: 1 (at block #5000)".to_owned()
        }
    );
    assert_eq!(
        store.get(TOTAL_EVENTS_KEY).await.unwrap(),
        Some("1".to_owned())
    );
}

#[tokio::test]
async fn test_checkpoint_never_decreases_behind_lagging_head() {
    let (provider, mock) = Provider::mocked();
    mock.push(U64::from(5000)).unwrap();

    let store = Arc::new(MemoryStore::new());
    store.set(LAST_BLOCK_NUMBER_KEY, "6000").await.unwrap();
    store.set(TOTAL_EVENTS_KEY, "2").await.unwrap();
    let scanner = scanner_with_config(provider, store.clone(), test_config());

    let decision = scanner.run().await.expect("invocation failed");
    assert_eq!(
        decision,
        ExecutionDecision::Skip {
            message: "Total events matched: 2 (at block #5000)".to_owned()
        }
    );
    assert_eq!(
        store.get(LAST_BLOCK_NUMBER_KEY).await.unwrap(),
        Some("6000".to_owned())
    );
}

#[test]
fn test_decision_wire_shape() {
    let skip = ExecutionDecision::Skip {
        message: "Total events matched: 0 (at block #5000)".to_owned(),
    };
    let value = serde_json::to_value(skip.to_result()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "canExec": false,
            "message": "Total events matched: 0 (at block #5000)"
        })
    );

    let execute = ExecutionDecision::Execute {
        calls: vec![Call {
            to: Address::zero(),
            data: Bytes::from(vec![0x01, 0x02]),
        }],
    };
    let value = serde_json::to_value(execute.to_result()).unwrap();
    assert_eq!(value["canExec"], serde_json::json!(true));
    assert_eq!(value["callData"][0]["data"], serde_json::json!("0x0102"));
    assert!(value.get("message").is_none());
}
