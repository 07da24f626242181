use ethers::{
    abi::AbiEncode,
    types::{Bytes, U256},
};
use serde::{Deserialize, Serialize};

use crate::contracts::{
    Approval, DepositFilter, Intent, SwapRwaToStbcCall, SwapRwaToStbcIntentCall,
};

use super::ScannerConfig;

// stand-in signature fields, a production deployment sources a real signed
// approval from an external signer service
const PLACEHOLDER_V: u8 = 27;
const PLACEHOLDER_R: [u8; 32] = [
    0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90,
    0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90,
    0x12, 0x34,
];
const PLACEHOLDER_S: [u8; 32] = [
    0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01,
    0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01,
    0x23, 0x45,
];

/// Which DAO collateral entrypoint the execute payload targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadKind {
    #[default]
    DirectSwap,
    Intent,
}

/// Encodes the outbound call for the matched deposit, argument order exactly
/// as the target function expects it.
pub fn build_call_data(
    kind: PayloadKind,
    config: &ScannerConfig,
    deposit: &DepositFilter,
    deadline: U256,
) -> Bytes {
    let order_ids_to_take = vec![deposit.order_id];
    let approval = Approval {
        deadline,
        v: PLACEHOLDER_V,
        r: PLACEHOLDER_R,
        s: PLACEHOLDER_S,
    };

    match kind {
        PayloadKind::DirectSwap => SwapRwaToStbcCall {
            rwa_token: config.rwa_token,
            amount_in_token_decimals: deposit.amount,
            partial_matching: false,
            order_ids_to_take,
            approval,
        }
        .encode()
        .into(),
        PayloadKind::Intent => SwapRwaToStbcIntentCall {
            order_ids_to_take,
            approval,
            intent: Intent {
                recipient: deposit.requester,
                rwa_token: config.rwa_token,
                amount_in_token_decimals: deposit.amount,
                deadline,
                signature: Bytes::default(),
            },
            partial_matching: false,
        }
        .encode()
        .into(),
    }
}
