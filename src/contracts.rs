use ethers::{
    contract::{EthAbiCodec, EthAbiType, EthCall, EthEvent},
    types::{Address, Bytes, U256},
};

/// Deposit event emitted by the swapper engine whenever a requester queues an
/// order for matching.
#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Deposit", abi = "Deposit(address,uint256,uint256)")]
pub struct DepositFilter {
    #[ethevent(indexed)]
    pub requester: Address,
    #[ethevent(indexed)]
    pub order_id: U256,
    pub amount: U256,
}

/// Permit-style approval forwarded to the DAO collateral contract alongside a
/// swap. The watcher only fills in placeholder signature fields, a real signed
/// approval comes from an external signer service.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct Approval {
    pub deadline: U256,
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType, EthAbiCodec)]
pub struct Intent {
    pub recipient: Address,
    pub rwa_token: Address,
    pub amount_in_token_decimals: U256,
    pub deadline: U256,
    pub signature: Bytes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "swapRWAtoStbc",
    abi = "swapRWAtoStbc(address,uint256,bool,uint256[],(uint256,uint8,bytes32,bytes32))"
)]
pub struct SwapRwaToStbcCall {
    pub rwa_token: Address,
    pub amount_in_token_decimals: U256,
    pub partial_matching: bool,
    pub order_ids_to_take: Vec<U256>,
    pub approval: Approval,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "swapRWAtoStbcIntent",
    abi = "swapRWAtoStbcIntent(uint256[],(uint256,uint8,bytes32,bytes32),(address,address,uint256,uint256,bytes),bool)"
)]
pub struct SwapRwaToStbcIntentCall {
    pub order_ids_to_take: Vec<U256>,
    pub approval: Approval,
    pub intent: Intent,
    pub partial_matching: bool,
}
