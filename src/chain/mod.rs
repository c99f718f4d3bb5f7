// src/chain/mod.rs
use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::Result;
use crate::types::ReserveSnapshot;

/// Read-only view of the chain state a rate needs.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Timestamp of the latest block, unix seconds.
    async fn block_timestamp(&self) -> Result<u64>;

    async fn total_supply(&self, pool: Address) -> Result<U256>;

    /// Pool tokens, balances and token decimals as held by `vault`.
    async fn reserves(&self, pool: Address, vault: Address) -> Result<ReserveSnapshot>;

    async fn unit_seconds(&self, pool: Address) -> Result<u64>;

    async fn expiration(&self, pool: Address) -> Result<u64>;
}

pub mod evm;
pub mod memory;
