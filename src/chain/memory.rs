// src/chain/memory.rs
use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use super::ChainReader;
use crate::error::{LoanscanError, Result};
use crate::types::ReserveSnapshot;

/// Fixed pool state for one ConvergentCurve pool.
#[derive(Debug, Clone)]
pub struct PoolState {
    pub total_supply: U256,
    pub reserves: ReserveSnapshot,
    pub unit_seconds: u64,
    pub expiration: u64,
}

/// In-memory chain with a frozen block timestamp. Unknown pools fail reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    pub timestamp: u64,
    pub pools: HashMap<Address, PoolState>,
}

impl MemoryChain {
    pub fn new(timestamp: u64) -> Self {
        Self { timestamp, pools: HashMap::new() }
    }

    pub fn with_pool(mut self, pool: Address, state: PoolState) -> Self {
        self.pools.insert(pool, state);
        self
    }

    fn pool(&self, pool: Address) -> Result<&PoolState> {
        self.pools
            .get(&pool)
            .ok_or_else(|| LoanscanError::ChainReadFailure(format!("no contract at {pool}")))
    }
}

#[async_trait]
impl ChainReader for MemoryChain {
    async fn block_timestamp(&self) -> Result<u64> {
        Ok(self.timestamp)
    }

    async fn total_supply(&self, pool: Address) -> Result<U256> {
        Ok(self.pool(pool)?.total_supply)
    }

    async fn reserves(&self, pool: Address, _vault: Address) -> Result<ReserveSnapshot> {
        Ok(self.pool(pool)?.reserves.clone())
    }

    async fn unit_seconds(&self, pool: Address) -> Result<u64> {
        Ok(self.pool(pool)?.unit_seconds)
    }

    async fn expiration(&self, pool: Address) -> Result<u64> {
        Ok(self.pool(pool)?.expiration)
    }
}
