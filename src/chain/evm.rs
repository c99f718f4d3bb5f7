// src/chain/evm.rs
use alloy::primitives::{Address, U256, U64};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::sol;
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;

use super::ChainReader;
use crate::error::{LoanscanError, Result};
use crate::types::ReserveSnapshot;

sol! {
    #[sol(rpc)]
    interface IConvergentCurvePool {
        function totalSupply() external view returns (uint256 supply);
        function getPoolId() external view returns (bytes32 poolId);
        function expiration() external view returns (uint256 expiry);
        function unitSeconds() external view returns (uint256 unit);
    }

    #[sol(rpc)]
    interface IBalancerVault {
        function getPoolTokens(bytes32 poolId)
            external
            view
            returns (address[] tokens, uint256[] balances, uint256 lastChangeBlock);
    }

    #[sol(rpc)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8 places);
    }
}

#[derive(Debug, Deserialize)]
struct LatestBlock {
    timestamp: U64,
}

fn read_err<E: std::fmt::Display>(what: &'static str) -> impl Fn(E) -> LoanscanError {
    move |e| LoanscanError::ChainReadFailure(format!("{what}: {e}"))
}

fn to_u64(what: &'static str, v: U256) -> Result<u64> {
    u64::try_from(v).map_err(|_| LoanscanError::ChainReadFailure(format!("{what}: {v} does not fit u64")))
}

/// `ChainReader` over a JSON-RPC node.
pub struct EvmChainReader<P> {
    provider: P,
}

impl<P> EvmChainReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

/// Reader over plain HTTP JSON-RPC.
pub fn connect_http(rpc_url: &str) -> Result<EvmChainReader<impl Provider + Clone + 'static>> {
    let url: reqwest::Url = rpc_url
        .parse()
        .map_err(|e| LoanscanError::Config(format!("rpc_url {rpc_url:?}: {e}")))?;
    Ok(EvmChainReader::new(ProviderBuilder::new().on_http(url)))
}

#[async_trait]
impl<P> ChainReader for EvmChainReader<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn block_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .raw_request::<_, LatestBlock>("eth_getBlockByNumber".into(), ("latest", false))
            .await
            .map_err(read_err("eth_getBlockByNumber"))?;
        Ok(block.timestamp.to::<u64>())
    }

    async fn total_supply(&self, pool: Address) -> Result<U256> {
        let out = IConvergentCurvePool::new(pool, &self.provider)
            .totalSupply()
            .call()
            .await
            .map_err(read_err("totalSupply"))?;
        Ok(out.supply)
    }

    async fn reserves(&self, pool: Address, vault: Address) -> Result<ReserveSnapshot> {
        let pool_id = IConvergentCurvePool::new(pool, &self.provider)
            .getPoolId()
            .call()
            .await
            .map_err(read_err("getPoolId"))?
            .poolId;

        let IBalancerVault::getPoolTokensReturn { tokens, balances, .. } =
            IBalancerVault::new(vault, &self.provider)
                .getPoolTokens(pool_id)
                .call()
                .await
                .map_err(read_err("getPoolTokens"))?;

        let provider = &self.provider;
        let decimals = try_join_all(tokens.iter().map(|token| async move {
            IERC20Metadata::new(*token, provider)
                .decimals()
                .call()
                .await
                .map(|out| out.places)
                .map_err(read_err("decimals"))
        }))
        .await?;

        tracing::debug!(%pool, ?tokens, "pool reserves read");
        Ok(ReserveSnapshot { tokens, balances, decimals })
    }

    async fn unit_seconds(&self, pool: Address) -> Result<u64> {
        let out = IConvergentCurvePool::new(pool, &self.provider)
            .unitSeconds()
            .call()
            .await
            .map_err(read_err("unitSeconds"))?;
        to_u64("unitSeconds", out.unit)
    }

    async fn expiration(&self, pool: Address) -> Result<u64> {
        let out = IConvergentCurvePool::new(pool, &self.provider)
            .expiration()
            .call()
            .await
            .map_err(read_err("expiration"))?;
        to_u64("expiration", out.expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn rejects_malformed_rpc_url() {
        let err = connect_http("not a url").err().unwrap();
        assert!(matches!(err, LoanscanError::Config(_)));
    }

    /// Reads a live DAI principal-token pool when `RPC_URL` and `LOANSCAN_TEST_POOL` are set.
    #[tokio::test]
    async fn live_pool_reserves() {
        let (Ok(rpc), Ok(pool)) = (std::env::var("RPC_URL"), std::env::var("LOANSCAN_TEST_POOL")) else {
            eprintln!("Skipping test: RPC_URL / LOANSCAN_TEST_POOL not set");
            return;
        };
        let vault = address!("BA12222222228d8Ba445958a75a0704d566BF2C8");
        let pool: Address = pool.parse().expect("pool address");
        let reader = connect_http(&rpc).expect("reader");

        let ts = reader.block_timestamp().await.expect("timestamp");
        assert!(ts > 1_600_000_000);
        let snap = reader.reserves(pool, vault).await.expect("reserves");
        assert_eq!(snap.tokens.len(), 2);
        assert_eq!(snap.decimals.len(), 2);
        assert!(reader.unit_seconds(pool).await.expect("unit seconds") > 0);
    }
}
