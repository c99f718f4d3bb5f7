// src/registry/deployment.rs
use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;

use super::{Registry, RegistrySource};
use crate::chain::ChainReader;
use crate::error::{LoanscanError, Result};
use crate::report::FailureMode;
use crate::types::Instrument;

pub const MAINNET_ADDRESSES_URL: &str =
    "https://raw.githubusercontent.com/element-fi/elf-deploy/main/addresses/mainnet.json";

/// Subset of the published deployment-address document this job reads.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentAddresses {
    #[serde(default)]
    pub tokens: HashMap<String, Address>,
    #[serde(default)]
    pub tranches: HashMap<String, Vec<Tranche>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tranche {
    pub address: Address,
    pub pt_pool: PoolRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolRef {
    pub address: Address,
}

/// Registry built from the deployment-address document. Expiration and curve
/// unit are read from each pool, never from the document.
pub struct DeploymentRegistry {
    http: reqwest::Client,
    url: String,
    chain: Arc<dyn ChainReader>,
    mode: FailureMode,
}

impl DeploymentRegistry {
    pub fn new(http: reqwest::Client, url: impl Into<String>, chain: Arc<dyn ChainReader>) -> Self {
        Self { http, url: url.into(), chain, mode: FailureMode::Abort }
    }

    /// How a term or tranche that cannot be resolved is handled.
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.mode = mode;
        self
    }

    pub async fn fetch(&self) -> Result<DeploymentAddresses> {
        let fetch_err = |e: reqwest::Error| {
            LoanscanError::RegistryLookupFailure(format!("deployment addresses from {}: {e}", self.url))
        };
        self.http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?
            .json::<DeploymentAddresses>()
            .await
            .map_err(fetch_err)
    }

    async fn instrument(&self, symbol: &str, underlying: Address, tranche: &Tranche) -> Result<Instrument> {
        let pool = tranche.pt_pool.address;
        let (unit_seconds, expiration) =
            futures::try_join!(self.chain.unit_seconds(pool), self.chain.expiration(pool))?;
        Ok(Instrument {
            symbol: symbol.to_string(),
            principal_token: tranche.address,
            underlying,
            pool,
            expiration,
            unit_seconds,
        })
    }
}

#[async_trait]
impl RegistrySource for DeploymentRegistry {
    async fn load(&self, terms: &[String]) -> Result<Registry> {
        let doc = self.fetch().await?;
        let mut pending = Vec::new();
        for term in terms {
            let key = term.to_lowercase();
            match lookup(&doc, &key) {
                Ok((underlying, tranches)) => {
                    for tranche in tranches {
                        pending.push((key.clone(), underlying, tranche));
                    }
                }
                Err(e) if self.mode == FailureMode::Omit => {
                    tracing::warn!(term = %term, code = e.code(), "term omitted: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        let futs: Vec<_> = pending
            .iter()
            .map(|(symbol, underlying, tranche)| self.instrument(symbol, *underlying, tranche))
            .collect();
        let instruments = self
            .mode
            .gather(
                futs,
                |i| format!("{} pool {}", pending[i].0, pending[i].2.pt_pool.address),
            )
            .await?;
        tracing::info!(url = %self.url, n = instruments.len(), "deployment registry loaded");
        Ok(Registry::new(instruments))
    }
}

fn lookup<'a>(doc: &'a DeploymentAddresses, key: &str) -> Result<(Address, &'a [Tranche])> {
    let underlying = *doc
        .tokens
        .get(key)
        .ok_or_else(|| LoanscanError::RegistryLookupFailure(format!("no base token for {key:?}")))?;
    let tranches = doc
        .tranches
        .get(key)
        .ok_or_else(|| LoanscanError::RegistryLookupFailure(format!("no tranches for {key:?}")))?;
    Ok((underlying, tranches.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::memory::{MemoryChain, PoolState};
    use crate::types::ReserveSnapshot;
    use alloy::primitives::{address, U256};
    use httpmock::prelude::*;
    use serde_json::json;

    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const POOL_A: Address = address!("00000000000000000000000000000000000000a1");
    const POOL_B: Address = address!("00000000000000000000000000000000000000b1");

    fn pool(unit_seconds: u64, expiration: u64) -> PoolState {
        PoolState {
            total_supply: U256::ZERO,
            reserves: ReserveSnapshot { tokens: vec![], balances: vec![], decimals: vec![] },
            unit_seconds,
            expiration,
        }
    }

    fn document() -> serde_json::Value {
        json!({
            "balancerVault": "0xBA12222222228d8Ba445958a75a0704d566BF2C8",
            "tokens": { "dai": "0x6b175474e89094c44da98b954eedeac495271d0f" },
            "tranches": {
                "dai": [
                    { "address": "0x00000000000000000000000000000000000000a0", "expiration": 1634346845,
                      "ptPool": { "address": "0x00000000000000000000000000000000000000a1", "poolId": "0x01", "fee": "0.1" },
                      "ytPool": { "address": "0x00000000000000000000000000000000000000a2" } },
                    { "address": "0x00000000000000000000000000000000000000b0",
                      "ptPool": { "address": "0x00000000000000000000000000000000000000b1" } }
                ]
            }
        })
    }

    fn chain() -> Arc<dyn ChainReader> {
        Arc::new(
            MemoryChain::new(0)
                .with_pool(POOL_A, pool(100, 1_640_995_200))
                .with_pool(POOL_B, pool(200, 1_651_275_535)),
        )
    }

    #[tokio::test]
    async fn loads_tranches_with_chain_terms() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET).path("/addresses/mainnet.json");
                then.status(200).json_body(document());
            })
            .await;

        let source = DeploymentRegistry::new(reqwest::Client::new(), server.url("/addresses/mainnet.json"), chain());
        let reg = source.load(&["DAI".into()]).await.unwrap();
        m.assert_async().await;

        let got = reg.instruments();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].symbol, "dai");
        assert_eq!(got[0].underlying, DAI);
        assert_eq!(got[0].pool, POOL_A);
        // the document's expiration is ignored
        assert_eq!(got[0].expiration, 1_640_995_200);
        assert_eq!(got[0].unit_seconds, 100);
        assert_eq!(got[1].pool, POOL_B);
        assert_eq!(got[1].unit_seconds, 200);
        assert_eq!(got[1].expiration, 1_651_275_535);
    }

    #[tokio::test]
    async fn missing_term_is_a_lookup_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/mainnet.json");
                then.status(200).json_body(document());
            })
            .await;

        let source = DeploymentRegistry::new(reqwest::Client::new(), server.url("/mainnet.json"), chain());
        let err = source.load(&["dai".into(), "usdc".into()]).await.unwrap_err();
        assert!(matches!(err, LoanscanError::RegistryLookupFailure(_)));
    }

    #[tokio::test]
    async fn http_error_is_a_lookup_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/mainnet.json");
                then.status(503);
            })
            .await;

        let source = DeploymentRegistry::new(reqwest::Client::new(), server.url("/mainnet.json"), chain());
        let err = source.load(&["dai".into()]).await.unwrap_err();
        assert!(matches!(err, LoanscanError::RegistryLookupFailure(_)));
    }

    #[tokio::test]
    async fn unknown_pool_fails_the_load() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/mainnet.json");
                then.status(200).json_body(document());
            })
            .await;

        let only_a: Arc<dyn ChainReader> = Arc::new(MemoryChain::new(0).with_pool(POOL_A, pool(100, 1_640_995_200)));
        let source = DeploymentRegistry::new(reqwest::Client::new(), server.url("/mainnet.json"), only_a);
        let err = source.load(&["dai".into()]).await.unwrap_err();
        assert!(matches!(err, LoanscanError::ChainReadFailure(_)));
    }

    #[tokio::test]
    async fn omit_mode_skips_unreadable_pools_and_terms() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/mainnet.json");
                then.status(200).json_body(document());
            })
            .await;

        let only_a: Arc<dyn ChainReader> = Arc::new(MemoryChain::new(0).with_pool(POOL_A, pool(100, 1_640_995_200)));
        let source = DeploymentRegistry::new(reqwest::Client::new(), server.url("/mainnet.json"), only_a)
            .with_failure_mode(FailureMode::Omit);
        let reg = source.load(&["dai".into(), "usdc".into()]).await.unwrap();

        let got = reg.instruments();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].pool, POOL_A);
        assert_eq!(got[0].unit_seconds, 100);
    }
}
