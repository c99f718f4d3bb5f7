// src/types.rs
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{LoanscanError, Result};

/// A principal token and the ConvergentCurve pool it trades in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,           // underlying key, e.g. "dai"
    pub principal_token: Address, // tranche address
    pub underlying: Address,
    pub pool: Address,
    pub expiration: u64,          // unix seconds
    pub unit_seconds: u64,
}

/// Pool balances as returned by the vault, one entry per pool token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub tokens: Vec<Address>,
    pub balances: Vec<U256>,
    pub decimals: Vec<u8>,
}

/// Base and principal sides of a two-token pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSides {
    pub base_reserves: U256,
    pub principal_reserves: U256,
    pub base_decimals: u8,
}

impl ReserveSnapshot {
    /// Locate `base` among the pool tokens; the other token is the principal.
    pub fn sides(&self, base: Address) -> Result<PoolSides> {
        if self.tokens.len() != 2 || self.balances.len() != 2 || self.decimals.len() != 2 {
            return Err(LoanscanError::ChainReadFailure(format!(
                "expected a two-token pool, got {} tokens / {} balances / {} decimals",
                self.tokens.len(),
                self.balances.len(),
                self.decimals.len()
            )));
        }
        // Address equality is case-insensitive by construction.
        let base_idx = self
            .tokens
            .iter()
            .position(|t| *t == base)
            .ok_or_else(|| {
                LoanscanError::RegistryLookupFailure(format!(
                    "underlying {base} is not a token of the pool ({:?})",
                    self.tokens
                ))
            })?;
        let pt_idx = 1 - base_idx;
        Ok(PoolSides {
            base_reserves: self.balances[base_idx],
            principal_reserves: self.balances[pt_idx],
            base_decimals: self.decimals[base_idx],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResult {
    pub apr: f64,
    pub apy: f64, // currently equal to apr
    pub token_symbol: String,
}

impl RateResult {
    pub fn new(symbol: &str, apr: f64) -> Self {
        Self { apr, apy: apr, token_symbol: symbol.to_uppercase() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub lend_rates: Vec<RateResult>,
    pub borrow_rates: Vec<RateResult>,
}

impl Report {
    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LoanscanError::InvalidInput(format!("report serialization: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const PT: Address = address!("00000000000000000000000000000000000000aa");

    fn snapshot(tokens: [Address; 2]) -> ReserveSnapshot {
        ReserveSnapshot {
            tokens: tokens.to_vec(),
            balances: vec![U256::from(10u64), U256::from(20u64)],
            decimals: vec![18, 6],
        }
    }

    #[test]
    fn sides_follow_base_position() {
        let s = snapshot([DAI, PT]).sides(DAI).unwrap();
        assert_eq!(s.base_reserves, U256::from(10u64));
        assert_eq!(s.principal_reserves, U256::from(20u64));
        assert_eq!(s.base_decimals, 18);

        let s = snapshot([PT, DAI]).sides(DAI).unwrap();
        assert_eq!(s.base_reserves, U256::from(20u64));
        assert_eq!(s.principal_reserves, U256::from(10u64));
        assert_eq!(s.base_decimals, 6);
    }

    #[test]
    fn missing_base_is_a_lookup_failure() {
        let err = snapshot([PT, PT]).sides(DAI).unwrap_err();
        assert!(matches!(err, LoanscanError::RegistryLookupFailure(_)));
    }

    #[test]
    fn report_json_shape() {
        let report = Report {
            lend_rates: vec![RateResult::new("dai", 0.05)],
            borrow_rates: vec![],
        };
        let json = report.to_json().unwrap();
        let expected = "{\n  \"lendRates\": [\n    {\n      \"apr\": 0.05,\n      \"apy\": 0.05,\n      \"tokenSymbol\": \"DAI\"\n    }\n  ],\n  \"borrowRates\": []\n}";
        assert_eq!(json, expected);
    }

    #[test]
    fn infinite_rate_serializes_as_null() {
        let report = Report {
            lend_rates: vec![RateResult::new("usdc", f64::INFINITY)],
            borrow_rates: vec![],
        };
        let v: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(v["lendRates"][0]["apr"].is_null());
        assert!(v["lendRates"][0]["apy"].is_null());
        assert_eq!(v["lendRates"][0]["tokenSymbol"], "USDC");
    }
}
