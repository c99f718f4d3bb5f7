// src/report.rs
use std::future::Future;
use std::sync::Arc;

use alloy::primitives::Address;
use futures::future::{join_all, try_join_all};
use serde::Deserialize;

use crate::chain::ChainReader;
use crate::error::Result;
use crate::rates::{fixed_rate, time_remaining, RateInputs};
use crate::types::{Instrument, RateResult, Report};

/// What to do when one instrument cannot be priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Fail the whole report.
    #[default]
    Abort,
    /// Drop the instrument and log a warning.
    Omit,
}

impl FailureMode {
    /// Await `futs` concurrently, keeping input order. `Abort` returns the
    /// first error; `Omit` drops failed items, logging each with `label(index)`.
    pub async fn gather<T, I>(self, futs: I, label: impl Fn(usize) -> String) -> Result<Vec<T>>
    where
        I: IntoIterator,
        I::Item: Future<Output = Result<T>>,
    {
        match self {
            FailureMode::Abort => try_join_all(futs).await,
            FailureMode::Omit => Ok(join_all(futs)
                .await
                .into_iter()
                .enumerate()
                .filter_map(|(i, res)| match res {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(item = %label(i), code = e.code(), "omitted: {e}");
                        None
                    }
                })
                .collect()),
        }
    }
}

pub struct ReportAssembler {
    chain: Arc<dyn ChainReader>,
    vault: Address,
    mode: FailureMode,
}

impl ReportAssembler {
    pub fn new(chain: Arc<dyn ChainReader>, vault: Address, mode: FailureMode) -> Self {
        Self { chain, vault, mode }
    }

    /// Price every instrument concurrently; `lendRates` keeps input order.
    pub async fn assemble(&self, instruments: &[Instrument]) -> Result<Report> {
        let lend_rates = self
            .mode
            .gather(instruments.iter().map(|inst| self.rate_for(inst)), |i| {
                format!("{} pool {}", instruments[i].symbol, instruments[i].pool)
            })
            .await?;

        tracing::info!(
            lend = lend_rates.len(),
            requested = instruments.len(),
            "report assembled"
        );
        Ok(Report { lend_rates, borrow_rates: Vec::new() })
    }

    pub async fn rate_for(&self, inst: &Instrument) -> Result<RateResult> {
        let (now, supply, snapshot) = futures::try_join!(
            self.chain.block_timestamp(),
            self.chain.total_supply(inst.pool),
            self.chain.reserves(inst.pool, self.vault),
        )?;

        let sides = snapshot.sides(inst.underlying)?;
        let remaining = time_remaining(inst.expiration, now);
        let base_reserves = sides.base_reserves.to_string();
        let principal_reserves = sides.principal_reserves.to_string();
        let total_supply = supply.to_string();

        let apr = fixed_rate(&RateInputs {
            base_reserves: &base_reserves,
            principal_reserves: &principal_reserves,
            total_supply: &total_supply,
            time_remaining: remaining,
            unit_seconds: inst.unit_seconds,
            base_decimals: sides.base_decimals,
        })?;

        let maturity = chrono::DateTime::from_timestamp(inst.expiration as i64, 0)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        tracing::debug!(
            symbol = %inst.symbol,
            pool = %inst.pool,
            %maturity,
            remaining,
            apr,
            "rate computed"
        );

        Ok(RateResult::new(&inst.symbol, apr))
    }
}
