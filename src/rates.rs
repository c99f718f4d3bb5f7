// src/rates.rs
use crate::error::{LoanscanError, Result};

pub const ONE_YEAR_IN_SECONDS: u64 = 31_536_000;
/// Precision every reserve is normalized to before pricing.
pub const NORMALIZED_DECIMALS: u8 = 18;

/// Inputs for one principal-token pool, reserves as base-10 integer strings.
#[derive(Debug, Clone)]
pub struct RateInputs<'a> {
    pub base_reserves: &'a str,
    pub principal_reserves: &'a str,
    pub total_supply: &'a str,
    pub time_remaining: u64,
    pub unit_seconds: u64,
    pub base_decimals: u8,
}

/// Seconds until `expiration`, zero once it has passed.
#[inline]
pub fn time_remaining(expiration: u64, now: u64) -> u64 {
    expiration.saturating_sub(now)
}

fn parse_amount(label: &str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LoanscanError::InvalidInput(format!("{label}: {raw:?} is not a non-negative integer")));
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| LoanscanError::InvalidInput(format!("{label}: {e}")))
}

/// `raw` as a float, scaled from `decimals` to 18 decimals.
///
/// The amount is rounded to `f64` first and then multiplied by the power of
/// ten, so amounts above 2^53 round exactly as the published feed always has.
fn normalized(label: &str, raw: &str, decimals: u8) -> Result<f64> {
    let amount = parse_amount(label, raw)?;
    Ok(amount * 10f64.powi(i32::from(NORMALIZED_DECIMALS - decimals)))
}

/// Spot price of one principal token in base units:
/// `(base / (principal + supply)) ^ (time_remaining / unit_seconds)`.
///
/// Decimals above 18 give a price of 0. A zero `unit_seconds` is not
/// rejected; the exponent follows IEEE division.
pub fn calc_spot_price_pt(
    base_reserves: &str,
    principal_reserves: &str,
    total_supply: &str,
    time_remaining: u64,
    unit_seconds: u64,
    base_decimals: u8,
) -> Result<f64> {
    let supply = parse_amount("total supply", total_supply)?;
    if base_decimals > NORMALIZED_DECIMALS {
        parse_amount("base reserves", base_reserves)?;
        parse_amount("principal reserves", principal_reserves)?;
        return Ok(0.0);
    }
    let base = normalized("base reserves", base_reserves, base_decimals)?;
    let principal = normalized("principal reserves", principal_reserves, base_decimals)?;

    let t = time_remaining as f64 / unit_seconds as f64;
    Ok((base / (principal + supply)).powf(t))
}

/// Annualized discount implied by `spot_price`, in percent.
/// An expired instrument (`time_remaining == 0`) has no forward rate: 0.
pub fn calc_fixed_apr(spot_price: f64, time_remaining: u64) -> f64 {
    if time_remaining == 0 {
        return 0.0;
    }
    let years = time_remaining as f64 / ONE_YEAR_IN_SECONDS as f64;
    ((1.0 - spot_price) / spot_price / years) * 100.0
}

/// Full pipeline: reserves to fractional APR (0.05 = 5%).
///
/// A zero spot price (empty base side) yields an infinite rate, which the
/// report serializes as `null`.
pub fn fixed_rate(inp: &RateInputs<'_>) -> Result<f64> {
    let spot = calc_spot_price_pt(
        inp.base_reserves,
        inp.principal_reserves,
        inp.total_supply,
        inp.time_remaining,
        inp.unit_seconds,
        inp.base_decimals,
    )?;
    Ok(calc_fixed_apr(spot, inp.time_remaining) / 100.0)
}
