// src/config.rs
use alloy::primitives::{address, Address};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{LoanscanError, Result};
use crate::registry::deployment::MAINNET_ADDRESSES_URL;
use crate::report::FailureMode;
use crate::types::Instrument;

pub const CONFIG_ENV: &str = "LOANSCAN_CONFIG";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const BALANCER_VAULT: Address = address!("BA12222222228d8Ba445958a75a0704d566BF2C8");

#[derive(Debug, Clone, Deserialize)]
pub struct LoanscanConfig {
    #[serde(default = "d_rpc_url")]              pub rpc_url: String,
    #[serde(default = "d_vault")]                pub balancer_vault: Address,
    #[serde(default = "d_terms")]                pub terms: Vec<String>,
    #[serde(default)]                            pub registry: RegistryConfig,
    #[serde(default)]                            pub on_instrument_error: FailureMode,
    #[serde(default = "d_output_path")]          pub output_path: PathBuf,
    #[serde(default)]                            pub publish: PublishConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RegistryConfig {
    /// Element deployment-address document over HTTP.
    Deployment {
        #[serde(default = "d_deployment_url")]
        url: String,
    },
    Static {
        instruments: Vec<Instrument>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "d_true")]                 pub enabled: bool,
    #[serde(default = "d_bucket")]               pub bucket: String,
    #[serde(default = "d_object_key")]           pub object_key: String,
    #[serde(default = "d_region")]               pub region: String,
}

fn d_rpc_url() -> String { "http://127.0.0.1:8545".into() }
fn d_vault() -> Address { BALANCER_VAULT }
fn d_terms() -> Vec<String> { vec!["dai".into(), "usdc".into()] }
fn d_output_path() -> PathBuf { PathBuf::from("loanscan") }
fn d_deployment_url() -> String { MAINNET_ADDRESSES_URL.into() }
fn d_true() -> bool { true }
fn d_bucket() -> String { "elementfi".into() }
fn d_object_key() -> String { "loanscan".into() }
fn d_region() -> String { "us-east-2".into() }

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig::Deployment { url: d_deployment_url() }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket: d_bucket(),
            object_key: d_object_key(),
            region: d_region(),
        }
    }
}

impl Default for LoanscanConfig {
    fn default() -> Self {
        Self {
            rpc_url: d_rpc_url(),
            balancer_vault: d_vault(),
            terms: d_terms(),
            registry: RegistryConfig::default(),
            on_instrument_error: FailureMode::default(),
            output_path: d_output_path(),
            publish: PublishConfig::default(),
        }
    }
}

impl LoanscanConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| LoanscanError::Config(e.to_string()))
    }

    /// `.env`, then the file named by `LOANSCAN_CONFIG` (defaults when unset),
    /// then `RPC_URL` over the configured endpoint.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("no .env loaded: {e}");
        }
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| LoanscanError::Config(format!("{path}: {e}")))?;
                Self::from_toml_str(&raw)?
            }
            Err(_) => Self::default(),
        };
        if let Ok(url) = std::env::var(RPC_URL_ENV) {
            cfg.rpc_url = url;
        }
        Ok(cfg)
    }
}
