// src/job.rs
use std::sync::Arc;

use crate::chain::{evm, ChainReader};
use crate::config::{LoanscanConfig, RegistryConfig};
use crate::error::Result;
use crate::publishing::{publish_all, FilePublisher, Publisher, S3Publisher, StdoutPublisher};
use crate::registry::deployment::DeploymentRegistry;
use crate::registry::static_list::StaticRegistry;
use crate::registry::RegistrySource;
use crate::report::ReportAssembler;
use crate::types::Report;

pub fn registry_source(cfg: &LoanscanConfig, chain: Arc<dyn ChainReader>) -> Box<dyn RegistrySource> {
    match &cfg.registry {
        RegistryConfig::Deployment { url } => {
            Box::new(
                DeploymentRegistry::new(reqwest::Client::new(), url.clone(), chain)
                    .with_failure_mode(cfg.on_instrument_error),
            )
        }
        RegistryConfig::Static { instruments } => Box::new(StaticRegistry::new(instruments.clone())),
    }
}

/// Resolve the configured terms and price every instrument.
pub async fn generate_report(
    cfg: &LoanscanConfig,
    chain: Arc<dyn ChainReader>,
    source: &dyn RegistrySource,
) -> Result<Report> {
    let registry = source.load(&cfg.terms).await?;
    let instruments = registry.for_underlyings(&cfg.terms, cfg.on_instrument_error)?;
    tracing::info!(terms = ?cfg.terms, instruments = instruments.len(), "pricing instruments");

    ReportAssembler::new(chain, cfg.balancer_vault, cfg.on_instrument_error)
        .assemble(&instruments)
        .await
}

pub async fn publishers(cfg: &LoanscanConfig) -> Vec<Box<dyn Publisher>> {
    let mut out: Vec<Box<dyn Publisher>> = vec![
        Box::new(StdoutPublisher),
        Box::new(FilePublisher::new(cfg.output_path.clone())),
    ];
    if cfg.publish.enabled {
        let s3 = S3Publisher::from_env(&cfg.publish.region, &cfg.publish.bucket, &cfg.publish.object_key).await;
        out.push(Box::new(s3));
    } else {
        tracing::info!("object store upload disabled");
    }
    out
}

/// One full run: chain reads, report, publication.
pub async fn run(cfg: &LoanscanConfig) -> Result<Report> {
    let chain: Arc<dyn ChainReader> = Arc::new(evm::connect_http(&cfg.rpc_url)?);
    let source = registry_source(cfg, chain.clone());

    let report = generate_report(cfg, chain, source.as_ref()).await?;
    let document = report.to_json()?;
    publish_all(&publishers(cfg).await, &document).await?;
    Ok(report)
}
