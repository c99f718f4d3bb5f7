// src/bin/loanscan.rs
use loanscan::config::LoanscanConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let cfg = LoanscanConfig::load()?;
    tracing::info!(rpc = %cfg.rpc_url, terms = ?cfg.terms, "loanscan starting");

    let report = loanscan::job::run(&cfg).await?;
    tracing::info!(lend = report.lend_rates.len(), "loanscan done");
    Ok(())
}
