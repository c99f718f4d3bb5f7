// src/registry/mod.rs
use async_trait::async_trait;

use crate::error::{LoanscanError, Result};
use crate::report::FailureMode;
use crate::types::Instrument;

pub mod deployment;
pub mod static_list;

/// Where the instrument list comes from.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Load instruments, at least covering the underlyings in `terms`.
    async fn load(&self, terms: &[String]) -> Result<Registry>;
}

/// Known instruments in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    instruments: Vec<Instrument>,
}

impl Registry {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Instruments for each requested underlying symbol, grouped in `terms`
    /// order and registry order within a group. A symbol with no instruments
    /// fails the lookup, or is skipped with a warning under `Omit`.
    pub fn for_underlyings(&self, terms: &[String], mode: FailureMode) -> Result<Vec<Instrument>> {
        let mut out = Vec::new();
        for term in terms {
            let before = out.len();
            out.extend(
                self.instruments
                    .iter()
                    .filter(|i| i.symbol.eq_ignore_ascii_case(term))
                    .cloned(),
            );
            if out.len() == before {
                let e = LoanscanError::RegistryLookupFailure(format!(
                    "no instruments registered for underlying {term:?}"
                ));
                match mode {
                    FailureMode::Abort => return Err(e),
                    FailureMode::Omit => tracing::warn!(term = %term, code = e.code(), "term omitted: {e}"),
                }
            }
        }
        Ok(out)
    }
}
