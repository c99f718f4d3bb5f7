// src/registry/static_list.rs
use async_trait::async_trait;

use super::{Registry, RegistrySource};
use crate::error::Result;
use crate::types::Instrument;

/// Instruments listed directly in configuration.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    pub instruments: Vec<Instrument>,
}

impl StaticRegistry {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }
}

#[async_trait]
impl RegistrySource for StaticRegistry {
    async fn load(&self, _terms: &[String]) -> Result<Registry> {
        tracing::debug!(n = self.instruments.len(), "static registry");
        Ok(Registry::new(self.instruments.clone()))
    }
}
