// src/error.rs

#[derive(thiserror::Error, Debug)]
pub enum LoanscanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("chain read failed: {0}")]
    ChainReadFailure(String),
    #[error("registry lookup failed: {0}")]
    RegistryLookupFailure(String),
    #[error("publish failed: {0}")]
    PublishFailure(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("config: {0}")]
    Config(String),
}

impl LoanscanError {
    /// Short code used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            LoanscanError::InvalidInput(_)          => "invalid",
            LoanscanError::ChainReadFailure(_)      => "chain",
            LoanscanError::RegistryLookupFailure(_) => "registry",
            LoanscanError::PublishFailure(_)        => "publish",
            LoanscanError::Config(_)                => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanscanError>;
