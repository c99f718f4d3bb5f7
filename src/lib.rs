// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod rates;
pub mod chain;
pub mod registry;
pub mod report;
pub mod publishing;
pub mod job;
