//! Core data types for the event-vol engine
//!
//! Defines fundamental types:
//! - OptionLeg/Strategy: immutable position building blocks
//! - OptionQuote/OptionChain/ChainLookup: chain data and pricing lookups
//! - MarketSnapshot: per-run market conditions
//! - EngineConfig: immutable run configuration

pub mod config;
pub mod error;
pub mod greeks;
pub mod option;
pub mod quote;
pub mod snapshot;

pub use config::*;
pub use error::*;
pub use greeks::*;
pub use option::*;
pub use quote::*;
pub use snapshot::*;
