//! Pricing models
//!
//! Black-Scholes-Merton is the pricing kernel for the whole engine:
//! entry/exit repricing, Greeks enrichment, and GEX aggregation all go
//! through it.

pub mod black_scholes;
