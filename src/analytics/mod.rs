//! Market analytics
//!
//! Term-structure event variance, implied move, dealer gamma exposure,
//! historical event moves, and skew diagnostics.

pub mod event_vol;
pub mod gamma;
pub mod historical;
pub mod implied_move;
pub mod skew;

pub use event_vol::*;
pub use gamma::*;
pub use historical::*;
pub use implied_move::*;
pub use skew::*;
