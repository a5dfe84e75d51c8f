//! Strategy construction, repricing, and scoring
//!
//! - structures: always-built baseline catalog
//! - backspreads/calendar/post_event: conditionally-gated structures
//! - registry: gate/builder dispatch tables
//! - payoff: entry cost and vectorized scenario repricing
//! - scoring: metrics, composite score, ranking

pub mod backspreads;
pub mod calendar;
pub mod payoff;
pub mod post_event;
pub mod registry;
pub mod scoring;
pub mod structures;

pub use backspreads::*;
pub use calendar::*;
pub use payoff::*;
pub use post_event::*;
pub use registry::*;
pub use scoring::*;
pub use structures::*;
