//! Subscription cost over a period window.
//!
//! A cost query names an inclusive window of months plus optional owner and
//! service filters. Every matching subscription contributes its monthly price
//! for each month it was active inside the window.

mod aggregator;
mod error;
mod filter;
mod overlap;

pub use aggregator::{aggregate, compute_total_cost, contribution};
pub use error::CostError;
pub use filter::QueryFilter;
pub use overlap::{clip, effective_end, select, ClippedInterval};
