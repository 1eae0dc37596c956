//! Query composition: filters, sort/page normalization and grouping.

mod aggregate;
mod filter;
mod paging;

pub use aggregate::*;
pub use filter::*;
pub use paging::*;
