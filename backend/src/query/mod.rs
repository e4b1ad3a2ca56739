//! In-memory query helpers over resource lists.
//!
//! Both functions here are pure: they never touch the database and preserve input order.

mod aggregate;
mod filter;

pub use aggregate::*;
pub use filter::*;
