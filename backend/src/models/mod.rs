//! Data models for the Design Hub application.
//!
//! These models match the frontend shapes for seamless interoperability.

mod resource;
mod snapshot;
mod stats;
mod user;

pub use resource::*;
pub use snapshot::*;
pub use stats::*;
pub use user::*;
