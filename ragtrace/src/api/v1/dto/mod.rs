//! v1 API Data Transfer Objects.
//!
//! Wire types for the v1 REST API, kept separate from the domain models in
//! `src/models/`.

pub mod checks;
pub mod common;
pub mod traces;

pub use checks::*;
pub use common::*;
pub use traces::*;
