//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod products;
pub mod text;
pub mod types;
