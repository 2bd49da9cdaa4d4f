//! Application services for the administrative surface.

pub mod products;

pub use products::AdminProductService;
