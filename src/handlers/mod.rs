// handlers/mod.rs - HTTP handlers
//
// Public:    /, /health
// Protected: /api/programs/v1/* (authentication + throttling applied by route layers in app.rs)

pub mod health;
pub mod programs;

pub use health::{health, root};
