pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod courses;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod programs;
pub mod throttle;

pub use app::{app, AppState};
