pub mod auth;
pub mod throttle;

pub use auth::authenticate;
pub use throttle::{client_ip, throttle};
