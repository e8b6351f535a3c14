pub mod cors;
pub mod timeout;

pub use cors::{cors_middleware, CorsPolicy};
pub use timeout::handle_timeout_error;
