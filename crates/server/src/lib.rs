pub mod config;
pub mod routes;
pub mod store;

pub use config::ServerConfig;
pub use routes::{AppError, router};
pub use store::PgStore;
