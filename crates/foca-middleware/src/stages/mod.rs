//! Built-in middleware stages.

mod cors;
mod request_id;
mod traffic;

pub use cors::{headers as cors_headers, AllowedOrigins, CorsStage};
pub use request_id::{RequestIdStage, REQUEST_ID_HEADER};
pub use traffic::TrafficStage;
