//! GitLab CI client modules
//!
//! Client construction, request interception, JSON conversion, error
//! translation, and the build service wrapping one client per master.

pub mod api;
pub mod codec;
pub mod config;
pub mod error;
pub mod headers;
pub mod service;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use api::{GitlabCiClient, MAX_PAGE_SIZE};
pub use codec::JsonConverter;
pub use config::{ClientConfig, LogLevel};
pub use error::ClientError;
pub use headers::{GitlabCiHeaders, RequestInterceptor, PRIVATE_TOKEN_HEADER};
pub use service::GitlabCiService;

pub type Result<T> = std::result::Result<T, ClientError>;
