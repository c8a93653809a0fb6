//! Builds GitLab CI REST clients for every configured master and registers
//! them, keyed by name, in the registry of build services.

pub mod build_services;
pub mod client;
pub mod config;
pub mod domain;
pub mod id;
pub mod logging;
pub mod masters;
pub mod permissions;
pub mod result;

pub use build_services::{BuildService, BuildServiceProvider, BuildServices, SharedBuildServices};
pub use config::{AppConfig, GitlabCiHost};
pub use masters::{build_registry, register_masters, GitlabCiMasters};
