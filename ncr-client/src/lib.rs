mod utils;
mod service_url;
#[cfg(test)]
mod fake;

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod humanize;
pub mod manifest;
pub mod reference;
pub mod registry;

pub use aggregate::{aggregate, aggregate_now, TagSummary};
pub use client::Client;
pub use config::Config;
pub use error::Error;
pub use manifest::{BlobCreationInfo, Manifest};
pub use reference::Digest;
pub use registry::RegistryApi;
pub use service_url::{host_and_port, DOCKER_MANIFEST_V2};
pub use reqwest::StatusCode;
