// Kubernetes client and typed resource listings for the MCP server

pub mod client;
pub mod config;
pub mod error;
pub mod kubeconfig;
pub mod types;

pub use client::{KubeClient, ResourceClient};
pub use config::{Auth, ClientConfig, RetryPolicy};
pub use error::{ClientError, ClientResult};
pub use kubeconfig::Kubeconfig;
pub use types::*;
