//! Transports that carry JSON-RPC messages to the MCP server.

pub mod sse;
pub mod stdio;

use kube_mcp::McpServer;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use sse::SseConfig;

/// The transport chosen for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Sse(SseConfig),
}

impl Transport {
    /// Name used in the startup banner
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse(_) => "SSE",
        }
    }

    /// Serve until the transport closes, fails, or `shutdown` fires.
    pub async fn serve(
        self,
        server: Arc<McpServer>,
        shutdown: CancellationToken,
    ) -> std::io::Result<()> {
        match self {
            Self::Stdio => stdio::serve_stdio(server, shutdown).await,
            Self::Sse(config) => sse::serve(server, config, shutdown).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use kube_mcp::{init_toolsets, McpServer, DEFAULT_TOOLSETS};
    use kube_mcp_core::{ClientResult, PodList, ResourceClient, ServiceList};
    use std::sync::Arc;

    /// Client that returns empty listings
    struct EmptyClient;

    #[async_trait::async_trait]
    impl ResourceClient for EmptyClient {
        async fn list_pods(&self, _namespace: &str) -> ClientResult<PodList> {
            Ok(PodList::default())
        }

        async fn list_services(&self, _namespace: &str) -> ClientResult<ServiceList> {
            Ok(ServiceList::default())
        }
    }

    /// Server with every Kubernetes toolset enabled
    pub fn test_server() -> Arc<McpServer> {
        let toolsets = init_toolsets(DEFAULT_TOOLSETS, false, Arc::new(EmptyClient)).unwrap();
        let mut server = McpServer::new(kube_mcp::SERVER_NAME, "test");
        toolsets.register_tools(&mut server).unwrap();
        Arc::new(server)
    }
}
