// Pod tools

use crate::protocol::CallToolResult;
use crate::tools::{Arguments, ParamSpec, Tool, ToolDefinition};
use anyhow::{Context, Result};
use kube_mcp_core::ResourceClient;
use std::sync::Arc;

/// Tool to list the pods of a namespace
pub struct ListPodsTool {
    client: Arc<dyn ResourceClient>,
}

impl ListPodsTool {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for ListPodsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_pods", "List all pods in a namespace")
            .with_title("List Pods")
            .read_only()
            .with_param(ParamSpec::string("namespace", "Namespace to list pods in").required())
    }

    async fn execute(&self, arguments: &Arguments) -> Result<CallToolResult> {
        let namespace = arguments.required_string("namespace")?;

        let pods = self
            .client
            .list_pods(namespace)
            .await
            .context("failed to list pods")?;

        let json = serde_json::to_string(&pods).context("failed to marshal pods")?;
        Ok(CallToolResult::text(json))
    }
}
