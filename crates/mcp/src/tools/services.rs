// Service tools

use crate::protocol::CallToolResult;
use crate::tools::{Arguments, ParamSpec, Tool, ToolDefinition};
use anyhow::{Context, Result};
use kube_mcp_core::ResourceClient;
use std::sync::Arc;

/// Tool to list the services of a namespace
pub struct ListServicesTool {
    client: Arc<dyn ResourceClient>,
}

impl ListServicesTool {
    pub fn new(client: Arc<dyn ResourceClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for ListServicesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_services", "List all services in a namespace")
            .with_title("List Services")
            .read_only()
            .with_param(
                ParamSpec::string("namespace", "Namespace to list services in").required(),
            )
    }

    async fn execute(&self, arguments: &Arguments) -> Result<CallToolResult> {
        let namespace = arguments.required_string("namespace")?;

        let services = self
            .client
            .list_services(namespace)
            .await
            .context("failed to list services")?;

        let json = serde_json::to_string(&services).context("failed to marshal services")?;
        Ok(CallToolResult::text(json))
    }
}
