// Kubernetes toolsets

use crate::error::Result;
use crate::toolsets::{Toolset, ToolsetGroup, ALL_TOOLSETS};
use crate::tools::{ListPodsTool, ListServicesTool, ServerTool};
use kube_mcp_core::ResourceClient;
use std::sync::Arc;

/// Toolsets enabled when the operator does not choose any
pub const DEFAULT_TOOLSETS: &[&str] = &[ALL_TOOLSETS];

/// Declare every Kubernetes toolset, then enable the requested ones.
pub fn init_toolsets<S: AsRef<str>>(
    enabled_toolsets: &[S],
    read_only: bool,
    client: Arc<dyn ResourceClient>,
) -> Result<ToolsetGroup> {
    let mut group = ToolsetGroup::new(read_only);

    let pods = Toolset::new("pods", "Kubernetes Pod related tools")
        .add_read_tools([ServerTool::new(ListPodsTool::new(client.clone()))]);

    let services = Toolset::new("services", "Kubernetes Service related tools")
        .add_read_tools([ServerTool::new(ListServicesTool::new(client))]);

    group.add_toolset(pods)?;
    group.add_toolset(services)?;

    group.enable_toolsets(enabled_toolsets)?;

    tracing::info!(
        toolsets = ?group.enabled_toolsets(),
        read_only = read_only,
        "Toolsets initialized"
    );

    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tools::mock::MockClient;

    fn tool_names(group: &ToolsetGroup) -> Vec<String> {
        group
            .active_tools()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    #[test]
    fn test_default_toolsets_enable_everything() {
        let group = init_toolsets(DEFAULT_TOOLSETS, false, Arc::new(MockClient::default())).unwrap();
        assert_eq!(group.enabled_toolsets(), vec!["pods", "services"]);
        assert_eq!(tool_names(&group), vec!["list_pods", "list_services"]);
    }

    #[test]
    fn test_single_toolset() {
        let group = init_toolsets(&["services"], true, Arc::new(MockClient::default())).unwrap();
        assert_eq!(tool_names(&group), vec!["list_services"]);
        assert!(group.read_only());
    }

    #[test]
    fn test_unknown_toolset() {
        let result = init_toolsets(&["pods", "deployments"], false, Arc::new(MockClient::default()));
        assert!(matches!(result, Err(Error::UnknownToolset(ref name)) if name == "deployments"));
    }
}
