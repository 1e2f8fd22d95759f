//! Toolsets and the group that decides which tools are exposed.
//!
//! Every tool is declared up front inside a named [`Toolset`], split into
//! read and write tools. At startup the operator picks toolsets by name and
//! [`ToolsetGroup::active_tools`] yields what gets registered on the server.
//! A group built read-only never yields a write tool.

use crate::error::{Error, Result};
use crate::server::McpServer;
use crate::tools::ServerTool;

/// Toolset name that selects every registered toolset.
pub const ALL_TOOLSETS: &str = "all";

/// A named group of related tools
#[derive(Debug, Clone)]
pub struct Toolset {
    name: String,
    description: String,
    read_tools: Vec<ServerTool>,
    write_tools: Vec<ServerTool>,
    enabled: bool,
}

impl Toolset {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            read_tools: Vec::new(),
            write_tools: Vec::new(),
            enabled: false,
        }
    }

    pub fn add_read_tools(mut self, tools: impl IntoIterator<Item = ServerTool>) -> Self {
        self.read_tools.extend(tools);
        self
    }

    pub fn add_write_tools(mut self, tools: impl IntoIterator<Item = ServerTool>) -> Self {
        self.write_tools.extend(tools);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Read tools, then write tools unless `read_only`. Empty when disabled.
    fn active_tools(&self, read_only: bool) -> impl Iterator<Item = &ServerTool> {
        let enabled = self.enabled;
        let write_tools: &[ServerTool] = if read_only { &[] } else { &self.write_tools };

        self.read_tools
            .iter()
            .chain(write_tools)
            .filter(move |_| enabled)
    }
}

/// Ordered collection of toolsets plus the read-only policy
#[derive(Debug, Clone)]
pub struct ToolsetGroup {
    toolsets: Vec<Toolset>,
    read_only: bool,
}

impl ToolsetGroup {
    pub fn new(read_only: bool) -> Self {
        Self {
            toolsets: Vec::new(),
            read_only,
        }
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Register a toolset. Names must be unique.
    pub fn add_toolset(&mut self, toolset: Toolset) -> Result<()> {
        if self.get(toolset.name()).is_some() {
            return Err(Error::DuplicateToolset(toolset.name().to_string()));
        }
        self.toolsets.push(toolset);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Toolset> {
        self.toolsets.iter().find(|ts| ts.name == name)
    }

    /// Names in registration order
    pub fn toolset_names(&self) -> Vec<&str> {
        self.toolsets.iter().map(|ts| ts.name()).collect()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(Toolset::is_enabled)
    }

    pub fn enabled_toolsets(&self) -> Vec<&str> {
        self.toolsets
            .iter()
            .filter(|ts| ts.enabled)
            .map(|ts| ts.name())
            .collect()
    }

    /// Enable toolsets by name; [`ALL_TOOLSETS`] enables every toolset.
    ///
    /// Every name is resolved before anything is enabled, so an unknown name
    /// leaves the group exactly as it was.
    pub fn enable_toolsets<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut selected = vec![false; self.toolsets.len()];

        for name in names {
            let name = name.as_ref();
            if name == ALL_TOOLSETS {
                selected.iter_mut().for_each(|s| *s = true);
                continue;
            }

            let index = self
                .toolsets
                .iter()
                .position(|ts| ts.name == name)
                .ok_or_else(|| Error::UnknownToolset(name.to_string()))?;
            selected[index] = true;
        }

        for (toolset, selected) in self.toolsets.iter_mut().zip(selected) {
            if selected && !toolset.enabled {
                tracing::debug!(toolset = %toolset.name, "Enabling toolset");
                toolset.enabled = true;
            }
        }

        Ok(())
    }

    /// Tools of enabled toolsets in registration order, read tools first,
    /// write tools dropped when the group is read-only.
    pub fn active_tools(&self) -> Vec<ServerTool> {
        self.toolsets
            .iter()
            .flat_map(|ts| ts.active_tools(self.read_only))
            .cloned()
            .collect()
    }

    /// Register every active tool on the server.
    pub fn register_tools(&self, server: &mut McpServer) -> Result<()> {
        for tool in self.active_tools() {
            server.register(tool)?;
        }
        Ok(())
    }
}
