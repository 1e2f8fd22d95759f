// Tool trait and the registered tool unit

use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use crate::tools::params::{input_schema, Arguments, ParamSpec};
use anyhow::Result;
use std::fmt;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Static description of the tool
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with already validated arguments.
    ///
    /// `Err` is for failures past validation (remote calls, serialization);
    /// the server turns it into an error result.
    async fn execute(&self, arguments: &Arguments) -> Result<CallToolResult>;
}

/// Name, description, hints and declared parameters of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub title: Option<String>,
    pub read_only_hint: bool,
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            title: None,
            read_only_hint: false,
            params: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only_hint = true;
        self
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Wire descriptor for `tools/list`
    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: input_schema(&self.params),
            annotations: Some(ToolAnnotations {
                title: self.title.clone(),
                read_only_hint: Some(self.read_only_hint),
            }),
        }
    }
}

/// A tool definition paired with its handler, as held by toolsets and the server.
#[derive(Clone)]
pub struct ServerTool {
    definition: Arc<ToolDefinition>,
    handler: Arc<dyn Tool>,
}

impl ServerTool {
    pub fn new(tool: impl Tool + 'static) -> Self {
        Self::from_arc(Arc::new(tool))
    }

    pub fn from_arc(handler: Arc<dyn Tool>) -> Self {
        Self {
            definition: Arc::new(handler.definition()),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Validate the arguments, then run the handler.
    ///
    /// Validation failures and handler errors both come back as error
    /// results; a failing call never escapes as a protocol error.
    pub async fn call(&self, arguments: Option<serde_json::Value>) -> CallToolResult {
        let arguments = match Arguments::from_json(arguments)
            .and_then(|args| args.validate(&self.definition.params).map(|_| args))
        {
            Ok(arguments) => arguments,
            Err(e) => {
                tracing::debug!(tool = %self.name(), error = %e, "Rejected tool arguments");
                return CallToolResult::error(e.to_string());
            }
        };

        match self.handler.execute(&arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %self.name(), error = %e, "Tool call failed");
                CallToolResult::error(format!("{:#}", e))
            }
        }
    }
}

impl fmt::Debug for ServerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTool")
            .field("name", &self.definition.name)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tool that echoes its `value` argument and counts executions.
    pub struct EchoTool {
        pub name: String,
        pub calls: Arc<AtomicUsize>,
    }

    impl EchoTool {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(&self.name, "Echo the value argument")
                .with_param(ParamSpec::string("value", "Value to echo").required())
        }

        async fn execute(&self, arguments: &Arguments) -> Result<CallToolResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let value = arguments.required_string("value")?;
            if value == "fail" {
                anyhow::bail!("echo refused");
            }
            Ok(CallToolResult::text(value))
        }
    }

    pub fn echo(name: &str) -> ServerTool {
        ServerTool::new(EchoTool::new(name))
    }
}
