pub mod params;
pub mod pods;
pub mod services;
mod tool;

pub use params::{input_schema, Arguments, ParamError, ParamKind, ParamSpec, ParamValue};
pub use pods::ListPodsTool;
pub use services::ListServicesTool;
pub use tool::{ServerTool, Tool, ToolDefinition};

#[cfg(test)]
pub(crate) use tool::testing;
