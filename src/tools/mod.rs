//! Tools the agent can call: schemas, registry and the built-in media tools.

pub mod builtin;
pub mod outcome;
pub mod registry;
pub mod schema;

pub use builtin::{default_registry, register_builtin, BuiltinTool, MediaToolbox};
pub use outcome::{FailureKind, ToolOutcome};
pub use registry::{ToolHandler, ToolRegistry};
pub use schema::{ParamKind, ParamSpec, ToolSpec};
