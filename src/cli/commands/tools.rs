//! List the tools the agent can call.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::tools::{default_registry, ToolSpec};

/// Run the tools command.
pub fn run_tools(json: bool, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Tools, settings)?;
    let registry = default_registry(settings)?;

    if json {
        let definitions = registry.definitions();
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    Output::header(&format!("{} tools", registry.len()));
    println!();
    for spec in registry.specs() {
        Output::tool(&spec.name, &spec.description, &param_labels(spec));
    }
    Ok(())
}

/// Parameter names, optional ones marked with `?`.
fn param_labels(spec: &ToolSpec) -> Vec<String> {
    spec.params
        .iter()
        .map(|p| {
            if p.required {
                p.name.clone()
            } else {
                format!("{}?", p.name)
            }
        })
        .collect()
}
