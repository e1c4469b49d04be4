use pagepilot_tools::{ToolContext, ToolRegistry};
use serde_json::Value;
use std::path::Path;

use super::open_session;

fn schema_function(schema: &Value) -> &Value {
    schema.get("function").unwrap_or(schema)
}

/// List all registered tools with their parameters.
pub async fn list() -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    let schemas = registry.get_tool_schemas();

    println!();
    println!("Registered tools ({} total)", schemas.len());
    println!();

    for schema in &schemas {
        let func = schema_function(schema);
        println!("  {}", func["name"].as_str().unwrap_or(""));
        println!("    {}", func["description"].as_str().unwrap_or(""));

        let required: Vec<&str> = func["parameters"]["required"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        if let Some(props) = func["parameters"]["properties"].as_object() {
            for (key, val) in props {
                let typ = val.get("type").and_then(|t| t.as_str()).unwrap_or("any");
                let req = if required.contains(&key.as_str()) { " (required)" } else { "" };
                println!("      {:<10} {}{}", key, typ, req);
            }
        }
        println!();
    }

    Ok(())
}

/// Run one tool call against a fresh browser session.
pub async fn run(config_path: Option<&Path>, tool_name: &str, params_json: &str) -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    if registry.get(tool_name).is_none() {
        anyhow::bail!(
            "Tool '{}' not found. Use `pagepilot tools list` to see available tools.",
            tool_name
        );
    }

    let params: Value = serde_json::from_str(params_json)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON params: {}\nInput: {}", e, params_json))?;

    let ctx = ToolContext::new(open_session(config_path)?.shared());
    let result = registry.execute(tool_name, ctx, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
