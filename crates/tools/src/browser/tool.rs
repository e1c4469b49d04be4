use async_trait::async_trait;
use pagepilot_core::{Error, Result};
use serde_json::{json, Value};

use super::ops::{describe, perform_action};
use crate::{Tool, ToolContext, ToolSchema};

/// `page_description`: snapshot the current page, optionally after navigating.
pub struct PageDescriptionTool;

#[async_trait]
impl Tool for PageDescriptionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "page_description",
            description: "Describe the current browser page: its URL, raw HTML with an appended action list, a Markdown rendering, and every button, link and role=button element. Pass 'url' to navigate there first (waits for network idle).",
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Optional URL to load before describing. Omit to describe the page that is already open."
                    }
                },
                "required": []
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        match params.get("url") {
            None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
            Some(_) => Err(Error::Validation("'url' must be a string".into())),
        }
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let url = params.get("url").and_then(|v| v.as_str());
        let mut session = ctx.session.lock().await;
        let description = describe(&mut session, url).await?;
        Ok(serde_json::to_value(description)?)
    }
}

/// `perform_action`: click the element identified by `target`.
pub struct PerformActionTool;

#[async_trait]
impl Tool for PerformActionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "perform_action",
            description: "Click an element on the current page and return the updated page description. 'target' may be a CSS selector starting with '#' or '.', an element id, the element's visible text (exact or partial), a link href, or a button's accessible name; these are tried in that order. Returns status 'error' if nothing matches.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "target": {
                        "type": "string",
                        "description": "Identifier of the element to activate, e.g. 'submit', '#login', 'Sign in', '/pricing'."
                    }
                },
                "required": ["target"]
            }),
        }
    }

    fn validate(&self, params: &Value) -> Result<()> {
        match params.get("target").and_then(|v| v.as_str()) {
            Some(t) if !t.is_empty() => Ok(()),
            Some(_) => Err(Error::Validation("'target' must not be empty".into())),
            None => Err(Error::Validation("Missing required parameter: target".into())),
        }
    }

    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value> {
        let target = params["target"]
            .as_str()
            .ok_or_else(|| Error::Validation("Missing required parameter: target".into()))?;
        let mut session = ctx.session.lock().await;
        let report = perform_action(&mut session, target).await?;
        Ok(serde_json::to_value(report)?)
    }
}
