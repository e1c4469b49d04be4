pub mod browser;
pub mod html_to_md;
pub mod registry;

use async_trait::async_trait;
use pagepilot_core::Result;
use serde_json::Value;

pub use browser::{BrowserSession, SharedSession};
pub use registry::ToolRegistry;

/// State handed to every tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    pub session: SharedSession,
}

impl ToolContext {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;
    fn validate(&self, params: &Value) -> Result<()>;
    async fn execute(&self, ctx: ToolContext, params: Value) -> Result<Value>;
}
