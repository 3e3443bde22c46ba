use async_trait::async_trait;

use super::error::ToolError;
use super::params::{input_schema, Args, JsonObject, Param};
use crate::tools::BotContext;

/// Minimal metadata every tool must expose.
pub trait ToolSpec {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn params(&self) -> &'static [Param] {
        &[]
    }
    fn input_schema(&self) -> JsonObject {
        input_schema(self.params())
    }
}

/// Tool = Spec + handler. Arguments reaching `call` were already validated
/// against `params()`.
#[async_trait]
pub trait Tool: ToolSpec + Send + Sync {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError>;
}

/// Textual outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    /// Error-flagged result. The failure is logged here so every handler
    /// reports the same way.
    pub fn failure(message: impl std::fmt::Display) -> Self {
        tracing::error!("Error: {message}");
        Self { text: format!("Failed: {message}"), is_error: true }
    }
}
