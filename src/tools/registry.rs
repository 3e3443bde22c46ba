use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::core::error::ArgError;
use crate::core::params::{Args, JsonObject};
use crate::core::tool::{Tool, ToolOutput};
use crate::infra::logging::log_metric;

use super::BotContext;

/// Rejections that happen before a handler runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("tool not found: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    InvalidArgs(#[from] ArgError),
}

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<Vec<Arc<dyn Tool>>>,
    by_name: Arc<HashMap<&'static str, usize>>,
}

impl ToolRegistry {
    pub fn with_tools<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let tools: Vec<Arc<dyn Tool>> = iter.into_iter().collect();
        let by_name = tools.iter().enumerate().map(|(i, t)| (t.name(), i)).collect();
        Self {
            tools: Arc::new(tools),
            by_name: Arc::new(by_name),
        }
    }

    /// Registry holding the whole catalogue.
    pub fn standard() -> Self {
        Self::with_tools(super::all_tools())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn list(&self) -> Vec<ToolMeta> {
        self.tools
            .iter()
            .map(|t| ToolMeta {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Validates `arguments` and runs the named tool on its own task, so a
    /// panicking handler turns into an error result instead of taking the
    /// server down.
    pub async fn dispatch(
        &self,
        bot: Arc<BotContext>,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<ToolOutput, DispatchError> {
        let tool = self
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_owned()))?;
        let args = Args::validate(tool.params(), arguments)?;

        let started = Instant::now();
        let task = tokio::spawn(async move { tool.call(&bot, &args).await });
        let output = match task.await {
            Ok(Ok(text)) => ToolOutput::text(text),
            Ok(Err(e)) => ToolOutput::failure(e),
            Err(e) if e.is_panic() => ToolOutput::failure("tool handler panicked"),
            Err(_) => ToolOutput::failure("tool handler was cancelled"),
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let tool_name = name.to_owned();
        let outcome = if output.is_error { "error" } else { "ok" };
        metrics::counter!("tool_calls_total", "tool" => tool_name.clone(), "outcome" => outcome)
            .increment(1);
        metrics::histogram!("tool_call_duration_ms", "tool" => tool_name).record(elapsed_ms);
        log_metric(name, "duration_ms", elapsed_ms);

        Ok(output)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ToolError;
    use crate::core::params::Param;
    use crate::core::tool::ToolSpec;
    use crate::game::fake::FakeGame;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    impl ToolSpec for Echo {
        fn name(&self) -> &'static str {
            "test-echo"
        }
        fn description(&self) -> &'static str {
            "echo tool"
        }
        fn params(&self) -> &'static [Param] {
            const P: &[Param] = &[Param::string("text", "Text")];
            P
        }
    }

    #[async_trait]
    impl Tool for Echo {
        async fn call(&self, _bot: &BotContext, args: &Args) -> Result<String, ToolError> {
            match args.string("text")? {
                "boom" => Err(ToolError::msg("exploded")),
                "panic" => panic!("handler bug"),
                text => Ok(text.to_owned()),
            }
        }
    }

    fn registry() -> (ToolRegistry, Arc<BotContext>) {
        let reg = ToolRegistry::with_tools([Arc::new(Echo) as Arc<dyn Tool>]);
        let bot = Arc::new(BotContext::new(Arc::new(FakeGame::default())));
        (reg, bot)
    }

    fn args(v: serde_json::Value) -> Option<JsonObject> {
        v.as_object().cloned()
    }

    #[tokio::test]
    async fn registry_lists_and_calls() {
        let (reg, bot) = registry();
        let metas = reg.list();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].name, "test-echo");
        let out = reg.dispatch(bot, "test-echo", args(json!({"text": "hi"}))).await.unwrap();
        assert_eq!(out, ToolOutput::text("hi"));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let (reg, bot) = registry();
        let err = reg.dispatch(bot, "nope", None).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool(ref n) if n == "nope"));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_handler() {
        let (reg, bot) = registry();
        let err = reg.dispatch(bot, "test-echo", args(json!({"text": 3}))).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgs(ArgError::WrongType { name: "text", .. })));
    }

    #[tokio::test]
    async fn handler_failure_becomes_error_result() {
        let (reg, bot) = registry();
        let out = reg.dispatch(bot, "test-echo", args(json!({"text": "boom"}))).await.unwrap();
        assert!(out.is_error);
        assert_eq!(out.text, "Failed: exploded");
    }

    #[tokio::test]
    async fn panicking_handler_is_contained() {
        let (reg, bot) = registry();
        let out = reg
            .dispatch(bot.clone(), "test-echo", args(json!({"text": "panic"})))
            .await
            .unwrap();
        assert!(out.is_error);
        let again = reg.dispatch(bot, "test-echo", args(json!({"text": "ok"}))).await.unwrap();
        assert_eq!(again.text, "ok");
    }

    #[test]
    fn standard_registry_keeps_catalogue_order() {
        let names: Vec<&str> = ToolRegistry::standard().list().iter().map(|m| m.name).collect();
        assert_eq!(names.first(), Some(&"get-position"));
        assert_eq!(names.last(), Some(&"craft-item"));
    }
}
