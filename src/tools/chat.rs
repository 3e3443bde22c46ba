use async_trait::async_trait;

use super::BotContext;
use crate::core::error::ToolError;
use crate::core::params::{Args, Param};
use crate::core::tool::{Tool, ToolSpec};

pub struct SendChat;

impl ToolSpec for SendChat {
    fn name(&self) -> &'static str {
        "send-chat"
    }
    fn description(&self) -> &'static str {
        "Send a chat message in-game"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[Param::string("message", "Message to send in chat")];
        P
    }
}

#[async_trait]
impl Tool for SendChat {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let message = args.string("message")?;
        bot.game().chat(message).await?;
        Ok(format!("Sent message: \"{message}\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fake::{Call, FakeGame};
    use crate::tools::testing::run;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn chat_is_forwarded_verbatim() {
        let game = Arc::new(FakeGame::default());
        let out = run(&SendChat, &game, json!({"message": "hello there"})).await.unwrap();
        assert_eq!(out, "Sent message: \"hello there\"");
        assert_eq!(game.calls(), vec![Call::Chat("hello there".into())]);
    }
}
