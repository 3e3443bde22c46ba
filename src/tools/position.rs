//! Where the bot is, where it goes and where it looks.

use std::time::Duration;

use async_trait::async_trait;

use super::{coords, BotContext, HeldControl};
use crate::core::error::{ArgError, ToolError};
use crate::core::params::{Args, Param};
use crate::core::tool::{Tool, ToolSpec};
use crate::game::types::{BlockPos, Control, Goal};

const JUMP_HOLD: Duration = Duration::from_millis(250);

pub struct GetPosition;

impl ToolSpec for GetPosition {
    fn name(&self) -> &'static str {
        "get-position"
    }
    fn description(&self) -> &'static str {
        "Get the current position of the bot"
    }
}

#[async_trait]
impl Tool for GetPosition {
    async fn call(&self, bot: &BotContext, _args: &Args) -> Result<String, ToolError> {
        let pos = BlockPos::floor(bot.game().position().await?);
        Ok(format!("Current position: {pos}"))
    }
}

pub struct MoveToPosition;

impl ToolSpec for MoveToPosition {
    fn name(&self) -> &'static str {
        "move-to-position"
    }
    fn description(&self) -> &'static str {
        "Move the bot to a specific position"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::number("x", "X coordinate"),
            Param::number("y", "Y coordinate"),
            Param::number("z", "Z coordinate"),
            Param::number("range", "How close to get to the target (default: 1)").optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for MoveToPosition {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let target = coords(args)?;
        let range = args.opt_number("range").unwrap_or(1.0);
        let _motion = bot.motion().await;
        bot.game().goto(Goal::near(target, range)).await?;
        Ok(format!("Successfully moved to position near {target}"))
    }
}

pub struct LookAt;

impl ToolSpec for LookAt {
    fn name(&self) -> &'static str {
        "look-at"
    }
    fn description(&self) -> &'static str {
        "Make the bot look at a specific position"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::number("x", "X coordinate"),
            Param::number("y", "Y coordinate"),
            Param::number("z", "Z coordinate"),
        ];
        P
    }
}

#[async_trait]
impl Tool for LookAt {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let target = coords(args)?;
        bot.game().look_at(target, true).await?;
        Ok(format!("Looking at position {target}"))
    }
}

pub struct Jump;

impl ToolSpec for Jump {
    fn name(&self) -> &'static str {
        "jump"
    }
    fn description(&self) -> &'static str {
        "Make the bot jump"
    }
}

#[async_trait]
impl Tool for Jump {
    async fn call(&self, bot: &BotContext, _args: &Args) -> Result<String, ToolError> {
        let _motion = bot.motion().await;
        let _held = HeldControl::press(bot.game(), Control::Jump)?;
        tokio::time::sleep(JUMP_HOLD).await;
        Ok("Successfully jumped".to_owned())
    }
}

pub struct MoveInDirection;

impl ToolSpec for MoveInDirection {
    fn name(&self) -> &'static str {
        "move-in-direction"
    }
    fn description(&self) -> &'static str {
        "Move the bot in a specific direction for a duration"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::choice("direction", Control::DIRECTIONS, "Direction to move"),
            Param::number("duration", "Duration in milliseconds (default: 1000)").optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for MoveInDirection {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let direction = args.string("direction")?;
        let control = Control::parse_direction(direction).ok_or_else(|| ArgError::NotAChoice {
            name: "direction",
            value: direction.to_owned(),
            choices: Control::DIRECTIONS.join(", "),
        })?;
        let duration = args.opt_number("duration").unwrap_or(1000.0);
        let hold = Duration::try_from_secs_f64(duration.max(0.0) / 1000.0).unwrap_or(Duration::ZERO);

        let _motion = bot.motion().await;
        {
            let _held = HeldControl::press(bot.game(), control)?;
            tokio::time::sleep(hold).await;
        }
        Ok(format!("Moved {control} for {duration}ms"))
    }
}
