use async_trait::async_trait;

use super::BotContext;
use crate::core::error::ToolError;
use crate::core::params::{Args, Param};
use crate::core::tool::{Tool, ToolSpec};
use crate::game::types::{BlockPos, EntityFilter};

pub struct FindEntity;

impl ToolSpec for FindEntity {
    fn name(&self) -> &'static str {
        "find-entity"
    }
    fn description(&self) -> &'static str {
        "Find the nearest entity of a specific type"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::string("type", "Type of entity to find (empty for any entity)").optional(),
            Param::number("maxDistance", "Maximum search distance (default: 16)").optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for FindEntity {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let kind = args.opt_string("type").unwrap_or("");
        let max_distance = args.opt_number("maxDistance").unwrap_or(16.0);

        let game = bot.game();
        let nearest = game.nearest_entity(&EntityFilter::from_query(kind)).await?;
        let here = game.position().await?;
        match nearest {
            Some(entity) if entity.position.distance_to(&here) <= max_distance => Ok(format!(
                "Found {} at position {}",
                entity.label(),
                BlockPos::floor(entity.position)
            )),
            _ => {
                let what = if kind.is_empty() { "entity" } else { kind };
                Ok(format!("No {what} found within {max_distance} blocks"))
            }
        }
    }
}
