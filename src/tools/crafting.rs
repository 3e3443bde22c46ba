use async_trait::async_trait;

use super::BotContext;
use crate::core::error::ToolError;
use crate::core::params::{Args, Param};
use crate::core::tool::{Tool, ToolSpec};
use crate::game::types::{BlockMatcher, BlockPos, Recipe};

const CRAFTING_TABLE: &str = "crafting_table";
const TABLE_SEARCH_DISTANCE: f64 = 32.0;

/// With a table any recipe works, but table recipes are preferred. Without
/// one only hand recipes are usable.
fn choose_recipe(recipes: Vec<Recipe>, table: Option<BlockPos>) -> Option<Recipe> {
    if table.is_some() {
        let preferred = recipes.iter().position(|r| r.requires_table).unwrap_or(0);
        recipes.into_iter().nth(preferred)
    } else {
        recipes.into_iter().find(|r| !r.requires_table)
    }
}

pub struct CraftItem;

impl ToolSpec for CraftItem {
    fn name(&self) -> &'static str {
        "craft-item"
    }
    fn description(&self) -> &'static str {
        "Craft an item, using a nearby crafting table when one is available"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::string("itemName", "Name of the item to craft"),
            Param::number("count", "How many to craft (default: 1)").optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for CraftItem {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let name = args.string("itemName")?;
        let count = args.opt_number("count").unwrap_or(1.0) as u32;

        let game = bot.game();
        let item = game
            .item_by_name(name)
            .await?
            .ok_or_else(|| ToolError::msg(format!("Unknown item: {name}")))?;

        let table = match game.block_by_name(CRAFTING_TABLE).await? {
            Some(def) => game
                .find_block(BlockMatcher::Id { id: def.id }, TABLE_SEARCH_DISTANCE)
                .await?
                .map(|b| b.position),
            None => None,
        };

        let recipes = game.recipes_for(item.id, count, table).await?;
        let Some(recipe) = choose_recipe(recipes, table) else {
            let hint = if table.is_none() { " (no crafting table nearby)" } else { "" };
            return Err(ToolError::msg(format!("No recipe available to craft {name}{hint}")));
        };
        tracing::debug!(recipe = recipe.id, ?table, "crafting {count} {name}");

        game.craft(&recipe, count, table).await?;
        Ok(match table {
            Some(at) => format!("Crafted {count} {name} using crafting table at {at}"),
            None => format!("Crafted {count} {name}"),
        })
    }
}
