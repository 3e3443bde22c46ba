use std::fmt::Write as _;

use async_trait::async_trait;

use super::BotContext;
use crate::core::error::{ArgError, ToolError};
use crate::core::params::{Args, Param};
use crate::core::tool::{Tool, ToolSpec};
use crate::game::types::{EquipDestination, InventoryItem};

/// First item whose name contains the lowercased query.
fn find_matching<'a>(items: &'a [InventoryItem], query: &str) -> Option<&'a InventoryItem> {
    let needle = query.to_lowercase();
    items.iter().find(|item| item.name.contains(&needle))
}

fn not_found(query: &str) -> String {
    format!("Couldn't find any item matching '{query}' in inventory")
}

pub struct ListInventory;

impl ToolSpec for ListInventory {
    fn name(&self) -> &'static str {
        "list-inventory"
    }
    fn description(&self) -> &'static str {
        "List all items in the bot's inventory"
    }
}

#[async_trait]
impl Tool for ListInventory {
    async fn call(&self, bot: &BotContext, _args: &Args) -> Result<String, ToolError> {
        let items = bot.game().inventory().await?;
        if items.is_empty() {
            return Ok("Inventory is empty".to_owned());
        }
        let mut text = format!("Found {} items in inventory:\n\n", items.len());
        for item in &items {
            let _ = writeln!(text, "- {} (x{}) in slot {}", item.name, item.count, item.slot);
        }
        Ok(text)
    }
}

pub struct FindItem;

impl ToolSpec for FindItem {
    fn name(&self) -> &'static str {
        "find-item"
    }
    fn description(&self) -> &'static str {
        "Find a specific item in the bot's inventory"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[Param::string("nameOrType", "Name or type of item to find")];
        P
    }
}

#[async_trait]
impl Tool for FindItem {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let query = args.string("nameOrType")?;
        let items = bot.game().inventory().await?;
        Ok(match find_matching(&items, query) {
            Some(item) => format!(
                "Found {} {} in inventory (slot {})",
                item.count, item.name, item.slot
            ),
            None => not_found(query),
        })
    }
}

pub struct EquipItem;

impl ToolSpec for EquipItem {
    fn name(&self) -> &'static str {
        "equip-item"
    }
    fn description(&self) -> &'static str {
        "Equip a specific item"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::string("itemName", "Name of the item to equip"),
            Param::choice(
                "destination",
                EquipDestination::NAMES,
                "Where to equip the item (default: 'hand')",
            )
            .optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for EquipItem {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let query = args.string("itemName")?;
        let destination = match args.opt_string("destination") {
            None => EquipDestination::Hand,
            Some(d) => EquipDestination::parse(d).ok_or_else(|| ArgError::NotAChoice {
                name: "destination",
                value: d.to_owned(),
                choices: EquipDestination::NAMES.join(", "),
            })?,
        };
        let items = bot.game().inventory().await?;
        let Some(item) = find_matching(&items, query) else {
            return Ok(not_found(query));
        };
        bot.game().equip(item, destination).await?;
        Ok(format!("Equipped {} to {destination}", item.name))
    }
}
