//! Block placement, digging and block search.

use async_trait::async_trait;

use super::{block_coords, BotContext};
use crate::core::error::{ArgError, ToolError};
use crate::core::params::{Args, Param};
use crate::core::tool::{Tool, ToolSpec};
use crate::game::types::{BlockMatcher, BlockPos, Face, Goal, Vec3};

/// Support faces tried when placing, most useful first.
const FACE_ORDER: [Face; 6] = [
    Face::Down,
    Face::North,
    Face::South,
    Face::East,
    Face::West,
    Face::Up,
];

const DEFAULT_SEARCH_DISTANCE: f64 = 16.0;

/// Face order for one placement attempt with `preferred` moved to the front.
fn face_order(preferred: Face) -> [Face; 6] {
    let mut order = FACE_ORDER;
    if let Some(i) = order.iter().position(|&f| f == preferred) {
        order[..=i].rotate_right(1);
    }
    order
}

fn corner(pos: BlockPos) -> Vec3 {
    Vec3::new(f64::from(pos.x), f64::from(pos.y), f64::from(pos.z))
}

pub struct PlaceBlock;

impl ToolSpec for PlaceBlock {
    fn name(&self) -> &'static str {
        "place-block"
    }
    fn description(&self) -> &'static str {
        "Place a block at the specified position"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::number("x", "X coordinate"),
            Param::number("y", "Y coordinate"),
            Param::number("z", "Z coordinate"),
            Param::choice(
                "faceDirection",
                Face::NAMES,
                "Direction to place against (default: 'down')",
            )
            .optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for PlaceBlock {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let (target, pos) = block_coords(args)?;
        let preferred = match args.opt_string("faceDirection") {
            None => Face::Down,
            Some(f) => Face::parse(f).ok_or_else(|| ArgError::NotAChoice {
                name: "faceDirection",
                value: f.to_owned(),
                choices: Face::NAMES.join(", "),
            })?,
        };

        let game = bot.game();
        if let Some(existing) = game.block_at(pos).await?.filter(|b| !b.is_air()) {
            return Ok(format!(
                "There's already a block ({}) at {target}",
                existing.name
            ));
        }

        for face in face_order(preferred) {
            let Some(reference) = pos.offset(face) else {
                continue;
            };
            if game.block_at(reference).await?.filter(|b| !b.is_air()).is_none() {
                continue;
            }
            if !game.can_see_block(reference).await? {
                let _motion = bot.motion().await;
                game.goto(Goal::near(corner(reference), 2.0)).await?;
            }
            game.look_at(target, true).await?;
            match game.place_block(reference, face).await {
                Ok(()) => return Ok(format!("Placed block at {target} using {face} face")),
                Err(e) => tracing::warn!("Failed to place using {face} face: {e}"),
            }
        }

        Ok(format!(
            "Failed to place block at {target}: No adjacent block, try a different coordinate first"
        ))
    }
}

pub struct DigBlock;

impl ToolSpec for DigBlock {
    fn name(&self) -> &'static str {
        "dig-block"
    }
    fn description(&self) -> &'static str {
        "Dig a block at the specified position"
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
impl Tool for DigBlock {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let (target, pos) = block_coords(args)?;
        let game = bot.game();
        let Some(block) = game.block_at(pos).await?.filter(|b| !b.is_air()) else {
            return Ok(format!("No block found at position {target}"));
        };

        if !game.can_dig_block(pos).await? || !game.can_see_block(pos).await? {
            let _motion = bot.motion().await;
            game.goto(Goal::near(target, 2.0)).await?;
        }

        game.dig(pos).await?;
        Ok(format!("Dug {} at {target}", block.name))
    }
}

pub struct GetBlockInfo;

impl ToolSpec for GetBlockInfo {
    fn name(&self) -> &'static str {
        "get-block-info"
    }
    fn description(&self) -> &'static str {
        "Get information about a block at the specified position"
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
impl Tool for GetBlockInfo {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let (target, pos) = block_coords(args)?;
        Ok(match bot.game().block_at(pos).await? {
            None => format!("No block information found at position {target}"),
            Some(block) => format!(
                "Found {} (type: {}) at position {}",
                block.name, block.type_id, block.position
            ),
        })
    }
}

pub struct FindBlock;

impl ToolSpec for FindBlock {
    fn name(&self) -> &'static str {
        "find-block"
    }
    fn description(&self) -> &'static str {
        "Find the nearest block of a specific type"
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::string("blockType", "Type of block to find"),
            Param::number("maxDistance", "Maximum search distance (default: 16)").optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for FindBlock {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let block_type = args.string("blockType")?;
        let max_distance = args.opt_number("maxDistance").unwrap_or(DEFAULT_SEARCH_DISTANCE);

        let game = bot.game();
        let Some(def) = game.block_by_name(block_type).await? else {
            return Ok(format!("Unknown block type: {block_type}"));
        };
        Ok(
            match game.find_block(BlockMatcher::Id { id: def.id }, max_distance).await? {
                None => format!("No {block_type} found within {max_distance} blocks"),
                Some(block) => format!("Found {block_type} at position {}", block.position),
            },
        )
    }
}

pub struct FindBlocks;

impl ToolSpec for FindBlocks {
    fn name(&self) -> &'static str {
        "find-blocks"
    }
    fn description(&self) -> &'static str {
        "Find multiple blocks of a specific type. Can also help if you don't know where blocks are that you could place against."
    }
    fn params(&self) -> &'static [Param] {
        const P: &[Param] = &[
            Param::string(
                "blockType",
                "Type of block to find. Use 'all' if you just want to find where blocks are.",
            ),
            Param::number("maxDistance", "Maximum search distance (default: 16)").optional(),
            Param::number("count", "Amount of blocks to find").optional(),
        ];
        P
    }
}

#[async_trait]
impl Tool for FindBlocks {
    async fn call(&self, bot: &BotContext, args: &Args) -> Result<String, ToolError> {
        let block_type = args.string("blockType")?;
        let max_distance = args.opt_number("maxDistance").unwrap_or(DEFAULT_SEARCH_DISTANCE);
        // float to int casts saturate, so negative counts become 0
        let count = args.opt_number("count").unwrap_or(2.0) as u32;

        let game = bot.game();
        let matching = if block_type == "all" {
            BlockMatcher::NotAir
        } else {
            match game.block_by_name(block_type).await? {
                Some(def) => BlockMatcher::Id { id: def.id },
                None => return Ok(format!("Unknown block type: {block_type}")),
            }
        };

        let found = game.find_blocks(matching, max_distance, count).await?;
        if found.is_empty() {
            return Ok(format!("No {block_type} found within {max_distance} blocks"));
        }
        let locations = found
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ToolError::msg(e.to_string()))?
            .join(", ");
        Ok(format!("Found {block_type} at the following locations: [{locations}]"))
    }
}
