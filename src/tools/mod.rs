//! Tool handlers, one module per domain.

pub mod blocks;
pub mod chat;
pub mod crafting;
pub mod entities;
pub mod inventory;
pub mod position;
pub mod registry;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::core::error::ArgError;
use crate::core::params::Args;
use crate::core::tool::Tool;
use crate::game::types::{BlockPos, Control, Vec3};
use crate::game::{GameClient, GameError};

/// Shared state every handler sees: the game session plus the motion lock.
pub struct BotContext {
    game: Arc<dyn GameClient>,
    motion: Mutex<()>,
}

impl BotContext {
    pub fn new(game: Arc<dyn GameClient>) -> Self {
        Self {
            game,
            motion: Mutex::new(()),
        }
    }

    pub fn game(&self) -> &dyn GameClient {
        self.game.as_ref()
    }

    /// Serialises anything that moves the bot. Queries never take this.
    pub async fn motion(&self) -> MutexGuard<'_, ()> {
        self.motion.lock().await
    }
}

/// Keeps a control input pressed until dropped.
pub(crate) struct HeldControl<'a> {
    game: &'a dyn GameClient,
    control: Control,
}

impl<'a> HeldControl<'a> {
    pub(crate) fn press(game: &'a dyn GameClient, control: Control) -> Result<Self, GameError> {
        game.set_control_state(control, true)?;
        Ok(Self { game, control })
    }
}

impl Drop for HeldControl<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.game.set_control_state(self.control, false) {
            tracing::warn!(control = %self.control, error = %e, "failed to release control");
        }
    }
}

/// Reads the `x`, `y`, `z` arguments.
pub(crate) fn coords(args: &Args) -> Result<Vec3, ArgError> {
    Ok(Vec3::new(args.number("x")?, args.number("y")?, args.number("z")?))
}

/// Reads the coordinates and floors them to the block they fall in.
pub(crate) fn block_coords(args: &Args) -> Result<(Vec3, BlockPos), ArgError> {
    let v = coords(args)?;
    let axis = |name: &'static str, c: f64| {
        BlockPos::axis(c).ok_or_else(|| ArgError::OutOfRange {
            name,
            value: c.to_string(),
        })
    };
    Ok((v, BlockPos::new(axis("x", v.x)?, axis("y", v.y)?, axis("z", v.z)?)))
}

/// Every tool, in catalogue order.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(position::GetPosition),
        Arc::new(position::MoveToPosition),
        Arc::new(position::LookAt),
        Arc::new(position::Jump),
        Arc::new(position::MoveInDirection),
        Arc::new(inventory::ListInventory),
        Arc::new(inventory::FindItem),
        Arc::new(inventory::EquipItem),
        Arc::new(blocks::PlaceBlock),
        Arc::new(blocks::DigBlock),
        Arc::new(blocks::GetBlockInfo),
        Arc::new(blocks::FindBlock),
        Arc::new(blocks::FindBlocks),
        Arc::new(entities::FindEntity),
        Arc::new(chat::SendChat),
        Arc::new(crafting::CraftItem),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use serde_json::Value;

    use super::BotContext;
    use crate::core::error::ToolError;
    use crate::core::params::Args;
    use crate::core::tool::Tool;
    use crate::game::fake::FakeGame;

    /// Validates `args` and runs `tool` against `game`.
    pub async fn run(tool: &dyn Tool, game: &Arc<FakeGame>, args: Value) -> Result<String, ToolError> {
        let bot = BotContext::new(game.clone());
        let args = Args::validate(tool.params(), args.as_object().cloned())?;
        tool.call(&bot, &args).await
    }
}
