//! Boundary to the game-client collaborator that owns the Minecraft connection,
//! world model, physics and pathfinding.

pub mod bridge;
pub mod session;
pub mod types;
pub mod wire;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

use types::{
    Block, BlockMatcher, BlockPos, Control, Entity, EntityFilter, EquipDestination, Face, Goal,
    InventoryItem, ItemDef, Recipe, SessionEnd, Vec3,
};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("not connected: {0}")]
    Disconnected(String),
    #[error("{message}")]
    Remote { code: i32, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Operations consumed from the game client. Every call is an opaque,
/// potentially failing remote operation; results are snapshots.
#[async_trait]
pub trait GameClient: Send + Sync + 'static {
    fn username(&self) -> &str;

    async fn position(&self) -> Result<Vec3, GameError>;
    async fn goto(&self, goal: Goal) -> Result<(), GameError>;
    async fn look_at(&self, target: Vec3, force: bool) -> Result<(), GameError>;
    /// Fire-and-forget control input; never awaits the collaborator.
    fn set_control_state(&self, control: Control, state: bool) -> Result<(), GameError>;

    async fn block_at(&self, pos: BlockPos) -> Result<Option<Block>, GameError>;
    async fn can_see_block(&self, pos: BlockPos) -> Result<bool, GameError>;
    async fn can_dig_block(&self, pos: BlockPos) -> Result<bool, GameError>;
    /// Places the held block against `reference`, the neighbour lying on the
    /// `side` face of the target position.
    async fn place_block(&self, reference: BlockPos, side: Face) -> Result<(), GameError>;
    async fn dig(&self, pos: BlockPos) -> Result<(), GameError>;
    async fn block_by_name(&self, name: &str) -> Result<Option<ItemDef>, GameError>;
    async fn find_block(
        &self,
        matching: BlockMatcher,
        max_distance: f64,
    ) -> Result<Option<Block>, GameError>;
    async fn find_blocks(
        &self,
        matching: BlockMatcher,
        max_distance: f64,
        count: u32,
    ) -> Result<Vec<BlockPos>, GameError>;

    async fn inventory(&self) -> Result<Vec<InventoryItem>, GameError>;
    async fn equip(&self, item: &InventoryItem, destination: EquipDestination)
        -> Result<(), GameError>;
    async fn item_by_name(&self, name: &str) -> Result<Option<ItemDef>, GameError>;
    async fn recipes_for(
        &self,
        item_id: u32,
        count: u32,
        crafting_table: Option<BlockPos>,
    ) -> Result<Vec<Recipe>, GameError>;
    async fn craft(
        &self,
        recipe: &Recipe,
        count: u32,
        crafting_table: Option<BlockPos>,
    ) -> Result<(), GameError>;

    async fn nearest_entity(&self, filter: &EntityFilter) -> Result<Option<Entity>, GameError>;
    async fn chat(&self, message: &str) -> Result<(), GameError>;

    /// Ends the session from our side. Returns once the quit request has left
    /// the process, or after a short bound if the transport is stuck.
    async fn quit(&self);
    /// Resolves once the session is over, for whatever reason.
    async fn closed(&self) -> SessionEnd;
}
