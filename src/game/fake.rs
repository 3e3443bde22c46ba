//! In-memory game client used by handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;

use super::types::{
    Block, BlockMatcher, BlockPos, Control, Entity, EntityFilter, EquipDestination, Face, Goal,
    InventoryItem, ItemDef, Recipe, SessionEnd, Vec3,
};
use super::{GameClient, GameError};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Goto(Goal),
    LookAt(Vec3),
    Place(BlockPos, Face),
    Dig(BlockPos),
    Equip(u32, EquipDestination),
    RecipesFor(u32, u32, Option<BlockPos>),
    Craft(u32, u32, Option<BlockPos>),
    Chat(String),
    Control(Control, bool, Instant),
    Quit,
}

fn center(pos: BlockPos) -> Vec3 {
    Vec3::new(
        f64::from(pos.x) + 0.5,
        f64::from(pos.y) + 0.5,
        f64::from(pos.z) + 0.5,
    )
}

#[derive(Default)]
pub struct FakeWorld {
    pub position: Option<Vec3>,
    pub blocks: HashMap<BlockPos, Block>,
    pub hidden: HashSet<BlockPos>,
    pub undiggable: HashSet<BlockPos>,
    pub place_fails: HashSet<BlockPos>,
    pub goto_error: Option<String>,
    pub inventory: Vec<InventoryItem>,
    pub entities: Vec<Entity>,
    pub blocks_by_name: HashMap<String, u32>,
    pub items_by_name: HashMap<String, u32>,
    pub recipes: Vec<Recipe>,
}

impl FakeWorld {
    pub fn with_block(mut self, name: &str, id: u32, pos: BlockPos) -> Self {
        self.blocks.insert(
            pos,
            Block {
                name: name.into(),
                type_id: id,
                position: pos,
            },
        );
        self.blocks_by_name.insert(name.into(), id);
        self
    }

    fn origin(&self) -> Vec3 {
        self.position.unwrap_or(Vec3::new(0.5, 64.0, 0.5))
    }
}

pub struct FakeGame {
    world: Mutex<FakeWorld>,
    calls: Mutex<Vec<Call>>,
    ended: watch::Sender<Option<SessionEnd>>,
}

impl Default for FakeGame {
    fn default() -> Self {
        Self::new(FakeWorld::default())
    }
}

impl FakeGame {
    pub fn new(world: FakeWorld) -> Self {
        Self {
            world: Mutex::new(world),
            calls: Mutex::new(Vec::new()),
            ended: watch::channel(None).0,
        }
    }

    /// Resolves every pending and future `closed()` with `end`.
    pub fn end_session(&self, end: SessionEnd) {
        self.ended.send_replace(Some(end));
    }

    pub fn world(&self) -> MutexGuard<'_, FakeWorld> {
        self.world.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn matches(block: &Block, matching: BlockMatcher) -> bool {
        match matching {
            BlockMatcher::Id { id } => block.type_id == id,
            BlockMatcher::NotAir => !block.is_air(),
        }
    }

    fn entity_matches(filter: &EntityFilter, entity: &Entity) -> bool {
        match filter {
            EntityFilter::Any => true,
            EntityFilter::Player => entity.kind == "player",
            EntityFilter::Mob => entity.kind == "mob",
            EntityFilter::NameContains(needle) => entity
                .name
                .as_deref()
                .is_some_and(|n| n.contains(needle.as_str())),
        }
    }

    fn blocks_near(&self, matching: BlockMatcher, max_distance: f64) -> Vec<Block> {
        let world = self.world();
        let origin = world.origin();
        let mut found: Vec<(f64, Block)> = world
            .blocks
            .values()
            .filter(|b| Self::matches(b, matching))
            .map(|b| (center(b.position).distance_to(&origin), b.clone()))
            .filter(|(d, _)| *d <= max_distance)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().map(|(_, b)| b).collect()
    }
}

#[async_trait]
impl GameClient for FakeGame {
    fn username(&self) -> &str {
        "LLMBot"
    }

    async fn position(&self) -> Result<Vec3, GameError> {
        Ok(self.world().origin())
    }

    async fn goto(&self, goal: Goal) -> Result<(), GameError> {
        self.record(Call::Goto(goal));
        match self.world().goto_error.clone() {
            Some(message) => Err(GameError::Remote { code: -32000, message }),
            None => Ok(()),
        }
    }

    async fn look_at(&self, target: Vec3, _force: bool) -> Result<(), GameError> {
        self.record(Call::LookAt(target));
        Ok(())
    }

    fn set_control_state(&self, control: Control, state: bool) -> Result<(), GameError> {
        self.record(Call::Control(control, state, Instant::now()));
        Ok(())
    }

    async fn block_at(&self, pos: BlockPos) -> Result<Option<Block>, GameError> {
        Ok(self.world().blocks.get(&pos).cloned())
    }

    async fn can_see_block(&self, pos: BlockPos) -> Result<bool, GameError> {
        Ok(!self.world().hidden.contains(&pos))
    }

    async fn can_dig_block(&self, pos: BlockPos) -> Result<bool, GameError> {
        Ok(!self.world().undiggable.contains(&pos))
    }

    async fn place_block(&self, reference: BlockPos, side: Face) -> Result<(), GameError> {
        self.record(Call::Place(reference, side));
        if self.world().place_fails.contains(&reference) {
            return Err(GameError::Remote {
                code: -32000,
                message: "blockUpdate did not fire".into(),
            });
        }
        Ok(())
    }

    async fn dig(&self, pos: BlockPos) -> Result<(), GameError> {
        self.record(Call::Dig(pos));
        self.world().blocks.remove(&pos);
        Ok(())
    }

    async fn block_by_name(&self, name: &str) -> Result<Option<ItemDef>, GameError> {
        Ok(self.world().blocks_by_name.get(name).map(|&id| ItemDef {
            id,
            name: name.into(),
        }))
    }

    async fn find_block(
        &self,
        matching: BlockMatcher,
        max_distance: f64,
    ) -> Result<Option<Block>, GameError> {
        Ok(self.blocks_near(matching, max_distance).into_iter().next())
    }

    async fn find_blocks(
        &self,
        matching: BlockMatcher,
        max_distance: f64,
        count: u32,
    ) -> Result<Vec<BlockPos>, GameError> {
        Ok(self
            .blocks_near(matching, max_distance)
            .into_iter()
            .take(count as usize)
            .map(|b| b.position)
            .collect())
    }

    async fn inventory(&self) -> Result<Vec<InventoryItem>, GameError> {
        Ok(self.world().inventory.clone())
    }

    async fn equip(
        &self,
        item: &InventoryItem,
        destination: EquipDestination,
    ) -> Result<(), GameError> {
        self.record(Call::Equip(item.slot, destination));
        Ok(())
    }

    async fn item_by_name(&self, name: &str) -> Result<Option<ItemDef>, GameError> {
        Ok(self.world().items_by_name.get(name).map(|&id| ItemDef {
            id,
            name: name.into(),
        }))
    }

    async fn recipes_for(
        &self,
        item_id: u32,
        count: u32,
        crafting_table: Option<BlockPos>,
    ) -> Result<Vec<Recipe>, GameError> {
        self.record(Call::RecipesFor(item_id, count, crafting_table));
        Ok(self.world().recipes.clone())
    }

    async fn craft(
        &self,
        recipe: &Recipe,
        count: u32,
        crafting_table: Option<BlockPos>,
    ) -> Result<(), GameError> {
        self.record(Call::Craft(recipe.id, count, crafting_table));
        Ok(())
    }

    async fn nearest_entity(&self, filter: &EntityFilter) -> Result<Option<Entity>, GameError> {
        let world = self.world();
        let origin = world.origin();
        Ok(world
            .entities
            .iter()
            .filter(|e| Self::entity_matches(filter, e))
            .min_by(|a, b| {
                a.position
                    .distance_to(&origin)
                    .total_cmp(&b.position.distance_to(&origin))
            })
            .cloned())
    }

    async fn chat(&self, message: &str) -> Result<(), GameError> {
        self.record(Call::Chat(message.into()));
        Ok(())
    }

    async fn quit(&self) {
        self.record(Call::Quit);
    }

    async fn closed(&self) -> SessionEnd {
        let mut rx = self.ended.subscribe();
        loop {
            if let Some(end) = rx.borrow_and_update().clone() {
                return end;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}
