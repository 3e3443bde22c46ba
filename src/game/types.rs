//! Snapshot types borrowed from the game client for the span of one call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Continuous world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Vec3) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Floors each axis, saturating at the `i32` bounds. Meant for positions
    /// reported by the game; use [`BlockPos::axis`] for untrusted input.
    pub fn floor(v: Vec3) -> Self {
        Self {
            x: v.x.floor() as i32,
            y: v.y.floor() as i32,
            z: v.z.floor() as i32,
        }
    }

    /// Floors one coordinate, or `None` when it is not finite or does not fit.
    pub fn axis(c: f64) -> Option<i32> {
        let c = c.floor();
        (c >= f64::from(i32::MIN) && c <= f64::from(i32::MAX)).then_some(c as i32)
    }

    /// The neighbour on `face`, or `None` past the edge of the coordinate space.
    pub fn offset(&self, face: Face) -> Option<Self> {
        let (dx, dy, dz) = face.vector();
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Unit offset sent with `placeBlock` to name the clicked face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceVector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// The six axis-aligned faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl Face {
    pub const NAMES: &'static [&'static str] = &["up", "down", "north", "south", "east", "west"];

    pub fn vector(self) -> (i32, i32, i32) {
        match self {
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::East => (1, 0, 0),
            Face::West => (-1, 0, 0),
        }
    }

    /// Vector pointing from a neighbour on this side back at the origin block.
    pub fn opposite_vector(self) -> FaceVector {
        let (x, y, z) = self.vector();
        FaceVector { x: -x, y: -y, z: -z }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Face::Up => "up",
            Face::Down => "down",
            Face::North => "north",
            Face::South => "south",
            Face::East => "east",
            Face::West => "west",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Face::Up),
            "down" => Some(Face::Down),
            "north" => Some(Face::North),
            "south" => Some(Face::South),
            "east" => Some(Face::East),
            "west" => Some(Face::West),
            _ => None,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: u32,
    pub position: BlockPos,
}

impl Block {
    pub fn is_air(&self) -> bool {
        self.name == "air"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub count: u32,
    pub slot: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Vec3,
}

impl Entity {
    /// Best human-readable label: name, then username, then entity type.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.username.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(&self.kind)
    }
}

/// Registry entry for a block or item kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: u32,
    pub requires_table: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Goal {
    Near { x: f64, y: f64, z: f64, range: f64 },
}

impl Goal {
    pub fn near(pos: Vec3, range: f64) -> Self {
        Goal::Near {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockMatcher {
    Id { id: u32 },
    NotAir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum EntityFilter {
    Any,
    Player,
    Mob,
    NameContains(String),
}

impl EntityFilter {
    /// Builds the filter from the free-form `type` argument of `find-entity`.
    pub fn from_query(query: &str) -> Self {
        match query {
            "" => EntityFilter::Any,
            "player" => EntityFilter::Player,
            "mob" => EntityFilter::Mob,
            other => EntityFilter::NameContains(other.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Forward,
    Back,
    Left,
    Right,
    Jump,
}

impl Control {
    pub const DIRECTIONS: &'static [&'static str] = &["forward", "back", "left", "right"];

    pub fn as_str(self) -> &'static str {
        match self {
            Control::Forward => "forward",
            Control::Back => "back",
            Control::Left => "left",
            Control::Right => "right",
            Control::Jump => "jump",
        }
    }

    /// Parses one of the four walking directions.
    pub fn parse_direction(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(Control::Forward),
            "back" => Some(Control::Back),
            "left" => Some(Control::Left),
            "right" => Some(Control::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipDestination {
    #[serde(rename = "hand")]
    Hand,
    #[serde(rename = "head")]
    Head,
    #[serde(rename = "torso")]
    Torso,
    #[serde(rename = "legs")]
    Legs,
    #[serde(rename = "feet")]
    Feet,
    #[serde(rename = "off-hand")]
    OffHand,
}

impl EquipDestination {
    pub const NAMES: &'static [&'static str] = &["hand", "head", "torso", "legs", "feet", "off-hand"];

    pub fn as_str(self) -> &'static str {
        match self {
            EquipDestination::Hand => "hand",
            EquipDestination::Head => "head",
            EquipDestination::Torso => "torso",
            EquipDestination::Legs => "legs",
            EquipDestination::Feet => "feet",
            EquipDestination::OffHand => "off-hand",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hand" => Some(EquipDestination::Hand),
            "head" => Some(EquipDestination::Head),
            "torso" => Some(EquipDestination::Torso),
            "legs" => Some(EquipDestination::Legs),
            "feet" => Some(EquipDestination::Feet),
            "off-hand" => Some(EquipDestination::OffHand),
            _ => None,
        }
    }
}

impl fmt::Display for EquipDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a game session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Kicked(String),
    Ended(String),
    ConnectionLost(String),
    Quit,
}

impl SessionEnd {
    /// `true` when the session ended because we asked it to.
    pub fn is_local(&self) -> bool {
        matches!(self, SessionEnd::Quit)
    }
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::Kicked(reason) => write!(f, "kicked: {reason}"),
            SessionEnd::Ended(reason) => write!(f, "session ended: {reason}"),
            SessionEnd::ConnectionLost(reason) => write!(f, "connection lost: {reason}"),
            SessionEnd::Quit => f.write_str("quit"),
        }
    }
}
