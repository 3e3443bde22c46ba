//! Minecraft bot exposed to AI assistants as MCP tools.
//!
//! - `game`: the game-client collaborator (bridge protocol, session bootstrap)
//! - `core`: tool contracts, argument validation, errors
//! - `tools`: the tool handlers and the dispatching registry
//! - `infra`: config, logging, MCP transports, boot
//! - `cli`: command-line entry points

pub mod cli;
pub mod core;
pub mod game;
pub mod infra;
pub mod tools;
