//! Core types & traits: tool contracts, argument shapes and errors.

pub mod error;
pub mod params;
pub mod tool;
