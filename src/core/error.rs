use thiserror::Error;

use crate::game::GameError;

/// Argument shape mismatch, detected before a handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("missing required field: {0}")]
    Missing(&'static str),
    #[error("invalid type for field {name}: expected {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },
    #[error("invalid value '{value}' for field {name}: expected one of {choices}")]
    NotAChoice {
        name: &'static str,
        value: String,
        choices: String,
    },
    #[error("field {name} is outside the world: {value}")]
    OutOfRange { name: &'static str, value: String },
}

/// Failure while executing a tool against the game.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Args(#[from] ArgError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("{0}")]
    Message(String),
}

impl ToolError {
    pub fn msg(message: impl Into<String>) -> Self {
        ToolError::Message(message.into())
    }
}
