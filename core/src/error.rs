use alloc::string::String;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Tile value must be a power of two of at least 2")]
    InvalidTileValue,
    #[error("Stored game state could not be parsed")]
    MalformedState,
    #[error("Game state could not be encoded")]
    UnencodableState,
    #[error("Game has not been won, nothing to keep playing for")]
    NotWon,
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failure reported by a persistence gateway. Never fatal to the game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
    #[error("Storage rejected the write: {0}")]
    Rejected(String),
}
