//! Error types for the simulation core
//!
//! Almost every variant is a content/configuration error: something that is wrong in a
//! level file, a tileset or an animation and that should be caught while authoring content.
//! None of them are retried at runtime.

use thiserror::Error;

/// Errors raised while constructing or loading game objects
#[derive(Debug, Error)]
pub enum GameError {
    /// A tile id in the grid has no surface in the atlas
    #[error("invalid tileset: tile id {tile} at ({x}, {y}) is not in the atlas")]
    InvalidTileset { tile: i32, x: usize, y: usize },

    /// Tile grid rows do not all have the same length
    #[error("tile grid row {row} has {found} cells, expected {expected}")]
    RaggedTileGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("entity type '{0}' already registered")]
    DuplicateEntityType(String),

    /// Entity descriptor parameters did not match the kind's parameter struct
    #[error("invalid parameters for entity type '{kind}': {source}")]
    InvalidEntityParams {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid animation: {0}")]
    InvalidAnimation(String),

    #[error("cached rendering requires a surface with precomputed rotations: '{0}'")]
    UncachedSurface(String),

    /// Lookup of a key that the asset loader never provided
    #[error("missing {table} asset '{key}'")]
    MissingAsset { table: &'static str, key: String },

    #[error("unknown movement profile: {0}")]
    UnknownProfile(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A physics-backed transform was handed to a second simulation
    #[error("physics body is already registered in another simulation")]
    ForeignBody,

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = GameError::InvalidTileset { tile: 7, x: 2, y: 3 };
        assert_eq!(
            err.to_string(),
            "invalid tileset: tile id 7 at (2, 3) is not in the atlas"
        );

        let err = GameError::MissingAsset {
            table: "surface",
            key: "submarine".to_string(),
        };
        assert_eq!(err.to_string(), "missing surface asset 'submarine'");
    }

    #[test]
    fn test_parse_error_converts() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: GameError = parse.unwrap_err().into();
        assert!(matches!(err, GameError::Parse(_)));
    }
}
