//! Error taxonomy
//!
//! Three families of failure exist:
//! - configuration errors, raised while a scene is being set up
//! - state violations, raised when a caller breaks the cell/tile invariants
//! - missing entities or components (programming errors)
//!
//! Out-of-range lookups and gameplay no-ops are not errors: they are `None`
//! or `false` at the call site.

use thiserror::Error;

use crate::resources::ResourceKind;
use crate::sim::{CellId, ComponentKind, TileId};

/// Broad category of a [`BlastError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    State,
    NotFound,
}

#[derive(Debug, Error)]
pub enum BlastError {
    #[error("unknown {kind:?} resource `{name}`")]
    MissingResource { kind: ResourceKind, name: String },

    #[error("resource kind {0:?} is already registered")]
    DuplicateResourceKind(ResourceKind),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("state has no field `{0}`")]
    UnknownField(String),

    #[error("cell {cell:?} is already occupied by tile {occupant:?}")]
    CellOccupied { cell: CellId, occupant: TileId },

    #[error("tile {tile:?} is already attached to cell {cell:?}")]
    TileAlreadyAttached { tile: TileId, cell: CellId },

    #[error("tile {0:?} is already queued for movement")]
    AlreadyQueued(TileId),

    #[error("tile {0:?} does not exist")]
    UnknownTile(TileId),

    #[error("tile {tile:?} has no {kind:?} component")]
    MissingComponent { tile: TileId, kind: ComponentKind },
}

impl BlastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BlastError::MissingResource { .. }
            | BlastError::DuplicateResourceKind(_)
            | BlastError::InvalidConfig(_)
            | BlastError::ConfigParse(_)
            | BlastError::UnknownField(_) => ErrorCategory::Config,
            BlastError::CellOccupied { .. }
            | BlastError::TileAlreadyAttached { .. }
            | BlastError::AlreadyQueued(_) => ErrorCategory::State,
            BlastError::UnknownTile(_) | BlastError::MissingComponent { .. } => {
                ErrorCategory::NotFound
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BlastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = BlastError::InvalidConfig("rows".into());
        assert_eq!(err.category(), ErrorCategory::Config);

        let err = BlastError::AlreadyQueued(TileId(3));
        assert_eq!(err.category(), ErrorCategory::State);

        let err = BlastError::MissingComponent {
            tile: TileId(1),
            kind: ComponentKind::Movement,
        };
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().contains("Movement"));
    }
}
