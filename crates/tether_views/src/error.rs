//! # View Error Types
//!
//! Everything that can go wrong inside the view layer. None of these are
//! fatal: the registry logs them and degrades to "this view is absent".

use thiserror::Error;

use crate::view::{EntityId, IdentityCategory};

/// Errors that can occur in the view layer.
#[derive(Error, Debug)]
pub enum ViewError {
    /// The world data provider had nothing for this entity.
    ///
    /// Expected when the entity left between the create request and the
    /// lookup.
    #[error("no source data for {category} entity {id}")]
    SourceUnavailable {
        /// Category the create was aimed at.
        category: IdentityCategory,
        /// The entity that could not be resolved.
        id: EntityId,
    },

    /// A view failed to push the latest simulation state into its scene.
    #[error("view {id} failed to update: {reason}")]
    UpdateFailed {
        /// The failing view.
        id: EntityId,
        /// What went wrong.
        reason: String,
    },

    /// Configuration parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration is not valid TOML for `ViewConfig`.
    #[error("malformed configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),
}

/// Result type for view operations.
pub type ViewResult<T> = Result<T, ViewError>;
