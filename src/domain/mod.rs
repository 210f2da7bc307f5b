// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod catalog;
pub mod franchise;
pub mod numbering;
pub mod sequence;
pub mod series;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Franchise Domain
pub use franchise::{validate_franchise, EntryKind, Franchise, FranchiseEntry, ParentLink};

// Series Domain
pub use series::{
    validate_series, validate_year, ComponentKind, Period, Season, Series, SeriesComponent,
    SpecialEpisode, MAX_YEAR, MIN_YEAR,
};

// Sequence Engine (shared by both container kinds)
pub use sequence::{
    Backward, Forward, MoveDirection, ReorderOutcome, Sequenced,
};

// Catalog (arena of containers)
pub use catalog::Catalog;

// Display Number Engine
pub use numbering::{DisplayUpdate, NumberingOutcome};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of ordering and numbering rules
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

impl DomainError {
    /// Recast a rule violation found in stored data as a data-integrity error
    pub fn into_integrity(self) -> DomainError {
        match self {
            DomainError::InvariantViolation(message) => DomainError::DataIntegrity(message),
            other => other,
        }
    }
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
