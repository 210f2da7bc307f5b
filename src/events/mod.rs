// src/events/mod.rs
//
// Internal Event System - Public API

pub mod bus;
pub mod types;

// ============================================================================
// PUBLIC EXPORTS - Event Types and Bus Only
// ============================================================================

pub use types::DomainEvent;

pub use types::{
    // Container lifecycle
    ContainerDeleted,
    ContainerSaved,
    // Projection changes
    FranchiseCreated,
    FranchiseEntriesChanged,
    MergeDisplayNumbersToggled,
    ProjectionChange,
    ProjectionResorted,
    SeriesComponentsChanged,
    SeriesCreated,
};

pub use bus::{EventBus, EventLogEntry, DEFAULT_LOG_CAPACITY};
