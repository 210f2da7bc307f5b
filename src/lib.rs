// src/lib.rs
// CineCatalog - ordering and display numbering for a local movie catalog
//
// Architecture:
// - Domain-centric: sequence and display-number rules live in the domain
// - Arena catalog: containers reference each other by id, never by pointer
// - Event-driven: projection consumers learn about changes through the bus
// - Explicit: loading validates, nothing is silently repaired
// - Application Layer: presentation boundary (DTOs, commands)

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_franchise,
    validate_series,
    // Catalog
    Catalog,
    // Series
    ComponentKind,
    DisplayUpdate,
    DomainError,
    DomainResult,
    // Franchise
    EntryKind,
    Franchise,
    FranchiseEntry,
    MoveDirection,
    // Numbering
    NumberingOutcome,
    ParentLink,
    Period,
    // Sequence
    ReorderOutcome,
    Season,
    Sequenced,
    Series,
    SeriesComponent,
    SpecialEpisode,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::CatalogConfig;

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    ContainerDeleted,
    ContainerSaved,
    DomainEvent,
    EventBus,
    EventLogEntry,
    DEFAULT_LOG_CAPACITY,
    FranchiseCreated,
    FranchiseEntriesChanged,
    MergeDisplayNumbersToggled,
    ProjectionChange,
    ProjectionResorted,
    SeriesComponentsChanged,
    SeriesCreated,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    FranchiseRepository, SeriesRepository, SqliteFranchiseRepository, SqliteSeriesRepository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{AttachEntryRequest, FranchiseService, SeriesService};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::AppState;

// Re-export application submodules
pub use application::commands;
pub use application::dto;
