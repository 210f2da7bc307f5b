// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO ordering, NO repair, NO invariant enforcement
// - NO event emission
// - Explicit SQL only

pub mod franchise_repository;
pub mod series_repository;

pub use franchise_repository::{FranchiseRepository, SqliteFranchiseRepository};
pub use series_repository::{SeriesRepository, SqliteSeriesRepository};

#[cfg(test)]
pub use franchise_repository::MockFranchiseRepository;
#[cfg(test)]
pub use series_repository::MockSeriesRepository;
