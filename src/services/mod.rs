// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod franchise_service;
pub mod series_service;


// Re-export all services and their types
pub use franchise_service::{AttachEntryRequest, FranchiseService};

pub use series_service::SeriesService;
