// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the presentation layer and services
// - Commands accept ids as strings and DTOs, return DTOs
// - Errors leave as serialized ErrorResponse JSON
// - Commands NEVER contain business logic

pub mod franchise_commands;
pub mod series_commands;

pub use franchise_commands::*;
pub use series_commands::*;

use uuid::Uuid;

use crate::application::error_handling::ErrorResponse;

pub(crate) fn parse_id(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value)
        .map_err(|e| ErrorResponse::validation(format!("Invalid UUID: {}", e)).to_json())
}
