// src/application/commands/franchise_commands.rs
//
// Franchise Command Handlers
//
// RULES:
// - Accept ids and DTOs
// - Call services
// - Return DTOs
// - Never contain business logic

use uuid::Uuid;

use super::parse_id;
use crate::application::dto::{
    AttachEntryDto, EntryPermissionsDto, FranchiseDto, FranchiseEntryDto,
};
use crate::application::error_handling::{ErrorResponse, ToErrorResponse};
use crate::application::state::AppState;
use crate::error::AppResult;
use crate::services::{AttachEntryRequest, FranchiseService};

/// Create an empty franchise and return its id
pub fn create_franchise(state: &AppState, title: String) -> Result<String, String> {
    let id = state
        .franchise_service
        .create_franchise(title)
        .to_error_response()?;
    Ok(id.to_string())
}

/// Load the tree containing a franchise; returns the outermost franchise
pub fn load_franchise_tree(state: &AppState, franchise_id: String) -> Result<FranchiseDto, String> {
    let id = parse_id(&franchise_id)?;
    let root = state.franchise_service.load_tree(id).to_error_response()?;
    get_franchise(state, root.to_string())
}

pub fn delete_franchise(state: &AppState, franchise_id: String) -> Result<(), String> {
    let id = parse_id(&franchise_id)?;
    state
        .franchise_service
        .delete_franchise(id)
        .to_error_response()
}

/// Stored franchises by title
pub fn list_franchises(state: &AppState) -> Result<Vec<FranchiseDto>, String> {
    let franchises = state
        .franchise_service
        .list_franchises()
        .to_error_response()?;
    Ok(franchises.iter().map(FranchiseDto::from).collect())
}

pub fn get_franchise(state: &AppState, franchise_id: String) -> Result<FranchiseDto, String> {
    let id = parse_id(&franchise_id)?;
    let franchise = state
        .franchise_service
        .get_franchise(id)
        .to_error_response()?;
    Ok(FranchiseDto::from(&franchise))
}

pub fn get_franchise_title_path(state: &AppState, franchise_id: String) -> Result<String, String> {
    let id = parse_id(&franchise_id)?;
    state.franchise_service.title_path(id).to_error_response()
}

/// Re-sort trigger; safe to call any number of times
pub fn resort_franchise(
    state: &AppState,
    franchise_id: String,
) -> Result<Vec<FranchiseEntryDto>, String> {
    let id = parse_id(&franchise_id)?;
    let entries = state.franchise_service.resort(id).to_error_response()?;
    Ok(entries.iter().map(FranchiseEntryDto::from).collect())
}

/// Add a movie, series or nested franchise at the end; returns the entry id
pub fn attach_entry(state: &AppState, dto: AttachEntryDto) -> Result<String, String> {
    let franchise_id = parse_id(&dto.franchise_id)?;
    let target_id = parse_id(&dto.target_id)?;
    let kind = dto.entry_kind(target_id).ok_or_else(|| {
        ErrorResponse::validation(format!("Invalid entry kind: {}", dto.kind)).to_json()
    })?;

    let entry_id = state
        .franchise_service
        .attach_entry(AttachEntryRequest {
            franchise_id,
            kind,
            show_display_number: dto.show_display_number,
        })
        .to_error_response()?;

    Ok(entry_id.to_string())
}

pub fn detach_entry(
    state: &AppState,
    franchise_id: String,
    entry_id: String,
) -> Result<FranchiseEntryDto, String> {
    let removed = state
        .franchise_service
        .detach_entry(parse_id(&franchise_id)?, parse_id(&entry_id)?)
        .to_error_response()?;
    Ok(FranchiseEntryDto::from(&removed))
}

pub fn move_entry_up(state: &AppState, franchise_id: String, entry_id: String) -> Result<(), String> {
    state
        .franchise_service
        .move_entry_up(parse_id(&franchise_id)?, parse_id(&entry_id)?)
        .to_error_response()
}

pub fn move_entry_down(
    state: &AppState,
    franchise_id: String,
    entry_id: String,
) -> Result<(), String> {
    state
        .franchise_service
        .move_entry_down(parse_id(&franchise_id)?, parse_id(&entry_id)?)
        .to_error_response()
}

/// Direct sequence edit; returns the franchise as re-sorted
pub fn set_entry_sequence_number(
    state: &AppState,
    franchise_id: String,
    entry_id: String,
    sequence_number: u32,
) -> Result<FranchiseDto, String> {
    let id = parse_id(&franchise_id)?;
    state
        .franchise_service
        .set_entry_sequence_number(id, parse_id(&entry_id)?, sequence_number)
        .to_error_response()?;
    get_franchise(state, franchise_id)
}

pub fn show_display_number(
    state: &AppState,
    franchise_id: String,
    entry_id: String,
) -> Result<(), String> {
    state
        .franchise_service
        .show_display_number(parse_id(&franchise_id)?, parse_id(&entry_id)?)
        .to_error_response()
}

pub fn hide_display_number(
    state: &AppState,
    franchise_id: String,
    entry_id: String,
) -> Result<(), String> {
    state
        .franchise_service
        .hide_display_number(parse_id(&franchise_id)?, parse_id(&entry_id)?)
        .to_error_response()
}

pub fn set_merge_display_numbers(
    state: &AppState,
    franchise_id: String,
    enabled: bool,
) -> Result<(), String> {
    state
        .franchise_service
        .set_merge_display_numbers(parse_id(&franchise_id)?, enabled)
        .to_error_response()
}

pub fn set_loosely_connected(
    state: &AppState,
    franchise_id: String,
    value: bool,
) -> Result<(), String> {
    state
        .franchise_service
        .set_loosely_connected(parse_id(&franchise_id)?, value)
        .to_error_response()
}

pub fn get_next_display_number(state: &AppState, franchise_id: String) -> Result<u32, String> {
    state
        .franchise_service
        .next_display_number(parse_id(&franchise_id)?)
        .to_error_response()
}

pub fn get_entry_permissions(
    state: &AppState,
    franchise_id: String,
    entry_id: String,
) -> Result<EntryPermissionsDto, String> {
    entry_permissions(
        &state.franchise_service,
        parse_id(&franchise_id)?,
        parse_id(&entry_id)?,
    )
    .to_error_response()
}

fn entry_permissions(
    service: &FranchiseService,
    franchise_id: Uuid,
    entry_id: Uuid,
) -> AppResult<EntryPermissionsDto> {
    Ok(EntryPermissionsDto {
        can_move_up: service.can_move_up(franchise_id, entry_id)?,
        can_move_down: service.can_move_down(franchise_id, entry_id)?,
        can_detach: service.can_detach(franchise_id, entry_id)?,
        can_show_display_number: service.can_show_display_number(franchise_id, entry_id)?,
        can_hide_display_number: service.can_hide_display_number(franchise_id, entry_id)?,
    })
}

pub fn can_add_entry(
    state: &AppState,
    franchise_id: String,
    has_validation_errors: bool,
    is_new: bool,
) -> Result<bool, String> {
    state
        .franchise_service
        .can_add_entry(parse_id(&franchise_id)?, has_validation_errors, is_new)
        .to_error_response()
}

pub fn can_attach_franchise(
    state: &AppState,
    franchise_id: String,
    nested_id: String,
) -> Result<bool, String> {
    state
        .franchise_service
        .can_attach_franchise(parse_id(&franchise_id)?, parse_id(&nested_id)?)
        .to_error_response()
}
