// src/application/commands/series_commands.rs
//
// Series Command Handlers

use uuid::Uuid;

use super::parse_id;
use crate::application::dto::{ComponentPermissionsDto, SeriesComponentDto, SeriesDto};
use crate::application::error_handling::ToErrorResponse;
use crate::application::state::AppState;
use crate::domain::ComponentKind;
use crate::error::AppResult;
use crate::services::SeriesService;

pub fn create_series(state: &AppState, title: String) -> Result<String, String> {
    let id = state
        .series_service
        .create_series(title)
        .to_error_response()?;
    Ok(id.to_string())
}

pub fn load_series(state: &AppState, series_id: String) -> Result<SeriesDto, String> {
    let id = parse_id(&series_id)?;
    state.series_service.load(id).to_error_response()?;
    get_series(state, series_id)
}

pub fn get_series(state: &AppState, series_id: String) -> Result<SeriesDto, String> {
    let series = state
        .series_service
        .get_series(parse_id(&series_id)?)
        .to_error_response()?;
    Ok(SeriesDto::from(&series))
}

pub fn delete_series(state: &AppState, series_id: String) -> Result<(), String> {
    state
        .series_service
        .delete_series(parse_id(&series_id)?)
        .to_error_response()
}

/// Stored series by title
pub fn list_series(state: &AppState) -> Result<Vec<SeriesDto>, String> {
    let series = state.series_service.list_series().to_error_response()?;
    Ok(series.iter().map(SeriesDto::from).collect())
}

/// Re-sort trigger; safe to call any number of times
pub fn resort_series(
    state: &AppState,
    series_id: String,
) -> Result<Vec<SeriesComponentDto>, String> {
    let components = state
        .series_service
        .resort(parse_id(&series_id)?)
        .to_error_response()?;
    Ok(components.iter().map(SeriesComponentDto::from).collect())
}

pub fn add_season(state: &AppState, series_id: String) -> Result<String, String> {
    let id = state
        .series_service
        .add_season(parse_id(&series_id)?)
        .to_error_response()?;
    Ok(id.to_string())
}

pub fn add_special_episode(state: &AppState, series_id: String) -> Result<String, String> {
    let id = state
        .series_service
        .add_special_episode(parse_id(&series_id)?)
        .to_error_response()?;
    Ok(id.to_string())
}

pub fn update_component(
    state: &AppState,
    series_id: String,
    component_id: String,
    payload: ComponentKind,
) -> Result<(), String> {
    state
        .series_service
        .update_component(parse_id(&series_id)?, parse_id(&component_id)?, payload)
        .to_error_response()
}

pub fn detach_component(
    state: &AppState,
    series_id: String,
    component_id: String,
) -> Result<SeriesComponentDto, String> {
    let removed = state
        .series_service
        .detach_component(parse_id(&series_id)?, parse_id(&component_id)?)
        .to_error_response()?;
    Ok(SeriesComponentDto::from(&removed))
}

pub fn move_component_up(
    state: &AppState,
    series_id: String,
    component_id: String,
) -> Result<(), String> {
    state
        .series_service
        .move_component_up(parse_id(&series_id)?, parse_id(&component_id)?)
        .to_error_response()
}

pub fn move_component_down(
    state: &AppState,
    series_id: String,
    component_id: String,
) -> Result<(), String> {
    state
        .series_service
        .move_component_down(parse_id(&series_id)?, parse_id(&component_id)?)
        .to_error_response()
}

pub fn set_component_sequence_number(
    state: &AppState,
    series_id: String,
    component_id: String,
    sequence_number: u32,
) -> Result<SeriesDto, String> {
    state
        .series_service
        .set_component_sequence_number(
            parse_id(&series_id)?,
            parse_id(&component_id)?,
            sequence_number,
        )
        .to_error_response()?;
    get_series(state, series_id)
}

pub fn convert_to_miniseries(state: &AppState, series_id: String) -> Result<(), String> {
    state
        .series_service
        .convert_to_miniseries(parse_id(&series_id)?)
        .to_error_response()
}

pub fn get_component_permissions(
    state: &AppState,
    series_id: String,
    component_id: String,
) -> Result<ComponentPermissionsDto, String> {
    component_permissions(
        &state.series_service,
        parse_id(&series_id)?,
        parse_id(&component_id)?,
    )
    .to_error_response()
}

fn component_permissions(
    service: &SeriesService,
    series_id: Uuid,
    component_id: Uuid,
) -> AppResult<ComponentPermissionsDto> {
    Ok(ComponentPermissionsDto {
        can_move_up: service.can_move_up(series_id, component_id)?,
        can_move_down: service.can_move_down(series_id, component_id)?,
        can_convert_to_miniseries: service.can_convert_to_miniseries(series_id)?,
    })
}

pub fn can_add_component(
    state: &AppState,
    series_id: String,
    has_validation_errors: bool,
) -> Result<bool, String> {
    state
        .series_service
        .can_add_component(parse_id(&series_id)?, has_validation_errors)
        .to_error_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;

    #[test]
    fn test_series_round_trip_through_commands() {
        let state = AppState::in_memory(CatalogConfig::default()).unwrap();
        let id = create_series(&state, "Fargo".to_string()).unwrap();
        let first = add_season(&state, id.clone()).unwrap();
        let special = add_special_episode(&state, id.clone()).unwrap();

        let dto = set_component_sequence_number(&state, id.clone(), special.clone(), 1).unwrap();
        assert_eq!(dto.components[0].id, special);
        assert_eq!(dto.components[1].id, first);
        assert_eq!(dto.components[1].title, "Season 1");

        let permissions = get_component_permissions(&state, id.clone(), special).unwrap();
        assert!(!permissions.can_move_up);
        assert!(permissions.can_move_down);
        assert!(!permissions.can_convert_to_miniseries);

        assert!(!can_add_component(&state, id, true).unwrap());
    }

    #[test]
    fn test_unknown_series_is_not_found() {
        let state = AppState::in_memory(CatalogConfig::default()).unwrap();
        let err = get_series(&state, Uuid::new_v4().to_string()).unwrap_err();
        assert!(err.contains("not_found"));
    }

    #[test]
    fn test_delete_series_through_commands() {
        let state = AppState::in_memory(CatalogConfig::default()).unwrap();
        let id = create_series(&state, "Lost".to_string()).unwrap();
        assert_eq!(list_series(&state).unwrap().len(), 1);

        delete_series(&state, id).unwrap();

        assert!(list_series(&state).unwrap().is_empty());
    }
}
