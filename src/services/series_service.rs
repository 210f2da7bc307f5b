// src/services/series_service.rs
//
// Series orchestration. Components only carry sequence numbers, so every
// mutation goes straight through the sequence engine.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use super::franchise_service::{read_catalog, write_catalog};
use crate::config::CatalogConfig;
use crate::domain::sequence::{self, ReorderOutcome};
use crate::domain::{
    validate_series, validate_year, Catalog, ComponentKind, DomainError, DomainResult, EntryKind,
    Period, Season, Series, SeriesComponent, SpecialEpisode,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    ContainerDeleted, ContainerSaved, EventBus, ProjectionChange, ProjectionResorted,
    SeriesComponentsChanged, SeriesCreated,
};
use crate::repositories::SeriesRepository;

pub struct SeriesService {
    series_repo: Arc<dyn SeriesRepository>,
    catalog: Arc<RwLock<Catalog>>,
    event_bus: Arc<EventBus>,
    config: CatalogConfig,
}

impl SeriesService {
    pub fn new(
        series_repo: Arc<dyn SeriesRepository>,
        catalog: Arc<RwLock<Catalog>>,
        event_bus: Arc<EventBus>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            series_repo,
            catalog,
            event_bus,
            config,
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    pub fn create_series(&self, title: String) -> AppResult<Uuid> {
        let series = Series::new(title);
        self.series_repo.save(&series)?;

        let id = series.id;
        let title = series.title.clone();
        write_catalog(&self.catalog).insert_series(series);

        self.event_bus.emit(SeriesCreated::new(id, title));
        Ok(id)
    }

    /// Load and validate a series; a broken one is reported, never repaired
    pub fn load(&self, series_id: Uuid) -> AppResult<()> {
        let series = self
            .series_repo
            .get_by_id(series_id)?
            .ok_or(AppError::NotFound)?;

        validate_series(&series).map_err(DomainError::into_integrity)?;
        write_catalog(&self.catalog).insert_series(series);

        log::info!("[CATALOG] Loaded series {}", series_id);
        Ok(())
    }

    pub fn save(&self, series_id: Uuid) -> AppResult<()> {
        let snapshot = self.get_series(series_id)?;
        self.series_repo.save(&snapshot)?;
        self.event_bus.emit(ContainerSaved::new(series_id));
        Ok(())
    }

    pub fn get_series(&self, series_id: Uuid) -> AppResult<Series> {
        Ok(read_catalog(&self.catalog).series(series_id)?.clone())
    }

    /// Components ordered by sequence number
    pub fn projection(&self, series_id: Uuid) -> AppResult<Vec<SeriesComponent>> {
        let catalog = read_catalog(&self.catalog);
        let series = catalog.series(series_id)?;
        Ok(series.components_in_order().into_iter().cloned().collect())
    }

    /// Full re-sort of the projection; firing it repeatedly is harmless
    pub fn resort(&self, series_id: Uuid) -> AppResult<Vec<SeriesComponent>> {
        let projection = self.projection(series_id)?;
        self.event_bus.emit(ProjectionResorted::new(series_id));
        Ok(projection)
    }

    /// Remove a series from the catalog and the database
    ///
    /// A series still listed in a loaded franchise has to be detached first.
    pub fn delete_series(&self, series_id: Uuid) -> AppResult<()> {
        {
            let mut catalog = write_catalog(&self.catalog);
            catalog.series(series_id)?;

            let owner = catalog.franchises().find(|franchise| {
                franchise.entries.iter().any(|entry| {
                    matches!(entry.kind, EntryKind::Series { series_id: id } if id == series_id)
                })
            });
            if let Some(franchise) = owner {
                return Err(DomainError::PreconditionViolation(format!(
                    "Series {} is still an entry of franchise {}",
                    series_id, franchise.id
                ))
                .into());
            }

            catalog.remove_series(series_id);
        }

        self.series_repo.delete(series_id)?;
        self.event_bus.emit(ContainerDeleted::new(series_id));
        log::info!("[CATALOG] Deleted series {}", series_id);
        Ok(())
    }

    /// Every stored series by title, loaded or not
    pub fn list_series(&self) -> AppResult<Vec<Series>> {
        self.series_repo.list_all()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Append a season with defaults derived from the current last component
    pub fn add_season(&self, series_id: Uuid) -> AppResult<Uuid> {
        let component_id = self.mutate(series_id, |series| {
            let number = series.seasons().count() + 1;
            let (channel, year) = self.defaults_after(series)?;

            let season = ComponentKind::Season(Season {
                title: self.config.season_title(number),
                original_title: self.config.season_original_title(number),
                channel,
                periods: vec![Period::single(year)],
            });

            Ok(append(series, season))
        })?;

        self.finish(series_id, ProjectionChange::Added { child_id: component_id })?;
        Ok(component_id)
    }

    /// Append an untitled special episode with defaults derived from the last component
    pub fn add_special_episode(&self, series_id: Uuid) -> AppResult<Uuid> {
        let component_id = self.mutate(series_id, |series| {
            let (channel, year) = self.defaults_after(series)?;

            let episode = ComponentKind::SpecialEpisode(SpecialEpisode {
                title: String::new(),
                original_title: String::new(),
                channel,
                month: 1,
                year,
            });

            Ok(append(series, episode))
        })?;

        self.finish(series_id, ProjectionChange::Added { child_id: component_id })?;
        Ok(component_id)
    }

    /// Replace a component's payload; its position is unchanged
    pub fn update_component(
        &self,
        series_id: Uuid,
        component_id: Uuid,
        kind: ComponentKind,
    ) -> AppResult<()> {
        self.mutate(series_id, |series| {
            let component = series.component_mut(component_id).ok_or_else(|| {
                DomainError::InvalidOperation(format!(
                    "Component {} does not belong to series {}",
                    component_id, series_id
                ))
            })?;
            component.kind = kind;
            validate_series(series).map_err(|err| match err {
                DomainError::DataIntegrity(message) => DomainError::InvalidOperation(message),
                other => other,
            })
        })?;

        self.save(series_id)
    }

    pub fn detach_component(&self, series_id: Uuid, component_id: Uuid) -> AppResult<SeriesComponent> {
        let removed = self.mutate(series_id, |series| {
            sequence::detach(&mut series.components, component_id)
        })?;

        self.finish(series_id, ProjectionChange::Removed { child_id: component_id })?;
        Ok(removed)
    }

    /// Swap two adjacent components; `second` must directly follow `first`
    pub fn swap_components(&self, series_id: Uuid, first: Uuid, second: Uuid) -> AppResult<()> {
        self.mutate(series_id, |series| {
            sequence::swap(&mut series.components, first, second)
        })?;

        self.finish(
            series_id,
            ProjectionChange::Reordered {
                child_ids: vec![first, second],
            },
        )
    }

    pub fn move_component_up(&self, series_id: Uuid, component_id: Uuid) -> AppResult<()> {
        let previous = self
            .previous_component(series_id, component_id)?
            .ok_or_else(|| no_neighbour(component_id, "before"))?;
        self.swap_components(series_id, previous.id, component_id)
    }

    pub fn move_component_down(&self, series_id: Uuid, component_id: Uuid) -> AppResult<()> {
        let next = self
            .next_component(series_id, component_id)?
            .ok_or_else(|| no_neighbour(component_id, "after"))?;
        self.swap_components(series_id, component_id, next.id)
    }

    /// Direct edit of a component's sequence number
    pub fn set_component_sequence_number(
        &self,
        series_id: Uuid,
        component_id: Uuid,
        sequence_number: u32,
    ) -> AppResult<Option<ReorderOutcome>> {
        let outcome = self.mutate(series_id, |series| {
            sequence::move_to(&mut series.components, component_id, sequence_number)
        })?;

        let Some(reorder) = outcome else {
            return Ok(None);
        };

        let mut child_ids = vec![reorder.moved];
        child_ids.extend(reorder.displaced.iter().copied());
        self.finish(series_id, ProjectionChange::Reordered { child_ids })?;
        self.event_bus.emit(ProjectionResorted::new(series_id));

        Ok(Some(reorder))
    }

    pub fn convert_to_miniseries(&self, series_id: Uuid) -> AppResult<()> {
        self.mutate(series_id, |series| {
            if !series.can_convert_to_miniseries() {
                return Err(DomainError::InvalidOperation(format!(
                    "Series {} has more than one season, period or a special episode",
                    series_id
                )));
            }
            series.is_miniseries = true;
            Ok(())
        })?;

        self.save(series_id)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn next_component(
        &self,
        series_id: Uuid,
        component_id: Uuid,
    ) -> AppResult<Option<SeriesComponent>> {
        let catalog = read_catalog(&self.catalog);
        let series = catalog.series(series_id)?;
        Ok(sequence::next_sibling(&series.components, component_id).cloned())
    }

    pub fn previous_component(
        &self,
        series_id: Uuid,
        component_id: Uuid,
    ) -> AppResult<Option<SeriesComponent>> {
        let catalog = read_catalog(&self.catalog);
        let series = catalog.series(series_id)?;
        Ok(sequence::previous_sibling(&series.components, component_id).cloned())
    }

    pub fn can_move_up(&self, series_id: Uuid, component_id: Uuid) -> AppResult<bool> {
        Ok(self.previous_component(series_id, component_id)?.is_some())
    }

    pub fn can_move_down(&self, series_id: Uuid, component_id: Uuid) -> AppResult<bool> {
        Ok(self.next_component(series_id, component_id)?.is_some())
    }

    /// Components can be added only while the series has no validation errors
    pub fn can_add_component(&self, series_id: Uuid, has_validation_errors: bool) -> AppResult<bool> {
        read_catalog(&self.catalog).series(series_id)?;
        Ok(!has_validation_errors)
    }

    pub fn can_convert_to_miniseries(&self, series_id: Uuid) -> AppResult<bool> {
        let catalog = read_catalog(&self.catalog);
        Ok(catalog.series(series_id)?.can_convert_to_miniseries())
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Channel and year for a component appended after the current last one
    ///
    /// Fails when the derived year is out of range, e.g. the last component
    /// already airs in the final supported year.
    fn defaults_after(&self, series: &Series) -> DomainResult<(String, i32)> {
        let Some(previous) = series.last_component() else {
            let year = self.config.default_series_year;
            validate_year(year)?;
            return Ok((String::new(), year));
        };

        let year = previous.kind.next_year().ok_or_else(|| {
            DomainError::InvariantViolation(format!(
                "Component {} leaves no year for the next one",
                previous.id
            ))
        })?;
        validate_year(year)?;

        Ok((previous.kind.channel().to_string(), year))
    }

    /// Run `operation` on a copy of the series; the stored series only
    /// changes when it succeeds
    fn mutate<T>(
        &self,
        series_id: Uuid,
        operation: impl FnOnce(&mut Series) -> DomainResult<T>,
    ) -> AppResult<T> {
        let mut catalog = write_catalog(&self.catalog);
        let series = catalog.series_mut(series_id)?;

        let mut draft = series.clone();
        let result = operation(&mut draft)?;
        draft.touch();
        *series = draft;

        Ok(result)
    }

    fn finish(&self, series_id: Uuid, change: ProjectionChange) -> AppResult<()> {
        self.save(series_id)?;
        self.event_bus
            .emit(SeriesComponentsChanged::new(series_id, change));
        Ok(())
    }
}

fn append(series: &mut Series, kind: ComponentKind) -> Uuid {
    let component = SeriesComponent::new(series.id, kind);
    let component_id = component.id;
    let position = sequence::insert(&mut series.components, component);
    log::debug!(
        "[SEQUENCE] Added component {} to series {} at {}",
        component_id,
        series.id,
        position
    );
    component_id
}

fn no_neighbour(component_id: Uuid, side: &str) -> AppError {
    AppError::Domain(DomainError::PreconditionViolation(format!(
        "No component {} component {}",
        side, component_id
    )))
}
