// src/services/franchise_service.rs
//
// Franchise orchestration: load -> validate -> mutate -> save -> notify
//
// Mutations run under the catalog write lock. Touched franchises are
// persisted and events are emitted after the lock is released.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::domain::catalog::MAX_NESTING_DEPTH;
use crate::domain::numbering::{self, NumberingOutcome};
use crate::domain::sequence::{self, ReorderOutcome};
use crate::domain::{
    validate_franchise, Catalog, DomainError, DomainResult, EntryKind, Franchise, FranchiseEntry,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    ContainerDeleted, ContainerSaved, EventBus, FranchiseCreated, FranchiseEntriesChanged,
    MergeDisplayNumbersToggled, ProjectionChange, ProjectionResorted,
};
use crate::repositories::FranchiseRepository;

#[derive(Debug, Clone)]
pub struct AttachEntryRequest {
    pub franchise_id: Uuid,
    pub kind: EntryKind,
    /// Give the new entry a display number right away
    pub show_display_number: bool,
}

pub struct FranchiseService {
    franchise_repo: Arc<dyn FranchiseRepository>,
    catalog: Arc<RwLock<Catalog>>,
    event_bus: Arc<EventBus>,
}

/// Mutations only ever write a fully computed catalog, so a guard poisoned by
/// a panicking caller still protects a consistent catalog
pub(crate) fn read_catalog(catalog: &RwLock<Catalog>) -> RwLockReadGuard<'_, Catalog> {
    catalog.read().unwrap_or_else(|poisoned| {
        log::warn!("[CATALOG] Recovering catalog lock after a panic");
        poisoned.into_inner()
    })
}

pub(crate) fn write_catalog(catalog: &RwLock<Catalog>) -> RwLockWriteGuard<'_, Catalog> {
    catalog.write().unwrap_or_else(|poisoned| {
        log::warn!("[CATALOG] Recovering catalog lock after a panic");
        poisoned.into_inner()
    })
}

impl FranchiseService {
    pub fn new(
        franchise_repo: Arc<dyn FranchiseRepository>,
        catalog: Arc<RwLock<Catalog>>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            franchise_repo,
            catalog,
            event_bus,
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    pub fn create_franchise(&self, title: String) -> AppResult<Uuid> {
        let franchise = Franchise::new(title);
        validate_franchise(&franchise)?;
        self.franchise_repo.save(&franchise)?;

        let id = franchise.id;
        let title = franchise.title.clone();
        write_catalog(&self.catalog).insert_franchise(franchise);

        self.event_bus.emit(FranchiseCreated::new(id, title));
        Ok(id)
    }

    /// Load the whole tree containing `franchise_id`
    ///
    /// The outermost ancestor is found first, then every nested franchise is
    /// loaded and validated. Nothing is repaired: a broken container fails
    /// the load with a data-integrity error and the catalog is left as it was.
    /// Returns the id of the outermost franchise.
    pub fn load_tree(&self, franchise_id: Uuid) -> AppResult<Uuid> {
        let root_id = self.find_root(franchise_id)?;

        let mut staging = Catalog::new();
        let mut pending = vec![root_id];
        while let Some(id) = pending.pop() {
            if staging.contains_franchise(id) {
                return Err(DomainError::DataIntegrity(format!(
                    "Franchise {} is reachable twice in one tree",
                    id
                ))
                .into());
            }

            let franchise = self.franchise_repo.get_by_id(id)?.ok_or_else(|| {
                DomainError::DataIntegrity(format!("Referenced franchise {} does not exist", id))
            })?;

            validate_franchise(&franchise)?;
            pending.extend(
                franchise
                    .entries
                    .iter()
                    .filter_map(|entry| entry.kind.nested_franchise()),
            );
            staging.insert_franchise(franchise);
        }

        let loaded: Vec<Uuid> = staging.franchises().map(|f| f.id).collect();
        for id in &loaded {
            staging
                .validate_links(*id)
                .map_err(DomainError::into_integrity)?;
        }

        let mut catalog = write_catalog(&self.catalog);
        for id in loaded {
            if let Some(franchise) = staging.remove_franchise(id) {
                catalog.insert_franchise(franchise);
            }
        }

        log::info!("[CATALOG] Loaded franchise tree {}", root_id);
        Ok(root_id)
    }

    fn find_root(&self, franchise_id: Uuid) -> AppResult<Uuid> {
        let mut current = franchise_id;
        let mut seen = vec![franchise_id];

        while let Some(link) = self.franchise_repo.find_parent(current)? {
            if seen.contains(&link.franchise_id) || seen.len() > MAX_NESTING_DEPTH {
                return Err(DomainError::DataIntegrity(format!(
                    "Franchise {} has a cyclic or too deep parent chain",
                    franchise_id
                ))
                .into());
            }
            seen.push(link.franchise_id);
            current = link.franchise_id;
        }

        Ok(current)
    }

    /// Remove a franchise from the catalog and the database
    ///
    /// Its parent closes the numbering gap; franchises nested in it become
    /// top-level.
    pub fn delete_franchise(&self, franchise_id: Uuid) -> AppResult<()> {
        let (removed, outcome) =
            self.mutate(|catalog| numbering::delete_franchise(catalog, franchise_id))?;
        self.franchise_repo.delete(franchise_id)?;

        match removed.parent {
            Some(link) => self.finish(
                &[link.franchise_id],
                link.franchise_id,
                Some(ProjectionChange::Removed {
                    child_id: link.entry_id,
                }),
                &outcome,
            )?,
            None => self.finish(&[], franchise_id, None, &outcome)?,
        }

        self.event_bus.emit(ContainerDeleted::new(franchise_id));
        log::info!("[CATALOG] Deleted franchise {}", franchise_id);
        Ok(())
    }

    /// Every stored franchise by title, loaded or not
    pub fn list_franchises(&self) -> AppResult<Vec<Franchise>> {
        self.franchise_repo.list_all()
    }

    /// Persist every loaded franchise of the tree containing `franchise_id`
    pub fn save_tree(&self, franchise_id: Uuid) -> AppResult<()> {
        let ids: Vec<Uuid> = {
            let catalog = read_catalog(&self.catalog);
            let root = catalog.root_of(franchise_id)?;
            catalog
                .franchises()
                .filter(|f| catalog.root_of(f.id).map(|r| r == root).unwrap_or(false))
                .map(|f| f.id)
                .collect()
        };
        self.persist(&ids)
    }

    pub fn get_franchise(&self, franchise_id: Uuid) -> AppResult<Franchise> {
        Ok(read_catalog(&self.catalog).franchise(franchise_id)?.clone())
    }

    /// Entries ordered by sequence number
    pub fn projection(&self, franchise_id: Uuid) -> AppResult<Vec<FranchiseEntry>> {
        let catalog = read_catalog(&self.catalog);
        let franchise = catalog.franchise(franchise_id)?;
        Ok(franchise.entries_in_order().into_iter().cloned().collect())
    }

    /// Full re-sort of the projection; firing it repeatedly is harmless
    pub fn resort(&self, franchise_id: Uuid) -> AppResult<Vec<FranchiseEntry>> {
        let projection = self.projection(franchise_id)?;
        self.event_bus.emit(ProjectionResorted::new(franchise_id));
        Ok(projection)
    }

    /// "Outer: Inner: Franchise"
    pub fn title_path(&self, franchise_id: Uuid) -> AppResult<String> {
        let catalog = read_catalog(&self.catalog);
        let mut titles = vec![catalog.franchise(franchise_id)?.title.clone()];
        for ancestor in catalog.ancestors(franchise_id)? {
            titles.push(catalog.franchise(ancestor)?.title.clone());
        }
        titles.reverse();
        Ok(titles.join(": "))
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn attach_entry(&self, request: AttachEntryRequest) -> AppResult<Uuid> {
        let franchise_id = request.franchise_id;
        let (entry_id, outcome) = self.mutate(|catalog| {
            numbering::attach_entry(
                catalog,
                franchise_id,
                request.kind,
                request.show_display_number,
            )
        })?;

        self.finish(
            &[franchise_id],
            franchise_id,
            Some(ProjectionChange::Added { child_id: entry_id }),
            &outcome,
        )?;
        Ok(entry_id)
    }

    pub fn detach_entry(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<FranchiseEntry> {
        let (removed, outcome) =
            self.mutate(|catalog| numbering::detach_entry(catalog, franchise_id, entry_id))?;

        self.finish(
            &[franchise_id],
            franchise_id,
            Some(ProjectionChange::Removed { child_id: entry_id }),
            &outcome,
        )?;
        Ok(removed)
    }

    /// Swap two adjacent entries; `second` must directly follow `first`
    pub fn swap_entries(&self, franchise_id: Uuid, first: Uuid, second: Uuid) -> AppResult<()> {
        let outcome =
            self.mutate(|catalog| numbering::swap_entries(catalog, franchise_id, first, second))?;

        self.finish(
            &[franchise_id],
            franchise_id,
            Some(ProjectionChange::Reordered {
                child_ids: vec![first, second],
            }),
            &outcome,
        )
    }

    pub fn move_entry_up(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        let previous = self
            .previous_entry(franchise_id, entry_id)?
            .ok_or_else(|| no_neighbour(entry_id, "before"))?;
        self.swap_entries(franchise_id, previous.id, entry_id)
    }

    pub fn move_entry_down(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        let next = self
            .next_entry(franchise_id, entry_id)?
            .ok_or_else(|| no_neighbour(entry_id, "after"))?;
        self.swap_entries(franchise_id, entry_id, next.id)
    }

    /// Direct edit of an entry's sequence number
    pub fn set_entry_sequence_number(
        &self,
        franchise_id: Uuid,
        entry_id: Uuid,
        sequence_number: u32,
    ) -> AppResult<Option<ReorderOutcome>> {
        let result = self.mutate(|catalog| {
            numbering::move_entry(catalog, franchise_id, entry_id, sequence_number)
        })?;

        let Some((reorder, outcome)) = result else {
            return Ok(None);
        };

        let mut child_ids = vec![reorder.moved];
        child_ids.extend(reorder.displaced.iter().copied());
        self.finish(
            &[franchise_id],
            franchise_id,
            Some(ProjectionChange::Reordered { child_ids }),
            &outcome,
        )?;
        self.event_bus.emit(ProjectionResorted::new(franchise_id));

        Ok(Some(reorder))
    }

    pub fn show_display_number(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        let outcome = self.mutate(|catalog| numbering::show(catalog, franchise_id, entry_id))?;
        self.finish(&[franchise_id], franchise_id, None, &outcome)
    }

    pub fn hide_display_number(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        let outcome = self.mutate(|catalog| numbering::hide(catalog, franchise_id, entry_id))?;
        self.finish(&[franchise_id], franchise_id, None, &outcome)
    }

    pub fn set_merge_display_numbers(&self, franchise_id: Uuid, enabled: bool) -> AppResult<()> {
        let (changed, outcome) = self.mutate(|catalog| {
            let changed = catalog.franchise(franchise_id)?.merge_display_numbers != enabled;
            let outcome = numbering::set_merge_display_numbers(catalog, franchise_id, enabled)?;
            Ok((changed, outcome))
        })?;

        if !changed {
            return Ok(());
        }

        self.finish(&[franchise_id], franchise_id, None, &outcome)?;
        self.event_bus
            .emit(MergeDisplayNumbersToggled::new(franchise_id, enabled));
        Ok(())
    }

    /// Informational flag; numbering ignores it
    pub fn set_loosely_connected(&self, franchise_id: Uuid, value: bool) -> AppResult<()> {
        self.mutate(|catalog| {
            let franchise = catalog.franchise_mut(franchise_id)?;
            franchise.is_loosely_connected = value;
            franchise.touch();
            Ok(())
        })?;
        self.persist(&[franchise_id])
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Number a brand-new numbered entry would receive
    pub fn next_display_number(&self, franchise_id: Uuid) -> AppResult<u32> {
        let catalog = read_catalog(&self.catalog);
        Ok(numbering::next_display_number(&catalog, franchise_id)?)
    }

    pub fn next_entry(
        &self,
        franchise_id: Uuid,
        entry_id: Uuid,
    ) -> AppResult<Option<FranchiseEntry>> {
        let catalog = read_catalog(&self.catalog);
        let franchise = catalog.franchise(franchise_id)?;
        Ok(sequence::next_sibling(&franchise.entries, entry_id).cloned())
    }

    pub fn previous_entry(
        &self,
        franchise_id: Uuid,
        entry_id: Uuid,
    ) -> AppResult<Option<FranchiseEntry>> {
        let catalog = read_catalog(&self.catalog);
        let franchise = catalog.franchise(franchise_id)?;
        Ok(sequence::previous_sibling(&franchise.entries, entry_id).cloned())
    }

    pub fn can_move_up(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        Ok(self.previous_entry(franchise_id, entry_id)?.is_some())
    }

    pub fn can_move_down(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        Ok(self.next_entry(franchise_id, entry_id)?.is_some())
    }

    pub fn can_detach(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let catalog = read_catalog(&self.catalog);
        Ok(catalog.franchise(franchise_id)?.entry(entry_id).is_some())
    }

    /// Entries can be added only to a saved franchise without validation errors
    pub fn can_add_entry(
        &self,
        franchise_id: Uuid,
        has_validation_errors: bool,
        is_new: bool,
    ) -> AppResult<bool> {
        read_catalog(&self.catalog).franchise(franchise_id)?;
        Ok(!has_validation_errors && !is_new)
    }

    /// A nested franchise can be added if it is free and would not contain its new parent
    pub fn can_attach_franchise(&self, franchise_id: Uuid, nested_id: Uuid) -> AppResult<bool> {
        let catalog = read_catalog(&self.catalog);
        let nested = catalog.franchise(nested_id)?;
        Ok(nested.parent.is_none() && !catalog.is_self_or_ancestor(nested_id, franchise_id)?)
    }

    pub fn can_show_display_number(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let catalog = read_catalog(&self.catalog);
        let franchise = catalog.franchise(franchise_id)?;
        let Some(entry) = franchise.entry(entry_id) else {
            return Ok(false);
        };

        let merged = entry
            .kind
            .nested_franchise()
            .and_then(|id| catalog.franchise(id).ok())
            .map(|nested| nested.merge_display_numbers)
            .unwrap_or(false);

        Ok(entry.display_number.is_none() && !merged)
    }

    pub fn can_hide_display_number(&self, franchise_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let catalog = read_catalog(&self.catalog);
        let franchise = catalog.franchise(franchise_id)?;
        Ok(franchise
            .entry(entry_id)
            .map(|entry| entry.display_number.is_some())
            .unwrap_or(false))
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Run `operation` on a copy of the catalog and swap it in on success
    ///
    /// A failing operation leaves every container exactly as it was.
    fn mutate<T>(&self, operation: impl FnOnce(&mut Catalog) -> DomainResult<T>) -> AppResult<T> {
        let mut catalog = write_catalog(&self.catalog);
        let mut draft = catalog.clone();
        let result = operation(&mut draft)?;
        *catalog = draft;
        Ok(result)
    }

    fn persist(&self, franchise_ids: &[Uuid]) -> AppResult<()> {
        let snapshots: Vec<Franchise> = {
            let catalog = read_catalog(&self.catalog);
            let mut snapshots = Vec::new();
            for id in franchise_ids {
                if snapshots.iter().any(|f: &Franchise| f.id == *id) {
                    continue;
                }
                snapshots.push(catalog.franchise(*id)?.clone());
            }
            snapshots
        };

        for franchise in snapshots {
            self.franchise_repo.save(&franchise)?;
            self.event_bus.emit(ContainerSaved::new(franchise.id));
        }
        Ok(())
    }

    /// Save everything the mutation touched, then notify
    fn finish(
        &self,
        touched: &[Uuid],
        franchise_id: Uuid,
        change: Option<ProjectionChange>,
        outcome: &NumberingOutcome,
    ) -> AppResult<()> {
        let mut to_save = touched.to_vec();
        to_save.extend(outcome.renumbered_franchises());
        self.persist(&to_save)?;

        if let Some(change) = change {
            self.event_bus
                .emit(FranchiseEntriesChanged::new(franchise_id, change));
        }

        let mut renumbered: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for update in &outcome.updates {
            let children = renumbered.entry(update.franchise_id).or_default();
            if !children.contains(&update.entry_id) {
                children.push(update.entry_id);
            }
        }
        for id in outcome.renumbered_franchises() {
            if let Some(child_ids) = renumbered.remove(&id) {
                self.event_bus.emit(FranchiseEntriesChanged::new(
                    id,
                    ProjectionChange::Renumbered { child_ids },
                ));
            }
        }

        Ok(())
    }
}

fn no_neighbour(entry_id: Uuid, side: &str) -> AppError {
    AppError::Domain(DomainError::PreconditionViolation(format!(
        "No entry {} entry {}",
        side, entry_id
    )))
}
