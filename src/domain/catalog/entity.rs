use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::franchise::{Franchise, ParentLink};
use crate::domain::series::Series;
use crate::domain::{DomainError, DomainResult};

/// Upper bound on franchise nesting; real catalogs stay within three levels
pub const MAX_NESTING_DEPTH: usize = 64;

/// Arena of loaded containers
///
/// Children are owned by their container; containers are owned here and
/// reference each other through ids resolved by lookup.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    franchises: HashMap<Uuid, Franchise>,
    series: HashMap<Uuid, Series>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Franchises
    // ------------------------------------------------------------------

    pub fn insert_franchise(&mut self, franchise: Franchise) {
        self.franchises.insert(franchise.id, franchise);
    }

    pub fn remove_franchise(&mut self, id: Uuid) -> Option<Franchise> {
        self.franchises.remove(&id)
    }

    pub fn contains_franchise(&self, id: Uuid) -> bool {
        self.franchises.contains_key(&id)
    }

    pub fn franchise(&self, id: Uuid) -> DomainResult<&Franchise> {
        self.franchises
            .get(&id)
            .ok_or_else(|| DomainError::NotFound(format!("Franchise {}", id)))
    }

    pub fn franchise_mut(&mut self, id: Uuid) -> DomainResult<&mut Franchise> {
        self.franchises
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("Franchise {}", id)))
    }

    pub fn franchises(&self) -> impl Iterator<Item = &Franchise> {
        self.franchises.values()
    }

    /// Parent chain from the direct parent outward
    ///
    /// Fails on a cycle or when the chain is deeper than MAX_NESTING_DEPTH.
    pub fn ancestors(&self, id: Uuid) -> DomainResult<Vec<Uuid>> {
        let mut chain = Vec::new();
        let mut current = self.franchise(id)?.parent;

        while let Some(link) = current {
            if link.franchise_id == id || chain.contains(&link.franchise_id) {
                return Err(DomainError::InvariantViolation(format!(
                    "Franchise {} is nested inside itself",
                    link.franchise_id
                )));
            }
            if chain.len() >= MAX_NESTING_DEPTH {
                return Err(DomainError::InvariantViolation(format!(
                    "Franchise {} is nested deeper than {} levels",
                    id, MAX_NESTING_DEPTH
                )));
            }

            chain.push(link.franchise_id);
            current = self.franchise(link.franchise_id)?.parent;
        }

        Ok(chain)
    }

    /// Outermost franchise containing `id` (itself when it has no parent)
    pub fn root_of(&self, id: Uuid) -> DomainResult<Uuid> {
        Ok(self.ancestors(id)?.last().copied().unwrap_or(id))
    }

    /// True if `candidate` is `id` or one of its ancestors
    pub fn is_self_or_ancestor(&self, candidate: Uuid, id: Uuid) -> DomainResult<bool> {
        Ok(candidate == id || self.ancestors(id)?.contains(&candidate))
    }

    /// Check the links between a loaded franchise and its neighbours
    pub fn validate_links(&self, id: Uuid) -> DomainResult<()> {
        let franchise = self.franchise(id)?;

        if let Some(link) = franchise.parent {
            let parent = self.franchise(link.franchise_id).map_err(|_| {
                DomainError::DataIntegrity(format!(
                    "Franchise {} refers to parent {} which is not loaded",
                    id, link.franchise_id
                ))
            })?;

            let points_back = parent
                .entry(link.entry_id)
                .map(|entry| entry.kind.nested_franchise() == Some(id))
                .unwrap_or(false);

            if !points_back {
                return Err(DomainError::DataIntegrity(format!(
                    "Parent entry {} does not reference franchise {}",
                    link.entry_id, id
                )));
            }
        }

        for entry in &franchise.entries {
            let Some(nested_id) = entry.kind.nested_franchise() else {
                continue;
            };
            let Ok(nested) = self.franchise(nested_id) else {
                continue;
            };

            let expected = ParentLink {
                franchise_id: id,
                entry_id: entry.id,
            };
            if nested.parent != Some(expected) {
                return Err(DomainError::DataIntegrity(format!(
                    "Franchise {} is referenced by entry {} but links elsewhere",
                    nested_id, entry.id
                )));
            }

            if nested.merge_display_numbers && entry.display_number.is_some() {
                return Err(DomainError::DataIntegrity(format!(
                    "Entry {} references merged franchise {} but has its own display number",
                    entry.id, nested_id
                )));
            }
        }

        self.ancestors(id)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Series
    // ------------------------------------------------------------------

    pub fn insert_series(&mut self, series: Series) {
        self.series.insert(series.id, series);
    }

    pub fn remove_series(&mut self, id: Uuid) -> Option<Series> {
        self.series.remove(&id)
    }

    pub fn series(&self, id: Uuid) -> DomainResult<&Series> {
        self.series
            .get(&id)
            .ok_or_else(|| DomainError::NotFound(format!("Series {}", id)))
    }

    pub fn series_mut(&mut self, id: Uuid) -> DomainResult<&mut Series> {
        self.series
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("Series {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::franchise::{EntryKind, FranchiseEntry};
    use crate::domain::sequence::insert;

    fn nest(catalog: &mut Catalog, parent_id: Uuid, child_id: Uuid) -> Uuid {
        let entry = FranchiseEntry::new(parent_id, EntryKind::franchise(child_id));
        let entry_id = entry.id;
        insert(&mut catalog.franchise_mut(parent_id).unwrap().entries, entry);
        catalog.franchise_mut(child_id).unwrap().parent = Some(ParentLink {
            franchise_id: parent_id,
            entry_id,
        });
        entry_id
    }

    fn franchise(catalog: &mut Catalog, title: &str) -> Uuid {
        let franchise = Franchise::new(title.to_string());
        let id = franchise.id;
        catalog.insert_franchise(franchise);
        id
    }

    #[test]
    fn test_ancestors_and_root() {
        let mut catalog = Catalog::new();
        let outer = franchise(&mut catalog, "Middle-earth");
        let middle = franchise(&mut catalog, "The Lord of the Rings");
        let inner = franchise(&mut catalog, "Extended Editions");
        nest(&mut catalog, outer, middle);
        nest(&mut catalog, middle, inner);

        assert_eq!(catalog.ancestors(inner).unwrap(), vec![middle, outer]);
        assert_eq!(catalog.root_of(inner).unwrap(), outer);
        assert_eq!(catalog.root_of(outer).unwrap(), outer);
        assert!(catalog.is_self_or_ancestor(outer, inner).unwrap());
        assert!(!catalog.is_self_or_ancestor(inner, outer).unwrap());
        assert!(catalog.validate_links(middle).is_ok());
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut catalog = Catalog::new();
        let a = franchise(&mut catalog, "A");
        let b = franchise(&mut catalog, "B");
        nest(&mut catalog, a, b);
        nest(&mut catalog, b, a);

        assert!(matches!(
            catalog.ancestors(a),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_broken_back_reference_is_integrity_error() {
        let mut catalog = Catalog::new();
        let outer = franchise(&mut catalog, "Outer");
        let inner = franchise(&mut catalog, "Inner");
        nest(&mut catalog, outer, inner);
        catalog.franchise_mut(inner).unwrap().parent = None;

        assert!(matches!(
            catalog.validate_links(outer),
            Err(DomainError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_merged_entry_with_own_number_is_integrity_error() {
        let mut catalog = Catalog::new();
        let outer = franchise(&mut catalog, "Outer");
        let inner = franchise(&mut catalog, "Inner");
        let entry_id = nest(&mut catalog, outer, inner);
        catalog.franchise_mut(inner).unwrap().merge_display_numbers = true;
        catalog
            .franchise_mut(outer)
            .unwrap()
            .entry_mut(entry_id)
            .unwrap()
            .display_number = Some(1);

        assert!(catalog.validate_links(outer).is_err());
    }

    #[test]
    fn test_missing_container_is_not_found() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.franchise(Uuid::new_v4()),
            Err(DomainError::NotFound(_))
        ));
        assert!(catalog.series(Uuid::new_v4()).is_err());
    }
}
