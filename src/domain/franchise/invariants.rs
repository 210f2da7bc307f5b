use std::collections::HashSet;

use super::entity::Franchise;
use crate::domain::sequence::validate_dense;
use crate::domain::{DomainError, DomainResult};

/// Validates all Franchise invariants that can be checked in isolation
///
/// Links to other containers (parent back-references, merged nested
/// franchises) are checked by the catalog.
pub fn validate_franchise(franchise: &Franchise) -> DomainResult<()> {
    validate_ownership(franchise)?;
    validate_dense(&franchise.entries)?;
    validate_display_numbers(franchise)?;
    Ok(())
}

/// Every entry belongs to this franchise, ids are unique,
/// and the franchise never contains itself
fn validate_ownership(franchise: &Franchise) -> DomainResult<()> {
    let mut ids = HashSet::new();

    for entry in &franchise.entries {
        if entry.franchise_id != franchise.id {
            return Err(DomainError::DataIntegrity(format!(
                "Entry {} belongs to franchise {}, not {}",
                entry.id, entry.franchise_id, franchise.id
            )));
        }

        if !ids.insert(entry.id) {
            return Err(DomainError::DataIntegrity(format!(
                "Entry {} appears more than once",
                entry.id
            )));
        }

        if entry.kind.nested_franchise() == Some(franchise.id) {
            return Err(DomainError::DataIntegrity(format!(
                "Franchise {} contains itself",
                franchise.id
            )));
        }
    }

    Ok(())
}

/// Display numbers are >= 1 and never decrease along the sequence
fn validate_display_numbers(franchise: &Franchise) -> DomainResult<()> {
    let mut previous: Option<u32> = None;

    for entry in franchise.entries_in_order() {
        let Some(number) = entry.display_number else {
            continue;
        };

        if number == 0 {
            return Err(DomainError::DataIntegrity(format!(
                "Entry {} has display number 0",
                entry.id
            )));
        }

        if let Some(before) = previous {
            if number < before {
                return Err(DomainError::DataIntegrity(format!(
                    "Display number {} at position {} is lower than an earlier {}",
                    number, entry.sequence_number, before
                )));
            }
        }

        previous = Some(number);
    }

    Ok(())
}

/// Invariants that must hold true for the Franchise domain:
///
/// 1. Sequence numbers are exactly 1..=N
/// 2. Display numbers are weakly monotonic with sequence numbers
/// 3. Display numbers are never 0 (absence is None)
/// 4. An entry belongs to exactly one franchise
/// 5. A franchise is referenced by at most one parent entry
/// 6. An entry referencing a merged nested franchise has no number of its own

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::franchise::{EntryKind, FranchiseEntry};
    use crate::domain::sequence::insert;
    use uuid::Uuid;

    fn franchise_with(numbers: &[Option<u32>]) -> Franchise {
        let mut franchise = Franchise::new("Alien".to_string());
        for number in numbers {
            let mut entry = FranchiseEntry::new(franchise.id, EntryKind::movie(Uuid::new_v4()));
            entry.display_number = *number;
            insert(&mut franchise.entries, entry);
        }
        franchise
    }

    #[test]
    fn test_valid_franchise() {
        let franchise = franchise_with(&[Some(1), None, Some(2), Some(2)]);
        assert!(validate_franchise(&franchise).is_ok());
    }

    #[test]
    fn test_decreasing_display_numbers_fail() {
        let franchise = franchise_with(&[Some(2), Some(1)]);
        assert!(matches!(
            validate_franchise(&franchise),
            Err(DomainError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_zero_display_number_fails() {
        let franchise = franchise_with(&[Some(0)]);
        assert!(validate_franchise(&franchise).is_err());
    }

    #[test]
    fn test_sequence_gap_fails() {
        let mut franchise = franchise_with(&[None, None]);
        franchise.entries[1].sequence_number = 3;
        assert!(matches!(
            validate_franchise(&franchise),
            Err(DomainError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_foreign_entry_fails() {
        let mut franchise = franchise_with(&[None]);
        franchise.entries[0].franchise_id = Uuid::new_v4();
        assert!(validate_franchise(&franchise).is_err());
    }

    #[test]
    fn test_self_reference_fails() {
        let mut franchise = franchise_with(&[]);
        let entry = FranchiseEntry::new(franchise.id, EntryKind::franchise(franchise.id));
        insert(&mut franchise.entries, entry);
        assert!(validate_franchise(&franchise).is_err());
    }

    #[test]
    fn test_show_display_numbers_is_derived() {
        assert!(!franchise_with(&[None, None]).show_display_numbers());
        assert!(franchise_with(&[None, Some(1)]).show_display_numbers());
    }
}
