// src/domain/numbering/ordering.rs
//
// Sequence operations on franchises that keep display numbers consistent.
//
// Each operation plans every sequence and display change against the
// unmodified catalog and only then applies them.

use uuid::Uuid;

use super::engine::{reflow, show};
use super::flatten::{is_merged_reference, set_value, shift_after, unit_items, value_of, Slot};
use super::NumberingOutcome;
use crate::domain::catalog::Catalog;
use crate::domain::franchise::{EntryKind, Franchise, FranchiseEntry, ParentLink};
use crate::domain::sequence::{self, ReorderOutcome};
use crate::domain::{DomainError, DomainResult};

/// Append a new entry to a franchise
///
/// With `numbered`, the entry is shown right away. A nested franchise must be
/// loaded, must not already have a parent, and must not contain `franchise_id`.
pub fn attach_entry(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    kind: EntryKind,
    numbered: bool,
) -> DomainResult<(Uuid, NumberingOutcome)> {
    catalog.franchise(franchise_id)?;

    let mut merged = false;
    if let Some(nested_id) = kind.nested_franchise() {
        let nested = catalog.franchise(nested_id)?;
        if nested.parent.is_some() {
            return Err(DomainError::InvalidOperation(format!(
                "Franchise {} is already part of another franchise",
                nested_id
            )));
        }
        if catalog.is_self_or_ancestor(nested_id, franchise_id)? {
            return Err(DomainError::InvalidOperation(format!(
                "Franchise {} cannot contain itself",
                nested_id
            )));
        }
        merged = nested.merge_display_numbers;
        if merged && numbered {
            return Err(DomainError::InvalidOperation(format!(
                "Franchise {} merges its numbers and cannot be numbered itself",
                nested_id
            )));
        }
    }

    let entry = FranchiseEntry::new(franchise_id, kind);
    let entry_id = entry.id;
    let franchise = catalog.franchise_mut(franchise_id)?;
    let position = sequence::insert(&mut franchise.entries, entry);
    franchise.touch();

    let mut outcome = NumberingOutcome::default();
    if let Some(nested_id) = kind.nested_franchise() {
        catalog.franchise_mut(nested_id)?.parent = Some(ParentLink {
            franchise_id,
            entry_id,
        });
        if merged {
            outcome.extend(reflow(catalog, nested_id)?);
        }
    }

    if numbered {
        outcome.extend(show(catalog, franchise_id, entry_id)?);
    }

    log::debug!(
        "[SEQUENCE] Attached {} entry {} to franchise {} at {}",
        kind,
        entry_id,
        franchise_id,
        position
    );

    Ok((entry_id, outcome))
}

/// Remove an entry from a franchise
///
/// Later display numbers close over the removed entry's items, then later
/// sequence numbers close the gap. A detached nested franchise becomes a
/// top-level franchise.
pub fn detach_entry(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    entry_id: Uuid,
) -> DomainResult<(FranchiseEntry, NumberingOutcome)> {
    let franchise = catalog.franchise(franchise_id)?;
    let entry = franchise.entry(entry_id).ok_or_else(|| {
        DomainError::InvalidOperation(format!(
            "Entry {} does not belong to franchise {}",
            entry_id, franchise_id
        ))
    })?;

    let mut items = Vec::new();
    unit_items(catalog, entry, &mut items, 0)?;
    let sequence_number = entry.sequence_number;
    let nested_id = entry.kind.nested_franchise();
    let merged = is_merged_reference(catalog, entry);

    let mut outcome = NumberingOutcome::default();
    if !items.is_empty() {
        shift_after(
            catalog,
            franchise_id,
            sequence_number,
            -(items.len() as i64),
            &mut outcome,
        )?;
    }

    let franchise = catalog.franchise_mut(franchise_id)?;
    let removed = sequence::detach(&mut franchise.entries, entry_id)?;
    franchise.touch();

    if let Some(nested_id) = nested_id {
        if catalog.contains_franchise(nested_id) {
            catalog.franchise_mut(nested_id)?.parent = None;
            if merged {
                outcome.extend(reflow(catalog, nested_id)?);
            }
        }
    }

    log::debug!(
        "[SEQUENCE] Detached entry {} from franchise {} ({} numbers changed)",
        entry_id,
        franchise_id,
        outcome.updates.len()
    );

    Ok((removed, outcome))
}

/// Take a franchise out of the catalog
///
/// The franchise is first detached from its parent, which closes the gap in
/// the parent's numbering. Franchises nested in it become top-level; merged
/// ones are renumbered on their own from 1.
pub fn delete_franchise(
    catalog: &mut Catalog,
    franchise_id: Uuid,
) -> DomainResult<(Franchise, NumberingOutcome)> {
    let mut outcome = NumberingOutcome::default();

    if let Some(link) = catalog.franchise(franchise_id)?.parent {
        let (_, detached) = detach_entry(catalog, link.franchise_id, link.entry_id)?;
        outcome.extend(detached);
    }

    let nested: Vec<Uuid> = catalog
        .franchise(franchise_id)?
        .entries
        .iter()
        .filter_map(|entry| entry.kind.nested_franchise())
        .filter(|id| catalog.contains_franchise(*id))
        .collect();

    for nested_id in nested {
        let franchise = catalog.franchise_mut(nested_id)?;
        franchise.parent = None;
        if franchise.merge_display_numbers {
            outcome.extend(reflow(catalog, nested_id)?);
        }
    }

    let removed = catalog
        .remove_franchise(franchise_id)
        .ok_or_else(|| DomainError::NotFound(format!("Franchise {}", franchise_id)))?;
    outcome
        .updates
        .retain(|update| update.franchise_id != franchise_id);

    log::debug!(
        "[SEQUENCE] Deleted franchise {} ({} numbers changed)",
        franchise_id,
        outcome.updates.len()
    );

    Ok((removed, outcome))
}

/// Slots of the given entries in the given order
fn items_of(catalog: &Catalog, franchise_id: Uuid, order: &[Uuid]) -> DomainResult<Vec<Slot>> {
    let franchise = catalog.franchise(franchise_id)?;
    let mut items = Vec::new();
    for entry_id in order {
        if let Some(entry) = franchise.entry(*entry_id) {
            unit_items(catalog, entry, &mut items, 0)?;
        }
    }
    Ok(items)
}

/// Hand the display values of a reordered span back out in the new order
///
/// The span keeps the same multiset of numbers, so everything outside it is
/// untouched and numbers stay non-decreasing.
fn plan_reassignment(
    catalog: &Catalog,
    before: &[Slot],
    after: Vec<Slot>,
) -> DomainResult<Vec<(Slot, u32)>> {
    let mut values = Vec::with_capacity(before.len());
    for slot in before {
        if let Some(value) = value_of(catalog, *slot)? {
            values.push(value);
        }
    }
    values.sort_unstable();
    Ok(after.into_iter().zip(values).collect())
}

fn apply_reassignment(
    catalog: &mut Catalog,
    plan: Vec<(Slot, u32)>,
    outcome: &mut NumberingOutcome,
) -> DomainResult<()> {
    for (slot, value) in plan {
        set_value(catalog, slot, Some(value), outcome)?;
    }
    Ok(())
}

/// Swap two adjacent entries; `second` must directly follow `first`
pub fn swap_entries(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    first: Uuid,
    second: Uuid,
) -> DomainResult<NumberingOutcome> {
    let franchise = catalog.franchise(franchise_id)?;
    sequence::check_adjacent(&franchise.entries, first, second)?;

    let before = items_of(catalog, franchise_id, &[first, second])?;
    let after = items_of(catalog, franchise_id, &[second, first])?;
    let plan = plan_reassignment(catalog, &before, after)?;

    let franchise = catalog.franchise_mut(franchise_id)?;
    sequence::swap(&mut franchise.entries, first, second)?;
    franchise.touch();

    let mut outcome = NumberingOutcome::default();
    apply_reassignment(catalog, plan, &mut outcome)?;

    log::debug!(
        "[SEQUENCE] Swapped entries {} and {} in franchise {}",
        first,
        second,
        franchise_id
    );

    Ok(outcome)
}

/// Set an entry's sequence number directly, displacing siblings
///
/// Returns `None` when the entry already holds `new_position`.
pub fn move_entry(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    entry_id: Uuid,
    new_position: u32,
) -> DomainResult<Option<(ReorderOutcome, NumberingOutcome)>> {
    let franchise = catalog.franchise(franchise_id)?;
    let Some(reorder) = sequence::plan_move(&franchise.entries, entry_id, new_position)? else {
        return Ok(None);
    };

    let span_before: Vec<Uuid> = sequence::by_sequence(&franchise.entries)
        .into_iter()
        .filter(|entry| {
            entry.sequence_number >= reorder.span_start()
                && entry.sequence_number <= reorder.span_end()
        })
        .map(|entry| entry.id)
        .collect();

    let mut span_after: Vec<Uuid> = span_before
        .iter()
        .copied()
        .filter(|id| *id != entry_id)
        .collect();
    match reorder.direction {
        sequence::MoveDirection::Earlier => span_after.insert(0, entry_id),
        sequence::MoveDirection::Later => span_after.push(entry_id),
    }

    let before = items_of(catalog, franchise_id, &span_before)?;
    let after = items_of(catalog, franchise_id, &span_after)?;
    let plan = plan_reassignment(catalog, &before, after)?;

    let franchise = catalog.franchise_mut(franchise_id)?;
    sequence::apply_move(&mut franchise.entries, &reorder);
    franchise.touch();

    let mut outcome = NumberingOutcome::default();
    apply_reassignment(catalog, plan, &mut outcome)?;

    Ok(Some((reorder, outcome)))
}
