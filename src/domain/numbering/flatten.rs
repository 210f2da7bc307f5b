// src/domain/numbering/flatten.rs
//
// The flattened view of a franchise's numbering.
//
// A numbered Movie/Series entry is one item. An entry referencing a nested
// franchise is one item when it has a number and the nested franchise is not
// merged; a merged nested franchise contributes its own flattened items
// instead.

use uuid::Uuid;

use super::NumberingOutcome;
use crate::domain::catalog::{Catalog, MAX_NESTING_DEPTH};
use crate::domain::franchise::{EntryKind, FranchiseEntry};
use crate::domain::sequence::{backward_from, forward};
use crate::domain::{DomainError, DomainResult};

/// Address of a display number: an entry inside a franchise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub franchise_id: Uuid,
    pub entry_id: Uuid,
}

pub(crate) fn check_depth(depth: usize) -> DomainResult<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(DomainError::InvariantViolation(format!(
            "Franchise nesting exceeds {} levels",
            MAX_NESTING_DEPTH
        )));
    }
    Ok(())
}

/// True if the entry references a loaded franchise with merge mode on
pub(crate) fn is_merged_reference(catalog: &Catalog, entry: &FranchiseEntry) -> bool {
    entry
        .kind
        .nested_franchise()
        .and_then(|id| catalog.franchise(id).ok())
        .map(|nested| nested.merge_display_numbers)
        .unwrap_or(false)
}

/// Items contributed by one entry, in flattened order
pub(crate) fn unit_items(
    catalog: &Catalog,
    entry: &FranchiseEntry,
    out: &mut Vec<Slot>,
    depth: usize,
) -> DomainResult<()> {
    let own = Slot {
        franchise_id: entry.franchise_id,
        entry_id: entry.id,
    };

    match entry.kind {
        EntryKind::Movie { .. } | EntryKind::Series { .. } => {
            if entry.display_number.is_some() {
                out.push(own);
            }
        }
        EntryKind::Franchise { franchise_id } => {
            if is_merged_reference(catalog, entry) {
                flatten_into(catalog, franchise_id, out, depth + 1)?;
            } else if entry.display_number.is_some() {
                out.push(own);
            }
        }
    }

    Ok(())
}

fn flatten_into(
    catalog: &Catalog,
    franchise_id: Uuid,
    out: &mut Vec<Slot>,
    depth: usize,
) -> DomainResult<()> {
    check_depth(depth)?;
    let franchise = catalog.franchise(franchise_id)?;

    for entry in forward(&franchise.entries) {
        unit_items(catalog, entry, out, depth)?;
    }

    Ok(())
}

/// Every numbered item of a franchise in flattened order
pub fn flattened_items(catalog: &Catalog, franchise_id: Uuid) -> DomainResult<Vec<Slot>> {
    let mut items = Vec::new();
    flatten_into(catalog, franchise_id, &mut items, 0)?;
    Ok(items)
}

/// Current display number of a slot
pub(crate) fn value_of(catalog: &Catalog, slot: Slot) -> DomainResult<Option<u32>> {
    let franchise = catalog.franchise(slot.franchise_id)?;
    let entry = franchise.entry(slot.entry_id).ok_or_else(|| {
        DomainError::NotFound(format!(
            "Entry {} in franchise {}",
            slot.entry_id, slot.franchise_id
        ))
    })?;
    Ok(entry.display_number)
}

pub(crate) fn set_value(
    catalog: &mut Catalog,
    slot: Slot,
    value: Option<u32>,
    outcome: &mut NumberingOutcome,
) -> DomainResult<()> {
    let franchise = catalog.franchise_mut(slot.franchise_id)?;
    let entry = franchise.entry_mut(slot.entry_id).ok_or_else(|| {
        DomainError::NotFound(format!(
            "Entry {} in franchise {}",
            slot.entry_id, slot.franchise_id
        ))
    })?;

    let previous = entry.display_number;
    entry.display_number = value;
    outcome.record(slot, previous, value);
    Ok(())
}

fn max_of(catalog: &Catalog, items: &[Slot]) -> DomainResult<Option<u32>> {
    let mut max = None;
    for slot in items {
        if let Some(value) = value_of(catalog, *slot)? {
            max = Some(max.map_or(value, |current: u32| current.max(value)));
        }
    }
    Ok(max)
}

/// Highest display number anywhere in the flattened franchise
pub fn flattened_max(catalog: &Catalog, franchise_id: Uuid) -> DomainResult<Option<u32>> {
    let items = flattened_items(catalog, franchise_id)?;
    max_of(catalog, &items)
}

/// Highest display number among the items before `sequence_number`
pub(crate) fn preceding_max(
    catalog: &Catalog,
    franchise_id: Uuid,
    sequence_number: u32,
) -> DomainResult<Option<u32>> {
    let franchise = catalog.franchise(franchise_id)?;
    let mut items = Vec::new();

    for entry in backward_from(&franchise.entries, sequence_number) {
        unit_items(catalog, entry, &mut items, 0)?;
    }

    max_of(catalog, &items)
}

/// Shift every item after `sequence_number` by `delta`
///
/// When the franchise is merged into a parent, the parent's items after the
/// referencing entry move as well, all the way up the merged chain. Every
/// new value is computed before the first one is written, so a shift that
/// would leave the `u32` range fails without touching the catalog.
pub(crate) fn shift_after(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    sequence_number: u32,
    delta: i64,
    outcome: &mut NumberingOutcome,
) -> DomainResult<()> {
    let mut shifted = Vec::new();
    let mut current = Some((franchise_id, sequence_number));
    let mut depth = 0;

    while let Some((id, after)) = current {
        check_depth(depth)?;

        let franchise = catalog.franchise(id)?;
        let mut items = Vec::new();
        for entry in franchise
            .entries
            .iter()
            .filter(|entry| entry.sequence_number > after)
        {
            unit_items(catalog, entry, &mut items, 0)?;
        }

        for slot in items {
            if let Some(value) = value_of(catalog, slot)? {
                shifted.push((slot, shift(value, delta)?));
            }
        }

        current = match franchise.parent {
            Some(link) if franchise.merge_display_numbers => {
                let parent = catalog.franchise(link.franchise_id)?;
                let entry = parent.entry(link.entry_id).ok_or_else(|| {
                    DomainError::DataIntegrity(format!(
                        "Parent entry {} of franchise {} is missing",
                        link.entry_id, id
                    ))
                })?;
                Some((link.franchise_id, entry.sequence_number))
            }
            _ => None,
        };

        depth += 1;
    }

    for (slot, value) in shifted {
        set_value(catalog, slot, Some(value), outcome)?;
    }

    Ok(())
}

fn shift(value: u32, delta: i64) -> DomainResult<u32> {
    u32::try_from((i64::from(value) + delta).max(1)).map_err(|_| {
        DomainError::InvariantViolation(format!(
            "Display number {} cannot be shifted by {}",
            value, delta
        ))
    })
}

/// Outermost franchise whose flattened numbering includes `franchise_id`
pub fn region_root(catalog: &Catalog, franchise_id: Uuid) -> DomainResult<Uuid> {
    let mut current = franchise_id;
    let mut depth = 0;

    loop {
        check_depth(depth)?;
        let franchise = catalog.franchise(current)?;
        match franchise.parent {
            Some(link) if franchise.merge_display_numbers => current = link.franchise_id,
            _ => return Ok(current),
        }
        depth += 1;
    }
}
