// src/domain/numbering/engine.rs
//
// Show / hide / first-number recomputation / merge adjustment

use uuid::Uuid;

use super::flatten::{
    check_depth, is_merged_reference, preceding_max, region_root, set_value, shift_after,
    Slot,
};
use super::{flattened_max, successor, NumberingOutcome};
use crate::domain::catalog::Catalog;
use crate::domain::franchise::EntryKind;
use crate::domain::sequence::{backward_from, by_sequence};
use crate::domain::{DomainError, DomainResult};

/// Number the first item of a franchise would take in its parent's numbering
///
/// Walks the parent's entries backwards from the referencing entry. A numbered
/// Movie/Series yields its number + 1; a nested franchise yields one past its
/// flattened maximum. When nothing precedes it, a merged parent continues its
/// own first number and an unmerged parent restarts at 1.
pub fn recompute_first_number(catalog: &Catalog, franchise_id: Uuid) -> DomainResult<u32> {
    let mut current = franchise_id;
    let mut depth = 0;

    loop {
        check_depth(depth)?;

        let franchise = catalog.franchise(current)?;
        let Some(link) = franchise.parent else {
            return Ok(1);
        };

        let parent = catalog.franchise(link.franchise_id)?;
        let entry = parent.entry(link.entry_id).ok_or_else(|| {
            DomainError::DataIntegrity(format!(
                "Parent entry {} of franchise {} is missing",
                link.entry_id, current
            ))
        })?;

        for predecessor in backward_from(&parent.entries, entry.sequence_number) {
            match predecessor.kind {
                EntryKind::Movie { .. } | EntryKind::Series { .. } => {
                    if let Some(number) = predecessor.display_number {
                        return successor(number);
                    }
                }
                EntryKind::Franchise { franchise_id } => {
                    return match flattened_max(catalog, franchise_id)? {
                        Some(max) => successor(max),
                        None => Ok(1),
                    };
                }
            }
        }

        if !parent.merge_display_numbers {
            return Ok(1);
        }

        current = parent.id;
        depth += 1;
    }
}

/// Lowest number a franchise's own numbering may start at
pub fn first_number_floor(catalog: &Catalog, franchise_id: Uuid) -> DomainResult<u32> {
    if catalog.franchise(franchise_id)?.merge_display_numbers {
        recompute_first_number(catalog, franchise_id)
    } else {
        Ok(1)
    }
}

/// Number the next shown entry appended to `franchise_id` would get
pub fn next_display_number(catalog: &Catalog, franchise_id: Uuid) -> DomainResult<u32> {
    match flattened_max(catalog, franchise_id)? {
        Some(max) => successor(max),
        None => first_number_floor(catalog, franchise_id),
    }
}

fn membership_error(franchise_id: Uuid, entry_id: Uuid) -> DomainError {
    DomainError::InvalidOperation(format!(
        "Entry {} does not belong to franchise {}",
        entry_id, franchise_id
    ))
}

/// Give an entry a display number
///
/// The entry takes one past the highest preceding number and every later
/// number shifts up by one. Showing an already numbered entry does nothing.
pub fn show(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    entry_id: Uuid,
) -> DomainResult<NumberingOutcome> {
    let franchise = catalog.franchise(franchise_id)?;
    let entry = franchise
        .entry(entry_id)
        .ok_or_else(|| membership_error(franchise_id, entry_id))?;

    let mut outcome = NumberingOutcome::default();
    if entry.display_number.is_some() {
        return Ok(outcome);
    }

    if is_merged_reference(catalog, entry) {
        return Err(DomainError::InvalidOperation(format!(
            "Entry {} references a franchise whose numbers are merged",
            entry_id
        )));
    }

    let sequence_number = entry.sequence_number;
    let number = match preceding_max(catalog, franchise_id, sequence_number)? {
        Some(max) => successor(max)?,
        None => first_number_floor(catalog, franchise_id)?,
    };

    shift_after(catalog, franchise_id, sequence_number, 1, &mut outcome)?;
    set_value(
        catalog,
        Slot {
            franchise_id,
            entry_id,
        },
        Some(number),
        &mut outcome,
    )?;

    log::debug!(
        "[NUMBERING] Showed entry {} as #{} ({} numbers changed)",
        entry_id,
        number,
        outcome.updates.len()
    );

    Ok(outcome)
}

/// Remove an entry's display number and close the gap it leaves
pub fn hide(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    entry_id: Uuid,
) -> DomainResult<NumberingOutcome> {
    let franchise = catalog.franchise(franchise_id)?;
    let entry = franchise
        .entry(entry_id)
        .ok_or_else(|| membership_error(franchise_id, entry_id))?;

    let mut outcome = NumberingOutcome::default();
    if entry.display_number.is_none() {
        return Ok(outcome);
    }

    let sequence_number = entry.sequence_number;
    set_value(
        catalog,
        Slot {
            franchise_id,
            entry_id,
        },
        None,
        &mut outcome,
    )?;
    shift_after(catalog, franchise_id, sequence_number, -1, &mut outcome)?;

    log::debug!(
        "[NUMBERING] Hid entry {} ({} numbers changed)",
        entry_id,
        outcome.updates.len()
    );

    Ok(outcome)
}

/// Renumber every numbered item of a franchise consecutively from `first`
///
/// A merged nested franchise starts at its own recomputed first number; the
/// counter then continues after its block.
pub fn adjust_after_merge(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    first: u32,
) -> DomainResult<NumberingOutcome> {
    let mut outcome = NumberingOutcome::default();
    renumber(catalog, franchise_id, first, &mut outcome, 0)?;
    Ok(outcome)
}

fn renumber(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    first: u32,
    outcome: &mut NumberingOutcome,
    depth: usize,
) -> DomainResult<u64> {
    check_depth(depth)?;

    let plan: Vec<(Uuid, Option<Uuid>, bool)> = {
        let franchise = catalog.franchise(franchise_id)?;
        by_sequence(&franchise.entries)
            .into_iter()
            .map(|entry| {
                let merged = is_merged_reference(catalog, entry);
                let nested = entry.kind.nested_franchise().filter(|_| merged);
                (entry.id, nested, entry.display_number.is_some())
            })
            .collect()
    };

    let mut counter = u64::from(first);
    for (entry_id, merged_nested, numbered) in plan {
        match merged_nested {
            Some(nested_id) => {
                let start = recompute_first_number(catalog, nested_id)?;
                let end = renumber(catalog, nested_id, start, outcome, depth + 1)?;
                counter = counter.max(end);
            }
            None if numbered => {
                let number = u32::try_from(counter).map_err(|_| {
                    DomainError::InvariantViolation(format!(
                        "Franchise {} has more display numbers than fit after {}",
                        franchise_id, first
                    ))
                })?;
                set_value(
                    catalog,
                    Slot {
                        franchise_id,
                        entry_id,
                    },
                    Some(number),
                    outcome,
                )?;
                counter += 1;
            }
            None => {}
        }
    }

    Ok(counter)
}

/// Canonically renumber the whole flattened region containing `franchise_id`
pub fn reflow(catalog: &mut Catalog, franchise_id: Uuid) -> DomainResult<NumberingOutcome> {
    let root = region_root(catalog, franchise_id)?;
    let first = first_number_floor(catalog, root)?;
    adjust_after_merge(catalog, root, first)
}

/// Turn merge mode on or off
///
/// Turning it on drops the referencing entry's own number first, then both
/// the franchise and the region it now belongs to are renumbered.
pub fn set_merge_display_numbers(
    catalog: &mut Catalog,
    franchise_id: Uuid,
    enabled: bool,
) -> DomainResult<NumberingOutcome> {
    let franchise = catalog.franchise(franchise_id)?;
    let mut outcome = NumberingOutcome::default();
    if franchise.merge_display_numbers == enabled {
        return Ok(outcome);
    }

    let parent = franchise.parent;
    if enabled {
        if let Some(link) = parent {
            outcome.extend(hide(catalog, link.franchise_id, link.entry_id)?);
        }
    }

    let franchise = catalog.franchise_mut(franchise_id)?;
    franchise.merge_display_numbers = enabled;
    franchise.touch();

    outcome.extend(reflow(catalog, franchise_id)?);
    if let Some(link) = parent {
        if region_root(catalog, link.franchise_id)? != region_root(catalog, franchise_id)? {
            outcome.extend(reflow(catalog, link.franchise_id)?);
        }
    }

    log::info!(
        "[NUMBERING] Merge mode {} for franchise {} ({} numbers changed)",
        if enabled { "enabled" } else { "disabled" },
        franchise_id,
        outcome.updates.len()
    );

    Ok(outcome)
}
