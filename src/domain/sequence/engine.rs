// src/domain/sequence/engine.rs
//
// Insert / detach / swap over any container of `Sequenced` children.
//
// PRINCIPLES:
// - Validate first, mutate afterwards
// - A failed call leaves the children untouched
// - No implicit repair of loaded data

use uuid::Uuid;

use super::Sequenced;
use crate::domain::{DomainError, DomainResult};

/// Sequence number a newly appended child receives
pub fn next_sequence_number<T: Sequenced>(children: &[T]) -> u32 {
    children.len() as u32 + 1
}

/// Highest sequence number currently in use (0 for an empty container)
pub fn max_sequence_number<T: Sequenced>(children: &[T]) -> u32 {
    children
        .iter()
        .map(Sequenced::sequence_number)
        .max()
        .unwrap_or(0)
}

/// Append a child at the end of the order
///
/// Existing children are never reordered.
/// Returns the sequence number given to the child.
pub fn insert<T: Sequenced>(children: &mut Vec<T>, mut child: T) -> u32 {
    let sequence_number = next_sequence_number(children);
    child.set_sequence_number(sequence_number);
    children.push(child);
    log::debug!("[SEQUENCE] Inserted child at position {}", sequence_number);
    sequence_number
}

/// Index of a child in the backing list
pub fn position_of<T: Sequenced>(children: &[T], id: Uuid) -> DomainResult<usize> {
    children
        .iter()
        .position(|child| child.id() == id)
        .ok_or_else(|| {
            DomainError::InvalidOperation(format!(
                "Child {} is not a member of this container",
                id
            ))
        })
}

/// Remove a child and close the gap it leaves
///
/// Every child after the removed one moves down by one position.
pub fn detach<T: Sequenced>(children: &mut Vec<T>, id: Uuid) -> DomainResult<T> {
    let index = position_of(children, id)?;
    let removed_position = children[index].sequence_number();

    for child in children
        .iter_mut()
        .filter(|child| child.sequence_number() > removed_position)
    {
        let current = child.sequence_number();
        child.set_sequence_number(current - 1);
    }

    log::debug!("[SEQUENCE] Detached child {} from position {}", id, removed_position);
    Ok(children.remove(index))
}

/// Resolve two children and check that `second` directly follows `first`
pub fn check_adjacent<T: Sequenced>(
    children: &[T],
    first: Uuid,
    second: Uuid,
) -> DomainResult<(usize, usize)> {
    let first_index = position_of(children, first)?;
    let second_index = position_of(children, second)?;

    let first_position = children[first_index].sequence_number();
    let second_position = children[second_index].sequence_number();

    if second_position != first_position + 1 {
        return Err(DomainError::PreconditionViolation(format!(
            "Cannot swap positions {} and {}: children are not adjacent",
            first_position, second_position
        )));
    }

    Ok((first_index, second_index))
}

/// Exchange the positions of two adjacent children
pub fn swap<T: Sequenced>(children: &mut [T], first: Uuid, second: Uuid) -> DomainResult<()> {
    let (first_index, second_index) = check_adjacent(children, first, second)?;

    let first_position = children[first_index].sequence_number();
    children[first_index].set_sequence_number(first_position + 1);
    children[second_index].set_sequence_number(first_position);

    Ok(())
}

/// Check that sequence numbers form the dense permutation 1..=N
///
/// Used at the loading boundary. Violations are reported, never repaired.
pub fn validate_dense<T: Sequenced>(children: &[T]) -> DomainResult<()> {
    let count = children.len();
    let mut seen = vec![false; count];

    for child in children {
        let position = child.sequence_number() as usize;

        if position == 0 || position > count {
            return Err(DomainError::DataIntegrity(format!(
                "Sequence number {} of child {} is outside 1..={}",
                position,
                child.id(),
                count
            )));
        }

        if seen[position - 1] {
            return Err(DomainError::DataIntegrity(format!(
                "Sequence number {} is used by more than one child",
                position
            )));
        }

        seen[position - 1] = true;
    }

    Ok(())
}

/// Read-only projection of the children in sequence order
///
/// Sorting is a pure function of the current numbers, so calling this any
/// number of times without a mutation in between yields the same order.
pub fn by_sequence<T: Sequenced>(children: &[T]) -> Vec<&T> {
    let mut ordered: Vec<&T> = children.iter().collect();
    ordered.sort_by_key(|child| child.sequence_number());
    ordered
}
