// src/domain/sequence/reorder.rs
//
// Reorder Conflict Resolver
//
// A direct edit of a child's sequence number lands on a slot that a sibling
// already holds. Siblings are displaced toward the vacated slot, never
// overwritten:
// - moved earlier: every sibling in [new, old) moves down the list (+1)
// - moved later:   every sibling in (old, new] moves up the list (-1)
//
// Navigation (next / previous) is defined purely by position +/- 1.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::engine::position_of;
use super::Sequenced;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Earlier,
    Later,
}

/// Result of resolving a direct sequence edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub moved: Uuid,
    pub old_position: u32,
    pub new_position: u32,
    pub direction: MoveDirection,
    /// Siblings shifted to make room, in their original order
    pub displaced: Vec<Uuid>,
}

impl ReorderOutcome {
    /// Lowest position touched by the move
    pub fn span_start(&self) -> u32 {
        self.old_position.min(self.new_position)
    }

    /// Highest position touched by the move
    pub fn span_end(&self) -> u32 {
        self.old_position.max(self.new_position)
    }
}

/// Work out which siblings a direct edit displaces, without mutating
///
/// Returns `None` when the child already holds `new_position`.
pub fn plan_move<T: Sequenced>(
    children: &[T],
    id: Uuid,
    new_position: u32,
) -> DomainResult<Option<ReorderOutcome>> {
    let index = position_of(children, id)?;
    let count = children.len() as u32;

    if new_position == 0 || new_position > count {
        return Err(DomainError::PreconditionViolation(format!(
            "Sequence number {} is outside 1..={}",
            new_position, count
        )));
    }

    let old_position = children[index].sequence_number();
    if old_position == new_position {
        return Ok(None);
    }

    let direction = if new_position < old_position {
        MoveDirection::Earlier
    } else {
        MoveDirection::Later
    };

    let mut displaced: Vec<&T> = children
        .iter()
        .filter(|child| child.id() != id)
        .filter(|child| {
            let position = child.sequence_number();
            match direction {
                MoveDirection::Earlier => position >= new_position && position < old_position,
                MoveDirection::Later => position > old_position && position <= new_position,
            }
        })
        .collect();
    displaced.sort_by_key(|child| child.sequence_number());

    Ok(Some(ReorderOutcome {
        moved: id,
        old_position,
        new_position,
        direction,
        displaced: displaced.into_iter().map(Sequenced::id).collect(),
    }))
}

/// Apply a previously planned move
pub fn apply_move<T: Sequenced>(children: &mut [T], outcome: &ReorderOutcome) {
    for child in children.iter_mut() {
        if child.id() == outcome.moved {
            child.set_sequence_number(outcome.new_position);
        } else if outcome.displaced.contains(&child.id()) {
            let current = child.sequence_number();
            match outcome.direction {
                MoveDirection::Earlier => child.set_sequence_number(current + 1),
                MoveDirection::Later => child.set_sequence_number(current - 1),
            }
        }
    }

    log::debug!(
        "[SEQUENCE] Moved {} from {} to {} ({} displaced)",
        outcome.moved,
        outcome.old_position,
        outcome.new_position,
        outcome.displaced.len()
    );
}

/// Set a child's sequence number directly and resolve the collision
pub fn move_to<T: Sequenced>(
    children: &mut [T],
    id: Uuid,
    new_position: u32,
) -> DomainResult<Option<ReorderOutcome>> {
    let outcome = plan_move(children, id, new_position)?;
    if let Some(outcome) = &outcome {
        apply_move(children, outcome);
    }
    Ok(outcome)
}

/// Sibling at position + 1, if one exists
pub fn next_sibling<T: Sequenced>(children: &[T], id: Uuid) -> Option<&T> {
    let current = children.iter().find(|child| child.id() == id)?;
    let target = current.sequence_number() + 1;
    children
        .iter()
        .find(|child| child.sequence_number() == target)
}

/// Sibling at position - 1, if one exists
pub fn previous_sibling<T: Sequenced>(children: &[T], id: Uuid) -> Option<&T> {
    let current = children.iter().find(|child| child.id() == id)?;
    let target = current.sequence_number().checked_sub(1)?;
    children
        .iter()
        .find(|child| child.sequence_number() == target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::engine::tests::container;
    use crate::domain::sequence::{by_sequence, validate_dense};

    fn order(children: &[crate::domain::sequence::engine::tests::Item]) -> Vec<Uuid> {
        by_sequence(children).iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_move_earlier_displaces_forward() {
        let mut children = container(3);
        let ids = order(&children);

        let outcome = move_to(&mut children, ids[2], 1).unwrap().unwrap();

        assert_eq!(outcome.direction, MoveDirection::Earlier);
        assert_eq!(outcome.displaced, vec![ids[0], ids[1]]);
        assert_eq!(order(&children), vec![ids[2], ids[0], ids[1]]);
        assert!(validate_dense(&children).is_ok());
    }

    #[test]
    fn test_move_later_displaces_backward() {
        let mut children = container(4);
        let ids = order(&children);

        let outcome = move_to(&mut children, ids[0], 3).unwrap().unwrap();

        assert_eq!(outcome.direction, MoveDirection::Later);
        assert_eq!(order(&children), vec![ids[1], ids[2], ids[0], ids[3]]);
        assert!(validate_dense(&children).is_ok());
    }

    #[test]
    fn test_move_to_same_position_is_noop() {
        let mut children = container(3);
        let ids = order(&children);

        assert!(move_to(&mut children, ids[1], 2).unwrap().is_none());
        assert_eq!(order(&children), ids);
    }

    #[test]
    fn test_move_out_of_range_fails_without_mutation() {
        let mut children = container(3);
        let ids = order(&children);

        assert!(matches!(
            move_to(&mut children, ids[1], 4),
            Err(DomainError::PreconditionViolation(_))
        ));
        assert!(move_to(&mut children, ids[1], 0).is_err());
        assert_eq!(order(&children), ids);
    }

    #[test]
    fn test_navigation() {
        let children = container(3);
        let ids = order(&children);

        assert_eq!(next_sibling(&children, ids[0]).map(|c| c.id), Some(ids[1]));
        assert_eq!(previous_sibling(&children, ids[2]).map(|c| c.id), Some(ids[1]));
        assert!(next_sibling(&children, ids[2]).is_none());
        assert!(previous_sibling(&children, ids[0]).is_none());
    }

    #[test]
    fn test_navigation_across_transient_gap_is_noop() {
        let mut children = container(3);
        let ids = order(&children);
        children[1].position = 9;

        assert!(next_sibling(&children, ids[0]).is_none());
    }
}
