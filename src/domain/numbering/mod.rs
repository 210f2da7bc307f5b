//! Display Number Engine
//!
//! Critical Numbering Invariants:
//!
//! 1. Display numbers are optional, 1-based, never 0
//! 2. Within a franchise, numbers never decrease along the sequence order
//! 3. Hiding a number shifts every later number down by one;
//!    showing one shifts every later number up by one
//! 4. A franchise with merge mode on is flattened into its parent: its
//!    numbered entries take part in the parent's numbering at the position
//!    of the entry that references it
//! 5. An entry referencing a merged franchise never has a number of its own
//! 6. Every call validates first and then applies all changes, so sequence
//!    and display numbers are never observed half-updated

pub mod engine;
pub mod flatten;
pub mod ordering;


use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};

pub use engine::{
    adjust_after_merge, first_number_floor, hide, next_display_number, recompute_first_number,
    reflow, set_merge_display_numbers, show,
};
pub use flatten::{flattened_items, flattened_max, region_root, Slot};
pub use ordering::{attach_entry, delete_franchise, detach_entry, move_entry, swap_entries};

/// The number right after `number`
pub(crate) fn successor(number: u32) -> DomainResult<u32> {
    number.checked_add(1).ok_or_else(|| {
        DomainError::InvariantViolation(format!("Display number {} has no successor", number))
    })
}

/// A single display number change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayUpdate {
    pub franchise_id: Uuid,
    pub entry_id: Uuid,
    pub previous: Option<u32>,
    pub current: Option<u32>,
}

/// Every display number changed by one engine call, in application order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberingOutcome {
    pub updates: Vec<DisplayUpdate>,
}

impl NumberingOutcome {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn extend(&mut self, other: NumberingOutcome) {
        self.updates.extend(other.updates);
    }

    /// Franchises whose numbers changed, in first-touched order
    pub fn renumbered_franchises(&self) -> Vec<Uuid> {
        let mut franchises: Vec<Uuid> = Vec::new();
        for update in &self.updates {
            if !franchises.contains(&update.franchise_id) {
                franchises.push(update.franchise_id);
            }
        }
        franchises
    }

    pub(crate) fn record(&mut self, slot: Slot, previous: Option<u32>, current: Option<u32>) {
        if previous != current {
            self.updates.push(DisplayUpdate {
                franchise_id: slot.franchise_id,
                entry_id: slot.entry_id,
                previous,
                current,
            });
        }
    }
}
