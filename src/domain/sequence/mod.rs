//! Sequence Engine
//!
//! Critical Sequence Invariants:
//!
//! 1. Sequence numbers within one container are exactly 1..=N
//! 2. No duplicates, no gaps
//! 3. A new child is always appended as N + 1
//! 4. Detaching a child re-packs every later child down by one
//! 5. Only adjacent children can be swapped
//!
//! Everything here is generic over `Sequenced`, so franchise entries and
//! series components share one implementation.

pub mod engine;
pub mod reorder;
pub mod traversal;

use uuid::Uuid;

pub use engine::{
    by_sequence, check_adjacent, detach, insert, max_sequence_number,
    next_sequence_number, position_of, swap, validate_dense,
};
pub use reorder::{
    apply_move, move_to, next_sibling, plan_move, previous_sibling, MoveDirection, ReorderOutcome,
};
pub use traversal::{backward_from, forward, Backward, Forward};

/// A child that occupies a slot in its container's total order
pub trait Sequenced {
    /// Stable identity of the child inside its container
    fn id(&self) -> Uuid;

    /// 1-based position inside the container
    fn sequence_number(&self) -> u32;

    fn set_sequence_number(&mut self, value: u32);
}
