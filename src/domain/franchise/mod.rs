pub mod entity;
pub mod invariants;

pub use entity::{EntryKind, Franchise, FranchiseEntry, ParentLink};
pub use invariants::validate_franchise;
