//! Critical Catalog Invariants:
//!
//! 1. The catalog owns every loaded container by value
//! 2. A nested franchise knows its parent only by id (no owning back-pointer)
//! 3. A franchise is referenced by at most one parent entry
//! 4. Parent chains are acyclic and bounded by MAX_NESTING_DEPTH

pub mod entity;

pub use entity::{Catalog, MAX_NESTING_DEPTH};
