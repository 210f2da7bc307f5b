use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::sequence::{by_sequence, Sequenced};

/// A franchise: an ordered collection of movies, series and nested franchises
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Franchise {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Display title (may be empty while the franchise has no titles)
    pub title: String,

    /// Children, stored in arbitrary order; the order is given by sequence numbers
    pub entries: Vec<FranchiseEntry>,

    /// Continue display numbering from the entry preceding this franchise
    pub merge_display_numbers: bool,

    /// Informational only, never consulted by the numbering engine
    pub is_loosely_connected: bool,

    /// Entry of the enclosing franchise that references this one
    pub parent: Option<ParentLink>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Non-owning back-reference from a nested franchise to its parent entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    pub franchise_id: Uuid,
    pub entry_id: Uuid,
}

/// A child of a franchise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseEntry {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Owning franchise (immutable)
    pub franchise_id: Uuid,

    /// What the entry points to
    pub kind: EntryKind,

    /// Dense 1-based position inside the franchise
    pub sequence_number: u32,

    /// Optional user-facing ordinal; absence is never encoded as zero
    pub display_number: Option<u32>,
}

/// Closed set of things a franchise can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    Movie { movie_id: Uuid },
    Series { series_id: Uuid },
    Franchise { franchise_id: Uuid },
}

impl Franchise {
    /// Create a new, empty franchise
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            entries: Vec::new(),
            merge_display_numbers: false,
            is_loosely_connected: false,
            parent: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True iff any entry carries a display number
    pub fn show_display_numbers(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.display_number.is_some())
    }

    pub fn entry(&self, entry_id: Uuid) -> Option<&FranchiseEntry> {
        self.entries.iter().find(|entry| entry.id == entry_id)
    }

    pub fn entry_mut(&mut self, entry_id: Uuid) -> Option<&mut FranchiseEntry> {
        self.entries.iter_mut().find(|entry| entry.id == entry_id)
    }

    /// Entries sorted by sequence number
    pub fn entries_in_order(&self) -> Vec<&FranchiseEntry> {
        by_sequence(&self.entries)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl FranchiseEntry {
    /// Create an entry owned by `franchise_id`
    /// The sequence number is assigned when the entry is inserted
    pub fn new(franchise_id: Uuid, kind: EntryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            franchise_id,
            kind,
            sequence_number: 0,
            display_number: None,
        }
    }
}

impl Sequenced for FranchiseEntry {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    fn set_sequence_number(&mut self, value: u32) {
        self.sequence_number = value;
    }
}

impl EntryKind {
    pub fn movie(movie_id: Uuid) -> Self {
        Self::Movie { movie_id }
    }

    pub fn series(series_id: Uuid) -> Self {
        Self::Series { series_id }
    }

    pub fn franchise(franchise_id: Uuid) -> Self {
        Self::Franchise { franchise_id }
    }

    /// Id of the referenced movie, series or franchise
    pub fn target_id(&self) -> Uuid {
        match self {
            EntryKind::Movie { movie_id } => *movie_id,
            EntryKind::Series { series_id } => *series_id,
            EntryKind::Franchise { franchise_id } => *franchise_id,
        }
    }

    pub fn nested_franchise(&self) -> Option<Uuid> {
        match self {
            EntryKind::Franchise { franchise_id } => Some(*franchise_id),
            EntryKind::Movie { .. } | EntryKind::Series { .. } => None,
        }
    }

    /// Stored discriminator
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Movie { .. } => "movie",
            EntryKind::Series { .. } => "series",
            EntryKind::Franchise { .. } => "franchise",
        }
    }

    /// Rebuild a kind from its stored discriminator and target id
    pub fn from_parts(kind: &str, target_id: Uuid) -> Option<Self> {
        match kind {
            "movie" => Some(Self::movie(target_id)),
            "series" => Some(Self::series(target_id)),
            "franchise" => Some(Self::franchise(target_id)),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for Franchise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Franchise #{}: {}", self.id, self.title)
    }
}
