// events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are emitted after the catalog lock is released
// - Events carry only the data needed to re-project a container

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;

    /// Franchise or series the event is about
    fn container_id(&self) -> Uuid;
}

macro_rules! domain_event {
    ($name:ident, $container:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
            fn container_id(&self) -> Uuid {
                self.$container
            }
        }
    };
}

/// What happened to a container's projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionChange {
    Added { child_id: Uuid },
    Removed { child_id: Uuid },
    Reordered { child_ids: Vec<Uuid> },
    Renumbered { child_ids: Vec<Uuid> },
}

// ============================================================================
// CONTAINER LIFECYCLE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FranchiseCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub franchise_id: Uuid,
    pub title: String,
}

impl FranchiseCreated {
    pub fn new(franchise_id: Uuid, title: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            franchise_id,
            title,
        }
    }
}

domain_event!(FranchiseCreated, franchise_id);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub series_id: Uuid,
    pub title: String,
}

impl SeriesCreated {
    pub fn new(series_id: Uuid, title: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            series_id,
            title,
        }
    }
}

domain_event!(SeriesCreated, series_id);

/// Emitted once a container and its children were written out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSaved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub container_id: Uuid,
}

impl ContainerSaved {
    pub fn new(container_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            container_id,
        }
    }
}

domain_event!(ContainerSaved, container_id);

/// Emitted once a container was dropped from the catalog and the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDeleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub container_id: Uuid,
}

impl ContainerDeleted {
    pub fn new(container_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            container_id,
        }
    }
}

domain_event!(ContainerDeleted, container_id);

// ============================================================================
// PROJECTION CHANGES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FranchiseEntriesChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub franchise_id: Uuid,
    pub change: ProjectionChange,
}

impl FranchiseEntriesChanged {
    pub fn new(franchise_id: Uuid, change: ProjectionChange) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            franchise_id,
            change,
        }
    }
}

domain_event!(FranchiseEntriesChanged, franchise_id);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesComponentsChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub series_id: Uuid,
    pub change: ProjectionChange,
}

impl SeriesComponentsChanged {
    pub fn new(series_id: Uuid, change: ProjectionChange) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            series_id,
            change,
        }
    }
}

domain_event!(SeriesComponentsChanged, series_id);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeDisplayNumbersToggled {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub franchise_id: Uuid,
    pub enabled: bool,
}

impl MergeDisplayNumbersToggled {
    pub fn new(franchise_id: Uuid, enabled: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            franchise_id,
            enabled,
        }
    }
}

domain_event!(MergeDisplayNumbersToggled, franchise_id);

/// Request to re-sort a container's projection by sequence number
///
/// Re-sorting is idempotent, so receiving this more than once is harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResorted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub container_id: Uuid,
}

impl ProjectionResorted {
    pub fn new(container_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            container_id,
        }
    }
}

domain_event!(ProjectionResorted, container_id);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let id = Uuid::new_v4();
        assert_eq!(
            FranchiseCreated::new(id, "Alien".to_string()).event_type(),
            "FranchiseCreated"
        );
        assert_eq!(
            MergeDisplayNumbersToggled::new(id, true).event_type(),
            "MergeDisplayNumbersToggled"
        );
        assert_eq!(ProjectionResorted::new(id).event_type(), "ProjectionResorted");
    }

    #[test]
    fn test_container_id_points_at_the_changed_container() {
        let franchise_id = Uuid::new_v4();
        let series_id = Uuid::new_v4();

        let change = ProjectionChange::Removed {
            child_id: Uuid::new_v4(),
        };
        assert_eq!(
            FranchiseEntriesChanged::new(franchise_id, change.clone()).container_id(),
            franchise_id
        );
        assert_eq!(
            SeriesComponentsChanged::new(series_id, change).container_id(),
            series_id
        );
        assert_eq!(
            SeriesCreated::new(series_id, "Dark".to_string()).container_id(),
            series_id
        );
    }

    #[test]
    fn test_projection_change_serialization() {
        let child_id = Uuid::new_v4();
        let json = serde_json::to_value(ProjectionChange::Added { child_id }).unwrap();
        assert_eq!(json["kind"], "added");
        assert_eq!(json["child_id"], child_id.to_string());
    }
}
