// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are presentation-friendly, read-only projections
// - Children are always listed in sequence order
// - Conversion FROM domain entities only (never TO)

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::domain::{
    ComponentKind, EntryKind, Franchise, FranchiseEntry, Series, SeriesComponent,
};

// ============================================================================
// FRANCHISE DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FranchiseDto {
    pub id: String,
    pub title: String,
    pub merge_display_numbers: bool,
    pub is_loosely_connected: bool,
    pub show_display_numbers: bool,
    pub parent_franchise_id: Option<String>,
    pub entries: Vec<FranchiseEntryDto>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FranchiseEntryDto {
    pub id: String,
    pub kind: String,
    pub target_id: String,
    pub sequence_number: u32,
    pub display_number: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachEntryDto {
    pub franchise_id: String,
    /// "movie", "series" or "franchise"
    pub kind: String,
    pub target_id: String,
    #[serde(default)]
    pub show_display_number: bool,
}

/// Which commands are currently permitted for one entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPermissionsDto {
    pub can_move_up: bool,
    pub can_move_down: bool,
    pub can_detach: bool,
    pub can_show_display_number: bool,
    pub can_hide_display_number: bool,
}

// ============================================================================
// SERIES DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDto {
    pub id: String,
    pub title: String,
    pub is_miniseries: bool,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub components: Vec<SeriesComponentDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesComponentDto {
    pub id: String,
    pub kind: String,
    pub sequence_number: u32,
    pub title: String,
    pub channel: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    /// Full payload, as stored
    pub payload: ComponentKind,
}

/// Which commands are currently permitted for one component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPermissionsDto {
    pub can_move_up: bool,
    pub can_move_down: bool,
    pub can_convert_to_miniseries: bool,
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<&FranchiseEntry> for FranchiseEntryDto {
    fn from(entry: &FranchiseEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            kind: entry.kind.as_str().to_string(),
            target_id: entry.kind.target_id().to_string(),
            sequence_number: entry.sequence_number,
            display_number: entry.display_number,
        }
    }
}

impl From<&Franchise> for FranchiseDto {
    fn from(franchise: &Franchise) -> Self {
        Self {
            id: franchise.id.to_string(),
            title: franchise.title.clone(),
            merge_display_numbers: franchise.merge_display_numbers,
            is_loosely_connected: franchise.is_loosely_connected,
            show_display_numbers: franchise.show_display_numbers(),
            parent_franchise_id: franchise.parent.map(|link| link.franchise_id.to_string()),
            entries: franchise
                .entries_in_order()
                .into_iter()
                .map(FranchiseEntryDto::from)
                .collect(),
            created_at: franchise.created_at.to_rfc3339(),
            updated_at: franchise.updated_at.to_rfc3339(),
        }
    }
}

impl From<&SeriesComponent> for SeriesComponentDto {
    fn from(component: &SeriesComponent) -> Self {
        Self {
            id: component.id.to_string(),
            kind: component.kind.as_str().to_string(),
            sequence_number: component.sequence_number,
            title: component.kind.title().to_string(),
            channel: component.kind.channel().to_string(),
            start_year: component.kind.start_year(),
            end_year: component.kind.end_year(),
            payload: component.kind.clone(),
        }
    }
}

impl From<&Series> for SeriesDto {
    fn from(series: &Series) -> Self {
        Self {
            id: series.id.to_string(),
            title: series.title.clone(),
            is_miniseries: series.is_miniseries,
            start_year: series.start_year(),
            end_year: series.end_year(),
            components: series
                .components_in_order()
                .into_iter()
                .map(SeriesComponentDto::from)
                .collect(),
        }
    }
}

impl AttachEntryDto {
    /// Parse the entry kind; `None` for an unknown kind
    pub fn entry_kind(&self, target_id: Uuid) -> Option<EntryKind> {
        EntryKind::from_parts(&self.kind, target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::insert;
    use crate::domain::{Period, Season};

    #[test]
    fn test_franchise_dto_lists_entries_in_order() {
        let mut franchise = Franchise::new("Alien".to_string());
        let first = FranchiseEntry::new(franchise.id, EntryKind::movie(Uuid::new_v4()));
        let second = FranchiseEntry::new(franchise.id, EntryKind::series(Uuid::new_v4()));
        let second_id = second.id;
        insert(&mut franchise.entries, first);
        insert(&mut franchise.entries, second);
        franchise.entries.reverse();

        let dto = FranchiseDto::from(&franchise);

        assert_eq!(dto.entries.len(), 2);
        assert_eq!(dto.entries[1].id, second_id.to_string());
        assert_eq!(dto.entries[1].kind, "series");
        assert!(!dto.show_display_numbers);
    }

    #[test]
    fn test_series_dto_years() {
        let mut series = Series::new("Dark".to_string());
        let season = ComponentKind::Season(Season {
            title: "Season 1".to_string(),
            original_title: "Staffel 1".to_string(),
            channel: "Netflix".to_string(),
            periods: vec![Period::single(2017)],
        });
        insert(&mut series.components, SeriesComponent::new(series.id, season));

        let dto = SeriesDto::from(&series);

        assert_eq!(dto.start_year, Some(2017));
        assert_eq!(dto.components[0].channel, "Netflix");
        assert_eq!(dto.components[0].kind, "season");
    }

    #[test]
    fn test_attach_dto_kind_parsing() {
        let dto = AttachEntryDto {
            franchise_id: Uuid::new_v4().to_string(),
            kind: "franchise".to_string(),
            target_id: Uuid::new_v4().to_string(),
            show_display_number: false,
        };
        let target = Uuid::new_v4();
        assert_eq!(dto.entry_kind(target), Some(EntryKind::franchise(target)));

        let unknown = AttachEntryDto {
            kind: "book".to_string(),
            ..dto
        };
        assert!(unknown.entry_kind(target).is_none());
    }
}
