use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::sequence::{by_sequence, Sequenced};

/// Earliest year a component may air in
pub const MIN_YEAR: i32 = 1850;

/// Latest year a component may air in
pub const MAX_YEAR: i32 = 2100;

/// Represents a TV series made of seasons and special episodes
/// Series children have an order but no display numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Display title
    pub title: String,

    /// Seasons and special episodes, ordered by sequence number
    pub components: Vec<SeriesComponent>,

    /// Whether the series is stored as a miniseries
    pub is_miniseries: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A child of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesComponent {
    pub id: Uuid,

    /// Owning series (immutable)
    pub series_id: Uuid,

    pub sequence_number: u32,

    pub kind: ComponentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Season(Season),
    SpecialEpisode(SpecialEpisode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub title: String,
    pub original_title: String,
    pub channel: String,
    pub periods: Vec<Period>,
}

/// A continuous airing window of a season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start_month: u8,
    pub start_year: i32,
    pub end_month: u8,
    pub end_year: i32,
    pub episode_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialEpisode {
    pub title: String,
    pub original_title: String,
    pub channel: String,
    pub month: u8,
    pub year: i32,
}

impl Series {
    /// Create a new, empty series
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            components: Vec::new(),
            is_miniseries: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn component(&self, component_id: Uuid) -> Option<&SeriesComponent> {
        self.components
            .iter()
            .find(|component| component.id == component_id)
    }

    pub fn component_mut(&mut self, component_id: Uuid) -> Option<&mut SeriesComponent> {
        self.components
            .iter_mut()
            .find(|component| component.id == component_id)
    }

    /// Components sorted by sequence number
    pub fn components_in_order(&self) -> Vec<&SeriesComponent> {
        by_sequence(&self.components)
    }

    /// Component with the highest sequence number
    pub fn last_component(&self) -> Option<&SeriesComponent> {
        self.components
            .iter()
            .max_by_key(|component| component.sequence_number)
    }

    pub fn seasons(&self) -> impl Iterator<Item = &Season> {
        self.components.iter().filter_map(|c| match &c.kind {
            ComponentKind::Season(season) => Some(season),
            ComponentKind::SpecialEpisode(_) => None,
        })
    }

    pub fn special_episodes(&self) -> impl Iterator<Item = &SpecialEpisode> {
        self.components.iter().filter_map(|c| match &c.kind {
            ComponentKind::SpecialEpisode(episode) => Some(episode),
            ComponentKind::Season(_) => None,
        })
    }

    /// Earliest year of any component
    pub fn start_year(&self) -> Option<i32> {
        self.components
            .iter()
            .filter_map(|c| c.kind.start_year())
            .min()
    }

    /// Latest year of any component
    pub fn end_year(&self) -> Option<i32> {
        self.components
            .iter()
            .filter_map(|c| c.kind.end_year())
            .max()
    }

    /// A series can become a miniseries only when it has at most one season
    /// with at most one period, and no special episodes
    pub fn can_convert_to_miniseries(&self) -> bool {
        let seasons: Vec<&Season> = self.seasons().collect();
        let period_count: usize = seasons.iter().map(|s| s.periods.len()).sum();

        seasons.len() <= 1 && period_count <= 1 && self.special_episodes().next().is_none()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl SeriesComponent {
    /// Create a component owned by `series_id`
    /// The sequence number is assigned when the component is inserted
    pub fn new(series_id: Uuid, kind: ComponentKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            series_id,
            sequence_number: 0,
            kind,
        }
    }
}

impl Sequenced for SeriesComponent {
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

impl ComponentKind {
    pub fn channel(&self) -> &str {
        match self {
            ComponentKind::Season(season) => &season.channel,
            ComponentKind::SpecialEpisode(episode) => &episode.channel,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ComponentKind::Season(season) => &season.title,
            ComponentKind::SpecialEpisode(episode) => &episode.title,
        }
    }

    pub fn start_year(&self) -> Option<i32> {
        match self {
            ComponentKind::Season(season) => season.periods.iter().map(|p| p.start_year).min(),
            ComponentKind::SpecialEpisode(episode) => Some(episode.year),
        }
    }

    pub fn end_year(&self) -> Option<i32> {
        match self {
            ComponentKind::Season(season) => season.periods.iter().map(|p| p.end_year).max(),
            ComponentKind::SpecialEpisode(episode) => Some(episode.year),
        }
    }

    /// Default year for a component added right after this one
    ///
    /// `None` for a season without periods or when the year has no successor.
    pub fn next_year(&self) -> Option<i32> {
        self.end_year().and_then(|year| year.checked_add(1))
    }

    /// Stored discriminator
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Season(_) => "season",
            ComponentKind::SpecialEpisode(_) => "special_episode",
        }
    }
}

impl Period {
    /// A one-episode period in January of `year`
    pub fn single(year: i32) -> Self {
        Self {
            start_month: 1,
            start_year: year,
            end_month: 1,
            end_year: year,
            episode_count: 1,
        }
    }
}

impl std::fmt::Display for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Series #{}: {}", self.id, self.title)
    }
}
