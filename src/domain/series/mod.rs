pub mod entity;
pub mod invariants;

pub use entity::{
    ComponentKind, Period, Season, Series, SeriesComponent, SpecialEpisode, MAX_YEAR, MIN_YEAR,
};
pub use invariants::{validate_series, validate_year};
