use super::entity::{ComponentKind, Period, Series, MAX_YEAR, MIN_YEAR};
use crate::domain::sequence::validate_dense;
use crate::domain::{DomainError, DomainResult};

/// Validates all Series invariants
pub fn validate_series(series: &Series) -> DomainResult<()> {
    for component in &series.components {
        if component.series_id != series.id {
            return Err(DomainError::DataIntegrity(format!(
                "Component {} belongs to series {}, not {}",
                component.id, component.series_id, series.id
            )));
        }
        validate_component(&component.kind)?;
    }

    validate_dense(&series.components)?;
    Ok(())
}

fn validate_component(kind: &ComponentKind) -> DomainResult<()> {
    match kind {
        ComponentKind::Season(season) => {
            if season.periods.is_empty() {
                return Err(DomainError::InvariantViolation(format!(
                    "Season '{}' has no periods",
                    season.title
                )));
            }
            season.periods.iter().try_for_each(validate_period)
        }
        ComponentKind::SpecialEpisode(episode) => {
            validate_month(episode.month)?;
            validate_year(episode.year)
        }
    }
}

/// Months are 1..=12, years are in range and a period never ends before it starts
fn validate_period(period: &Period) -> DomainResult<()> {
    validate_month(period.start_month)?;
    validate_month(period.end_month)?;
    validate_year(period.start_year)?;
    validate_year(period.end_year)?;

    if (period.start_year, period.start_month) > (period.end_year, period.end_month) {
        return Err(DomainError::InvariantViolation(format!(
            "Period {}/{} ends before it starts ({}/{})",
            period.end_month, period.end_year, period.start_month, period.start_year
        )));
    }

    Ok(())
}

pub fn validate_year(year: i32) -> DomainResult<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(DomainError::InvariantViolation(format!(
            "Year {} is outside {}..={}",
            year, MIN_YEAR, MAX_YEAR
        )));
    }
    Ok(())
}

fn validate_month(month: u8) -> DomainResult<()> {
    if !(1..=12).contains(&month) {
        return Err(DomainError::InvariantViolation(format!(
            "Month {} is outside 1..=12",
            month
        )));
    }
    Ok(())
}

/// Critical Series Invariants:
///
/// 1. Seasons and special episodes share one dense 1..=N order
/// 2. A component belongs to exactly one series
/// 3. A season has at least one period
/// 4. Series children carry no display numbers

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::{Season, SeriesComponent, SpecialEpisode};
    use crate::domain::sequence::insert;

    fn season(periods: Vec<Period>) -> ComponentKind {
        ComponentKind::Season(Season {
            title: "Season 1".to_string(),
            original_title: "Season 1".to_string(),
            channel: "HBO".to_string(),
            periods,
        })
    }

    #[test]
    fn test_valid_series() {
        let mut series = Series::new("The Wire".to_string());
        let component = SeriesComponent::new(series.id, season(vec![Period::single(2002)]));
        insert(&mut series.components, component);

        assert!(validate_series(&series).is_ok());
    }

    #[test]
    fn test_season_without_periods_fails() {
        let mut series = Series::new("The Wire".to_string());
        insert(&mut series.components, SeriesComponent::new(series.id, season(vec![])));

        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn test_reversed_period_fails() {
        let mut period = Period::single(2004);
        period.end_year = 2003;
        let mut series = Series::new("The Wire".to_string());
        insert(&mut series.components, SeriesComponent::new(series.id, season(vec![period])));

        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn test_invalid_special_month_fails() {
        let mut series = Series::new("Sherlock".to_string());
        let special = ComponentKind::SpecialEpisode(SpecialEpisode {
            title: "The Abominable Bride".to_string(),
            original_title: "The Abominable Bride".to_string(),
            channel: "BBC One".to_string(),
            month: 13,
            year: 2016,
        });
        insert(&mut series.components, SeriesComponent::new(series.id, special));

        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn test_years_out_of_range_fail() {
        let mut period = Period::single(2000);
        period.end_year = i32::MAX;
        let mut series = Series::new("Doctor Who".to_string());
        insert(&mut series.components, SeriesComponent::new(series.id, season(vec![period])));
        assert!(validate_series(&series).is_err());

        let mut series = Series::new("Sherlock".to_string());
        let special = ComponentKind::SpecialEpisode(SpecialEpisode {
            title: "Special".to_string(),
            original_title: "Special".to_string(),
            channel: "BBC One".to_string(),
            month: 1,
            year: MIN_YEAR - 1,
        });
        insert(&mut series.components, SeriesComponent::new(series.id, special));
        assert!(validate_series(&series).is_err());

        assert!(validate_year(MAX_YEAR).is_ok());
        assert!(validate_year(MAX_YEAR + 1).is_err());
    }

    #[test]
    fn test_next_year_of_last_year_is_none() {
        let mut period = Period::single(2000);
        period.end_year = i32::MAX;
        assert_eq!(season(vec![period]).next_year(), None);
        assert_eq!(season(vec![]).next_year(), None);
    }

    #[test]
    fn test_duplicate_positions_are_integrity_errors() {
        let mut series = Series::new("The Wire".to_string());
        insert(&mut series.components, SeriesComponent::new(series.id, season(vec![Period::single(2002)])));
        insert(&mut series.components, SeriesComponent::new(series.id, season(vec![Period::single(2003)])));
        series.components[1].sequence_number = 1;

        assert!(matches!(
            validate_series(&series),
            Err(DomainError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_years_and_miniseries_conversion() {
        let mut series = Series::new("Chernobyl".to_string());
        assert!(series.can_convert_to_miniseries());
        assert_eq!(series.start_year(), None);

        insert(&mut series.components, SeriesComponent::new(series.id, season(vec![Period::single(2019)])));
        assert!(series.can_convert_to_miniseries());

        insert(&mut series.components, SeriesComponent::new(series.id, season(vec![Period::single(2021)])));
        assert!(!series.can_convert_to_miniseries());
        assert_eq!(series.start_year(), Some(2019));
        assert_eq!(series.end_year(), Some(2021));
        assert_eq!(series.last_component().unwrap().kind.next_year(), Some(2022));
    }
}
