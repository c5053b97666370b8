//! Filtering Module
//! Conjunctive row selection over the unified table. An unset selector is a
//! no-op; set selectors compare exact strings and commute freely.

use crate::data::schema::{col, UNKNOWN_PITCHER};
use polars::prelude::*;

/// Selector set for one view. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchFilter {
    pub pitcher: Option<String>,
    pub date: Option<String>,
    pub batter_side: Option<String>,
    pub runner_on: Option<bool>,
    pub count: Option<(i64, i64)>,
}

impl PitchFilter {
    /// Produce the subset matching all set selectors.
    pub fn apply(&self, df: &DataFrame) -> PolarsResult<DataFrame> {
        let mut predicate = lit(true);

        if let Some(pitcher) = &self.pitcher {
            predicate = predicate.and(col(col::PITCHER).eq(lit(pitcher.clone())));
        }
        if let Some(date) = &self.date {
            predicate = predicate.and(col(col::DATE).eq(lit(date.clone())));
        }
        if let Some(side) = &self.batter_side {
            predicate = predicate.and(col(col::BATTER_SIDE).eq(lit(side.clone())));
        }
        if let Some(runner_on) = self.runner_on {
            let flag: i32 = if runner_on { 1 } else { 0 };
            predicate = predicate.and(col(col::HAS_RUNNER).eq(lit(flag)));
        }
        if let Some((balls, strikes)) = self.count {
            predicate = predicate
                .and(col(col::BALLS).eq(lit(balls as f64)))
                .and(col(col::STRIKES).eq(lit(strikes as f64)));
        }

        df.clone().lazy().filter(predicate).collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == PitchFilter::default()
    }
}

/// Subset of rows tagged with one source category.
pub fn by_category(df: &DataFrame, tag: &str) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .filter(col(col::CATEGORY).eq(lit(tag.to_string())))
        .collect()
}

/// Non-null unique values of a string column, unsorted.
pub fn unique_strings(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .ok()
        .and_then(|c| c.unique().ok())
        .map(|unique| {
            let series = unique.as_materialized_series();
            (0..series.len())
                .filter_map(|i| {
                    let val = series.get(i).ok()?;
                    if val.is_null() {
                        None
                    } else {
                        Some(val.to_string().trim_matches('"').to_string())
                    }
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Pitcher names for the selector, sorted, placeholder entries dropped.
pub fn pitcher_choices(df: &DataFrame) -> Vec<String> {
    let mut names: Vec<String> = unique_strings(df, col::PITCHER)
        .into_iter()
        .filter(|n| {
            let lower = n.trim().to_lowercase();
            !lower.is_empty() && lower != "nan" && lower != UNKNOWN_PITCHER.to_lowercase()
        })
        .collect();
    names.sort();
    names
}

/// Dates for the selector, newest first.
pub fn date_choices(df: &DataFrame) -> Vec<String> {
    let mut dates = unique_strings(df, col::DATE);
    dates.sort();
    dates.reverse();
    dates
}

/// Distinct (balls, strikes) situations present in the subset, sorted.
pub fn count_choices(df: &DataFrame) -> Vec<(i64, i64)> {
    use crate::data::loader::float_at;

    let (Ok(balls), Ok(strikes)) = (df.column(col::BALLS), df.column(col::STRIKES)) else {
        return Vec::new();
    };

    let mut counts: Vec<(i64, i64)> = (0..df.height())
        .filter_map(|i| {
            let b = float_at(balls, i)?;
            let s = float_at(strikes, i)?;
            Some((b as i64, s as i64))
        })
        .collect();
    counts.sort();
    counts.dedup();
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                col::PITCHER.into(),
                vec!["Sato", "Sato", "Tanaka", "Unknown"],
            ),
            Column::new(
                col::DATE.into(),
                vec!["2024-04-01", "2024-04-08", "2024-04-01", "2024-04-01"],
            ),
            Column::new(
                col::BATTER_SIDE.into(),
                vec!["Right", "Left", "Right", "Right"],
            ),
            Column::new(col::HAS_RUNNER.into(), vec![0i32, 1, 0, 0]),
            Column::new(col::BALLS.into(), vec![0.0f64, 1.0, 0.0, 2.0]),
            Column::new(col::STRIKES.into(), vec![0.0f64, 2.0, 0.0, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn unset_filter_is_a_no_op() {
        let df = sample();
        let out = PitchFilter::default().apply(&df).unwrap();
        assert_eq!(out.height(), df.height());
    }

    #[test]
    fn filters_are_conjunctive() {
        let df = sample();
        let filter = PitchFilter {
            pitcher: Some("Sato".into()),
            date: Some("2024-04-01".into()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&df).unwrap().height(), 1);
    }

    #[test]
    fn filters_commute() {
        let df = sample();

        let by_pitcher = PitchFilter {
            pitcher: Some("Sato".into()),
            ..Default::default()
        };
        let by_date = PitchFilter {
            date: Some("2024-04-01".into()),
            ..Default::default()
        };

        let pitcher_then_date = by_date.apply(&by_pitcher.apply(&df).unwrap()).unwrap();
        let date_then_pitcher = by_pitcher.apply(&by_date.apply(&df).unwrap()).unwrap();

        assert_eq!(pitcher_then_date.height(), date_then_pitcher.height());
        assert!(pitcher_then_date.equals_missing(&date_then_pitcher));
    }

    #[test]
    fn count_and_runner_selectors() {
        let df = sample();

        let first_pitch_counts = PitchFilter {
            count: Some((0, 0)),
            ..Default::default()
        };
        assert_eq!(first_pitch_counts.apply(&df).unwrap().height(), 2);

        let runner_on = PitchFilter {
            runner_on: Some(true),
            ..Default::default()
        };
        assert_eq!(runner_on.apply(&df).unwrap().height(), 1);
    }

    #[test]
    fn selector_lists() {
        let df = sample();
        assert_eq!(pitcher_choices(&df), vec!["Sato", "Tanaka"]);
        assert_eq!(date_choices(&df), vec!["2024-04-08", "2024-04-01"]);
        assert_eq!(count_choices(&df), vec![(0, 0), (1, 2), (2, 2)]);
    }
}
