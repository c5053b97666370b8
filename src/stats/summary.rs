//! Aggregation Module
//! Per-pitch-type summaries, headline metrics, count-situation and outcome
//! distributions over a filtered subset. All aggregates skip missing values;
//! a rate over an empty subset is `None`, displayed as blank.

use crate::data::loader::{float_at, string_at};
use crate::data::schema::{self, col};
use polars::prelude::*;
use std::collections::HashMap;

/// Bucket label for rows whose pitch type is missing. Keeping these rows in
/// their own bucket preserves the invariant that summary counts sum to the
/// subset's total.
pub const UNTAGGED: &str = "Untagged";

/// Summary row for one pitch type.
#[derive(Debug, Clone)]
pub struct PitchTypeSummary {
    pub pitch_type: String,
    pub count: usize,
    /// Share of the subset's pitches, 0..=1.
    pub usage: f64,
    pub mean_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub strike_rate: f64,
    pub swing_rate: f64,
    pub whiffs: usize,
    /// Whiffs over swings; None when the type drew no swings.
    pub whiff_per_swing: Option<f64>,
}

/// Headline metrics for a filtered subset.
#[derive(Debug, Clone, Default)]
pub struct Headline {
    pub pitches: usize,
    pub mean_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub strike_rate: Option<f64>,
    /// Strike rate over first pitches only; None when the subset has none.
    pub first_pitch_strike_rate: Option<f64>,
}

/// Pitch-type frequencies in one ball-strike situation.
#[derive(Debug, Clone)]
pub struct CountSituation {
    pub balls: i64,
    pub strikes: i64,
    pub total: usize,
    /// (pitch type, pitches thrown), canonical order.
    pub per_type: Vec<(String, usize)>,
}

/// One bar of an outcome distribution.
#[derive(Debug, Clone)]
pub struct OutcomeSlice {
    pub label: String,
    pub count: usize,
    /// Share of classified rows in the group, 0..=1.
    pub share: f64,
}

/// Outcome distribution for one group (a batter side or a pitch type).
#[derive(Debug, Clone)]
pub struct OutcomeSplit {
    pub group: String,
    pub classified: usize,
    pub slices: Vec<OutcomeSlice>,
}

#[derive(Default)]
struct TypeAccumulator {
    count: usize,
    speeds: Vec<f64>,
    strikes: usize,
    swings: usize,
    whiffs: usize,
}

/// Per-pitch-type summary rows in canonical order. Row counts sum exactly to
/// `df.height()`.
pub fn summarize_by_pitch_type(df: &DataFrame, pitch_order: &[String]) -> Vec<PitchTypeSummary> {
    let total = df.height();
    if total == 0 {
        return Vec::new();
    }

    let Ok(types) = df.column(col::PITCH_TYPE) else {
        return Vec::new();
    };
    let speed = df.column(col::REL_SPEED).ok();
    let is_strike = df.column(col::IS_STRIKE).ok();
    let is_swing = df.column(col::IS_SWING).ok();
    let is_whiff = df.column(col::IS_WHIFF).ok();

    let mut buckets: HashMap<String, TypeAccumulator> = HashMap::new();
    for i in 0..total {
        let key = string_at(types, i).unwrap_or_else(|| UNTAGGED.to_string());
        let acc = buckets.entry(key).or_default();
        acc.count += 1;
        if let Some(v) = speed.and_then(|c| float_at(c, i)) {
            acc.speeds.push(v);
        }
        acc.strikes += flag(is_strike, i);
        acc.swings += flag(is_swing, i);
        acc.whiffs += flag(is_whiff, i);
    }

    let present: Vec<String> = buckets.keys().cloned().collect();
    let ordered = schema::order_pitch_types(&present, pitch_order);

    ordered
        .into_iter()
        .filter_map(|pitch_type| {
            let acc = buckets.remove(&pitch_type)?;
            let mean_speed = mean(&acc.speeds);
            let max_speed = acc.speeds.iter().cloned().fold(None, |m: Option<f64>, v| {
                Some(m.map_or(v, |m| m.max(v)))
            });
            Some(PitchTypeSummary {
                pitch_type,
                count: acc.count,
                usage: acc.count as f64 / total as f64,
                mean_speed,
                max_speed,
                strike_rate: acc.strikes as f64 / acc.count as f64,
                swing_rate: acc.swings as f64 / acc.count as f64,
                whiffs: acc.whiffs,
                whiff_per_swing: if acc.swings > 0 {
                    Some(acc.whiffs as f64 / acc.swings as f64)
                } else {
                    None
                },
            })
        })
        .collect()
}

/// Headline metrics for a subset.
pub fn headline(df: &DataFrame) -> Headline {
    let total = df.height();
    if total == 0 {
        return Headline::default();
    }

    let speed = df.column(col::REL_SPEED).ok();
    let is_strike = df.column(col::IS_STRIKE).ok();
    let is_first = df.column(col::IS_FIRST_PITCH).ok();

    let speeds: Vec<f64> = (0..total)
        .filter_map(|i| speed.and_then(|c| float_at(c, i)))
        .collect();

    let strikes: usize = (0..total).map(|i| flag(is_strike, i)).sum();

    let mut first_pitches = 0usize;
    let mut first_pitch_strikes = 0usize;
    for i in 0..total {
        if flag(is_first, i) == 1 {
            first_pitches += 1;
            first_pitch_strikes += flag(is_strike, i);
        }
    }

    Headline {
        pitches: total,
        mean_speed: mean(&speeds),
        max_speed: speeds.iter().cloned().fold(None, |m: Option<f64>, v| {
            Some(m.map_or(v, |m| m.max(v)))
        }),
        strike_rate: Some(strikes as f64 / total as f64),
        first_pitch_strike_rate: if first_pitches > 0 {
            Some(first_pitch_strikes as f64 / first_pitches as f64)
        } else {
            None
        },
    }
}

/// Pitch-type frequency per ball-strike situation, ordered by the
/// (balls, strikes) key. Rows with a missing count are left out.
pub fn count_distribution(df: &DataFrame, pitch_order: &[String]) -> Vec<CountSituation> {
    let (Ok(balls), Ok(strikes)) = (df.column(col::BALLS), df.column(col::STRIKES)) else {
        return Vec::new();
    };
    let Ok(types) = df.column(col::PITCH_TYPE) else {
        return Vec::new();
    };

    let mut situations: HashMap<(i64, i64), HashMap<String, usize>> = HashMap::new();
    for i in 0..df.height() {
        let (Some(b), Some(s)) = (float_at(balls, i), float_at(strikes, i)) else {
            continue;
        };
        let pitch_type = string_at(types, i).unwrap_or_else(|| UNTAGGED.to_string());
        *situations
            .entry((b as i64, s as i64))
            .or_default()
            .entry(pitch_type)
            .or_default() += 1;
    }

    let mut rows: Vec<CountSituation> = situations
        .into_iter()
        .map(|((balls, strikes), freq)| {
            let total = freq.values().sum();
            let present: Vec<String> = freq.keys().cloned().collect();
            let per_type = schema::order_pitch_types(&present, pitch_order)
                .into_iter()
                .filter_map(|t| {
                    let n = *freq.get(&t)?;
                    Some((t, n))
                })
                .collect();
            CountSituation {
                balls,
                strikes,
                total,
                per_type,
            }
        })
        .collect();
    rows.sort_by_key(|r| (r.balls, r.strikes));
    rows
}

/// Outcome distribution split by a grouping column (batter side or pitch
/// type). Unclassified rows are excluded from the denominator.
pub fn outcome_distribution(df: &DataFrame, group_col: &str) -> Vec<OutcomeSplit> {
    let (Ok(groups), Ok(outcomes)) = (df.column(group_col), df.column(col::OUTCOME)) else {
        return Vec::new();
    };

    let mut by_group: HashMap<String, HashMap<String, usize>> = HashMap::new();
    for i in 0..df.height() {
        let Some(outcome) = string_at(outcomes, i) else {
            continue;
        };
        let group = string_at(groups, i).unwrap_or_else(|| UNTAGGED.to_string());
        *by_group
            .entry(group)
            .or_default()
            .entry(outcome)
            .or_default() += 1;
    }

    let mut splits: Vec<OutcomeSplit> = by_group
        .into_iter()
        .map(|(group, freq)| {
            let classified: usize = freq.values().sum();
            let mut slices: Vec<OutcomeSlice> = freq
                .into_iter()
                .map(|(label, count)| OutcomeSlice {
                    label,
                    count,
                    share: count as f64 / classified.max(1) as f64,
                })
                .collect();
            slices.sort_by(|a, b| b.count.cmp(&a.count).then(a.label.cmp(&b.label)));
            OutcomeSplit {
                group,
                classified,
                slices,
            }
        })
        .collect();
    splits.sort_by(|a, b| a.group.cmp(&b.group));
    splits
}

/// (pitch type, [x, y] points) for a scatter view, canonical order, rows with
/// either coordinate missing skipped.
pub fn points_by_type(
    df: &DataFrame,
    x_col: &str,
    y_col: &str,
    pitch_order: &[String],
) -> Vec<(String, Vec<[f64; 2]>)> {
    let (Ok(xs), Ok(ys), Ok(types)) = (
        df.column(x_col),
        df.column(y_col),
        df.column(col::PITCH_TYPE),
    ) else {
        return Vec::new();
    };

    let mut by_type: HashMap<String, Vec<[f64; 2]>> = HashMap::new();
    for i in 0..df.height() {
        let (Some(x), Some(y)) = (float_at(xs, i), float_at(ys, i)) else {
            continue;
        };
        let pitch_type = string_at(types, i).unwrap_or_else(|| UNTAGGED.to_string());
        by_type.entry(pitch_type).or_default().push([x, y]);
    }

    let present: Vec<String> = by_type.keys().cloned().collect();
    schema::order_pitch_types(&present, pitch_order)
        .into_iter()
        .filter_map(|t| {
            let points = by_type.remove(&t)?;
            Some((t, points))
        })
        .collect()
}

/// Release speeds for one pitcher, missing values skipped.
pub fn speeds_for_pitcher(df: &DataFrame, pitcher: &str) -> Vec<f64> {
    let (Ok(pitchers), Ok(speed)) = (df.column(col::PITCHER), df.column(col::REL_SPEED)) else {
        return Vec::new();
    };
    (0..df.height())
        .filter(|&i| string_at(pitchers, i).as_deref() == Some(pitcher))
        .filter_map(|i| float_at(speed, i))
        .collect()
}

fn flag(column: Option<&Column>, idx: usize) -> usize {
    column
        .and_then(|c| float_at(c, idx))
        .map(|v| (v != 0.0) as usize)
        .unwrap_or(0)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::{default_outcome_rules, derive_columns};
    use crate::data::loader::RUNNERS;

    fn pitch_order() -> Vec<String> {
        schema::DEFAULT_PITCH_ORDER
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn sample() -> DataFrame {
        let df = DataFrame::new(vec![
            Column::new(
                col::PITCH_TYPE.into(),
                vec![
                    Some("Fastball"),
                    Some("Fastball"),
                    Some("Slider"),
                    Some("Slider"),
                    None,
                ],
            ),
            Column::new(
                col::PITCH_CALL.into(),
                vec![
                    Some("StrikeSwinging"),
                    Some("BallCalled"),
                    Some("FoulBall"),
                    Some("InPlay"),
                    Some("StrikeCalled"),
                ],
            ),
            Column::new(
                col::PLAY_RESULT.into(),
                vec![None, None, None, Some("HomeRun"), None],
            ),
            Column::new(
                col::HIT_TYPE.into(),
                vec![None, None, None, Some("FlyBall"), None],
            ),
            Column::new(
                col::BATTER_SIDE.into(),
                vec![
                    Some("Right"),
                    Some("Right"),
                    Some("Left"),
                    Some("Left"),
                    None,
                ],
            ),
            Column::new(
                col::REL_SPEED.into(),
                vec![Some(148.0), Some(150.0), Some(128.0), None, None],
            ),
            Column::new(
                col::BALLS.into(),
                vec![Some(0.0), Some(1.0), Some(0.0), Some(2.0), Some(0.0)],
            ),
            Column::new(
                col::STRIKES.into(),
                vec![Some(0.0), Some(1.0), Some(0.0), Some(2.0), Some(0.0)],
            ),
            Column::new(RUNNERS.into(), vec![None::<&str>, None, None, None, None]),
        ])
        .unwrap();
        derive_columns(&df, &default_outcome_rules()).unwrap()
    }

    #[test]
    fn summary_counts_sum_to_subset_total() {
        let df = sample();
        let rows = summarize_by_pitch_type(&df, &pitch_order());
        let sum: usize = rows.iter().map(|r| r.count).sum();
        assert_eq!(sum, df.height());

        // Canonical order: named types first, untagged bucket after.
        let order: Vec<&str> = rows.iter().map(|r| r.pitch_type.as_str()).collect();
        assert_eq!(order, vec!["Fastball", "Slider", UNTAGGED]);
    }

    #[test]
    fn summary_rates_and_missing_speed() {
        let df = sample();
        let rows = summarize_by_pitch_type(&df, &pitch_order());

        let fastball = &rows[0];
        assert_eq!(fastball.count, 2);
        assert_eq!(fastball.mean_speed, Some(149.0));
        assert_eq!(fastball.max_speed, Some(150.0));
        assert_eq!(fastball.strike_rate, 0.5);
        assert_eq!(fastball.whiffs, 1);
        assert_eq!(fastball.whiff_per_swing, Some(1.0));

        // Slider row 3 has a missing speed; the mean skips it.
        let slider = &rows[1];
        assert_eq!(slider.mean_speed, Some(128.0));
        assert_eq!(slider.whiff_per_swing, Some(0.0));

        // Untagged bucket drew no swings: ratio is undefined, not zero.
        let untagged = &rows[2];
        assert_eq!(untagged.whiff_per_swing, None);
    }

    #[test]
    fn headline_first_pitch_strike_rate() {
        let df = sample();
        let h = headline(&df);
        assert_eq!(h.pitches, 5);
        assert_eq!(h.strike_rate, Some(0.8));
        // Three 0-0 pitches, all strikes.
        assert_eq!(h.first_pitch_strike_rate, Some(1.0));
    }

    #[test]
    fn empty_subset_yields_blank_headline() {
        let df = sample().head(Some(0));
        let h = headline(&df);
        assert_eq!(h.pitches, 0);
        assert_eq!(h.mean_speed, None);
        assert_eq!(h.strike_rate, None);
        assert!(summarize_by_pitch_type(&df, &pitch_order()).is_empty());
    }

    #[test]
    fn count_situations() {
        let df = sample();
        let rows = count_distribution(&df, &pitch_order());
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].balls, rows[0].strikes, rows[0].total), (0, 0, 3));
        assert_eq!(rows[0].per_type[0], ("Fastball".to_string(), 1));
    }

    #[test]
    fn outcome_split_excludes_unclassified() {
        let df = sample();
        let splits = outcome_distribution(&df, col::BATTER_SIDE);
        // Only the home-run row classifies; it is a left-side batter.
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].group, "Left");
        assert_eq!(splits[0].classified, 1);
        assert_eq!(splits[0].slices[0].label, "home run");
        assert_eq!(splits[0].slices[0].share, 1.0);
    }
}
