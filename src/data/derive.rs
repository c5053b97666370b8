//! Flag & Category Derivation Module
//! Pure column derivations computed once after the per-file frames are
//! concatenated: strike/swing/whiff/first-pitch flags, runner presence, and
//! the batted-ball outcome category.

use crate::data::loader::{float_at, string_at, RUNNERS};
use crate::data::schema::col;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Pitch calls that count as a strike, compared upper-cased.
pub const STRIKE_CALLS: &[&str] = &["Y", "STRIKECALLED", "STRIKESWINGING", "FOULBALL", "INPLAY"];

/// Pitch calls where the batter offered at the pitch.
pub const SWING_CALLS: &[&str] = &["STRIKESWINGING", "FOULBALL", "INPLAY"];

/// Pitch calls that are a swing-and-miss.
pub const WHIFF_CALLS: &[&str] = &["STRIKESWINGING"];

/// Runner-column values treated as "no runner on base".
const NO_RUNNER_VALUES: &[&str] = &["", "0", "0.0", "none", "nan"];

/// Which raw text field an outcome clause inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeField {
    PlayResult,
    PitchCall,
    HitType,
}

/// One substring test: does the lower-cased field contain `needle`?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeClause {
    pub field: OutcomeField,
    pub needle: String,
}

/// One entry of the ordered outcome cascade. A rule matches when any of its
/// clauses matches; the first matching rule's label wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRule {
    pub label: String,
    pub any_of: Vec<OutcomeClause>,
}

impl OutcomeRule {
    fn new(label: &str, any_of: &[(OutcomeField, &str)]) -> Self {
        Self {
            label: label.to_string(),
            any_of: any_of
                .iter()
                .map(|(field, needle)| OutcomeClause {
                    field: *field,
                    needle: needle.to_string(),
                })
                .collect(),
        }
    }
}

/// Built-in outcome rule table. The priority order is load-bearing: terminal
/// results (home run, strikeout, walk) are tested before batted-ball shape so
/// a "HomeRun" row never falls through to the fly-ball bucket.
pub fn default_outcome_rules() -> Vec<OutcomeRule> {
    use OutcomeField::*;
    vec![
        OutcomeRule::new("home run", &[(PlayResult, "homerun"), (PlayResult, "home run")]),
        OutcomeRule::new(
            "strikeout",
            &[(PlayResult, "strikeout"), (PitchCall, "strikeout")],
        ),
        OutcomeRule::new("walk", &[(PlayResult, "walk"), (PitchCall, "ballintentional")]),
        OutcomeRule::new("hit by pitch", &[(PitchCall, "hitbypitch")]),
        OutcomeRule::new("line drive", &[(HitType, "line"), (PlayResult, "linedrive")]),
        OutcomeRule::new(
            "ground ball",
            &[(HitType, "ground"), (PlayResult, "groundout")],
        ),
        OutcomeRule::new("fly ball", &[(HitType, "fly"), (PlayResult, "flyout")]),
        OutcomeRule::new("popup", &[(HitType, "popup"), (PlayResult, "popout")]),
    ]
}

/// Classify one row's outcome. `None` is a valid terminal state: the row is
/// excluded from outcome-distribution views.
pub fn classify_outcome(
    play_result: Option<&str>,
    pitch_call: Option<&str>,
    hit_type: Option<&str>,
    rules: &[OutcomeRule],
) -> Option<String> {
    let play_result = play_result.map(|s| s.to_lowercase()).unwrap_or_default();
    let pitch_call = pitch_call.map(|s| s.to_lowercase()).unwrap_or_default();
    let hit_type = hit_type.map(|s| s.to_lowercase()).unwrap_or_default();

    for rule in rules {
        let hit = rule.any_of.iter().any(|clause| {
            let haystack = match clause.field {
                OutcomeField::PlayResult => &play_result,
                OutcomeField::PitchCall => &pitch_call,
                OutcomeField::HitType => &hit_type,
            };
            !haystack.is_empty() && haystack.contains(&clause.needle)
        });
        if hit {
            return Some(rule.label.clone());
        }
    }
    None
}

/// Strike/swing/whiff membership for one upper-cased pitch call.
pub fn call_flags(pitch_call: Option<&str>) -> (i32, i32, i32) {
    let upper = pitch_call.map(|s| s.trim().to_uppercase()).unwrap_or_default();
    let is_strike = STRIKE_CALLS.contains(&upper.as_str()) as i32;
    let is_swing = SWING_CALLS.contains(&upper.as_str()) as i32;
    let is_whiff = WHIFF_CALLS.contains(&upper.as_str()) as i32;
    (is_strike, is_swing, is_whiff)
}

/// Runner presence for one raw runner-column value.
pub fn runner_flag(raw: Option<&str>) -> i32 {
    match raw {
        None => 0,
        Some(s) => {
            let lower = s.trim().to_lowercase();
            if NO_RUNNER_VALUES.contains(&lower.as_str()) {
                0
            } else {
                1
            }
        }
    }
}

/// Append the derived columns to the unified table. Each derivation is a pure
/// function of existing fields and independent of row order.
pub fn derive_columns(df: &DataFrame, rules: &[OutcomeRule]) -> Result<DataFrame, DeriveError> {
    let height = df.height();

    let pitch_call = df.column(col::PITCH_CALL)?;
    let play_result = df.column(col::PLAY_RESULT)?;
    let hit_type = df.column(col::HIT_TYPE)?;
    let balls = df.column(col::BALLS)?;
    let strikes = df.column(col::STRIKES)?;
    let runners = df.column(RUNNERS)?;

    let mut is_strike = Vec::with_capacity(height);
    let mut is_swing = Vec::with_capacity(height);
    let mut is_whiff = Vec::with_capacity(height);
    let mut is_first_pitch = Vec::with_capacity(height);
    let mut has_runner = Vec::with_capacity(height);
    let mut outcome: Vec<Option<String>> = Vec::with_capacity(height);

    for i in 0..height {
        let call = string_at(pitch_call, i);
        let (strike, swing, whiff) = call_flags(call.as_deref());
        is_strike.push(strike);
        is_swing.push(swing);
        is_whiff.push(whiff);

        let first = matches!(
            (float_at(balls, i), float_at(strikes, i)),
            (Some(b), Some(s)) if b == 0.0 && s == 0.0
        );
        is_first_pitch.push(first as i32);

        has_runner.push(runner_flag(string_at(runners, i).as_deref()));

        outcome.push(classify_outcome(
            string_at(play_result, i).as_deref(),
            call.as_deref(),
            string_at(hit_type, i).as_deref(),
            rules,
        ));
    }

    let mut out = df.clone();
    out.with_column(Column::new(col::IS_STRIKE.into(), is_strike))?;
    out.with_column(Column::new(col::IS_SWING.into(), is_swing))?;
    out.with_column(Column::new(col::IS_WHIFF.into(), is_whiff))?;
    out.with_column(Column::new(col::IS_FIRST_PITCH.into(), is_first_pitch))?;
    out.with_column(Column::new(col::HAS_RUNNER.into(), has_runner))?;
    out.with_column(Column::new(col::OUTCOME.into(), outcome))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strike_allow_list() {
        for call in ["StrikeSwinging", "FoulBall", "InPlay", "StrikeCalled", "y"] {
            assert_eq!(call_flags(Some(call)).0, 1, "call {call}");
        }
        for call in ["BallCalled", "HitByPitch", "", "N"] {
            assert_eq!(call_flags(Some(call)).0, 0, "call {call}");
        }
        assert_eq!(call_flags(None).0, 0);
    }

    #[test]
    fn whiff_implies_swing_implies_strike() {
        for call in [
            "Y",
            "STRIKECALLED",
            "STRIKESWINGING",
            "FOULBALL",
            "INPLAY",
            "BALLCALLED",
            "HITBYPITCH",
        ] {
            let (strike, swing, whiff) = call_flags(Some(call));
            assert!(whiff <= swing, "whiff => swing broken for {call}");
            assert!(swing <= strike, "swing => strike broken for {call}");
        }
        // Strike-without-swing cases
        assert_eq!(call_flags(Some("StrikeCalled")), (1, 0, 0));
        assert_eq!(call_flags(Some("Y")), (1, 0, 0));
        // Swing-without-whiff cases
        assert_eq!(call_flags(Some("FoulBall")), (1, 1, 0));
        assert_eq!(call_flags(Some("InPlay")), (1, 1, 0));
        // The one whiff
        assert_eq!(call_flags(Some("StrikeSwinging")), (1, 1, 1));
    }

    #[test]
    fn home_run_outranks_batted_ball_shape() {
        let rules = default_outcome_rules();
        let outcome = classify_outcome(Some("HomeRun"), None, Some("GroundBall"), &rules);
        assert_eq!(outcome.as_deref(), Some("home run"));
    }

    #[test]
    fn unmatched_outcome_is_none() {
        let rules = default_outcome_rules();
        assert_eq!(classify_outcome(Some("Single"), None, None, &rules), None);
        assert_eq!(classify_outcome(None, None, None, &rules), None);
    }

    #[test]
    fn runner_falsy_values() {
        for raw in [None, Some(""), Some("0"), Some("0.0"), Some("none"), Some("NaN")] {
            assert_eq!(runner_flag(raw), 0, "raw {raw:?}");
        }
        assert_eq!(runner_flag(Some("1B")), 1);
        assert_eq!(runner_flag(Some("1")), 1);
    }

    #[test]
    fn derive_columns_end_to_end() {
        let df = DataFrame::new(vec![
            Column::new(
                col::PITCH_CALL.into(),
                vec![Some("StrikeSwinging"), Some("BallCalled"), None],
            ),
            Column::new(col::PLAY_RESULT.into(), vec![None, Some("HomeRun"), None]),
            Column::new(col::HIT_TYPE.into(), vec![None, Some("FlyBall"), None]),
            Column::new(col::BALLS.into(), vec![Some(0.0), Some(1.0), None]),
            Column::new(col::STRIKES.into(), vec![Some(0.0), Some(0.0), None]),
            Column::new(RUNNERS.into(), vec![None, Some("1B"), None]),
        ])
        .unwrap();

        let out = derive_columns(&df, &default_outcome_rules()).unwrap();

        // Row 0: {PitchCall: StrikeSwinging, Balls: 0, Strikes: 0}
        assert_eq!(float_at(out.column(col::IS_STRIKE).unwrap(), 0), Some(1.0));
        assert_eq!(float_at(out.column(col::IS_SWING).unwrap(), 0), Some(1.0));
        assert_eq!(float_at(out.column(col::IS_WHIFF).unwrap(), 0), Some(1.0));
        assert_eq!(
            float_at(out.column(col::IS_FIRST_PITCH).unwrap(), 0),
            Some(1.0)
        );

        // Row 1: home run with a runner on, not a first pitch
        assert_eq!(float_at(out.column(col::IS_STRIKE).unwrap(), 1), Some(0.0));
        assert_eq!(float_at(out.column(col::HAS_RUNNER).unwrap(), 1), Some(1.0));
        assert_eq!(
            string_at(out.column(col::OUTCOME).unwrap(), 1).as_deref(),
            Some("home run")
        );

        // Row 2: nothing known, everything zero/null
        assert_eq!(float_at(out.column(col::IS_STRIKE).unwrap(), 2), Some(0.0));
        assert_eq!(string_at(out.column(col::OUTCOME).unwrap(), 2), None);
    }
}
