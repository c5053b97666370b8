//! Canonical Schema Module
//! Column names, header rename table, and category/pitch-type conventions
//! shared by the loader and every downstream view.

/// Canonical column names of the unified table.
pub mod col {
    pub const PITCHER: &str = "Pitcher";
    pub const DATE: &str = "Date";
    pub const PITCH_TYPE: &str = "TaggedPitchType";
    pub const PITCH_CALL: &str = "PitchCall";
    pub const PLAY_RESULT: &str = "PlayResult";
    pub const HIT_TYPE: &str = "HitType";
    pub const BATTER_SIDE: &str = "BatterSide";
    pub const REL_SPEED: &str = "RelSpeed";
    pub const VERT_BREAK: &str = "InducedVertBreak";
    pub const HORZ_BREAK: &str = "HorzBreak";
    pub const PLATE_SIDE: &str = "PlateLocSide";
    pub const PLATE_HEIGHT: &str = "PlateLocHeight";
    pub const BALLS: &str = "Balls";
    pub const STRIKES: &str = "Strikes";
    pub const CATEGORY: &str = "DataCategory";

    // Derived columns
    pub const IS_STRIKE: &str = "is_strike";
    pub const IS_SWING: &str = "is_swing";
    pub const IS_WHIFF: &str = "is_whiff";
    pub const IS_FIRST_PITCH: &str = "is_first_pitch";
    pub const HAS_RUNNER: &str = "has_runner";
    pub const OUTCOME: &str = "Outcome";
}

/// Header variants seen across export generations, mapped to canonical names.
/// Unknown headers pass through untouched.
pub const RENAME_TABLE: &[(&str, &str)] = &[
    ("Pitch Type", col::PITCH_TYPE),
    ("Is Strike", col::PITCH_CALL),
    ("RelSpeed (KMH)", col::REL_SPEED),
    ("InducedVertBreak (CM)", col::VERT_BREAK),
    ("HorzBreak (CM)", col::HORZ_BREAK),
    ("PlateLocSide (CM)", col::PLATE_SIDE),
    ("PlateLocHeight (CM)", col::PLATE_HEIGHT),
    ("Batter Side", col::BATTER_SIDE),
    ("Play Result", col::PLAY_RESULT),
    ("Hit Type", col::HIT_TYPE),
];

/// Measurement columns coerced to Float64-or-null after concatenation.
pub const NUMERIC_COLUMNS: &[&str] = &[
    col::REL_SPEED,
    col::VERT_BREAK,
    col::HORZ_BREAK,
    col::PLATE_SIDE,
    col::PLATE_HEIGHT,
    col::BALLS,
    col::STRIKES,
];

/// String columns every file is guaranteed to carry after normalization,
/// synthesized with a default when the export lacks them.
pub const TEXT_COLUMNS: &[&str] = &[
    col::PITCHER,
    col::DATE,
    col::PITCH_TYPE,
    col::PITCH_CALL,
    col::PLAY_RESULT,
    col::HIT_TYPE,
    col::BATTER_SIDE,
];

/// Placeholder pitcher name for rows with no usable pitcher column.
pub const UNKNOWN_PITCHER: &str = "Unknown";

/// Source category of a file, inferred from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataCategory {
    /// Scheduled bullpen sessions ("sbp" files).
    Sbp,
    /// Open scrimmage games ("vs" files).
    Scrimmage,
    /// Pitch-by-pitch game charts ("pbp" files).
    Pbp,
    /// Dedicated pitching sessions.
    Pitching,
    /// Anything else.
    Other,
}

impl DataCategory {
    /// Infer category from a filename. Substring match on the lower-cased
    /// name, in priority order; first hit wins.
    pub fn from_filename(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("sbp") {
            DataCategory::Sbp
        } else if lower.contains("vs") {
            DataCategory::Scrimmage
        } else if lower.contains("pbp") {
            DataCategory::Pbp
        } else if lower.contains("pitching") {
            DataCategory::Pitching
        } else {
            DataCategory::Other
        }
    }

    /// Stable tag stored in the `DataCategory` column.
    pub fn tag(&self) -> &'static str {
        match self {
            DataCategory::Sbp => "SBP",
            DataCategory::Scrimmage => "vs",
            DataCategory::Pbp => "PBP",
            DataCategory::Pitching => "pitching",
            DataCategory::Other => "other",
        }
    }

    /// Tab label shown in the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            DataCategory::Sbp => "SBP",
            DataCategory::Scrimmage => "Scrimmage",
            DataCategory::Pbp => "Game / PBP",
            DataCategory::Pitching => "Pitching",
            DataCategory::Other => "Other",
        }
    }

    /// All categories, in tab order.
    pub const ALL: [DataCategory; 5] = [
        DataCategory::Sbp,
        DataCategory::Scrimmage,
        DataCategory::Pbp,
        DataCategory::Pitching,
        DataCategory::Other,
    ];
}

/// Hand-specified priority order for pitch types in summary tables.
pub const DEFAULT_PITCH_ORDER: &[&str] = &[
    "Fastball",
    "FB",
    "Slider",
    "SL",
    "Cutter",
    "CT",
    "Curveball",
    "CB",
    "Splitter",
    "SPL",
    "ChangeUp",
    "CH",
    "TwoSeamFastBall",
    "OneSeam",
];

/// Order pitch types canonically: named types first in priority-list order,
/// unrecognized types appended afterward, alphabetically.
pub fn order_pitch_types(types: &[String], priority: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = priority
        .iter()
        .filter(|p| types.iter().any(|t| t == *p))
        .cloned()
        .collect();

    let mut rest: Vec<String> = types
        .iter()
        .filter(|t| !priority.contains(t))
        .cloned()
        .collect();
    rest.sort();
    ordered.extend(rest);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_filename_priority() {
        assert_eq!(DataCategory::from_filename("2024_SBP_week3.csv"), DataCategory::Sbp);
        assert_eq!(DataCategory::from_filename("vs_hawks.csv"), DataCategory::Scrimmage);
        assert_eq!(DataCategory::from_filename("PBP_game1.csv"), DataCategory::Pbp);
        assert_eq!(DataCategory::from_filename("fall_pitching.csv"), DataCategory::Pitching);
        assert_eq!(DataCategory::from_filename("notes.csv"), DataCategory::Other);
        // "sbp" outranks "vs" when both appear
        assert_eq!(DataCategory::from_filename("sbp_vs_team.csv"), DataCategory::Sbp);
    }

    #[test]
    fn pitch_order_priority_then_alpha() {
        let priority: Vec<String> = DEFAULT_PITCH_ORDER.iter().map(|s| s.to_string()).collect();
        let types = vec![
            "Knuckleball".to_string(),
            "Slider".to_string(),
            "Fastball".to_string(),
            "Eephus".to_string(),
        ];
        let ordered = order_pitch_types(&types, &priority);
        assert_eq!(ordered, vec!["Fastball", "Slider", "Eephus", "Knuckleball"]);
    }
}
