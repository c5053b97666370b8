//! Stats module - aggregation and comparison

pub mod compare;
pub mod summary;

pub use compare::{compare_velocities, VeloComparison};
pub use summary::{
    count_distribution, headline, outcome_distribution, points_by_type, speeds_for_pitcher,
    summarize_by_pitch_type, CountSituation, Headline, OutcomeSplit, PitchTypeSummary,
};
