// Integration tests for the loading and aggregation pipeline.
//
// These exercise the library end-to-end against the fixture folder: CSV
// ingestion across header generations and encodings, flag/outcome derivation,
// category and selector filtering, and the per-pitch-type aggregates the
// dashboard renders.

use std::path::Path;

use pitchscope::config::DashboardConfig;
use pitchscope::data::schema::col;
use pitchscope::data::{self, DataLoader, LoadOutcome};
use pitchscope::stats;
use polars::prelude::DataFrame;

/// Fixture folder: three CSV exports of different generations.
/// - sbp_session.csv: current headers, UTF-8
/// - pbp_game.csv: legacy headers ("Pitch Type", "Is Strike", unit suffixes)
/// - vs_scrim_legacy.csv: Shift_JIS encoded
const FIXTURES: &str = "tests/fixtures";

/// Load the fixture folder and derive flags, as the app does after browse.
fn load_fixtures() -> DataFrame {
    let mut loader = DataLoader::new();
    let outcome = loader.load_dir(Path::new(FIXTURES)).expect("load fixtures");
    let LoadOutcome::Loaded { df, file_count, .. } = outcome else {
        panic!("fixture folder should contain data");
    };
    assert_eq!(file_count, 3);
    data::derive_columns(&df, &data::default_outcome_rules()).expect("derive")
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    let column = df.column(name).unwrap();
    (0..df.height())
        .map(|i| pitchscope::data::loader::string_at(column, i))
        .collect()
}

#[test]
fn mixed_folder_loads_into_one_table() {
    let table = load_fixtures();
    // 5 SBP + 4 PBP + 2 scrimmage rows
    assert_eq!(table.height(), 11);

    // Every canonical column survives concatenation.
    for name in [
        col::PITCHER,
        col::DATE,
        col::PITCH_TYPE,
        col::PITCH_CALL,
        col::REL_SPEED,
        col::CATEGORY,
        col::IS_STRIKE,
        col::IS_FIRST_PITCH,
        col::HAS_RUNNER,
        col::OUTCOME,
    ] {
        assert!(table.column(name).is_ok(), "missing column {name}");
    }
}

#[test]
fn categories_come_from_filenames() {
    let table = load_fixtures();
    assert_eq!(data::filter::by_category(&table, "SBP").unwrap().height(), 5);
    assert_eq!(data::filter::by_category(&table, "PBP").unwrap().height(), 4);
    assert_eq!(data::filter::by_category(&table, "vs").unwrap().height(), 2);
    assert_eq!(
        data::filter::by_category(&table, "pitching").unwrap().height(),
        0
    );
}

#[test]
fn shift_jis_file_contributes_readable_rows() {
    let table = load_fixtures();
    let scrim = data::filter::by_category(&table, "vs").unwrap();

    let pitchers = data::filter::pitcher_choices(&scrim);
    assert_eq!(pitchers, vec!["佐藤", "田中"]);

    // Timestamped date collapses to the ISO day.
    for date in strings(&scrim, col::DATE) {
        assert_eq!(date.as_deref(), Some("2024-06-02"));
    }
}

#[test]
fn legacy_headers_unify_with_current_ones() {
    let table = load_fixtures();
    let pbp = data::filter::by_category(&table, "PBP").unwrap();

    // "Pitch Created At" timestamps → Date
    for date in strings(&pbp, col::DATE) {
        assert_eq!(date.as_deref(), Some("2024-05-12"));
    }

    // "RelSpeed (KMH)" → RelSpeed
    let speeds: Vec<f64> = stats::speeds_for_pitcher(&pbp, "Tanaka");
    assert_eq!(speeds, vec![149.0, 131.2]);

    // "Is Strike" Y/N → strike flag
    let strikes = pbp.column(col::IS_STRIKE).unwrap();
    let total: i32 = (0..pbp.height())
        .filter_map(|i| pitchscope::data::loader::float_at(strikes, i))
        .map(|v| v as i32)
        .sum();
    assert_eq!(total, 3); // Y, InPlay, Y
}

#[test]
fn outcome_cascade_over_fixture_rows() {
    let table = load_fixtures();
    let outcomes = strings(&table, col::OUTCOME);

    let labeled: Vec<&str> = outcomes.iter().flatten().map(|s| s.as_str()).collect();
    // One home run in the PBP file, one grounder in the SBP file (files
    // concatenate in sorted name order). The home run never falls through
    // to "fly ball" despite its FlyBall hit type.
    assert_eq!(labeled, vec!["home run", "ground ball"]);
}

#[test]
fn selectors_compose_conjunctively_across_files() {
    let table = load_fixtures();

    let tanaka = data::PitchFilter {
        pitcher: Some("Tanaka".into()),
        ..Default::default()
    };
    assert_eq!(tanaka.apply(&table).unwrap().height(), 5);

    let tanaka_opening = data::PitchFilter {
        pitcher: Some("Tanaka".into()),
        date: Some("2024-04-01".into()),
        ..Default::default()
    };
    assert_eq!(tanaka_opening.apply(&table).unwrap().height(), 3);

    let runners_on = data::PitchFilter {
        runner_on: Some(true),
        ..Default::default()
    };
    // 1B/1B in the SBP file, 1/1 in the PBP file
    assert_eq!(runners_on.apply(&table).unwrap().height(), 4);

    let first_pitch_lefties = data::PitchFilter {
        batter_side: Some("Left".into()),
        count: Some((0, 0)),
        ..Default::default()
    };
    assert_eq!(first_pitch_lefties.apply(&table).unwrap().height(), 2);
}

#[test]
fn summary_counts_cover_the_whole_subset() {
    let table = load_fixtures();
    let sbp = data::filter::by_category(&table, "SBP").unwrap();

    let config = DashboardConfig::default();
    let summary = stats::summarize_by_pitch_type(&sbp, &config.pitch_order);

    let total: usize = summary.iter().map(|r| r.count).sum();
    assert_eq!(total, sbp.height());

    let usage_sum: f64 = summary.iter().map(|r| r.usage).sum();
    assert!((usage_sum - 1.0).abs() < 1e-9);

    // Priority ordering puts Fastball first.
    assert_eq!(summary[0].pitch_type, "Fastball");
    assert_eq!(summary[0].count, 3);
}

#[test]
fn headline_rates_from_fixture_rows() {
    let table = load_fixtures();
    let sbp = data::filter::by_category(&table, "SBP").unwrap();

    let headline = stats::headline(&sbp);
    assert_eq!(headline.pitches, 5);
    // StrikeCalled, StrikeSwinging, FoulBall, InPlay out of 5
    assert_eq!(headline.strike_rate, Some(0.8));
    // Both 0-0 pitches (StrikeCalled, FoulBall) were strikes.
    assert_eq!(headline.first_pitch_strike_rate, Some(1.0));
    assert_eq!(headline.max_speed, Some(148.2));
}

#[test]
fn velocity_comparison_over_all_files() {
    let table = load_fixtures();

    let tanaka = stats::speeds_for_pitcher(&table, "Tanaka");
    let sato = stats::speeds_for_pitcher(&table, "Sato");
    assert_eq!(tanaka.len(), 5);
    assert_eq!(sato.len(), 4);

    let cmp = stats::compare_velocities("Tanaka", &tanaka, "Sato", &sato);
    assert_eq!(cmp.left.count, 5);
    assert_eq!(cmp.right.count, 4);
    let p = cmp.p_value.expect("both samples are big enough");
    assert!(p > 0.0 && p <= 1.0);
}

#[test]
fn fixture_folder_without_config_uses_defaults() {
    let config = DashboardConfig::load_from_dir(Path::new(FIXTURES)).unwrap();
    let defaults = DashboardConfig::default();
    assert_eq!(config.pitch_order, defaults.pitch_order);
    assert_eq!(config.palette.len(), defaults.palette.len());
}
