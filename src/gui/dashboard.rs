//! Dashboard Widget
//! Central tabbed area: per-category stats and visual views, plus the
//! pitcher comparison tab. Every view renders from a precomputed
//! `TabViewModel`; empty subsets show a "no data" notice instead of tables.

use crate::charts::{ChartPalette, ChartPlotter};
use crate::config::DashboardConfig;
use crate::data::filter::{count_choices, date_choices, pitcher_choices};
use crate::data::schema::{col, DataCategory};
use crate::data::PitchFilter;
use crate::stats::{
    self, CountSituation, Headline, OutcomeSplit, PitchTypeSummary, VeloComparison,
};
use egui::{Color32, ComboBox, RichText};
use polars::prelude::DataFrame;

const CHART_HEIGHT: f32 = 320.0;
const NO_DATA: &str = "No data for this selection.";

/// Selector values offered by one tab, derived from the category subset
/// before per-tab filters apply.
#[derive(Debug, Clone, Default)]
pub struct FilterChoices {
    pub pitchers: Vec<String>,
    pub dates: Vec<String>,
    pub counts: Vec<(i64, i64)>,
}

/// Everything one category tab renders.
#[derive(Clone)]
pub struct TabViewModel {
    pub category: DataCategory,
    pub choices: FilterChoices,
    pub rows: usize,
    pub headline: Headline,
    pub summary: Vec<PitchTypeSummary>,
    pub counts: Vec<CountSituation>,
    pub outcomes_by_side: Vec<OutcomeSplit>,
    pub outcomes_by_type: Vec<OutcomeSplit>,
    pub movement: Vec<(String, Vec<[f64; 2]>)>,
    pub location: Vec<(String, Vec<[f64; 2]>)>,
}

impl TabViewModel {
    /// Build the view for one category: selector choices come from the
    /// unfiltered category subset, aggregates from the filtered one.
    pub fn build(
        category: DataCategory,
        category_subset: &DataFrame,
        filter: &PitchFilter,
        config: &DashboardConfig,
    ) -> Self {
        let choices = FilterChoices {
            pitchers: pitcher_choices(category_subset),
            dates: date_choices(category_subset),
            counts: count_choices(category_subset),
        };

        let filtered = filter
            .apply(category_subset)
            .unwrap_or_else(|_| category_subset.clear());

        Self {
            category,
            choices,
            rows: filtered.height(),
            headline: stats::headline(&filtered),
            summary: stats::summarize_by_pitch_type(&filtered, &config.pitch_order),
            counts: stats::count_distribution(&filtered, &config.pitch_order),
            outcomes_by_side: stats::outcome_distribution(&filtered, col::BATTER_SIDE),
            outcomes_by_type: stats::outcome_distribution(&filtered, col::PITCH_TYPE),
            movement: stats::points_by_type(
                &filtered,
                col::HORZ_BREAK,
                col::VERT_BREAK,
                &config.pitch_order,
            ),
            location: stats::points_by_type(
                &filtered,
                col::PLATE_SIDE,
                col::PLATE_HEIGHT,
                &config.pitch_order,
            ),
        }
    }
}

/// Comparison-tab state and result.
#[derive(Clone, Default)]
pub struct CompareView {
    pub pitchers: Vec<String>,
    pub result: Option<VeloComparison>,
}

/// Central tabbed dashboard. Owns the per-tab filter state and the compare
/// selections; aggregation happens upstream in the app.
pub struct Dashboard {
    pub active_tab: usize,
    pub filters: [PitchFilter; DataCategory::ALL.len()],
    pub compare_left: String,
    pub compare_right: String,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            active_tab: 0,
            filters: Default::default(),
            compare_left: String::new(),
            compare_right: String::new(),
        }
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_category(&self) -> Option<DataCategory> {
        DataCategory::ALL.get(self.active_tab).copied()
    }

    /// Draw the dashboard. Returns true when a selector changed and the view
    /// models need a recompute pass.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        views: &[TabViewModel],
        compare: &CompareView,
        config: &DashboardConfig,
        palette: &ChartPalette,
    ) -> bool {
        let mut changed = false;

        ui.horizontal(|ui| {
            for (idx, category) in DataCategory::ALL.iter().enumerate() {
                if ui
                    .selectable_label(self.active_tab == idx, category.label())
                    .clicked()
                {
                    self.active_tab = idx;
                    changed = true;
                }
            }
            if ui
                .selectable_label(self.active_tab == DataCategory::ALL.len(), "Compare")
                .clicked()
            {
                self.active_tab = DataCategory::ALL.len();
                changed = true;
            }
        });
        ui.separator();

        if self.active_tab == DataCategory::ALL.len() {
            changed |= self.show_compare_tab(ui, compare);
            return changed;
        }

        let Some(view) = views.get(self.active_tab) else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No data loaded").size(20.0));
            });
            return changed;
        };

        changed |= self.show_filter_bar(ui, view);
        ui.add_space(8.0);

        if view.rows == 0 {
            ui.label(RichText::new(NO_DATA).color(Color32::from_rgb(255, 193, 7)));
            return changed;
        }

        match view.category {
            DataCategory::Pbp | DataCategory::Pitching => {
                self.show_visual_view(ui, view, config, palette)
            }
            _ => self.show_stats_view(ui, view, palette),
        }

        changed
    }

    /// Pitcher/date/side/runner/count selectors for the active tab.
    fn show_filter_bar(&mut self, ui: &mut egui::Ui, view: &TabViewModel) -> bool {
        let filter = &mut self.filters[self.active_tab];
        let mut changed = false;

        ui.horizontal_wrapped(|ui| {
            changed |= option_combo(
                ui,
                "filter_pitcher",
                "Pitcher",
                &mut filter.pitcher,
                &view.choices.pitchers,
            );
            changed |= option_combo(
                ui,
                "filter_date",
                "Date",
                &mut filter.date,
                &view.choices.dates,
            );
            changed |= option_combo(
                ui,
                "filter_side",
                "Batter",
                &mut filter.batter_side,
                &["Right".to_string(), "Left".to_string()],
            );

            ui.label("Runners:");
            for (label, value) in [("All", None), ("Empty", Some(false)), ("On base", Some(true))] {
                if ui
                    .selectable_label(filter.runner_on == value, label)
                    .clicked()
                {
                    filter.runner_on = value;
                    changed = true;
                }
            }

            let count_text = filter
                .count
                .map(|(b, s)| format!("{b}-{s}"))
                .unwrap_or_else(|| "All".to_string());
            ComboBox::from_id_salt("filter_count")
                .selected_text(format!("Count: {count_text}"))
                .show_ui(ui, |ui| {
                    if ui.selectable_label(filter.count.is_none(), "All").clicked() {
                        filter.count = None;
                        changed = true;
                    }
                    for &(b, s) in &view.choices.counts {
                        if ui
                            .selectable_label(filter.count == Some((b, s)), format!("{b}-{s}"))
                            .clicked()
                        {
                            filter.count = Some((b, s));
                            changed = true;
                        }
                    }
                });
        });

        changed
    }

    /// Headline metrics + summary table + count-situation table.
    fn show_stats_view(&self, ui: &mut egui::Ui, view: &TabViewModel, palette: &ChartPalette) {
        show_headline(ui, &view.headline);
        ui.add_space(10.0);

        ui.label(RichText::new("Summary by pitch type").size(15.0).strong());
        ui.add_space(4.0);
        show_summary_table(ui, &view.summary, palette);

        ui.add_space(12.0);
        ui.label(RichText::new("Pitch mix by count").size(15.0).strong());
        ui.add_space(4.0);
        show_count_table(ui, &view.counts);

        ui.add_space(12.0);
        ui.label(RichText::new("Usage").size(15.0).strong());
        ChartPlotter::draw_usage_bars(ui, &view.summary, palette, 220.0);
    }

    /// Headline metrics + movement/location scatters + outcome bars.
    fn show_visual_view(
        &self,
        ui: &mut egui::Ui,
        view: &TabViewModel,
        config: &DashboardConfig,
        palette: &ChartPalette,
    ) {
        show_headline(ui, &view.headline);
        ui.add_space(10.0);

        let chart_width = (ui.available_width() - 30.0) / 2.0;
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.set_width(chart_width);
                ui.label(RichText::new("Movement").size(15.0).strong());
                ChartPlotter::draw_movement_chart(ui, &view.movement, palette, CHART_HEIGHT);
            });
            ui.add_space(10.0);
            ui.vertical(|ui| {
                ui.set_width(chart_width);
                ui.label(RichText::new("Plate location").size(15.0).strong());
                ChartPlotter::draw_location_chart(
                    ui,
                    &view.location,
                    &config.strike_zone,
                    palette,
                    CHART_HEIGHT,
                );
            });
        });

        ui.add_space(12.0);
        if view.outcomes_by_side.is_empty() {
            ui.label(RichText::new("No classified outcomes in this selection.").weak());
        } else {
            ui.label(
                RichText::new("Outcomes by batter side")
                    .size(15.0)
                    .strong(),
            );
            ChartPlotter::draw_outcome_bars(
                ui,
                "outcomes_by_side",
                &view.outcomes_by_side,
                palette,
                220.0,
            );

            ui.add_space(12.0);
            ui.label(
                RichText::new("Outcomes by pitch type")
                    .size(15.0)
                    .strong(),
            );
            ChartPlotter::draw_outcome_bars(
                ui,
                "outcomes_by_type",
                &view.outcomes_by_type,
                palette,
                220.0,
            );
        }
    }

    fn show_compare_tab(&mut self, ui: &mut egui::Ui, compare: &CompareView) -> bool {
        let mut changed = false;

        ui.horizontal(|ui| {
            for (salt, label, selection) in [
                ("compare_left", "Pitcher A", &mut self.compare_left),
                ("compare_right", "Pitcher B", &mut self.compare_right),
            ] {
                ui.label(label);
                ComboBox::from_id_salt(salt)
                    .selected_text(if selection.is_empty() {
                        "select".to_string()
                    } else {
                        selection.clone()
                    })
                    .show_ui(ui, |ui| {
                        for name in &compare.pitchers {
                            if ui.selectable_label(selection == name, name).clicked() {
                                *selection = name.clone();
                                changed = true;
                            }
                        }
                    });
                ui.add_space(12.0);
            }
        });
        ui.add_space(10.0);

        let Some(result) = &compare.result else {
            ui.label(RichText::new("Pick two pitchers to compare release speed.").weak());
            return changed;
        };

        egui::Grid::new("compare_table")
            .striped(true)
            .min_col_width(80.0)
            .show(ui, |ui| {
                ui.label(RichText::new("Pitcher").strong());
                ui.label(RichText::new("Pitches").strong());
                ui.label(RichText::new("Mean velo").strong());
                ui.label(RichText::new("Std").strong());
                ui.label(RichText::new("Max velo").strong());
                ui.end_row();

                for side in [&result.left, &result.right] {
                    ui.label(&side.label);
                    ui.label(side.count.to_string());
                    ui.label(fmt_opt(side.mean, 1));
                    ui.label(fmt_opt(side.std, 2));
                    ui.label(fmt_opt(side.max, 1));
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        match result.p_value {
            Some(p) => {
                let color = if result.is_significant {
                    Color32::from_rgb(220, 53, 69)
                } else {
                    ui.visuals().text_color()
                };
                ui.label(
                    RichText::new(format!(
                        "Welch t-test p = {:.4}{}",
                        p,
                        if result.is_significant {
                            "  (significant)"
                        } else {
                            ""
                        }
                    ))
                    .color(color),
                );
            }
            None => {
                ui.label(RichText::new("Not enough pitches for a t-test.").weak());
            }
        }

        changed
    }
}

fn show_headline(ui: &mut egui::Ui, headline: &Headline) {
    ui.horizontal(|ui| {
        metric(ui, "Pitches", format!("{}", headline.pitches));
        metric(ui, "Avg velo", fmt_opt(headline.mean_speed, 1));
        metric(ui, "Max velo", fmt_opt(headline.max_speed, 1));
        metric(ui, "Strike %", fmt_pct(headline.strike_rate));
        metric(ui, "1st-pitch strike %", fmt_pct(headline.first_pitch_strike_rate));
    });
}

fn metric(ui: &mut egui::Ui, label: &str, value: String) {
    egui::Frame::none()
        .fill(ui.visuals().widgets.noninteractive.bg_fill)
        .rounding(5.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                ui.label(RichText::new(label).size(11.0).weak());
                ui.label(RichText::new(value).size(17.0).strong());
            });
        });
    ui.add_space(6.0);
}

fn show_summary_table(ui: &mut egui::Ui, rows: &[PitchTypeSummary], palette: &ChartPalette) {
    egui::Grid::new("summary_table")
        .striped(true)
        .min_col_width(60.0)
        .spacing([10.0, 4.0])
        .show(ui, |ui| {
            for header in [
                "Pitch", "N", "Usage %", "Avg velo", "Max velo", "Strike %", "Swing %", "Whiffs",
                "Whiff/Swing",
            ] {
                ui.label(RichText::new(header).strong().size(12.0));
            }
            ui.end_row();

            for (idx, row) in rows.iter().enumerate() {
                ui.label(RichText::new(&row.pitch_type).color(palette.color(idx)));
                ui.label(row.count.to_string());
                ui.label(format!("{:.1}", row.usage * 100.0));
                ui.label(fmt_opt(row.mean_speed, 1));
                ui.label(fmt_opt(row.max_speed, 1));
                ui.label(format!("{:.1}", row.strike_rate * 100.0));
                ui.label(format!("{:.1}", row.swing_rate * 100.0));
                ui.label(row.whiffs.to_string());
                ui.label(fmt_opt(row.whiff_per_swing.map(|v| v * 100.0), 1));
                ui.end_row();
            }
        });
}

fn show_count_table(ui: &mut egui::Ui, counts: &[CountSituation]) {
    egui::Grid::new("count_table")
        .striped(true)
        .min_col_width(60.0)
        .spacing([10.0, 4.0])
        .show(ui, |ui| {
            ui.label(RichText::new("Count").strong().size(12.0));
            ui.label(RichText::new("Pitches").strong().size(12.0));
            ui.label(RichText::new("Mix").strong().size(12.0));
            ui.end_row();

            for row in counts {
                ui.label(format!("{}-{}", row.balls, row.strikes));
                ui.label(row.total.to_string());
                let mix = row
                    .per_type
                    .iter()
                    .map(|(t, n)| format!("{t} {n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                ui.label(mix);
                ui.end_row();
            }
        });
}

/// "-" for missing values, fixed decimals otherwise.
fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v * 100.0),
        None => "-".to_string(),
    }
}


/// An "All"-defaulting string selector. Returns true when the selection
/// changed.
fn option_combo(
    ui: &mut egui::Ui,
    salt: &str,
    label: &str,
    selection: &mut Option<String>,
    choices: &[String],
) -> bool {
    let mut changed = false;
    let text = selection.clone().unwrap_or_else(|| "All".to_string());
    ComboBox::from_id_salt(salt)
        .selected_text(format!("{label}: {text}"))
        .show_ui(ui, |ui| {
            if ui.selectable_label(selection.is_none(), "All").clicked() {
                *selection = None;
                changed = true;
            }
            for choice in choices {
                if ui
                    .selectable_label(selection.as_deref() == Some(choice), choice)
                    .clicked()
                {
                    *selection = Some(choice.clone());
                    changed = true;
                }
            }
        });
    changed
}
