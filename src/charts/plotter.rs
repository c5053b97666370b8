//! Chart Plotter Module
//! Interactive visualizations for the dashboard using egui_plot: movement
//! and plate-location scatters, usage bars, outcome distribution bars.

use crate::config::{DashboardConfig, StrikeZone};
use crate::stats::{OutcomeSplit, PitchTypeSummary};
use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

/// Plot ranges matching the original sheets, in centimeters.
const MOVEMENT_RANGE: f64 = 80.0;
const LOCATION_X_RANGE: f64 = 80.0;
const LOCATION_Y_MIN: f64 = -20.0;
const LOCATION_Y_MAX: f64 = 150.0;

/// Per-pitch-type color assignment cycled from the configured palette.
#[derive(Clone)]
pub struct ChartPalette {
    colors: Vec<Color32>,
}

impl ChartPalette {
    pub fn from_config(config: &DashboardConfig) -> Self {
        let colors = config
            .palette
            .iter()
            .map(|[r, g, b]| Color32::from_rgb(*r, *g, *b))
            .collect::<Vec<_>>();
        Self {
            colors: if colors.is_empty() {
                vec![Color32::GRAY]
            } else {
                colors
            },
        }
    }

    pub fn color(&self, idx: usize) -> Color32 {
        self.colors[idx % self.colors.len()]
    }
}

/// Creates the dashboard's interactive charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Movement scatter: horizontal break vs induced vertical break, one
    /// color per pitch type, zero axes drawn through the origin.
    pub fn draw_movement_chart(
        ui: &mut egui::Ui,
        points_by_type: &[(String, Vec<[f64; 2]>)],
        palette: &ChartPalette,
        height: f32,
    ) {
        Plot::new("movement_chart")
            .height(height)
            .data_aspect(1.0)
            .include_x(-MOVEMENT_RANGE)
            .include_x(MOVEMENT_RANGE)
            .include_y(-MOVEMENT_RANGE)
            .include_y(MOVEMENT_RANGE)
            .x_axis_label("Horizontal (cm)")
            .y_axis_label("Vertical (cm)")
            .legend(Legend::default())
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                // Zero axes
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![
                        [-MOVEMENT_RANGE, 0.0],
                        [MOVEMENT_RANGE, 0.0],
                    ]))
                    .color(Color32::DARK_GRAY)
                    .width(1.0),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![
                        [0.0, -MOVEMENT_RANGE],
                        [0.0, MOVEMENT_RANGE],
                    ]))
                    .color(Color32::DARK_GRAY)
                    .width(1.0),
                );

                for (idx, (pitch_type, points)) in points_by_type.iter().enumerate() {
                    let series: PlotPoints = points.iter().copied().collect();
                    plot_ui.points(
                        Points::new(series)
                            .radius(3.0)
                            .color(palette.color(idx).gamma_multiply(0.8))
                            .name(pitch_type),
                    );
                }
            });
    }

    /// Plate-location scatter with the strike-zone box, catcher's view.
    pub fn draw_location_chart(
        ui: &mut egui::Ui,
        points_by_type: &[(String, Vec<[f64; 2]>)],
        zone: &StrikeZone,
        palette: &ChartPalette,
        height: f32,
    ) {
        Plot::new("location_chart")
            .height(height)
            .data_aspect(1.0)
            .include_x(-LOCATION_X_RANGE)
            .include_x(LOCATION_X_RANGE)
            .include_y(LOCATION_Y_MIN)
            .include_y(LOCATION_Y_MAX)
            .x_axis_label("Plate side (cm)")
            .y_axis_label("Plate height (cm)")
            .legend(Legend::default())
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                let (x0, y0) = (zone.side_min, zone.height_min);
                let (x1, y1) = (zone.side_min + zone.width, zone.height_min + zone.height);
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![
                        [x0, y0],
                        [x1, y0],
                        [x1, y1],
                        [x0, y1],
                        [x0, y0],
                    ]))
                    .color(Color32::WHITE)
                    .width(2.0),
                );

                for (idx, (pitch_type, points)) in points_by_type.iter().enumerate() {
                    let series: PlotPoints = points.iter().copied().collect();
                    plot_ui.points(
                        Points::new(series)
                            .radius(3.0)
                            .color(palette.color(idx).gamma_multiply(0.8))
                            .name(pitch_type),
                    );
                }
            });
    }

    /// Usage share per pitch type.
    pub fn draw_usage_bars(
        ui: &mut egui::Ui,
        rows: &[PitchTypeSummary],
        palette: &ChartPalette,
        height: f32,
    ) {
        let labels: Vec<String> = rows.iter().map(|r| r.pitch_type.clone()).collect();
        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Bar::new(i as f64, r.usage * 100.0)
                    .width(0.6)
                    .fill(palette.color(i).gamma_multiply(0.85))
                    .name(&r.pitch_type)
            })
            .collect();

        Plot::new("usage_bars")
            .height(height)
            .y_axis_label("Usage %")
            .allow_scroll(false)
            .allow_drag(false)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() < 1e-6 && idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Outcome distribution as grouped bars: one cluster per outcome label,
    /// one bar per group (batter side or pitch type). `id` must be unique
    /// among plots in the same view.
    pub fn draw_outcome_bars(
        ui: &mut egui::Ui,
        id: &str,
        splits: &[OutcomeSplit],
        palette: &ChartPalette,
        height: f32,
    ) {
        // Union of outcome labels across groups, keeping first-seen order
        // (each split is already sorted by frequency).
        let mut labels: Vec<String> = Vec::new();
        for split in splits {
            for slice in &split.slices {
                if !labels.contains(&slice.label) {
                    labels.push(slice.label.clone());
                }
            }
        }

        let group_count = splits.len().max(1);
        let cluster_width = 0.8;
        let bar_width = cluster_width / group_count as f64;

        let charts: Vec<BarChart> = splits
            .iter()
            .enumerate()
            .map(|(g, split)| {
                let bars: Vec<Bar> = labels
                    .iter()
                    .enumerate()
                    .filter_map(|(l, label)| {
                        let slice = split.slices.iter().find(|s| &s.label == label)?;
                        let x = l as f64 - cluster_width / 2.0
                            + bar_width * (g as f64 + 0.5);
                        Some(
                            Bar::new(x, slice.share * 100.0)
                                .width(bar_width * 0.9)
                                .fill(palette.color(g).gamma_multiply(0.85)),
                        )
                    })
                    .collect();
                BarChart::new(bars).name(&split.group)
            })
            .collect();

        let axis_labels = labels.clone();
        Plot::new(id.to_string())
            .height(height)
            .y_axis_label("Share %")
            .legend(Legend::default())
            .allow_scroll(false)
            .allow_drag(false)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() < 1e-6 && idx < axis_labels.len() {
                    axis_labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                for chart in charts {
                    plot_ui.bar_chart(chart);
                }
            });
    }
}
