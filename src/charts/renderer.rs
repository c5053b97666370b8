//! Static Chart Renderer
//! Renders the dashboard's chart views to PNG bytes with plotters, for the
//! report exporter. Layout mirrors the interactive views: movement scatter,
//! plate-location scatter with strike zone, usage bars.

use crate::config::StrikeZone;
use crate::stats::PitchTypeSummary;
use plotters::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Invalid image buffer")]
    BadBuffer,
}

/// Scatter ranges matching the interactive plots, in centimeters.
const MOVEMENT_RANGE: f64 = 80.0;
const LOCATION_X_RANGE: f64 = 80.0;
const LOCATION_Y_MIN: f64 = -20.0;
const LOCATION_Y_MAX: f64 = 150.0;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Movement scatter (horizontal vs induced vertical break).
    pub fn render_movement_png(
        points_by_type: &[(String, Vec<[f64; 2]>)],
        palette: &[[u8; 3]],
        width: u32,
        height: u32,
        title: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buf = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(to_draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 26))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(55)
                .build_cartesian_2d(
                    -MOVEMENT_RANGE..MOVEMENT_RANGE,
                    -MOVEMENT_RANGE..MOVEMENT_RANGE,
                )
                .map_err(to_draw_err)?;

            chart
                .configure_mesh()
                .x_desc("Horizontal (cm)")
                .y_desc("Vertical (cm)")
                .light_line_style(RGBColor(230, 230, 230))
                .draw()
                .map_err(to_draw_err)?;

            // Zero axes through the origin.
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(-MOVEMENT_RANGE, 0.0), (MOVEMENT_RANGE, 0.0)],
                    BLACK.stroke_width(1),
                )))
                .map_err(to_draw_err)?;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(0.0, -MOVEMENT_RANGE), (0.0, MOVEMENT_RANGE)],
                    BLACK.stroke_width(1),
                )))
                .map_err(to_draw_err)?;

            for (idx, (pitch_type, points)) in points_by_type.iter().enumerate() {
                let color = palette_color(palette, idx);
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), 3, color.filled())),
                    )
                    .map_err(to_draw_err)?
                    .label(pitch_type)
                    .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
            }

            chart
                .configure_series_labels()
                .border_style(BLACK)
                .background_style(WHITE.mix(0.85))
                .draw()
                .map_err(to_draw_err)?;
            root.present().map_err(to_draw_err)?;
        }
        encode_png(buf, width, height)
    }

    /// Plate-location scatter with the strike-zone box.
    pub fn render_location_png(
        points_by_type: &[(String, Vec<[f64; 2]>)],
        zone: &StrikeZone,
        palette: &[[u8; 3]],
        width: u32,
        height: u32,
        title: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buf = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(to_draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 26))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(55)
                .build_cartesian_2d(
                    -LOCATION_X_RANGE..LOCATION_X_RANGE,
                    LOCATION_Y_MIN..LOCATION_Y_MAX,
                )
                .map_err(to_draw_err)?;

            chart
                .configure_mesh()
                .x_desc("Plate side (cm)")
                .y_desc("Plate height (cm)")
                .light_line_style(RGBColor(230, 230, 230))
                .draw()
                .map_err(to_draw_err)?;

            let (x0, y0) = (zone.side_min, zone.height_min);
            let (x1, y1) = (zone.side_min + zone.width, zone.height_min + zone.height);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x0, y0), (x1, y1)],
                    BLACK.stroke_width(2),
                )))
                .map_err(to_draw_err)?;

            for (idx, (pitch_type, points)) in points_by_type.iter().enumerate() {
                let color = palette_color(palette, idx);
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), 3, color.filled())),
                    )
                    .map_err(to_draw_err)?
                    .label(pitch_type)
                    .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
            }

            chart
                .configure_series_labels()
                .border_style(BLACK)
                .background_style(WHITE.mix(0.85))
                .draw()
                .map_err(to_draw_err)?;
            root.present().map_err(to_draw_err)?;
        }
        encode_png(buf, width, height)
    }

    /// Usage share per pitch type as vertical bars.
    pub fn render_usage_png(
        rows: &[PitchTypeSummary],
        palette: &[[u8; 3]],
        width: u32,
        height: u32,
        title: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buf = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(to_draw_err)?;

            let max_usage = rows
                .iter()
                .map(|r| r.usage * 100.0)
                .fold(0.0f64, f64::max)
                .max(10.0);
            let n = rows.len().max(1) as f64;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 26))
                .margin(12)
                .x_label_area_size(60)
                .y_label_area_size(55)
                .build_cartesian_2d(-0.5..(n - 0.5), 0.0..(max_usage * 1.15))
                .map_err(to_draw_err)?;

            let labels: Vec<String> = rows.iter().map(|r| r.pitch_type.clone()).collect();
            chart
                .configure_mesh()
                .y_desc("Usage %")
                .x_labels(rows.len().max(1))
                .x_label_formatter(&|x| {
                    let idx = x.round() as usize;
                    if (x - idx as f64).abs() < 1e-6 && idx < labels.len() {
                        labels[idx].clone()
                    } else {
                        String::new()
                    }
                })
                .light_line_style(RGBColor(230, 230, 230))
                .draw()
                .map_err(to_draw_err)?;

            chart
                .draw_series(rows.iter().enumerate().map(|(i, r)| {
                    let color = palette_color(palette, i);
                    Rectangle::new(
                        [(i as f64 - 0.3, 0.0), (i as f64 + 0.3, r.usage * 100.0)],
                        color.filled(),
                    )
                }))
                .map_err(to_draw_err)?;
            root.present().map_err(to_draw_err)?;
        }
        encode_png(buf, width, height)
    }
}

fn palette_color(palette: &[[u8; 3]], idx: usize) -> RGBColor {
    if palette.is_empty() {
        return RGBColor(120, 120, 120);
    }
    let [r, g, b] = palette[idx % palette.len()];
    RGBColor(r, g, b)
}

fn to_draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// RGB buffer → PNG bytes via the image crate.
fn encode_png(buf: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let img: image::RgbImage =
        image::ImageBuffer::from_raw(width, height, buf).ok_or(RenderError::BadBuffer)?;
    let mut png = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut png),
        image::ImageFormat::Png,
    )?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_chart_renders_to_png() {
        let points = vec![
            ("Fastball".to_string(), vec![[10.0, 40.0], [-5.0, 35.0]]),
            ("Slider".to_string(), vec![[-20.0, 5.0]]),
        ];
        let palette = vec![[231, 76, 60], [52, 152, 219]];
        let png =
            StaticChartRenderer::render_movement_png(&points, &palette, 400, 300, "Movement")
                .unwrap();
        // PNG magic bytes
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn location_chart_renders_with_empty_data() {
        let zone = StrikeZone::default();
        let png = StaticChartRenderer::render_location_png(&[], &zone, &[], 400, 300, "Location")
            .unwrap();
        assert!(!png.is_empty());
    }
}
