//! Rasterizes chart data into a PNG line plot.
//!
//! Every numeric column is drawn as one line against the implicit row index.
//! The plot has axes and horizontal gridlines but no text, so it needs no
//! font support.

use deck_core::{ChartTable, Error, FontColor, Result, Series};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;

/// Default raster size; 16:9 to match the chart region on the slide.
pub const DEFAULT_WIDTH: u32 = 960;
pub const DEFAULT_HEIGHT: u32 = 540;

const MARGIN_LEFT: u32 = 56;
const MARGIN_RIGHT: u32 = 24;
const MARGIN_TOP: u32 = 24;
const MARGIN_BOTTOM: u32 = 40;
const GRIDLINES: u32 = 5;

const GRID: RGBColor = RGBColor(226, 232, 240);
const AXIS: RGBColor = RGBColor(71, 85, 105);

/// Colors for the second and later series.
const PALETTE: [RGBColor; 6] = [
    RGBColor(237, 125, 49),
    RGBColor(112, 173, 71),
    RGBColor(255, 192, 0),
    RGBColor(91, 155, 213),
    RGBColor(165, 165, 165),
    RGBColor(158, 72, 14),
];

/// Renders chart tables to PNG bytes.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
    accent: RGBColor,
}

impl ChartRenderer {
    /// Create a renderer whose first series uses `accent`.
    pub fn new(accent: FontColor) -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            accent: RGBColor(accent.r, accent.g, accent.b),
        }
    }

    /// Override the raster size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(MARGIN_LEFT + MARGIN_RIGHT + 16);
        self.height = height.max(MARGIN_TOP + MARGIN_BOTTOM + 16);
        self
    }

    /// Pixel size of rendered images.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render the numeric columns of `table` as a PNG.
    pub fn render(&self, table: &ChartTable) -> Result<Vec<u8>> {
        let series = table.numeric_series();
        let img = self.draw(&series, table.rows().len())?;

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| Error::ImageEncode(format!("Failed to encode chart: {}", e)))?;

        Ok(buffer.into_inner())
    }

    fn draw(&self, series: &[Series], rows: usize) -> Result<RgbImage> {
        let (width, height) = self.size();
        let mut pixels = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_error)?;

            let (lo, hi) = value_range(series);
            let x_range = x_range(rows);
            let mut chart = ChartBuilder::on(&root)
                .margin_left(MARGIN_LEFT)
                .margin_right(MARGIN_RIGHT)
                .margin_top(MARGIN_TOP)
                .margin_bottom(MARGIN_BOTTOM)
                .build_cartesian_2d(x_range.clone(), lo..hi)
                .map_err(draw_error)?;

            chart
                .draw_series((0..=GRIDLINES).map(|i| {
                    let y = lo + (hi - lo) * f64::from(i) / f64::from(GRIDLINES);
                    let line = vec![(x_range.start, y), (x_range.end, y)];
                    PathElement::new(line, GRID.stroke_width(1))
                }))
                .map_err(draw_error)?;

            for (n, s) in series.iter().enumerate() {
                let color = if n == 0 {
                    self.accent
                } else {
                    PALETTE[(n - 1) % PALETTE.len()]
                };

                for run in point_runs(s) {
                    if run.len() == 1 {
                        // isolated value
                        let dot = Circle::new(run[0], 3, color.filled());
                        chart
                            .draw_series(std::iter::once(dot))
                            .map_err(draw_error)?;
                    } else {
                        chart
                            .draw_series(LineSeries::new(run, color.stroke_width(3)))
                            .map_err(draw_error)?;
                    }
                }
            }

            let origin = (x_range.start, lo);
            chart
                .draw_series([
                    PathElement::new(vec![origin, (x_range.start, hi)], AXIS.stroke_width(2)),
                    PathElement::new(vec![origin, (x_range.end, lo)], AXIS.stroke_width(2)),
                ])
                .map_err(draw_error)?;

            root.present().map_err(draw_error)?;
        }

        RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| Error::ImageEncode("Chart buffer does not match its size".to_string()))
    }
}

fn draw_error<E: std::fmt::Display>(e: E) -> Error {
    Error::ImageEncode(format!("Failed to draw chart: {}", e))
}

/// Row-index axis; a single row sits in the middle.
fn x_range(rows: usize) -> Range<f64> {
    if rows <= 1 {
        -1.0..1.0
    } else {
        0.0..(rows - 1) as f64
    }
}

/// Contiguous runs of present values, as `(row, value)` points.
fn point_runs(series: &Series) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, value) in series.values.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Global value range across series, padded when flat.
fn value_range(series: &[Series]) -> (f64, f64) {
    let (lo, hi) = series
        .iter()
        .filter_map(Series::range)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a), hi.max(b))
        });

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        let pad = if lo.abs() > 1.0 { lo.abs() * 0.1 } else { 1.0 };
        return (lo - pad, hi + pad);
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const ACCENT: FontColor = FontColor::rgb(0x25, 0x63, 0xEB);

    fn table(csv: &str) -> ChartTable {
        ChartTable::parse_csv("Chart", csv.as_bytes()).unwrap()
    }

    fn has_accent(img: &RgbImage) -> bool {
        let accent = Rgb([ACCENT.r, ACCENT.g, ACCENT.b]);
        img.pixels().any(|p| *p == accent)
    }

    #[test]
    fn test_render_produces_png() {
        let renderer = ChartRenderer::new(ACCENT);
        let png = renderer.render(&table("a,b\n1,4\n2,3\n3,5\n")).unwrap();
        assert!(png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), renderer.size());
    }

    #[test]
    fn test_first_series_uses_accent() {
        let renderer = ChartRenderer::new(ACCENT).with_size(200, 120);
        let img = renderer.draw(&table("a\n1\n2\n").numeric_series(), 2).unwrap();
        assert!(has_accent(&img));
    }

    #[test]
    fn test_single_row_is_drawn_as_a_point() {
        let renderer = ChartRenderer::new(ACCENT).with_size(200, 120);
        let img = renderer.draw(&table("a\n7\n").numeric_series(), 1).unwrap();
        assert!(has_accent(&img));
    }

    #[test]
    fn test_point_runs_split_on_gaps() {
        let series = Series {
            name: "gappy".to_string(),
            values: vec![Some(1.0), Some(2.0), None, Some(4.0)],
        };
        assert_eq!(
            point_runs(&series),
            vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(3.0, 4.0)]]
        );
    }

    #[test]
    fn test_value_range_pads_flat_series() {
        let series = vec![Series {
            name: "flat".to_string(),
            values: vec![Some(5.0), Some(5.0)],
        }];
        let (lo, hi) = value_range(&series);
        assert!(lo < 5.0 && hi > 5.0);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = ChartRenderer::new(ACCENT).with_size(160, 90);
        let data = table("x,y\n1,2\n2,1\n");
        assert_eq!(renderer.render(&data).unwrap(), renderer.render(&data).unwrap());
    }
}
