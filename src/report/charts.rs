use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::color;
use crate::data::stats;
use crate::data::summary::CorrelationMatrix;

// ---------------------------------------------------------------------------
// Raster charts for the HTML report
// ---------------------------------------------------------------------------

const AXIS: RGBColor = RGBColor(60, 60, 60);
const BAR: RGBColor = RGBColor(76, 114, 176);
const FONT: &str = "sans-serif";

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// A chart written to disk, with the caption it is shown under.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub title: String,
    pub path: PathBuf,
}

/// Draw into an RGB buffer and encode it as PNG.  Text needs a system font;
/// when none is available the chart is redrawn without captions and labels.
fn render<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: Fn(&Area<'_>, bool) -> Result<()>,
{
    let buffer = match draw_buffer(size, &draw, true) {
        Ok(buffer) => buffer,
        Err(e) => {
            log::warn!("Drawing {} without text: {e:#}", path.display());
            draw_buffer(size, &draw, false)?
        }
    };
    let img = RgbImage::from_raw(size.0, size.1, buffer).context("chart buffer size mismatch")?;
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing chart {}", path.display()))
}

fn draw_buffer<F>(size: (u32, u32), draw: &F, labelled: bool) -> Result<Vec<u8>>
where
    F: Fn(&Area<'_>, bool) -> Result<()>,
{
    let mut buffer = vec![255u8; (size.0 * size.1 * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root, labelled)?;
        root.present()?;
    }
    Ok(buffer)
}

fn builder<'a, 'b, 'c>(root: &'a Area<'b>, title: &str, labelled: bool) -> ChartBuilder<'a, 'c, BitMapBackend<'b>> {
    let mut builder = ChartBuilder::on(root);
    builder.margin(12);
    if labelled {
        builder
            .caption(title, (FONT, 22))
            .x_label_area_size(48)
            .y_label_area_size(64);
    }
    builder
}

/// Correlation matrix as a colour grid, each cell annotated with its
/// coefficient to two decimals.
pub fn heatmap(matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
    const CELL: u32 = 72;
    let n = matrix.columns.len().max(1);
    let side = n as u32 * CELL + 140;
    let names = &matrix.columns;

    render(path, (side, side), |root, labelled| {
        let span = -0.5..n as f64 - 0.5;
        let mut chart = builder(root, "Correlation heatmap", labelled).build_cartesian_2d(span.clone(), span)?;

        // row 0 is drawn at the top
        let flip = |i: usize| (n - 1 - i) as f64;
        let label = |v: f64, flipped: bool| -> String {
            if (v - v.round()).abs() > 1e-6 || v < 0.0 {
                return String::new();
            }
            let i = v.round() as usize;
            let i = if flipped { (n - 1).wrapping_sub(i) } else { i };
            names.get(i).cloned().unwrap_or_default()
        };
        if labelled {
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(n)
                .y_labels(n)
                .x_label_formatter(&|x| label(*x, false))
                .y_label_formatter(&|y| label(*y, true))
                .draw()?;
        }

        for (i, row) in matrix.values.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                let (x, y) = (j as f64, flip(i));
                let [r, g, b] = color::diverging(*v);
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.48, y - 0.48), (x + 0.48, y + 0.48)],
                    RGBColor(r, g, b).filled(),
                )))?;
                if labelled {
                    let [tr, tg, tb] = color::contrast_text([r, g, b]);
                    let style = (FONT, 16)
                        .into_font()
                        .color(&RGBColor(tr, tg, tb))
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    chart.draw_series(std::iter::once(Text::new(format!("{v:.2}"), (x, y), style)))?;
                }
            }
        }
        Ok(())
    })
}

/// Equal-width histogram of one column.
pub fn histogram(name: &str, values: &[f64], bins: usize, path: &Path) -> Result<()> {
    let hist = stats::histogram(values, bins);
    let lo = hist.first().map_or(0.0, |b| b.0);
    let hi = hist.last().map_or(1.0, |b| b.1);
    let peak = hist.iter().map(|b| b.2).max().unwrap_or(0).max(1) as f64;

    render(path, (640, 360), |root, labelled| {
        let mut chart = builder(root, &format!("Distribution of {name}"), labelled)
            .build_cartesian_2d(lo..hi, 0.0..peak * 1.1)?;
        if labelled {
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(name)
                .y_desc("Count")
                .draw()?;
        }
        chart.draw_series(hist.iter().map(|(start, end, count)| {
            Rectangle::new([(*start, 0.0), (*end, *count as f64)], BAR.filled())
        }))?;
        Ok(())
    })
}

/// Vertical box plot with Tukey whiskers; points beyond them are outliers.
pub fn box_plot(name: &str, values: &[f64], path: &Path) -> Result<()> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = match (lo.is_finite(), hi - lo < f64::EPSILON) {
        (false, _) => (0.0, 1.0),
        (true, true) => (lo - 0.5, hi + 0.5),
        (true, false) => (lo - (hi - lo) * 0.05, hi + (hi - lo) * 0.05),
    };
    let geometry = stats::box_stats(&finite);

    render(path, (320, 420), |root, labelled| {
        let mut chart = builder(root, &format!("Box plot of {name}"), labelled).build_cartesian_2d(0.0..2.0, lo..hi)?;
        if labelled {
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_x_axis()
                .y_desc(name)
                .draw()?;
        }
        let Some(b) = geometry else {
            return Ok(());
        };

        let line = AXIS.stroke_width(2);
        chart.draw_series(std::iter::once(Rectangle::new([(0.6, b.q1), (1.4, b.q3)], BAR.mix(0.5).filled())))?;
        chart.draw_series(std::iter::once(Rectangle::new([(0.6, b.q1), (1.4, b.q3)], line)))?;
        chart.draw_series(
            [
                vec![(0.6, b.median), (1.4, b.median)],
                vec![(1.0, b.q3), (1.0, b.upper_whisker)],
                vec![(1.0, b.q1), (1.0, b.lower_whisker)],
                vec![(0.8, b.upper_whisker), (1.2, b.upper_whisker)],
                vec![(0.8, b.lower_whisker), (1.2, b.lower_whisker)],
            ]
            .into_iter()
            .map(|points| PathElement::new(points, line)),
        )?;
        chart.draw_series(
            finite
                .iter()
                .filter(|v| **v < b.lower_whisker || **v > b.upper_whisker)
                .map(|v| Circle::new((1.0, *v), 3, AXIS.filled())),
        )?;
        Ok(())
    })
}

/// Render the full chart set into `dir`: correlation heatmap first, then a
/// histogram and a box plot per numeric column.
pub fn render_all(
    dir: &Path,
    pearson: Option<&CorrelationMatrix>,
    numeric: &[(String, Vec<f64>)],
    bins: usize,
) -> Result<Vec<RenderedChart>> {
    let mut charts = Vec::new();

    if let Some(matrix) = pearson {
        let path = dir.join("correlation_heatmap.png");
        heatmap(matrix, &path)?;
        charts.push(RenderedChart {
            title: "Correlation heatmap".to_string(),
            path,
        });
    }

    for (i, (name, values)) in numeric.iter().enumerate() {
        let path = dir.join(format!("hist_{i}.png"));
        histogram(name, values, bins, &path)?;
        charts.push(RenderedChart {
            title: format!("Distribution of {name}"),
            path,
        });

        let path = dir.join(format!("box_{i}.png"));
        box_plot(name, values, &path)?;
        charts.push(RenderedChart {
            title: format!("Box plot of {name}"),
            path,
        });
    }

    Ok(charts)
}
