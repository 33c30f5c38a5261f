//! SVG chart renderers on top of plotters.
//!
//! Every function writes one `.svg` file and keeps the fixed styling the
//! reports use (white background, sans-serif, bright palette). The callers
//! decide titles, labels and artifact placement.

use crate::Result;
use crate::stats;
use anyhow::bail;
use plotters::prelude::*;
use std::path::Path;

const SIZE: (u32, u32) = (1000, 600);
const CAPTION_FONT: (&str, i32) = ("sans-serif", 22);

const PALETTE: [RGBColor; 4] = [BLUE, RED, GREEN, MAGENTA];

/// A labeled point cloud for the regression charts.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Horizontal bar chart, one bar per labeled row.
pub fn h_bar_chart(path: &Path, title: &str, x_desc: &str, items: &[(String, f64)]) -> Result<()> {
    if items.is_empty() {
        bail!("no rows to plot for {title:?}");
    }
    let max = pad_max(items.iter().map(|(_, v)| *v));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d(0f64..max, (0..items.len() as i32).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(items.len().min(40))
        .y_label_formatter(&|v| segment_label(v, items))
        .x_desc(x_desc)
        .draw()?;

    chart.draw_series(items.iter().enumerate().map(|(i, (_, value))| {
        let i = i as i32;
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(i)),
                (*value, SegmentValue::Exact(i + 1)),
            ],
            PALETTE[0].mix(0.75).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Two overlaid horizontal bar series per row, seaborn style (translucent
/// overlap rather than side-by-side).
pub fn paired_bar_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    labels: (&str, &str),
    items: &[(String, f64, f64)],
) -> Result<()> {
    if items.is_empty() {
        bail!("no rows to plot for {title:?}");
    }
    let max = pad_max(items.iter().flat_map(|(_, a, b)| [*a, *b]));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d(0f64..max, (0..items.len() as i32).into_segmented())?;

    let rows: Vec<(String, f64)> = items.iter().map(|(k, a, _)| (k.clone(), *a)).collect();
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(items.len().min(40))
        .y_label_formatter(&|v| segment_label(v, &rows))
        .x_desc(x_desc)
        .draw()?;

    let bar = |i: usize, value: f64, color: RGBColor| {
        let i = i as i32;
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(i)),
                (value, SegmentValue::Exact(i + 1)),
            ],
            color.mix(0.55).filled(),
        )
    };

    chart
        .draw_series(
            items
                .iter()
                .enumerate()
                .map(|(i, (_, _, b))| bar(i, *b, PALETTE[1])),
        )?
        .label(labels.1)
        .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], PALETTE[1].mix(0.55).filled()));

    chart
        .draw_series(
            items
                .iter()
                .enumerate()
                .map(|(i, (_, a, _))| bar(i, *a, PALETTE[0])),
        )?
        .label(labels.0)
        .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], PALETTE[0].mix(0.55).filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Horizontal box plots, one per labeled group.
pub fn box_plot(path: &Path, title: &str, x_desc: &str, groups: &[(String, Vec<f64>)]) -> Result<()> {
    if groups.is_empty() || groups.iter().any(|(_, vs)| vs.is_empty()) {
        bail!("no samples to plot for {title:?}");
    }
    let max = pad_max(groups.iter().flat_map(|(_, vs)| vs.iter().copied())) as f32;

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d(0f32..max, (0..groups.len() as i32).into_segmented())?;

    let rows: Vec<(String, f64)> = groups.iter().map(|(k, _)| (k.clone(), 0.0)).collect();
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(groups.len())
        .y_label_formatter(&|v| segment_label(v, &rows))
        .x_desc(x_desc)
        .draw()?;

    let quartiles: Vec<Quartiles> = groups
        .iter()
        .map(|(_, values)| Quartiles::new(values))
        .collect();

    chart.draw_series(quartiles.iter().enumerate().map(|(i, q)| {
        Boxplot::new_horizontal(SegmentValue::CenterOf(i as i32), q).width(25)
    }))?;

    root.present()?;
    Ok(())
}

/// Scatter plus ordinary-least-squares regression line per series.
pub fn regression_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[Series],
) -> Result<()> {
    if series.iter().all(|s| s.points.is_empty()) {
        bail!("no points to plot for {title:?}");
    }
    let x_max = pad_max(series.iter().flat_map(|s| s.points.iter().map(|(x, _)| *x)));
    let y_max = pad_max(series.iter().flat_map(|s| s.points.iter().map(|(_, y)| *y)));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];

        chart
            .draw_series(
                s.points
                    .iter()
                    .map(|&p| Circle::new(p, 3, color.mix(0.5).filled())),
            )?
            .label(&s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));

        // A regression line needs at least two distinct x values; a sparse
        // series still gets its scatter.
        if let Ok((slope, intercept)) = stats::linear_fit(&s.points) {
            let xs = s.points.iter().map(|(x, _)| *x);
            let (x0, x1) = (
                xs.clone().fold(f64::INFINITY, f64::min),
                xs.fold(f64::NEG_INFINITY, f64::max),
            );
            chart.draw_series(LineSeries::new(
                [(x0, slope * x0 + intercept), (x1, slope * x1 + intercept)],
                color.stroke_width(2),
            ))?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Line chart over day buckets; `day_label` renders the x tick labels.
pub fn trend_chart(
    path: &Path,
    title: &str,
    y_desc: &str,
    day_label: &dyn Fn(i64) -> String,
    series: &[(String, Vec<(i64, f64)>)],
) -> Result<()> {
    if series.iter().all(|(_, pts)| pts.is_empty()) {
        bail!("no points to plot for {title:?}");
    }
    let days = series.iter().flat_map(|(_, pts)| pts.iter().map(|(d, _)| *d));
    let (d0, d1) = days.fold((i64::MAX, i64::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));
    let d1 = if d0 == d1 { d1 + 1 } else { d1 };
    let y_max = pad_max(series.iter().flat_map(|(_, pts)| pts.iter().map(|(_, v)| *v)));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(d0..d1, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("day")
        .y_desc(y_desc)
        .x_label_formatter(&|d| day_label(*d))
        .draw()?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Histogram with equal-width bins computed from the value range.
pub fn histogram_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    values: &[f64],
    bins: usize,
) -> Result<()> {
    if values.is_empty() || bins == 0 {
        bail!("no samples to plot for {title:?}");
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let y_max = pad_max(counts.iter().map(|&c| c as f64));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(min..min + width * bins as f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("count")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = min + width * i as f64;
        Rectangle::new(
            [(x0, 0.0), (x0 + width, count as f64)],
            PALETTE[0].mix(0.75).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Correlation-matrix heat map: blue (-1) through white (0) to red (+1),
/// with the coefficient printed in each cell.
pub fn heatmap_chart(
    path: &Path,
    title: &str,
    labels: &[String],
    matrix: &[Vec<f64>],
) -> Result<()> {
    if labels.is_empty() || matrix.len() != labels.len() {
        bail!("correlation matrix does not match its labels for {title:?}");
    }
    let n = labels.len() as i32;

    let root = SVGBackend::new(path, (900, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let rows: Vec<(String, f64)> = labels.iter().map(|l| (l.clone(), 0.0)).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(160)
        .y_label_area_size(220)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(labels.len())
        .y_labels(labels.len())
        .x_label_formatter(&|v| segment_label(v, &rows))
        .y_label_formatter(&|v| segment_label(v, &rows))
        .draw()?;

    chart.draw_series(matrix.iter().enumerate().flat_map(|(y, row)| {
        row.iter().enumerate().map(move |(x, &v)| {
            let (x, y) = (x as i32, y as i32);
            Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                heat_color(v).filled(),
            )
        })
    }))?;

    chart.draw_series(matrix.iter().enumerate().flat_map(|(y, row)| {
        row.iter().enumerate().map(move |(x, &v)| {
            Text::new(
                format!("{v:.2}"),
                (
                    SegmentValue::CenterOf(x as i32),
                    SegmentValue::CenterOf(y as i32),
                ),
                ("sans-serif", 13),
            )
        })
    }))?;

    root.present()?;
    Ok(())
}

fn heat_color(v: f64) -> RGBColor {
    let v = v.clamp(-1.0, 1.0);
    let scale = |frac: f64| (255.0 * (1.0 - frac)) as u8;
    if v >= 0.0 {
        RGBColor(255, scale(v), scale(v))
    } else {
        RGBColor(scale(-v), scale(-v), 255)
    }
}

fn segment_label(v: &SegmentValue<i32>, rows: &[(String, f64)]) -> String {
    let idx = match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => *i,
        SegmentValue::Last => return String::new(),
    };
    rows.get(idx as usize).map(|(k, _)| k.clone()).unwrap_or_default()
}

fn pad_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0f64, f64::max);
    if max > 0.0 { max * 1.05 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_inputs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chart.svg");
        assert!(h_bar_chart(&out, "t", "x", &[]).is_err());
        assert!(box_plot(&out, "t", "x", &[("a".into(), vec![])]).is_err());
        assert!(histogram_chart(&out, "t", "x", &[], 10).is_err());
    }

    #[test]
    fn heat_color_endpoints() {
        assert_eq!(heat_color(1.0), RGBColor(255, 0, 0));
        assert_eq!(heat_color(-1.0), RGBColor(0, 0, 255));
        assert_eq!(heat_color(0.0), RGBColor(255, 255, 255));
    }

    #[test]
    fn pad_max_guards_zero() {
        assert_eq!(pad_max([0.0].into_iter()), 1.0);
        assert_eq!(pad_max([10.0, 20.0].into_iter()), 21.0);
    }
}
