//! Chart rendering for the report.
//!
//! Two standalone PNG images: a bar chart of occurrences per period and a pie
//! chart of the percentage share per type.  Both are overwritten on every run
//! and embedded into the PDF afterwards, so any rendering failure is fatal.

use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};

use crate::aggregate::Aggregation;
use crate::error::ReportError;
use crate::model::PeriodCode;

/// Edge length of the square chart canvases, in pixels.
const CHART_SIZE_PX: u32 = 1000;

const BAR_CHART_TITLE: &str = "Total de Ocorrências por Período";
const PIE_CHART_TITLE: &str = "Percentual de Ocorrências por Tipo";

const BAR_FILL: RGBColor = RGBColor(66, 114, 184);

/// Slice colors, cycled when more categories than entries show up.
const PIE_COLORS: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

fn render_error(error: impl std::fmt::Display) -> ReportError {
    ReportError::Render(error.to_string())
}

fn bold_title() -> TextStyle<'static> {
    FontDesc::new(FontFamily::SansSerif, 40.0, FontStyle::Bold).into()
}

/// Renders the occurrences-per-period bar chart to `path`.
///
/// The x axis carries the period labels in chronological order.  An empty
/// record set produces a titled empty canvas instead of an error.
pub fn render_period_bar_chart(
    aggregation: &Aggregation,
    path: &Path,
) -> Result<(), ReportError> {
    let labels: Vec<String> = aggregation.by_period.keys().map(PeriodCode::label).collect();
    let counts: Vec<u64> = aggregation.by_period.values().copied().collect();

    let root =
        BitMapBackend::new(path, (CHART_SIZE_PX, CHART_SIZE_PX)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    if counts.is_empty() {
        root.titled(BAR_CHART_TITLE, bold_title())
            .map_err(render_error)?;
        return root.present().map_err(render_error);
    }

    let max_count = counts.iter().copied().max().unwrap_or(0).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption(BAR_CHART_TITLE, bold_title())
        .margin(24)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (0u32..labels.len() as u32).into_segmented(),
            0u64..max_count + 1,
        )
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Período")
        .y_desc("Total de Ocorrências")
        .axis_desc_style(("sans-serif", 30))
        .label_style(("sans-serif", 24))
        .x_label_formatter(&|value| {
            let index = match value {
                SegmentValue::Exact(index) | SegmentValue::CenterOf(index) => *index as usize,
                SegmentValue::Last => return String::new(),
            };
            labels.get(index).cloned().unwrap_or_default()
        })
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(index, &count)| {
            let left = SegmentValue::Exact(index as u32);
            let right = SegmentValue::Exact(index as u32 + 1);
            Rectangle::new([(left, 0u64), (right, count)], BAR_FILL.filled())
        }))
        .map_err(render_error)?;

    root.present().map_err(render_error)
}

/// Renders the share-per-type pie chart to `path`.
///
/// One slice per occurrence type in table (alphabetical) order, with
/// percentage labels to one decimal place.  An empty record set produces a
/// titled empty canvas instead of an error.
pub fn render_type_pie_chart(aggregation: &Aggregation, path: &Path) -> Result<(), ReportError> {
    let labels: Vec<String> = aggregation.by_type.keys().cloned().collect();
    let sizes: Vec<f64> = aggregation
        .by_type
        .values()
        .map(|&count| count as f64)
        .collect();

    let root =
        BitMapBackend::new(path, (CHART_SIZE_PX, CHART_SIZE_PX)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;
    let canvas = root.titled(PIE_CHART_TITLE, bold_title()).map_err(render_error)?;

    if sizes.iter().sum::<f64>() > 0.0 {
        let colors: Vec<RGBColor> = (0..sizes.len())
            .map(|index| PIE_COLORS[index % PIE_COLORS.len()])
            .collect();

        let (width, height) = canvas.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);
        let radius = f64::from(width.min(height)) * 0.32;

        let label_style: TextStyle = ("sans-serif", 26)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.label_style(label_style.clone());
        pie.percentages(label_style);
        canvas.draw(&pie).map_err(render_error)?;
    }

    root.present().map_err(render_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, normalize};
    use crate::model::{OccurrenceRecord, OccurrenceType};

    /// Text rendering needs a system sans-serif font; skip quietly when the
    /// environment has none, like the PDF rendering tests do.
    fn fonts_available() -> bool {
        ("sans-serif", 20).into_font().box_size("x").is_ok()
    }

    fn sample_aggregation() -> Aggregation {
        let records = vec![
            OccurrenceRecord {
                contract: 1,
                period: "2406".to_owned(),
                occurrence_type: OccurrenceType::FaltaInjustificada,
                company: "Alfa".to_owned(),
                unit: Some("Portaria".to_owned()),
            },
            OccurrenceRecord {
                contract: 1,
                period: "2407".to_owned(),
                occurrence_type: OccurrenceType::SaidaAntecipada,
                company: "Bravo".to_owned(),
                unit: None,
            },
        ];
        aggregate(&normalize(records).unwrap())
    }

    #[test]
    fn charts_write_png_files() {
        if !fonts_available() {
            eprintln!("skipping chart rendering test: no system fonts");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let aggregation = sample_aggregation();

        let bar = dir.path().join("bar.png");
        let pie = dir.path().join("pie.png");
        render_period_bar_chart(&aggregation, &bar).unwrap();
        render_type_pie_chart(&aggregation, &pie).unwrap();

        assert!(bar.metadata().unwrap().len() > 0);
        assert!(pie.metadata().unwrap().len() > 0);
    }

    #[test]
    fn empty_aggregation_still_renders() {
        if !fonts_available() {
            eprintln!("skipping chart rendering test: no system fonts");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let aggregation = Aggregation::default();

        render_period_bar_chart(&aggregation, &dir.path().join("bar.png")).unwrap();
        render_type_pie_chart(&aggregation, &dir.path().join("pie.png")).unwrap();
    }

    #[test]
    fn missing_parent_directory_is_a_render_error() {
        if !fonts_available() {
            eprintln!("skipping chart rendering test: no system fonts");
            return;
        }
        let aggregation = sample_aggregation();
        let result = render_period_bar_chart(
            &aggregation,
            Path::new("/nonexistent-dir/never/bar.png"),
        );
        assert!(matches!(result, Err(ReportError::Render(_))));
    }
}
