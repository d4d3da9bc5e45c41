//! PDF assembly for the occurrence report.
//!
//! One document: a header block (logo, title, generation date and time, period
//! range label), a black divider bar, the two chart images side by side, and
//! the two bordered summary tables.  The layout targets a single A4 page;
//! overflowing content flows onto further pages with genpdf's defaults, which
//! is a known scaling limit rather than a managed feature.

use std::path::Path;

use chrono::{DateTime, Local};
use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::{Color, Style};
use genpdf::Alignment;
use log::warn;

use crate::aggregate::Aggregation;
use crate::config::ReportConfig;
use crate::elements::{image_scaled_to_width, mm_from_f64, DividerBar, ShadedCell};
use crate::error::ReportError;
use crate::fonts;
use crate::model::OccurrenceType;

/// Title shown in the report header.
pub const REPORT_TITLE: &str = "OCORRÊNCIAS OPERACIONAIS";

const LOGO_WIDTH_MM: f64 = 24.0;
const CHART_WIDTH_MM: f64 = 85.0;
const HEADER_CELL_HEIGHT_MM: f64 = 7.0;
const DIVIDER_HEIGHT_MM: f64 = 2.0;

const BLACK: Color = Color::Rgb(0, 0, 0);
const WHITE: Color = Color::Rgb(255, 255, 255);

/// Returns the date-stamped output file name, e.g. `relatorio_ocorrencias_250825.pdf`.
pub fn report_file_name(generated_at: &DateTime<Local>) -> String {
    format!(
        "relatorio_ocorrencias_{}.pdf",
        generated_at.format("%d%m%y")
    )
}

fn header_text_style() -> Style {
    Style::new().with_font_size(8)
}

fn table_header_style() -> Style {
    Style::new().bold().with_font_size(8).with_color(WHITE)
}

fn cell_text(text: impl Into<String>, style: Style, alignment: Alignment) -> Paragraph {
    let mut paragraph = Paragraph::default();
    paragraph.push_styled(text, style);
    paragraph.set_alignment(alignment);
    paragraph
}

fn header_cell(text: &str) -> ShadedCell {
    ShadedCell::new(
        text,
        table_header_style(),
        BLACK,
        mm_from_f64(HEADER_CELL_HEIGHT_MM),
    )
    .with_alignment(Alignment::Center)
}

fn caption(text: &str) -> Paragraph {
    cell_text(
        text,
        Style::new().bold().with_font_size(10),
        Alignment::Center,
    )
}

/// Assembles the report and renders it to PDF bytes.
///
/// The chart images must already exist at the given paths.  Writing the bytes
/// to disk is the caller's job, which keeps render failures and filesystem
/// failures distinguishable.
pub fn assemble(
    config: &ReportConfig,
    aggregation: &Aggregation,
    bar_chart: &Path,
    pie_chart: &Path,
    generated_at: &DateTime<Local>,
) -> Result<Vec<u8>, ReportError> {
    let font_family = fonts::default_font_family()?;
    let mut document = genpdf::Document::new(font_family);
    document.set_title(REPORT_TITLE);
    document.set_font_size(8);

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    document.set_page_decorator(decorator);

    push_header(&mut document, config, generated_at)?;
    document.push(DividerBar::new(BLACK, mm_from_f64(DIVIDER_HEIGHT_MM)));
    document.push(Break::new(1));

    push_charts(&mut document, bar_chart, pie_chart)?;
    document.push(Break::new(1));

    document.push(caption("Ocorrências por Empresa"));
    document.push(company_table(aggregation)?);
    document.push(Break::new(1));

    document.push(caption("Ocorrências por Unidade"));
    document.push(unit_table(aggregation, config.render_breakdown)?);

    let mut bytes = Vec::new();
    document.render(&mut bytes)?;
    Ok(bytes)
}

fn push_header(
    document: &mut genpdf::Document,
    config: &ReportConfig,
    generated_at: &DateTime<Local>,
) -> Result<(), ReportError> {
    let mut header = TableLayout::new(vec![1, 2, 1]);

    let mut first_row = header.row();
    match logo_element(config)? {
        Some(logo) => first_row.push_element(logo),
        None => first_row.push_element(Paragraph::default()),
    }
    first_row.push_element(cell_text(
        REPORT_TITLE,
        Style::new().bold().with_font_size(12),
        Alignment::Center,
    ));
    first_row.push_element(cell_text(
        generated_at.format("%d/%m/%Y").to_string(),
        header_text_style(),
        Alignment::Right,
    ));
    first_row.push()?;

    let mut second_row = header.row();
    second_row.push_element(Paragraph::default());
    second_row.push_element(cell_text(
        config.period_label.clone(),
        header_text_style(),
        Alignment::Center,
    ));
    second_row.push_element(cell_text(
        generated_at.format("%H:%M:%S").to_string(),
        header_text_style(),
        Alignment::Right,
    ));
    second_row.push()?;

    document.push(header);
    Ok(())
}

fn logo_element(config: &ReportConfig) -> Result<Option<genpdf::elements::Image>, ReportError> {
    let Some(path) = &config.logo_path else {
        return Ok(None);
    };
    if !path.is_file() {
        warn!("logo image {} not found, skipping", path.display());
        return Ok(None);
    }
    Ok(Some(image_scaled_to_width(path, LOGO_WIDTH_MM)?))
}

fn push_charts(
    document: &mut genpdf::Document,
    bar_chart: &Path,
    pie_chart: &Path,
) -> Result<(), ReportError> {
    let mut charts = TableLayout::new(vec![1, 1]);
    let mut row = charts.row();

    let mut bar = image_scaled_to_width(bar_chart, CHART_WIDTH_MM)?;
    bar.set_alignment(Alignment::Center);
    row.push_element(bar);

    let mut pie = image_scaled_to_width(pie_chart, CHART_WIDTH_MM)?;
    pie.set_alignment(Alignment::Center);
    row.push_element(pie);

    row.push()?;
    document.push(charts);
    Ok(())
}

fn company_table(aggregation: &Aggregation) -> Result<TableLayout, ReportError> {
    let mut table = TableLayout::new(vec![1, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut header = table.row();
    header.push_element(header_cell("Empresa"));
    header.push_element(header_cell("Total de ocorrências (período selecionado)"));
    header.push()?;

    for (company, count) in &aggregation.by_company {
        let mut row = table.row();
        row.push_element(cell_text(company.clone(), Style::new(), Alignment::Left));
        row.push_element(cell_text(
            count.to_string(),
            Style::new(),
            Alignment::Center,
        ));
        row.push()?;
    }

    Ok(table)
}

fn unit_table(
    aggregation: &Aggregation,
    render_breakdown: bool,
) -> Result<TableLayout, ReportError> {
    let weights = if render_breakdown {
        vec![5, 2, 2, 2, 2, 2, 2, 2]
    } else {
        vec![5, 2]
    };
    let mut table = TableLayout::new(weights);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut header = table.row();
    header.push_element(header_cell("Unidade"));
    if render_breakdown {
        for occurrence_type in &OccurrenceType::KNOWN {
            header.push_element(header_cell(occurrence_type.short_label()));
        }
    }
    header.push_element(header_cell("Total"));
    header.push()?;

    for (unit, total) in &aggregation.by_unit {
        let mut row = table.row();
        row.push_element(cell_text(unit.clone(), Style::new().bold(), Alignment::Left));
        if render_breakdown {
            // The nested table always has a row for every unit in `by_unit`.
            let counts = aggregation.by_unit_type.get(unit).cloned().unwrap_or_default();
            for occurrence_type in &OccurrenceType::KNOWN {
                row.push_element(cell_text(
                    counts.get(occurrence_type).to_string(),
                    Style::new(),
                    Alignment::Center,
                ));
            }
        }
        row.push_element(cell_text(
            total.to_string(),
            Style::new().bold(),
            Alignment::Center,
        ));
        row.push()?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_embeds_the_date() {
        let date = Local::now();
        let name = report_file_name(&date);
        assert!(name.starts_with("relatorio_ocorrencias_"));
        assert!(name.ends_with(".pdf"));
        // "relatorio_ocorrencias_" + DDMMYY + ".pdf"
        assert_eq!(name.len(), "relatorio_ocorrencias_".len() + 6 + 4);
    }
}
