//! Custom element implementations built on top of `genpdf` primitives.
//!
//! The report needs two things the upstream crate does not ship: images scaled
//! to an exact width in millimetres, and table header cells with a solid fill
//! behind the text (the report draws them white-on-black).

use std::path::Path;

use image::GenericImageView;

use genpdf::elements::{Image, Paragraph};
use genpdf::error::{Context as _, Error};
use genpdf::style::{Color, Style};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

/// Vertical distance between the strokes that build up a solid fill.
const FILL_STRIDE_MM: f64 = 0.3;

/// Space between the top of a shaded cell and its text baseline area.
const CELL_TEXT_PADDING_MM: f64 = 0.8;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads the image at `path` using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Converts the image at `path` into a `genpdf` image rescaled to `width_mm`.
///
/// The natural size is estimated at 300 DPI and the aspect ratio is preserved.
pub fn image_scaled_to_width(
    path: impl AsRef<Path>,
    width_mm: f64,
) -> Result<Image, Error> {
    let dynamic = decode_image_from_path(path)?;
    let natural = estimated_image_size(&dynamic, DEFAULT_IMAGE_DPI);
    let mut image = Image::from_dynamic_image(dynamic)?;

    let natural_width = mm_to_f64(natural.width);
    if natural_width > f64::EPSILON {
        let scale = width_mm / natural_width;
        image.set_scale(Scale::new(scale, scale));
    }
    Ok(image)
}

/// A fixed-height table cell that paints a solid fill behind its text.
///
/// `genpdf` areas only expose line drawing, so the fill is built from densely
/// stacked horizontal strokes, the same primitive the underline support in the
/// upstream crate uses.
pub struct ShadedCell {
    paragraph: Paragraph,
    fill: Color,
    height: Mm,
}

impl ShadedCell {
    /// Creates a shaded cell with the given text, text style, and fill color.
    pub fn new(text: impl Into<String>, text_style: Style, fill: Color, height: Mm) -> Self {
        let mut paragraph = Paragraph::default();
        paragraph.push_styled(text, text_style);
        Self {
            paragraph,
            fill,
            height,
        }
    }

    /// Sets the text alignment and returns the updated cell.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.paragraph.set_alignment(alignment);
        self
    }

    fn fill_background(&self, area: &render::Area<'_>) {
        let width = area.size().width;
        let line_style = Style::new().with_color(self.fill);
        let height = mm_to_f64(self.height);
        let mut y = 0.0;
        while y <= height {
            area.draw_line(
                vec![
                    Position::new(0, mm_from_f64(y)),
                    Position::new(width, mm_from_f64(y)),
                ],
                line_style,
            );
            y += FILL_STRIDE_MM;
        }
    }
}

impl Element for ShadedCell {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        if self.height > area.size().height {
            let mut result = RenderResult::default();
            result.has_more = true;
            return Ok(result);
        }

        self.fill_background(&area);

        area.add_offset(Position::new(0, mm_from_f64(CELL_TEXT_PADDING_MM)));
        let text_result = self.paragraph.render(context, area, style)?;

        let mut result = RenderResult::default();
        result.size = Size::new(text_result.size.width, self.height);
        result.has_more = text_result.has_more;
        Ok(result)
    }
}

/// A full-width horizontal bar with a solid fill, used as the header divider.
pub struct DividerBar {
    fill: Color,
    height: Mm,
}

impl DividerBar {
    /// Creates a divider bar with the given fill color and height.
    pub fn new(fill: Color, height: Mm) -> Self {
        Self { fill, height }
    }
}

impl Element for DividerBar {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        if self.height > area.size().height {
            let mut result = RenderResult::default();
            result.has_more = true;
            return Ok(result);
        }

        let width = area.size().width;
        let line_style = Style::new().with_color(self.fill);
        let height = mm_to_f64(self.height);
        let mut y = 0.0;
        while y <= height {
            area.draw_line(
                vec![
                    Position::new(0, mm_from_f64(y)),
                    Position::new(width, mm_from_f64(y)),
                ],
                line_style,
            );
            y += FILL_STRIDE_MM;
        }

        let mut result = RenderResult::default();
        result.size = Size::new(width, self.height);
        Ok(result)
    }
}
