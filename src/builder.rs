//! Page display lists and their serialization to PDF bytes.
//!
//! Layout code never talks to `printpdf` directly. It records [`DrawOp`]s into a
//! [`PageLayout`] using PDF user-space points with the origin at the bottom-left corner, and
//! [`DocumentBuilder`] replays the list onto a single-page document. Keeping the list around
//! makes every layout decision inspectable in tests.

use std::io::BufWriter;
use std::sync::Arc;

use log::debug;
use printpdf::{
    CustomPdfConformance, Line, Mm, PdfConformance, PdfDocument, PdfLayerReference, Point,
};

use crate::elements::EmbeddedImage;
use crate::error::CatalogueError;
use crate::fonts::{self, Face, PageFonts};

/// Width of an A4 page in points.
pub const A4_WIDTH: f64 = 595.0;
/// Height of an A4 page in points.
pub const A4_HEIGHT: f64 = 842.0;

const MM_PER_POINT: f64 = 25.4 / 72.0;
const IMAGE_DPI: f64 = 72.0;
const LAYER_NAME: &str = "Catalogue";

fn mm(points: f64) -> Mm {
    Mm(points * MM_PER_POINT)
}

/// RGB color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    fn to_pdf(self) -> printpdf::Color {
        printpdf::Color::Rgb(printpdf::Rgb::new(self.r, self.g, self.b, None))
    }
}

/// Axis-aligned rectangle; `(x, y)` is the bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Whether `other` lies entirely inside this rectangle, allowing for rounding noise.
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-6;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.top() <= self.top() + EPS
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub frame: Rect,
    pub fill: Option<Rgb>,
    pub stroke: Option<Stroke>,
}

/// One line of text; `(x, y)` is the start of the baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub face: Face,
    pub color: Rgb,
}

impl TextRun {
    /// Measured width of the run.
    pub fn width(&self) -> f64 {
        self.face.text_width(&self.text, self.size)
    }
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    Rect(Shape),
    Line {
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    },
    Text(TextRun),
    Image {
        image: Arc<EmbeddedImage>,
        frame: Rect,
    },
}

/// Ordered draw operations for a single page.
#[derive(Clone, Debug)]
pub struct PageLayout {
    pub width: f64,
    pub height: f64,
    ops: Vec<DrawOp>,
}

impl PageLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn rect(&mut self, frame: Rect, fill: Option<Rgb>, stroke: Option<Stroke>) {
        self.ops.push(DrawOp::Rect(Shape {
            frame,
            fill,
            stroke,
        }));
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Stroke) {
        self.ops.push(DrawOp::Line { from, to, stroke });
    }

    pub fn text(&mut self, text: impl Into<String>, x: f64, y: f64, size: f64, face: Face, color: Rgb) {
        self.ops.push(DrawOp::Text(TextRun {
            text: text.into(),
            x,
            y,
            size,
            face,
            color,
        }));
    }

    pub fn image(&mut self, image: Arc<EmbeddedImage>, frame: Rect) {
        self.ops.push(DrawOp::Image { image, frame });
    }

    /// All text runs in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            _ => None,
        })
    }

    /// First text run whose content equals `text`.
    pub fn find_text(&self, text: &str) -> Option<&TextRun> {
        self.texts().find(|run| run.text == text)
    }

    /// All rectangles in drawing order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Rect(shape) => Some(shape),
            _ => None,
        })
    }

    /// Frames of all placed images in drawing order.
    pub fn image_frames(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { frame, .. } => Some(*frame),
                _ => None,
            })
            .collect()
    }
}

/// Serializes a [`PageLayout`] into a single-page PDF.
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replays `layout` onto a new document and returns the finished PDF bytes.
    pub fn render(self, layout: &PageLayout) -> Result<Vec<u8>, CatalogueError> {
        let title = self.title.unwrap_or_else(|| "Catalogue".to_string());

        let (document, page, layer) =
            PdfDocument::new(title, mm(layout.width), mm(layout.height), LAYER_NAME);
        let document = document.with_conformance(screen_conformance());
        let fonts = fonts::install_page_fonts(&document)?;
        let layer = document.get_page(page).get_layer(layer);

        for op in layout.ops() {
            draw(&layer, &fonts, op);
        }
        debug!("serializing page with {} draw operations", layout.ops().len());

        let mut writer = BufWriter::new(Vec::new());
        document
            .save(&mut writer)
            .map_err(|err| CatalogueError::Pdf(format!("failed to write document: {err:?}")))?;
        writer
            .into_inner()
            .map_err(|err| CatalogueError::Pdf(err.to_string()))
    }
}

/// Plain on-screen PDF: builtin fonts, no output-intent ICC profile and no XMP packet.
fn screen_conformance() -> PdfConformance {
    PdfConformance::Custom(CustomPdfConformance {
        identifier: "catalogue".to_string(),
        allows_default_fonts: true,
        requires_icc_profile: false,
        requires_xmp_metadata: false,
        ..CustomPdfConformance::default()
    })
}

fn draw(layer: &PdfLayerReference, fonts: &PageFonts, op: &DrawOp) {
    match op {
        DrawOp::Rect(shape) => {
            let Rect {
                x,
                y,
                width,
                height,
            } = shape.frame;
            let corners = [(x, y), (x + width, y), (x + width, y + height), (x, y + height)];
            if let Some(fill) = shape.fill {
                layer.set_fill_color(fill.to_pdf());
            }
            if let Some(stroke) = shape.stroke {
                layer.set_outline_color(stroke.color.to_pdf());
                layer.set_outline_thickness(stroke.width);
            }
            layer.add_shape(Line {
                points: corners
                    .iter()
                    .map(|(px, py)| (Point::new(mm(*px), mm(*py)), false))
                    .collect(),
                is_closed: true,
                has_fill: shape.fill.is_some(),
                has_stroke: shape.stroke.is_some(),
                is_clipping_path: false,
            });
        }
        DrawOp::Line { from, to, stroke } => {
            layer.set_outline_color(stroke.color.to_pdf());
            layer.set_outline_thickness(stroke.width);
            layer.add_shape(Line {
                points: vec![
                    (Point::new(mm(from.0), mm(from.1)), false),
                    (Point::new(mm(to.0), mm(to.1)), false),
                ],
                is_closed: false,
                has_fill: false,
                has_stroke: true,
                is_clipping_path: false,
            });
        }
        DrawOp::Text(run) => {
            layer.set_fill_color(run.color.to_pdf());
            layer.use_text(
                run.text.clone(),
                run.size,
                mm(run.x),
                mm(run.y),
                fonts.get(run.face),
            );
        }
        DrawOp::Image { image, frame } => {
            let (px_width, px_height) = image.dimensions();
            let scale_x = frame.width / f64::from(px_width);
            let scale_y = frame.height / f64::from(px_height);
            printpdf::Image::from_dynamic_image(image.pixels()).add_to_layer(
                layer.clone(),
                Some(mm(frame.x)),
                Some(mm(frame.y)),
                None,
                Some(scale_x),
                Some(scale_y),
                Some(IMAGE_DPI),
            );
        }
    }
}
