// Page builder: accumulates drawing operations on a printpdf document and
// is finalized once into an immutable byte buffer. The cursor runs top to
// bottom; sections either fit on the current page or explicitly request a
// new one.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use crate::core::{AppError, Result};

// A4 portrait
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;

pub const RGB_TEXT: (u8, u8, u8) = (40, 40, 40);
pub const RGB_MUTED: (u8, u8, u8) = (110, 110, 110);
pub const RGB_RULE: (u8, u8, u8) = (170, 170, 170);
pub const RGB_ACCENT: (u8, u8, u8) = (30, 60, 120);

fn rgb(color: (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
        None,
    ))
}

/// Accumulates drawing ops; `finalize` produces the PDF bytes exactly once
pub struct PageBuilder {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    /// Cursor in millimetres from the page bottom
    cursor_y: f32,
    pages: usize,
}

impl PageBuilder {
    pub fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::composition(format!("Font load failed: {}", e)))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::composition(format!("Font load failed: {}", e)))?;

        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            font,
            font_bold,
            cursor_y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    pub fn content_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    pub fn left(&self) -> f32 {
        MARGIN
    }

    pub fn right(&self) -> f32 {
        PAGE_WIDTH - MARGIN
    }

    /// Current cursor height above the page bottom
    pub fn cursor(&self) -> f32 {
        self.cursor_y
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Vertical space left above the bottom margin
    pub fn remaining(&self) -> f32 {
        self.cursor_y - MARGIN
    }

    pub fn advance(&mut self, dy: f32) {
        self.cursor_y -= dy;
    }

    /// Start a fresh page; used when a whole section requests one
    pub fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("content{}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor_y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    /// Break to a new page when fewer than `height` millimetres remain.
    /// Keeps long tables flowing; it is not used for the footer.
    pub fn ensure_space(&mut self, height: f32) {
        if self.remaining() < height {
            self.new_page();
        }
    }

    pub fn text(&self, content: &str, x: f32, y: f32, size: f32, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(content, size, Mm(x), Mm(y), &self.font);
    }

    pub fn text_bold(&self, content: &str, x: f32, y: f32, size: f32, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb(color));
        self.layer
            .use_text(content, size, Mm(x), Mm(y), &self.font_bold);
    }

    /// Right-align text so it ends at `x_end`
    pub fn text_right(
        &self,
        content: &str,
        x_end: f32,
        y: f32,
        size: f32,
        bold: bool,
        color: (u8, u8, u8),
    ) {
        let x = x_end - super::text::text_width(content, size);
        if bold {
            self.text_bold(content, x, y, size, color);
        } else {
            self.text(content, x, y, size, color);
        }
    }

    pub fn hline(&self, x1: f32, x2: f32, y: f32, thickness: f32, color: (u8, u8, u8)) {
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(thickness);

        let line = Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y)), false),
                (Point::new(Mm(x2), Mm(y)), false),
            ],
            is_closed: false,
        };
        self.layer.add_line(line);
    }

    /// Finalize into the output byte buffer. Consumes the builder; a
    /// document is produced exactly once.
    pub fn finalize(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| AppError::composition(format!("PDF serialization failed: {}", e)))
    }
}
