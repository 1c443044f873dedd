//! Draws a [`CardLayout`] onto A4 pages with printpdf.

use chrono::{NaiveDate, NaiveTime};
use printpdf::{
    Color, IndirectFontRef, Line, Mm, OffsetDateTime, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use super::fonts::{CardFonts, FontPair};
use super::layout::{Block, CardLayout, Table};
use crate::errors::AppError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const CONTENT_WIDTH: f32 = 150.0;
const CONTENT_LEFT: f32 = (PAGE_WIDTH - CONTENT_WIDTH) / 2.0;

const TITLE_SIZE: f32 = 18.0;
const REGISTRY_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;

const LINE_HEIGHT: f32 = 5.0;
const CELL_PADDING: f32 = 2.0;
const PT_TO_MM: f32 = 0.3528;
/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_EM: f32 = 0.5;

const TITLE_COLOR: (u8, u8, u8) = (0x1e, 0x3a, 0x8a);
const HEADING_COLOR: (u8, u8, u8) = (0x25, 0x63, 0xeb);
const REGISTRY_COLOR: (u8, u8, u8) = (0xdc, 0x26, 0x26);
const GRID_COLOR: (u8, u8, u8) = (0x80, 0x80, 0x80);
const TEXT_COLOR: (u8, u8, u8) = (0, 0, 0);

/// Length of each entry in the trailer `/ID` pair.
const TRAILER_ID_LEN: usize = 32;

/// Render a layout into PDF bytes.
///
/// The document id and all metadata dates come from `document_id` and
/// `stamp_date`, so equal inputs produce equal bytes.
pub fn render_layout(
    layout: &CardLayout,
    fonts: &CardFonts,
    title: &str,
    document_id: &str,
    stamp_date: NaiveDate,
) -> Result<Vec<u8>, AppError> {
    let stamp = midnight_utc(stamp_date)?;
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Card");
    let doc = doc
        .with_document_id(document_id.to_string())
        .with_creation_date(stamp)
        .with_mod_date(stamp)
        .with_metadata_date(stamp);
    let fonts = fonts.register(&doc)?;
    let first_layer = doc.get_page(page).get_layer(layer);

    {
        let mut writer = PageWriter {
            doc: &doc,
            layer: first_layer,
            fonts: &fonts,
            cursor: PAGE_HEIGHT - MARGIN_TOP,
            pages: 1,
        };

        for block in &layout.blocks {
            writer.block(block);
        }
    }

    let mut bytes = doc.save_to_bytes()?;
    pin_trailer_id(&mut bytes, document_id);
    Ok(bytes)
}

fn midnight_utc(date: NaiveDate) -> Result<OffsetDateTime, AppError> {
    let seconds = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| AppError::Render(format!("Invalid card date {}: {}", date, e)))
}

/// printpdf fills the trailer `/ID` pair with random strings at save time.
/// Overwrite both in place with a value derived from `document_id`; the
/// length is unchanged so the cross-reference offsets stay valid.
fn pin_trailer_id(bytes: &mut [u8], document_id: &str) {
    let Some(mut pos) = bytes.windows(3).rposition(|w| w == b"/ID").map(|i| i + 3) else {
        tracing::warn!("PDF trailer has no /ID entry");
        return;
    };

    let pinned = trailer_id(document_id);
    for _ in 0..2 {
        let Some(open) = bytes[pos..].iter().position(|&b| b == b'(').map(|i| pos + i) else {
            return;
        };
        let Some(close) = bytes[open..].iter().position(|&b| b == b')').map(|i| open + i) else {
            return;
        };
        if close - open - 1 == TRAILER_ID_LEN {
            bytes[open + 1..close].copy_from_slice(pinned.as_bytes());
        }
        pos = close + 1;
    }
}

fn trailer_id(document_id: &str) -> String {
    let plain: String = document_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    format!("{:0<width$.width$}", plain, width = TRAILER_ID_LEN)
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: &'a FontPair,
    /// Distance of the next free line from the bottom edge, in mm.
    cursor: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn block(&mut self, block: &Block) {
        match block {
            Block::Title(text) => {
                self.ensure_space(9.0);
                self.centered(text, TITLE_SIZE, TITLE_COLOR);
                self.cursor -= 9.0;
            }
            Block::RegistryNumber(text) => {
                self.ensure_space(7.0);
                self.centered(text, REGISTRY_SIZE, REGISTRY_COLOR);
                self.cursor -= 7.0;
            }
            Block::Heading(text) => {
                // Keep a heading on the same page as the first row below it.
                self.ensure_space(8.0 + LINE_HEIGHT + 2.0 * CELL_PADDING);
                self.cursor -= 2.0;
                let baseline = self.cursor - HEADING_SIZE * PT_TO_MM;
                self.text(text, HEADING_SIZE, CONTENT_LEFT, baseline, true, HEADING_COLOR);
                self.cursor -= 6.0;
            }
            Block::Table(table) => self.table(table),
            Block::Paragraph(text) => {
                let max_chars = chars_per_width(CONTENT_WIDTH, BODY_SIZE);
                for line in wrap_text(text, max_chars) {
                    self.ensure_space(LINE_HEIGHT);
                    let baseline = self.cursor - BODY_SIZE * PT_TO_MM;
                    self.text(&line, BODY_SIZE, CONTENT_LEFT, baseline, false, TEXT_COLOR);
                    self.cursor -= LINE_HEIGHT;
                }
            }
            Block::Spacer(mm) => {
                self.cursor -= *mm;
                if self.cursor < MARGIN_BOTTOM {
                    self.new_page();
                }
            }
            Block::PageBreak => self.new_page(),
        }
    }

    fn table(&mut self, table: &Table) {
        let [label_width, value_width] = table.column_widths;
        let left = (PAGE_WIDTH - label_width - value_width) / 2.0;
        let label_chars = chars_per_width(label_width - 2.0 * CELL_PADDING, BODY_SIZE);
        let value_chars = chars_per_width(value_width - 2.0 * CELL_PADDING, BODY_SIZE);

        for (label, value) in &table.rows {
            let label_lines = wrap_text(label, label_chars);
            let value_lines = wrap_text(value, value_chars);
            let line_count = label_lines.len().max(value_lines.len()).max(1);
            let height = line_count as f32 * LINE_HEIGHT + 2.0 * CELL_PADDING;

            self.ensure_space(height);
            let top = self.cursor;
            let bottom = top - height;

            self.rectangle(left, bottom, label_width, height);
            self.rectangle(left + label_width, bottom, value_width, height);

            let first_baseline = top - CELL_PADDING - BODY_SIZE * PT_TO_MM;
            for (i, line) in label_lines.iter().enumerate() {
                let y = first_baseline - i as f32 * LINE_HEIGHT;
                self.text(line, BODY_SIZE, left + CELL_PADDING, y, true, TEXT_COLOR);
            }
            for (i, line) in value_lines.iter().enumerate() {
                let y = first_baseline - i as f32 * LINE_HEIGHT;
                let x = left + label_width + CELL_PADDING;
                self.text(line, BODY_SIZE, x, y, false, TEXT_COLOR);
            }

            self.cursor = bottom;
        }
    }

    fn ensure_space(&mut self, height: f32) {
        if self.cursor - height < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Card page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = PAGE_HEIGHT - MARGIN_TOP;
    }

    fn centered(&self, text: &str, size: f32, color: (u8, u8, u8)) {
        let width = text_width(text, size);
        let x = ((PAGE_WIDTH - width) / 2.0).max(CONTENT_LEFT / 2.0);
        let baseline = self.cursor - size * PT_TO_MM;
        self.text(text, size, x, baseline, true, color);
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool, color: (u8, u8, u8)) {
        let font: &IndirectFontRef = if bold {
            &self.fonts.bold
        } else {
            &self.fonts.regular
        };
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    fn rectangle(&self, x: f32, y: f32, width: f32, height: f32) {
        self.layer.set_outline_color(rgb(GRID_COLOR));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Mm(y)), false),
                (Point::new(Mm(x + width), Mm(y)), false),
                (Point::new(Mm(x + width), Mm(y + height)), false),
                (Point::new(Mm(x), Mm(y + height)), false),
            ],
            is_closed: true,
        });
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH_EM * PT_TO_MM
}

fn chars_per_width(width: f32, size: f32) -> usize {
    ((width / (size * GLYPH_WIDTH_EM * PT_TO_MM)) as usize).max(1)
}

/// Greedy word wrap on character counts. Words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        if current_len > 0 || lines.is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
