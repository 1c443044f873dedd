//! Card fonts: DejaVu Sans when available, the built-in Helvetica family otherwise.

use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, PdfDocumentReference};

use crate::errors::AppError;

pub const REGULAR_FILE: &str = "DejaVuSans.ttf";
pub const BOLD_FILE: &str = "DejaVuSans-Bold.ttf";

/// Font sources loaded once at startup.
#[derive(Debug, Clone)]
pub enum CardFonts {
    Embedded { regular: Vec<u8>, bold: Vec<u8> },
    Builtin,
}

/// Fonts registered in one document.
pub struct FontPair {
    pub regular: IndirectFontRef,
    pub bold: IndirectFontRef,
}

impl CardFonts {
    /// Read the DejaVu pair from `dir`. A missing file is not an error.
    pub fn load(dir: &Path) -> Self {
        let read = |name: &str| match std::fs::read(dir.join(name)) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(
                    "Card font {} unavailable ({}), using built-in fonts",
                    dir.join(name).display(),
                    e
                );
                None
            }
        };

        match (read(REGULAR_FILE), read(BOLD_FILE)) {
            (Some(regular), Some(bold)) => {
                tracing::info!("Loaded card fonts from {}", dir.display());
                CardFonts::Embedded { regular, bold }
            }
            _ => CardFonts::Builtin,
        }
    }

    /// Add the fonts to a document, falling back to Helvetica if the
    /// embedded files cannot be parsed.
    pub fn register(&self, doc: &PdfDocumentReference) -> Result<FontPair, AppError> {
        if let CardFonts::Embedded { regular, bold } = self {
            match (
                doc.add_external_font(regular.as_slice()),
                doc.add_external_font(bold.as_slice()),
            ) {
                (Ok(regular), Ok(bold)) => return Ok(FontPair { regular, bold }),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!("Card fonts could not be parsed ({:?}), using built-in fonts", e);
                }
            }
        }

        Ok(FontPair {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        })
    }
}
