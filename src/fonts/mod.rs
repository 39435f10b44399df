//! Font handling for the catalogue page.
//!
//! The page uses the PDF base-14 Helvetica faces so no font files have to ship with the
//! service. Base-14 fonts carry no metrics inside the PDF, so the advance widths needed for
//! centering, right alignment and word wrap live in the tables below (units of 1/1000 em, from
//! the Adobe font metrics, indexed by Windows-ANSI code point).

use printpdf::{BuiltinFont, IndirectFontRef, PdfDocumentReference};

use crate::error::CatalogueError;

/// Advance used for characters missing from the tables.
const FALLBACK_ADVANCE: u16 = 556;

const EM_DASH_ADVANCE: u16 = 1000;

const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const HELVETICA_BOLD_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// Typeface used for a text run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Regular,
    Bold,
}

impl Face {
    /// The base-14 font backing this face.
    pub fn builtin(self) -> BuiltinFont {
        match self {
            Face::Regular => BuiltinFont::Helvetica,
            Face::Bold => BuiltinFont::HelveticaBold,
        }
    }

    /// Advance width of `ch` in 1/1000 em.
    pub fn advance(self, ch: char) -> u16 {
        let (ascii, latin1) = match self {
            Face::Regular => (&HELVETICA_ASCII, &HELVETICA_LATIN1),
            Face::Bold => (&HELVETICA_BOLD_ASCII, &HELVETICA_BOLD_LATIN1),
        };
        match ch as u32 {
            code @ 0x20..=0x7E => ascii[(code - 0x20) as usize],
            code @ 0xA0..=0xFF => latin1[(code - 0xA0) as usize],
            0x2014 => EM_DASH_ADVANCE,
            _ => FALLBACK_ADVANCE,
        }
    }

    /// Width of `text` set at `size` points, in points.
    pub fn text_width(self, text: &str, size: f64) -> f64 {
        let units: u32 = text.chars().map(|ch| u32::from(self.advance(ch))).sum();
        f64::from(units) * size / 1000.0
    }
}

/// Font handles registered with one PDF document.
pub struct PageFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PageFonts {
    pub fn get(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
        }
    }
}

/// Adds both Helvetica faces to `document` and returns their handles.
pub fn install_page_fonts(document: &PdfDocumentReference) -> Result<PageFonts, CatalogueError> {
    let load = |face: Face| {
        document.add_builtin_font(face.builtin()).map_err(|err| {
            CatalogueError::Pdf(format!("failed to register builtin font {face:?}: {err:?}"))
        })
    };
    Ok(PageFonts {
        regular: load(Face::Regular)?,
        bold: load(Face::Bold)?,
    })
}
