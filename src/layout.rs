//! Fixed one-page catalogue layout.
//!
//! Composition walks a vertical cursor down an A4 page and records every draw into a
//! [`PageLayout`]. Positions are PDF points measured from the bottom-left corner. Each section
//! advances the cursor by a fixed amount, so a missing image or an empty field never shifts the
//! sections below it.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::builder::{PageLayout, Rect, Rgb, Stroke};
use crate::elements::{fit_within, EmbeddedImage};
use crate::fonts::Face;
use crate::model::{ShapedOffice, ShapedProduct};
use crate::text::{
    collapse_whitespace, contact_line, or_placeholder, sanitize, strip_scheme, truncate_to_width,
    wrap_words,
};

pub const MARGIN: f64 = 42.0;
pub const CONTENT_WIDTH: f64 = crate::builder::A4_WIDTH - 2.0 * MARGIN;
/// Description lines are only drawn at or above this baseline.
pub const FOOTER_BOUNDARY: f64 = 110.0;

const TITLE_BASELINE_DROP: f64 = 60.0;
const LOGO_SIZE: f64 = 44.0;
const BRAND_SIZE: f64 = 16.0;

pub const MAIN_PANEL_HEIGHT: f64 = 184.0;
const SIDE_PANEL_HEIGHT: f64 = 88.0;
const PANEL_GAP: f64 = 16.0;
const GALLERY_ADVANCE: f64 = MAIN_PANEL_HEIGHT + 24.0;

const TITLE_BAR_HEIGHT: f64 = 28.0;
const TABLE_ROW_HEIGHT: f64 = 24.0;
const SPEC_ROW_PITCH: f64 = 20.0;
const SPEC_COLUMN_GAP: f64 = 18.0;
const SPEC_VALUE_OFFSET: f64 = 64.0;
const BODY_SIZE: f64 = 11.0;
const BODY_LINE_HEIGHT: f64 = 14.0;
const FOOTER_BASE: f64 = 34.0;

pub const NO_IMAGES_TEXT: &str = "No images available";
pub const IMAGE_FAILED_TEXT: &str = "Image failed to load";
pub const THANK_YOU_TEXT: &str = "Thank you for your interest in our products!";

pub const BLUE: Rgb = Rgb::new(0.173, 0.298, 0.592);
pub const GOLD: Rgb = Rgb::new(0.839, 0.655, 0.294);
pub const INK: Rgb = Rgb::new(0.06, 0.09, 0.13);
pub const INK_MUTED: Rgb = Rgb::new(0.28, 0.33, 0.40);
pub const DATE_TONE: Rgb = Rgb::new(0.53, 0.58, 0.67);
pub const RULE: Rgb = Rgb::new(0.88, 0.90, 0.93);
pub const PANEL: Rgb = Rgb::new(0.97, 0.98, 0.99);
pub const BORDER: Rgb = Rgb::new(0.90, 0.92, 0.94);
pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

const PANEL_BORDER: Stroke = Stroke {
    color: BORDER,
    width: 1.0,
};
const TABLE_RULE: Stroke = Stroke {
    color: RULE,
    width: 0.6,
};

/// Everything the page shows, already fetched and decoded.
#[derive(Clone, Debug)]
pub struct PageContent {
    pub product: ShapedProduct,
    pub office: ShapedOffice,
    pub logo: Option<Arc<EmbeddedImage>>,
    /// One slot per candidate image URL, `None` where the image could not be embedded. An empty
    /// list means the product has no usable image URLs at all.
    pub gallery: Vec<Option<Arc<EmbeddedImage>>>,
    pub date: NaiveDate,
}

/// Lays out the catalogue page for `content`.
pub fn compose(content: &PageContent) -> PageLayout {
    let mut composer = Composer {
        page: PageLayout::a4(),
        y: 0.0,
    };
    composer.header(content);
    composer.gallery(&content.gallery);
    composer.title_bar(&content.product);
    composer.measurements(&content.product);
    composer.specifications(&content.product);
    composer.description(&content.product.description);
    composer.footer(&content.office, content.date);
    composer.page
}

/// Date printed in the footer, e.g. `09 Mar 2024`.
pub fn footer_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

struct Composer {
    page: PageLayout,
    y: f64,
}

impl Composer {
    fn measure(face: Face, size: f64) -> impl Fn(&str) -> f64 {
        move |text: &str| face.text_width(text, size)
    }

    fn centered(&mut self, text: &str, y: f64, size: f64, face: Face, color: Rgb) {
        let x = MARGIN + (CONTENT_WIDTH - face.text_width(text, size)) / 2.0;
        self.page.text(text, x, y, size, face, color);
    }

    fn panel(&mut self, frame: Rect) {
        self.page.rect(frame, Some(PANEL), Some(PANEL_BORDER));
    }

    fn place_image(&mut self, image: &Arc<EmbeddedImage>, panel: Rect) {
        let (width, height) = image.dimensions();
        if let Some(frame) = fit_within(width, height, panel) {
            self.page.image(Arc::clone(image), frame);
        }
    }

    fn header(&mut self, content: &PageContent) {
        let top = self.page.height;
        if let Some(logo) = &content.logo {
            let frame = Rect::new(MARGIN - 10.0, top - 62.0, LOGO_SIZE, LOGO_SIZE);
            self.page.image(Arc::clone(logo), frame);
        }

        let brand = sanitize(&sanitize(&content.office.company_name).to_uppercase());
        let title_y = top - TITLE_BASELINE_DROP;
        let x = (self.page.width - Face::Bold.text_width(&brand, BRAND_SIZE)) / 2.0;
        self.page.text(brand, x, title_y, BRAND_SIZE, Face::Bold, BLUE);

        let bar_y = title_y - 12.0;
        let width = self.page.width;
        self.page.rect(Rect::new(0.0, bar_y, width, 4.0), Some(BLUE), None);
        self.page.rect(Rect::new(0.0, bar_y - 6.0, width, 6.0), Some(GOLD), None);
        self.y = bar_y - 20.0;
    }

    fn gallery(&mut self, slots: &[Option<Arc<EmbeddedImage>>]) {
        let y = self.y;
        if slots.is_empty() {
            self.panel(Rect::new(MARGIN, y - MAIN_PANEL_HEIGHT, CONTENT_WIDTH, MAIN_PANEL_HEIGHT));
            self.page.text(
                NO_IMAGES_TEXT,
                MARGIN + 12.0,
                y - MAIN_PANEL_HEIGHT / 2.0,
                12.0,
                Face::Regular,
                INK_MUTED,
            );
            self.y -= GALLERY_ADVANCE;
            return;
        }

        let main_width = CONTENT_WIDTH * 0.6;
        let main = Rect::new(MARGIN, y - MAIN_PANEL_HEIGHT, main_width, MAIN_PANEL_HEIGHT);
        self.panel(main);
        match slots.first().and_then(Option::as_ref) {
            Some(image) => self.place_image(image, main),
            None => self.page.text(
                IMAGE_FAILED_TEXT,
                MARGIN + 12.0,
                y - 16.0,
                10.0,
                Face::Regular,
                INK_MUTED,
            ),
        }

        let side_x = MARGIN + main_width + PANEL_GAP;
        let side_width = CONTENT_WIDTH * 0.4 - PANEL_GAP;
        for index in 0..2 {
            let top = y - index as f64 * (SIDE_PANEL_HEIGHT + PANEL_GAP);
            let side = Rect::new(side_x, top - SIDE_PANEL_HEIGHT, side_width, SIDE_PANEL_HEIGHT);
            self.panel(side);
            if let Some(image) = slots.get(index + 1).and_then(Option::as_ref) {
                self.place_image(image, side);
            }
        }
        self.y -= GALLERY_ADVANCE;
    }

    fn title_bar(&mut self, product: &ShapedProduct) {
        let y = self.y;
        let baseline = y - TITLE_BAR_HEIGHT + 8.0;
        self.page.rect(
            Rect::new(MARGIN, y - TITLE_BAR_HEIGHT, CONTENT_WIDTH, TITLE_BAR_HEIGHT),
            Some(BLUE),
            None,
        );

        let sku = sanitize(&product.sku);
        let bar_room = CONTENT_WIDTH - 24.0;
        let mut name_room = bar_room;
        if !sku.trim().is_empty() {
            // The SKU never takes more than half the bar so the name keeps the rest.
            let label = truncate_to_width(
                &format!("SKU: {}", sku.trim()),
                bar_room / 2.0,
                Self::measure(Face::Regular, 12.0),
            );
            let width = Face::Regular.text_width(&label, 12.0);
            let x = MARGIN + CONTENT_WIDTH - width - 12.0;
            self.page.text(label, x, baseline, 12.0, Face::Regular, WHITE);
            name_room = (bar_room - width - 12.0).max(bar_room / 2.0 - 12.0);
        }

        let name = or_placeholder(&product.name);
        let name = truncate_to_width(&name, name_room, Self::measure(Face::Bold, 16.0));
        self.page.text(name, MARGIN + 12.0, baseline, 16.0, Face::Bold, WHITE);
        self.y -= TITLE_BAR_HEIGHT + 18.0;
    }

    fn measurements(&mut self, product: &ShapedProduct) {
        let y = self.y;
        let table_width = CONTENT_WIDTH * 0.8;
        let column_width = table_width / 4.0;
        let table_x = MARGIN + (CONTENT_WIDTH - table_width) / 2.0;
        let height = 2.0 * TABLE_ROW_HEIGHT;

        self.page.rect(
            Rect::new(table_x, y - height, table_width, height),
            Some(WHITE),
            Some(PANEL_BORDER),
        );
        for column in 1..4 {
            let x = table_x + column as f64 * column_width;
            self.page.line((x, y), (x, y - height), TABLE_RULE);
        }
        self.page.line(
            (table_x, y - TABLE_ROW_HEIGHT),
            (table_x + table_width, y - TABLE_ROW_HEIGHT),
            TABLE_RULE,
        );

        let cells = [
            ("GSM", &product.gsm),
            ("OZ", &product.oz),
            ("CM", &product.cm),
            ("INCH", &product.inch),
        ];
        for (column, (label, value)) in cells.into_iter().enumerate() {
            let x = table_x + column as f64 * column_width + 6.0;
            self.page.text(label, x, y - 16.0, 12.0, Face::Bold, INK_MUTED);
            let value = truncate_to_width(
                &or_placeholder(value),
                column_width - 12.0,
                Self::measure(Face::Regular, 12.0),
            );
            self.page
                .text(value, x, y - TABLE_ROW_HEIGHT - 16.0, 12.0, Face::Regular, INK);
        }
        self.y -= height + 20.0;
    }

    fn specifications(&mut self, product: &ShapedProduct) {
        self.page.text(
            "Product Specifications:",
            MARGIN,
            self.y,
            12.0,
            Face::Bold,
            BLUE,
        );
        self.y -= 16.0;

        let specs = [
            ("Content", &product.content),
            ("Design", &product.design),
            ("Finish", &product.finish),
            ("Structure", &product.structure),
            ("Colors", &product.colors),
        ];
        let half = (CONTENT_WIDTH - SPEC_COLUMN_GAP) / 2.0;
        let first_row_y = self.y;
        let row_y = |index: usize| first_row_y - (index / 2) as f64 * SPEC_ROW_PITCH;
        let last_row_y = row_y(specs.len() - 1);
        for (index, (label, value)) in specs.iter().enumerate() {
            let x = if index % 2 == 0 {
                MARGIN
            } else {
                MARGIN + half + SPEC_COLUMN_GAP
            };
            let y = row_y(index);
            self.page
                .text(format!("{label}:"), x, y, BODY_SIZE, Face::Bold, INK_MUTED);
            let value = truncate_to_width(
                &or_placeholder(value),
                half - SPEC_VALUE_OFFSET,
                Self::measure(Face::Regular, BODY_SIZE),
            );
            self.page
                .text(value, x + SPEC_VALUE_OFFSET, y, BODY_SIZE, Face::Regular, INK);
        }
        self.y = last_row_y - 26.0;
    }

    fn description(&mut self, raw: &str) {
        let text = collapse_whitespace(&sanitize(raw));
        if text.is_empty() {
            return;
        }
        self.page
            .text("Description:", MARGIN, self.y, 12.0, Face::Bold, BLUE);
        self.y -= 16.0;

        for line in wrap_words(&text, CONTENT_WIDTH, Self::measure(Face::Regular, BODY_SIZE)) {
            if self.y < FOOTER_BOUNDARY {
                break;
            }
            self.page
                .text(line, MARGIN, self.y, BODY_SIZE, Face::Regular, INK);
            self.y -= BODY_LINE_HEIGHT;
        }
    }

    fn footer(&mut self, office: &ShapedOffice, date: NaiveDate) {
        let fit = |text: String| truncate_to_width(&text, CONTENT_WIDTH, Self::measure(Face::Regular, 10.0));

        let address = sanitize(&office.address);
        if !address.trim().is_empty() {
            self.page.text(
                fit(address.trim().to_string()),
                MARGIN,
                FOOTER_BASE + 44.0,
                10.0,
                Face::Regular,
                INK_MUTED,
            );
        }

        let contacts = contact_line(office);
        if !contacts.is_empty() {
            self.page.text(
                fit(contacts),
                MARGIN,
                FOOTER_BASE + 28.0,
                10.0,
                Face::Regular,
                INK_MUTED,
            );
        }

        let website = strip_scheme(&sanitize(&office.website));
        if !website.is_empty() {
            self.page.text(
                fit(format!("Website: {website}")),
                MARGIN,
                FOOTER_BASE + 12.0,
                10.0,
                Face::Regular,
                INK_MUTED,
            );
        }

        self.centered(THANK_YOU_TEXT, FOOTER_BASE - 4.0, 10.0, Face::Regular, INK_MUTED);
        self.centered(&footer_date(date), FOOTER_BASE - 18.0, 8.0, Face::Regular, DATE_TONE);
    }
}
