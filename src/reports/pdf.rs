//! PDF report writers built on printpdf's builtin Helvetica fonts.
//!
//! Every sheet is portrait A4 with 2 cm side margins. Rows are emitted top
//! to bottom with a fixed line height; when the cursor reaches the bottom
//! margin a new page is started and the column header is re-emitted.

use crate::{
    common::single_line,
    entities::price_list,
    errors::ServiceError,
    services::{price_lists::PriceListExportRow, reports::ExpiringLotRow},
};
use chrono::Local;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use tracing::instrument;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BOTTOM_MARGIN: f32 = 30.0;
const LINE_HEIGHT: f32 = 6.0;

const TITLE_SIZE: f32 = 16.0;
const HEADER_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;

const PRODUCT_CLIP: usize = 40;
const LOT_CLIP: usize = 12;

/// A4 sheet with a top-down text cursor.
struct PdfSheet {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfSheet {
    fn new(title: &str) -> Result<Self, ServiceError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ServiceError::ReportError(format!("PDF font error: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ServiceError::ReportError(format!("PDF font error: {}", e)))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn text(&self, x: f32, size: f32, bold: bool, text: &str) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }

    fn needs_break(&self) -> bool {
        self.y < BOTTOM_MARGIN
    }

    fn break_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn finish(self) -> Result<Vec<u8>, ServiceError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ServiceError::ReportError(format!("PDF save error: {}", e)))
    }
}

fn generated_line() -> String {
    format!("Generato il {}", Local::now().format("%d/%m/%Y %H:%M"))
}

fn price_list_header(sheet: &PdfSheet) {
    sheet.text(MARGIN, HEADER_SIZE, true, "SKU");
    sheet.text(60.0, HEADER_SIZE, true, "Prodotto");
    sheet.text(150.0, HEADER_SIZE, true, "Prezzo");
}

fn price_list_title(list: &price_list::Model) -> String {
    format!(
        "Listino: {} \u{2022} {} ({})",
        list.name, list.channel, list.currency
    )
}

/// Printable price list: one row per item, sorted by product name
/// (case-insensitive).
#[instrument(skip(list, rows))]
pub fn price_list_pdf(
    list: &price_list::Model,
    rows: &[PriceListExportRow],
) -> Result<Vec<u8>, ServiceError> {
    let title = price_list_title(list);
    let mut sheet = PdfSheet::new(&title)?;

    let mut rows: Vec<&PriceListExportRow> = rows.iter().collect();
    rows.sort_by_key(|r| r.product_name.to_lowercase());

    sheet.text(MARGIN, TITLE_SIZE, true, &title);
    sheet.advance(7.0);
    sheet.text(MARGIN, BODY_SIZE, false, &generated_line());
    sheet.advance(8.0);
    price_list_header(&sheet);
    sheet.advance(5.0);

    for row in rows {
        if sheet.needs_break() {
            sheet.break_page();
            price_list_header(&sheet);
            sheet.advance(5.0);
        }
        sheet.text(MARGIN, BODY_SIZE, false, &row.sku);
        sheet.text(60.0, BODY_SIZE, false, &row.product_name);
        sheet.text(
            150.0,
            BODY_SIZE,
            false,
            &format!("{:.2} {}", row.price, list.currency),
        );
        sheet.advance(LINE_HEIGHT);
    }

    sheet.finish()
}

fn expiring_header(sheet: &PdfSheet) {
    sheet.text(MARGIN, HEADER_SIZE, true, "Scadenza");
    sheet.text(50.0, HEADER_SIZE, true, "Prodotto (SKU)");
    sheet.text(110.0, HEADER_SIZE, true, "Lotto");
    sheet.text(175.0, HEADER_SIZE, true, "Q.tà");
}

/// Printable expiring-lots report with the active filters in the subtitle.
#[instrument(skip(rows))]
pub fn expiring_pdf(
    days: i64,
    category: Option<&str>,
    supplier: Option<&str>,
    rows: &[ExpiringLotRow],
) -> Result<Vec<u8>, ServiceError> {
    let title = format!("Report Scadenze (entro {} giorni)", days);
    let mut sheet = PdfSheet::new(&title)?;

    sheet.text(MARGIN, TITLE_SIZE, true, &title);
    sheet.advance(7.0);
    let filters = format!(
        "Categoria: {} / Fornitore: {}",
        category.filter(|c| !c.is_empty()).unwrap_or("tutte"),
        supplier.filter(|s| !s.is_empty()).unwrap_or("tutti"),
    );
    sheet.text(MARGIN, BODY_SIZE, false, &filters);
    sheet.advance(5.0);
    sheet.text(MARGIN, BODY_SIZE, false, &generated_line());
    sheet.advance(10.0);
    expiring_header(&sheet);
    sheet.advance(5.0);

    for row in rows {
        if sheet.needs_break() {
            sheet.break_page();
            expiring_header(&sheet);
            sheet.advance(5.0);
        }
        sheet.text(
            MARGIN,
            BODY_SIZE,
            false,
            &row.expiry_date.format("%d/%m/%Y").to_string(),
        );
        let product = format!("{} ({})", row.product_name, row.sku);
        sheet.text(50.0, BODY_SIZE, false, &single_line(&product, PRODUCT_CLIP));
        sheet.text(110.0, BODY_SIZE, false, &single_line(&row.lot_code, LOT_CLIP));
        sheet.text(175.0, BODY_SIZE, false, &row.qty.to_string());
        sheet.advance(LINE_HEIGHT);
    }

    sheet.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn price_list_title_names_channel_and_currency() {
        let list = price_list::Model {
            id: 1,
            name: "Listino Base".to_string(),
            channel: "B2B".to_string(),
            currency: "EUR".to_string(),
            notes: None,
        };
        assert_eq!(price_list_title(&list), "Listino: Listino Base • B2B (EUR)");
    }

    #[test]
    fn price_list_pdf_produces_document() {
        let list = price_list::Model {
            id: 1,
            name: "Listino Base".to_string(),
            channel: "Generale".to_string(),
            currency: "EUR".to_string(),
            notes: None,
        };
        let rows = vec![
            PriceListExportRow {
                sku: "SKU-1".to_string(),
                product_name: "Olio".to_string(),
                price: dec!(12.50),
            },
            PriceListExportRow {
                sku: "SKU-2".to_string(),
                product_name:
                    "Conserva di pomodori pelati San Marzano della Valle del Sarno DOP in latta"
                        .to_string(),
                price: dec!(3.80),
            },
        ];
        let bytes = price_list_pdf(&list, &rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn expiring_pdf_handles_many_rows_across_pages() {
        let rows: Vec<ExpiringLotRow> = (0..120)
            .map(|i| ExpiringLotRow {
                expiry_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                sku: format!("SKU-{}", i),
                product_name: "Olio extravergine di oliva del frantoio".to_string(),
                lot_code: format!("LOTTO-{:04}", i),
                qty: i,
                category: None,
                supplier: None,
            })
            .collect();
        let bytes = expiring_pdf(30, None, Some("Acme"), &rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
