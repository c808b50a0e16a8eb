//! CSV report writers. Every export is prefixed with a UTF-8 BOM so that
//! Excel opens accented characters correctly.

use crate::{
    common::single_line,
    entities::price_list,
    errors::ServiceError,
    services::{price_lists::PriceListExportRow, products::ProductExportRow, reports::ExpiringLotRow},
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const NOTES_MAX: usize = 500;

fn writer() -> csv::Writer<Vec<u8>> {
    csv::Writer::from_writer(UTF8_BOM.to_vec())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ServiceError> {
    writer
        .into_inner()
        .map_err(|e| ServiceError::ReportError(format!("CSV buffer error: {}", e)))
}

/// Full products export; the column set round-trips through the importer.
pub fn products_csv(rows: &[ProductExportRow]) -> Result<Vec<u8>, ServiceError> {
    let mut w = writer();
    w.write_record([
        "sku", "name", "category", "supplier", "unit", "vat", "cost", "price", "stock_qty",
        "min_stock", "notes",
    ])
    .map_err(|e| ServiceError::ReportError(format!("CSV write error: {}", e)))?;

    for row in rows {
        w.write_record([
            row.sku.as_str(),
            row.name.as_str(),
            row.category.as_deref().unwrap_or(""),
            row.supplier.as_deref().unwrap_or(""),
            row.unit.as_str(),
            &row.vat.to_string(),
            &row.cost.to_string(),
            &row.price.to_string(),
            &row.stock_qty.to_string(),
            &row.min_stock.to_string(),
            &single_line(row.notes.as_deref().unwrap_or(""), NOTES_MAX),
        ])
        .map_err(|e| ServiceError::ReportError(format!("CSV write error: {}", e)))?;
    }
    finish(w)
}

/// One price list with its rows, repeating the list header columns per row.
pub fn price_list_csv(
    list: &price_list::Model,
    rows: &[PriceListExportRow],
) -> Result<Vec<u8>, ServiceError> {
    let mut w = writer();
    w.write_record(["listino", "canale", "sku", "prodotto", "prezzo", "valuta"])
        .map_err(|e| ServiceError::ReportError(format!("CSV write error: {}", e)))?;

    for row in rows {
        w.write_record([
            list.name.as_str(),
            list.channel.as_str(),
            row.sku.as_str(),
            row.product_name.as_str(),
            &row.price.to_string(),
            list.currency.as_str(),
        ])
        .map_err(|e| ServiceError::ReportError(format!("CSV write error: {}", e)))?;
    }
    finish(w)
}

/// Expiring-lots report rows, dates in ISO format.
pub fn expiring_csv(rows: &[ExpiringLotRow]) -> Result<Vec<u8>, ServiceError> {
    let mut w = writer();
    w.write_record([
        "scadenza",
        "sku",
        "prodotto",
        "lotto",
        "quantita",
        "categoria",
        "fornitore",
    ])
    .map_err(|e| ServiceError::ReportError(format!("CSV write error: {}", e)))?;

    for row in rows {
        w.write_record([
            &row.expiry_date.format("%Y-%m-%d").to_string(),
            row.sku.as_str(),
            row.product_name.as_str(),
            row.lot_code.as_str(),
            &row.qty.to_string(),
            row.category.as_deref().unwrap_or(""),
            row.supplier.as_deref().unwrap_or(""),
        ])
        .map_err(|e| ServiceError::ReportError(format!("CSV write error: {}", e)))?;
    }
    finish(w)
}
