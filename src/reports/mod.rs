//! Exportable report documents: CSV files for spreadsheets and printable
//! PDF sheets. The row sources live in the service layer; these modules
//! only render.

pub mod csv;
pub mod pdf;
