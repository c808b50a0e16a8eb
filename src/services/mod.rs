pub mod categories;
pub mod lots;
pub mod price_lists;
pub mod products;
pub mod reports;
pub mod suppliers;

pub use categories::CategoryService;
pub use lots::LotService;
pub use price_lists::PriceListService;
pub use products::ProductService;
pub use reports::ReportService;
pub use suppliers::SupplierService;

use crate::errors::ServiceError;
use sea_orm::TransactionError;

/// Flattens sea-orm's transaction error wrapper back into our taxonomy.
pub(crate) fn unwrap_txn_err(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}
