mod errors;
mod importer;
mod report;
mod sync_service;

pub use errors::{ImportError, SaleError};
pub use importer::SalesImporter;
pub use report::{ImportDetail, ImportOutcome, ImportReport};
pub use sync_service::SyncService;
