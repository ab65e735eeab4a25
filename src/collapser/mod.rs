mod duplicate_collapser;
mod errors;
mod report;
mod transactions;
mod wallets;

pub use duplicate_collapser::DuplicateCollapser;
pub use errors::CollapseError;
pub use report::{CleanupAction, CleanupDetail, CleanupReport, GroupingKey};
