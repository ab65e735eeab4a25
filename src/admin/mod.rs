mod errors;
mod maintenance;
mod notifier;
mod operator;

pub use errors::{AdminError, NotifyError};
pub use maintenance::{MaintenanceJob, MaintenanceReport};
pub use notifier::{Notifier, TracingNotifier};
pub use operator::{Operator, Role};
