pub mod lock_discovery;
pub mod preview;
pub mod validation_service;

pub use lock_discovery::{LockCheck, LockDiscovery};
pub use preview::{Preview, PreviewError, PreviewRenderer};
pub use validation_service::{ValidationOutcome, ValidationService};
