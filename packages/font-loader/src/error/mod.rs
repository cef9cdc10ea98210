pub mod conversions;
pub mod fallback;
pub mod handler;
pub mod report;
pub mod types;

pub use handler::ErrorHandler;
pub use report::{ErrorId, ErrorReport, FontError, RecoveryAction, UserNotification};
pub use types::{ErrorCategory, ErrorSeverity, LoaderError, LoaderResult};
