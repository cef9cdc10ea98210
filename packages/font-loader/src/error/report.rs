use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::types::{ErrorCategory, ErrorSeverity, LoaderError};

/// Identifier of a recorded [`FontError`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErrorId(pub String);

impl ErrorId {
    pub(crate) fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let suffix: u64 = rand::random::<u64>() & 0xf_ffff_ffff;
        Self(format!("error_{}_{:09x}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A recorded failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontError {
    pub id: ErrorId,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub family: Option<String>,
    pub message: String,
    pub user_message: Option<String>,
    pub recoverable: bool,
    pub retry_count: u32,
    pub timestamp: SystemTime,
}

impl FontError {
    /// Message shown to the user, preferring the friendly one
    pub fn display_message(&self) -> &str {
        self.user_message.as_deref().unwrap_or(&self.message)
    }
}

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(ref family) = self.family {
            write!(f, " (family: {})", family)?;
        }

        if self.retry_count > 0 {
            write!(f, " [retry {}]", self.retry_count)?;
        }

        Ok(())
    }
}

/// Partial error handed to [`crate::ErrorHandler::report`]; unset fields take defaults
#[derive(Debug, Clone, Default)]
pub struct ErrorReport {
    pub category: Option<ErrorCategory>,
    pub severity: Option<ErrorSeverity>,
    pub family: Option<String>,
    pub message: Option<String>,
    pub user_message: Option<String>,
    pub recoverable: Option<bool>,
    pub retry_count: u32,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Report built from a loader failure, carrying its category and recoverability
    pub fn from_loader_error(error: &LoaderError) -> Self {
        Self::new(error.to_string())
            .with_category(error.category())
            .with_recoverable(error.is_recoverable())
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = Some(recoverable);
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub(crate) fn into_error(self, id: ErrorId) -> FontError {
        FontError {
            id,
            category: self.category.unwrap_or(ErrorCategory::FontLoading),
            severity: self.severity.unwrap_or_default(),
            family: self.family,
            message: self
                .message
                .unwrap_or_else(|| "Unknown error occurred".to_string()),
            user_message: self.user_message,
            recoverable: self.recoverable.unwrap_or(true),
            retry_count: self.retry_count,
            timestamp: SystemTime::now(),
        }
    }
}

/// Recovery actions offered for a recorded error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryAction {
    Retry,
    UseFallback,
    EnableOfflineMode,
    Dismiss,
}

impl RecoveryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryAction::Retry => "retry",
            RecoveryAction::UseFallback => "use-fallback",
            RecoveryAction::EnableOfflineMode => "enable-offline-mode",
            RecoveryAction::Dismiss => "dismiss",
        }
    }
}

/// The single coalesced user-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotification {
    pub message: String,
    pub severity: ErrorSeverity,
}

/// Friendly message for a failure category
pub fn user_friendly_message(category: ErrorCategory, family: Option<&str>) -> String {
    match category {
        ErrorCategory::Network => {
            "Unable to connect to the font service. Using system fonts instead.".to_string()
        }
        ErrorCategory::FontLoading => format!(
            "Font \"{}\" couldn't load. Using a similar system font.",
            family.unwrap_or("unknown")
        ),
        ErrorCategory::Api => {
            "Font service temporarily unavailable. Limited font selection available.".to_string()
        }
        ErrorCategory::Cache => {
            "Font cache error. Some fonts may load slower than usual.".to_string()
        }
        ErrorCategory::UserInput => {
            "Font loading issue encountered. Using fallback fonts.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_report_fills_defaults() {
        let error = ErrorReport::default().into_error(ErrorId("e1".into()));
        assert_eq!(error.category, ErrorCategory::FontLoading);
        assert_eq!(error.severity, ErrorSeverity::Medium);
        assert_eq!(error.message, "Unknown error occurred");
        assert!(error.recoverable);
        assert_eq!(error.retry_count, 0);
    }

    #[test]
    fn report_from_loader_error_keeps_classification() {
        let report = ErrorReport::from_loader_error(&LoaderError::Timeout(10_000));
        assert_eq!(report.category, Some(ErrorCategory::Network));
        assert_eq!(report.recoverable, Some(true));
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = ErrorId::generate();
        let b = ErrorId::generate();
        assert!(a.as_str().starts_with("error_"));
        assert_ne!(a, b);
    }

    #[test]
    fn friendly_message_names_the_family() {
        let message = user_friendly_message(ErrorCategory::FontLoading, Some("Lobster"));
        assert!(message.contains("\"Lobster\""));
    }
}
