use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::error::fallback;
use crate::error::report::{
    ErrorId, ErrorReport, FontError, RecoveryAction, UserNotification, user_friendly_message,
};
use crate::error::types::{ErrorCategory, ErrorSeverity};

#[derive(Debug, Default)]
struct HandlerState {
    errors: HashMap<ErrorId, FontError>,
    recent: VecDeque<FontError>,
    offline_mode: bool,
    offline_fallbacks: HashMap<String, String>,
    notification: Option<UserNotification>,
}

/// Central error registry, notification policy, offline mode and fallback lookup
#[derive(Debug)]
pub struct ErrorHandler {
    state: Mutex<HandlerState>,
    recent_capacity: usize,
}

impl ErrorHandler {
    pub fn new(recent_capacity: usize) -> Self {
        Self {
            state: Mutex::new(HandlerState::default()),
            recent_capacity: recent_capacity.max(1),
        }
    }

    /// Record a failure and apply the notification policy
    pub fn report(&self, report: ErrorReport) -> ErrorId {
        let id = ErrorId::generate();
        let error = report.into_error(id.clone());

        let mut state = self.state.lock();
        let notify = Self::should_notify(&error, state.offline_mode);

        match error.severity {
            ErrorSeverity::High => log::error!("[fonts] {}", error),
            ErrorSeverity::Medium => log::warn!("[fonts] {}", error),
            ErrorSeverity::Low => log::info!("[fonts] {}", error),
        }

        if notify {
            state.notification = Some(UserNotification {
                message: error.display_message().to_string(),
                severity: error.severity,
            });
        }

        state.recent.push_front(error.clone());
        state.recent.truncate(self.recent_capacity);
        state.errors.insert(id.clone(), error);

        id
    }

    fn should_notify(error: &FontError, offline_mode: bool) -> bool {
        error.severity == ErrorSeverity::High
            || (error.severity == ErrorSeverity::Medium && error.retry_count > 2)
            || offline_mode
    }

    pub fn clear(&self, id: &ErrorId) {
        let mut state = self.state.lock();
        state.errors.remove(id);
        state.recent.retain(|error| &error.id != id);
    }

    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.errors.clear();
        state.recent.clear();
        state.notification = None;
    }

    pub fn error(&self, id: &ErrorId) -> Option<FontError> {
        self.state.lock().errors.get(id).cloned()
    }

    /// Most recent errors first
    pub fn recent_errors(&self) -> Vec<FontError> {
        self.state.lock().recent.iter().cloned().collect()
    }

    /// Full history for one family, oldest first
    pub fn errors_for(&self, family: &str) -> Vec<FontError> {
        let state = self.state.lock();
        let mut errors: Vec<FontError> = state
            .errors
            .values()
            .filter(|error| error.family.as_deref() == Some(family))
            .cloned()
            .collect();
        errors.sort_by_key(|error| error.timestamp);
        errors
    }

    pub fn error_count(&self) -> usize {
        self.state.lock().errors.len()
    }

    pub fn notification(&self) -> Option<UserNotification> {
        self.state.lock().notification.clone()
    }

    pub fn dismiss_notification(&self) {
        self.state.lock().notification = None;
    }

    pub fn is_offline_mode(&self) -> bool {
        self.state.lock().offline_mode
    }

    pub fn enable_offline_mode(&self) {
        {
            let mut state = self.state.lock();
            state.offline_mode = true;
            state.offline_fallbacks = fallback::offline_fallback_table();
        }

        self.report(
            ErrorReport::new("Operating in offline mode, using fallback fonts")
                .with_category(ErrorCategory::Network)
                .with_severity(ErrorSeverity::Medium)
                .with_recoverable(true)
                .with_user_message(
                    "Limited font selection available offline. Using system fonts as fallbacks.",
                ),
        );
        log::info!("Offline mode enabled, using fallback fonts");
    }

    pub fn disable_offline_mode(&self) {
        let mut state = self.state.lock();
        state.offline_mode = false;
        state.offline_fallbacks.clear();
        log::info!("Online mode restored");
    }

    /// Web-safe family to render `family` with when it cannot be loaded
    pub fn fallback_for(&self, family: &str) -> String {
        let state = self.state.lock();
        let offline = state.offline_mode.then_some(&state.offline_fallbacks);
        fallback::resolve_fallback(family, offline)
    }

    pub fn recovery_options(&self, id: &ErrorId) -> Vec<RecoveryAction> {
        let state = self.state.lock();
        let Some(error) = state.errors.get(id) else {
            return Vec::new();
        };

        let mut options = Vec::with_capacity(4);
        if error.recoverable {
            options.push(RecoveryAction::Retry);
        }
        if error.family.is_some() {
            options.push(RecoveryAction::UseFallback);
        }
        if error.category == ErrorCategory::Network {
            options.push(RecoveryAction::EnableOfflineMode);
        }
        options.push(RecoveryAction::Dismiss);
        options
    }

    /// Friendly message for a recorded error
    pub fn user_message(&self, id: &ErrorId) -> Option<String> {
        self.error(id)
            .map(|error| user_friendly_message(error.category, error.family.as_deref()))
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(crate::constants::RECENT_ERRORS_CAPACITY)
    }
}
