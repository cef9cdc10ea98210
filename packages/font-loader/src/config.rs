use std::time::Duration;

use crate::constants;
use crate::error::{LoaderError, LoaderResult};

/// Tunables of the loading subsystem
#[derive(Debug, Clone, PartialEq)]
pub struct FontLoaderConfig {
    pub max_concurrent_loads: usize,
    pub max_retry_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_jitter_max: Duration,
    pub retry_max_delay: Duration,
    pub request_timeout: Duration,
    pub queue_process_delay: Duration,
    pub binary_cache_expiry: Duration,
    pub network_check_interval: Duration,
    pub network_staleness: Duration,
    pub stylesheet_cleanup_interval: Duration,
    pub stylesheet_max_age: Duration,
    pub preview_ttl: Duration,
    pub idle_ttl: Duration,
    pub history_capacity: usize,
    pub recent_errors_capacity: usize,
    pub max_binary_size: usize,
    pub stylesheet_endpoint: String,
    /// Spawn the network refresh and stylesheet sweep task on build
    pub background_tasks: bool,
}

impl Default for FontLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: constants::MAX_CONCURRENT_LOADS,
            max_retry_attempts: constants::MAX_RETRY_ATTEMPTS,
            retry_base_delay: Duration::from_millis(constants::RETRY_BASE_DELAY_MS),
            retry_jitter_max: Duration::from_millis(constants::RETRY_JITTER_MAX_MS),
            retry_max_delay: Duration::from_millis(constants::RETRY_MAX_DELAY_MS),
            request_timeout: Duration::from_secs(constants::FONT_LOAD_TIMEOUT_SECONDS),
            queue_process_delay: Duration::from_millis(constants::QUEUE_PROCESS_DELAY_MS),
            binary_cache_expiry: Duration::from_secs(constants::BINARY_CACHE_EXPIRY_SECONDS),
            network_check_interval: Duration::from_secs(constants::NETWORK_CHECK_INTERVAL_SECONDS),
            network_staleness: Duration::from_secs(constants::NETWORK_STALENESS_SECONDS),
            stylesheet_cleanup_interval: Duration::from_secs(
                constants::STYLESHEET_CLEANUP_INTERVAL_SECONDS,
            ),
            stylesheet_max_age: Duration::from_secs(constants::STYLESHEET_MAX_AGE_SECONDS),
            preview_ttl: Duration::from_secs(constants::PREVIEW_TTL_SECONDS),
            idle_ttl: Duration::from_secs(constants::IDLE_TTL_SECONDS),
            history_capacity: constants::FONT_HISTORY_MAX_SIZE,
            recent_errors_capacity: constants::RECENT_ERRORS_CAPACITY,
            max_binary_size: constants::MAX_FONT_FILE_SIZE,
            stylesheet_endpoint: constants::STYLESHEET_ENDPOINT.to_string(),
            background_tasks: true,
        }
    }
}

impl FontLoaderConfig {
    /// Skip spawning the maintenance task; refresh and sweep are then driven by the caller
    pub fn without_background_tasks(mut self) -> Self {
        self.background_tasks = false;
        self
    }

    #[inline]
    pub fn with_max_concurrent_loads(mut self, loads: usize) -> Self {
        self.max_concurrent_loads = loads;
        self
    }

    #[inline]
    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    /// Set base delay, jitter and ceiling of the retry backoff in one call
    #[inline]
    pub fn with_retry_backoff(mut self, base: Duration, jitter: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_jitter_max = jitter;
        self.retry_max_delay = max;
        self
    }

    #[inline]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[inline]
    pub fn with_binary_cache_expiry(mut self, expiry: Duration) -> Self {
        self.binary_cache_expiry = expiry;
        self
    }

    #[inline]
    pub fn with_stylesheet_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.stylesheet_endpoint = endpoint.into();
        self
    }

    /// Validate configuration before building
    pub fn validate(&self) -> LoaderResult<()> {
        if self.max_concurrent_loads == 0 {
            return Err(LoaderError::Config(
                "Concurrent load limit cannot be zero".to_string(),
            ));
        }

        if self.max_retry_attempts == 0 {
            return Err(LoaderError::Config(
                "At least one load attempt is required".to_string(),
            ));
        }

        if self.retry_max_delay < self.retry_base_delay {
            return Err(LoaderError::Config(format!(
                "Retry ceiling {:?} is below the base delay {:?}",
                self.retry_max_delay, self.retry_base_delay
            )));
        }

        let required = [
            ("Request timeout", self.request_timeout),
            ("Binary cache expiry", self.binary_cache_expiry),
            ("Network check interval", self.network_check_interval),
            ("Stylesheet cleanup interval", self.stylesheet_cleanup_interval),
        ];
        for (name, value) in required {
            if value.is_zero() {
                return Err(LoaderError::Config(format!("{} cannot be zero", name)));
            }
        }

        if self.history_capacity == 0 || self.recent_errors_capacity == 0 {
            return Err(LoaderError::Config(
                "History and error capacities cannot be zero".to_string(),
            ));
        }

        if self.max_binary_size < constants::MIN_FONT_FILE_SIZE {
            return Err(LoaderError::Config(format!(
                "Binary size limit must be at least {} bytes",
                constants::MIN_FONT_FILE_SIZE
            )));
        }

        let endpoint = url::Url::parse(&self.stylesheet_endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(LoaderError::Config(format!(
                "Stylesheet endpoint must be http(s): {}",
                endpoint
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = FontLoaderConfig::default();
        assert_eq!(config.max_concurrent_loads, 5);
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert_eq!(config.retry_max_delay, Duration::from_secs(10));
        assert_eq!(config.binary_cache_expiry, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.preview_ttl, Duration::from_secs(600));
        assert_eq!(config.idle_ttl, Duration::from_secs(1800));
        assert_eq!(config.history_capacity, 5);
        assert!(config.background_tasks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = FontLoaderConfig::default().with_max_concurrent_loads(0);
        assert!(matches!(config.validate(), Err(LoaderError::Config(_))));
    }

    #[test]
    fn inverted_backoff_is_rejected() {
        let config = FontLoaderConfig::default().with_retry_backoff(
            Duration::from_secs(5),
            Duration::ZERO,
            Duration::from_secs(1),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn endpoint_must_be_a_url() {
        let config = FontLoaderConfig::default().with_stylesheet_endpoint("not a url");
        assert!(matches!(config.validate(), Err(LoaderError::InvalidUrl(_))));

        let ftp = FontLoaderConfig::default().with_stylesheet_endpoint("ftp://fonts.example/css2");
        assert!(matches!(ftp.validate(), Err(LoaderError::Config(_))));
    }
}
