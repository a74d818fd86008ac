//! Process-wide context.
//!
//! Built once at start-up and handed to every component constructor, so no
//! component reaches for global configuration.

use std::sync::Arc;

use crate::config::Settings;
use crate::middleware::RetryPolicy;

/// Shared, read-only state for one process run.
#[derive(Debug, Clone)]
pub struct AppContext {
    settings: Arc<Settings>,
    retry: RetryPolicy,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        let retry = RetryPolicy::from_settings(&settings);
        Self {
            settings: Arc::new(settings),
            retry,
        }
    }

    /// Replace the retry policy derived from settings.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}
