//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use herlign_core::RateLimiter;

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::entities::Store;
use crate::youtube::VideoSource;

#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    /// In-process fixed-window counters; one instance per server process.
    pub rate_limiter: Arc<RateLimiter>,
    /// Backend for the guest chat bot.
    pub completion: Arc<dyn CompletionClient>,
    /// Channel uploads for the podcast sync.
    pub youtube: Arc<dyn VideoSource>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("rate_limiter_keys", &self.rate_limiter.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
use crate::{completion::fake::FakeCompletion, youtube::fake::FakeVideos};

#[cfg(test)]
impl AppState {
    /// In-memory store, default config, and the given completion backend.
    pub async fn for_tests(completion: Arc<dyn CompletionClient>) -> Arc<Self> {
        Self::for_tests_with(Config::for_tests(), completion).await
    }

    pub async fn for_tests_with(config: Config, completion: Arc<dyn CompletionClient>) -> Arc<Self> {
        Self::assemble(config, completion, Arc::new(FakeVideos::unconfigured())).await
    }

    /// Like [`AppState::for_tests`], with a scripted YouTube channel.
    pub async fn for_tests_with_videos(youtube: Arc<dyn VideoSource>) -> Arc<Self> {
        Self::assemble(Config::for_tests(), Arc::new(FakeCompletion::failing()), youtube).await
    }

    async fn assemble(
        config: Config,
        completion: Arc<dyn CompletionClient>,
        youtube: Arc<dyn VideoSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            store: Arc::new(Store::in_memory().await),
            rate_limiter: Arc::new(RateLimiter::new()),
            completion,
            youtube,
        })
    }
}
